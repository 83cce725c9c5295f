use url::Url;

use validator::ValidationError;

/// Longest code a caller may request
pub const MAX_CODE_LENGTH: usize = 32;

/// Codes that would be shadowed by fixed routes
pub const RESERVED_CODES: &[&str] = &["api", "health"];

/// Validates that a URL string is properly formatted and uses http/https
pub fn validate_url(url_str: &str) -> Result<(), ValidationError> {
    match Url::parse(url_str.trim()) {
        Ok(url) => {
            // Ensure URL has a scheme and host
            if url.scheme().is_empty() || url.host().is_none() {
                let mut err = ValidationError::new("url_host");
                err.message = Some("URL must have a scheme and host".into());
                return Err(err);
            }

            // Only accept HTTP and HTTPS URLs
            if url.scheme() != "http" && url.scheme() != "https" {
                let mut err = ValidationError::new("url_scheme");
                err.message = Some("URL scheme must be http or https".into());
                return Err(err);
            }

            Ok(())
        }
        Err(_) => {
            let mut err = ValidationError::new("url_format");
            err.message = Some("Invalid URL format".into());
            Err(err)
        }
    }
}

/// Validates that a requested short code:
/// - Is between 1 and 32 characters
/// - Only contains alphanumeric characters, hyphens and underscores
/// - Is not one of the [`RESERVED_CODES`]
pub fn validate_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() || code.len() > MAX_CODE_LENGTH {
        let mut err = ValidationError::new("code_length");
        err.message = Some(format!("Code must be between 1 and {} characters", MAX_CODE_LENGTH).into());
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("code_charset");
        err.message = Some(
            "Code can only contain alphanumeric characters, hyphens, and underscores".into(),
        );
        return Err(err);
    }

    if RESERVED_CODES.contains(&code) {
        let mut err = ValidationError::new("code_reserved");
        err.message = Some(format!("Code '{}' is reserved", code).into());
        return Err(err);
    }

    Ok(())
}
