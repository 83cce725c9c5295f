use url::Url;

use crate::config::ShortenerConfig;
use crate::errors::ServiceError;

/// Validation and canonicalization applied to every target URL before it is
/// stored or compared.
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    pub strip_query: bool,
    pub strip_anchor: bool,
    pub required_host: Option<String>,
}

impl From<&ShortenerConfig> for UrlPolicy {
    fn from(config: &ShortenerConfig) -> Self {
        Self {
            strip_query: config.strip_query,
            strip_anchor: config.strip_anchor,
            required_host: config
                .required_host
                .as_ref()
                .map(|host| host.trim().to_ascii_lowercase()),
        }
    }
}

impl UrlPolicy {
    /// Returns the canonical form of `raw`, or `InvalidUrl`.
    ///
    /// Canonical means: parsed and re-serialized by `url` (lowercase scheme
    /// and host, explicit root path), then query and fragment removed when
    /// the policy says so.
    pub fn normalize(&self, raw: &str) -> Result<String, ServiceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ServiceError::InvalidUrl("url cannot be empty".to_string()));
        }

        let mut url = Url::parse(raw)
            .map_err(|e| ServiceError::InvalidUrl(format!("'{}': {}", raw, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ServiceError::InvalidUrl(format!(
                "'{}': scheme must be http or https",
                raw
            )));
        }

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => {
                return Err(ServiceError::InvalidUrl(format!(
                    "'{}': url must have a host",
                    raw
                )))
            }
        };

        if let Some(required) = &self.required_host {
            if &host != required {
                return Err(ServiceError::InvalidUrl(format!(
                    "'{}': host must be {}",
                    raw, required
                )));
            }
        }

        if self.strip_query {
            url.set_query(None);
        }
        if self.strip_anchor {
            url.set_fragment(None);
        }

        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accepts_http_and_https() {
        let policy = UrlPolicy::default();
        assert_eq!(
            policy.normalize("https://Example.com").unwrap(),
            "https://example.com/"
        );
        assert_eq!(
            policy.normalize("  http://example.com/a?b=c#d ").unwrap(),
            "http://example.com/a?b=c#d"
        );
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        let policy = UrlPolicy::default();
        for raw in ["", "   ", "not-a-url", "/relative/path", "ftp://example.com", "mailto:a@b.c"] {
            assert!(
                matches!(policy.normalize(raw), Err(ServiceError::InvalidUrl(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_normalize_strips_query_and_anchor() {
        let policy = UrlPolicy {
            strip_query: true,
            strip_anchor: true,
            required_host: None,
        };
        assert_eq!(
            policy.normalize("https://example.com/page?utm=1#top").unwrap(),
            "https://example.com/page"
        );

        let keep_query = UrlPolicy {
            strip_anchor: true,
            ..Default::default()
        };
        assert_eq!(
            keep_query.normalize("https://example.com/page?utm=1#top").unwrap(),
            "https://example.com/page?utm=1"
        );
    }

    #[test]
    fn test_normalize_required_host() {
        let config = ShortenerConfig {
            required_host: Some("GitHub.com".to_string()),
            ..Default::default()
        };
        let policy = UrlPolicy::from(&config);

        assert!(policy.normalize("https://github.com/rust-lang").is_ok());
        assert!(matches!(
            policy.normalize("https://gitlab.com/rust-lang"),
            Err(ServiceError::InvalidUrl(_))
        ));
    }
}
