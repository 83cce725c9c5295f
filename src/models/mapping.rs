// src/models/mapping.rs - Pure data structures
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::validations::{validate_code, validate_url};

/// A persisted short code to URL pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// The short code addressing this mapping
    pub code: String,

    /// The normalized target URL
    pub url: String,
}

impl Mapping {
    pub fn new(code: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            url: url.into(),
        }
    }
}

// DTO for creating a new mapping, accepted as form, JSON or query string
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMappingDto {
    #[validate(
        length(min = 1, max = 2048, message = "URL must be between 1 and 2048 characters"),
        custom(function = "validate_url")
    )]
    pub url: String,

    /// Requested code; blank values are treated as absent
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(custom(function = "validate_code"))]
    pub code: Option<String>,
}

// DTO for response with the outcome of a create call
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMappingResponse {
    pub code: String,
    pub url: String,
    pub short_url: String,
    pub created: bool,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
