use thiserror::Error;

use super::StoreError;

/// Errors produced by the shortening service.
///
/// Every variant carries the code or URL it concerns so callers can log it
/// without reconstructing context.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Invalid code: {0}")]
    InvalidCode(String),

    #[error("Code conflict: code '{code}' is already taken by a different url than '{url}'")]
    CodeConflict { code: String, url: String },

    #[error("Code generation exhausted: no free code for '{url}' after {attempts} attempts")]
    CodeGenerationExhausted { url: String, attempts: usize },

    #[error("Not found: no url for code '{0}'")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}
