use std::io::Error as IoError;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::{error, warn};
use serde_json::json;
use thiserror::Error;

pub mod config;
pub mod service;
pub mod store;

pub use config::ConfigError;
pub use service::ServiceError;
pub use store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    // Service-level domain errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict error: {0}")]
    Conflict(String),
    #[error("Not found error: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Unavailable error: {0}")]
    Unavailable(String),
    // Infrastructure/system errors
    #[error("Server error: {0}")]
    Server(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Logger error: {0}")]
    Logger(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Unavailable(e.to_string())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidUrl(msg) => AppError::Validation(format!("invalid url: {}", msg)),
            ServiceError::InvalidCode(msg) => {
                AppError::Validation(format!("invalid code: {}", msg))
            }
            ServiceError::CodeConflict { code, .. } => {
                AppError::Conflict(format!("the code '{}' is already taken", code))
            }
            ServiceError::NotFound(code) => {
                AppError::NotFound(format!("no url for code '{}'", code))
            }
            ServiceError::CodeGenerationExhausted { url, attempts } => {
                error!(
                    "Code generation exhausted for '{}' after {} attempts",
                    url, attempts
                );
                AppError::Internal("could not allocate a short code".to_string())
            }
            ServiceError::StoreUnavailable(e) => {
                warn!("Store unavailable while serving request: {}", e);
                AppError::Unavailable(e.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Flatten field errors into a single string
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let reasons = errs
                    .iter()
                    .map(|e| e.message.clone().unwrap_or_else(|| e.code.clone()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", field, reasons)
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::Validation(message)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_)
            | AppError::Server(_)
            | AppError::Config(_)
            | AppError::Logger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_string = self.to_string();
        let (error_type, message) = error_string
            .split_once(':')
            .map(|(t, m)| (t.trim(), m.trim()))
            .unwrap_or(("Error", "An error occurred"));

        let error_message = if message.is_empty() {
            "An error occurred"
        } else {
            message
        };

        let code = self.status_code().as_u16();
        HttpResponse::build(self.status_code()).json(json!({
            "type": error_type.to_uppercase(),
            "message": error_message,
            "status_code": code,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_errors_map_to_status_codes() {
        let cases = [
            (
                AppError::from(ServiceError::InvalidUrl("ftp://x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(ServiceError::CodeConflict {
                    code: "abc".into(),
                    url: "https://example.com/".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(ServiceError::NotFound("abc".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(ServiceError::CodeGenerationExhausted {
                    url: "https://example.com/".into(),
                    attempts: 8,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::from(ServiceError::StoreUnavailable(StoreError::Unavailable(
                    "connection refused".into(),
                ))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{}", err);
        }
    }

    #[test]
    fn test_error_response_splits_type_and_message() {
        let err = AppError::Conflict("the code 'abc' is already taken".into());
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
