mod basic_auth;
mod request_logger;

pub use basic_auth::BasicAuth;
pub use request_logger::{RequestLogger, REQUEST_ID_HEADER};
