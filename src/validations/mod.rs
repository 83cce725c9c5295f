mod mapping;

pub use mapping::{validate_code, validate_url, MAX_CODE_LENGTH, RESERVED_CODES};
