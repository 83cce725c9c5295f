//! HTTP basic-auth check.
//!
//! The check is a plain function returning [`Authorization`]; the routing
//! layer decides what to do with a denial (see
//! [`crate::middleware::BasicAuth`]).

use actix_web::http::header::HeaderValue;
use base64::{engine::general_purpose::STANDARD, Engine};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

/// Realm advertised in the `WWW-Authenticate` challenge
pub const REALM: &str = "Restricted Area";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
}

/// Checks an `Authorization` header against the configured credentials.
///
/// Always grants when no user is configured.
pub fn authorize(header: Option<&HeaderValue>, config: &AuthConfig) -> Authorization {
    let Some(user) = config.user.as_deref() else {
        return Authorization::Granted;
    };
    let password = config.password.as_deref().unwrap_or("");

    let Some((given_user, given_password)) = header.and_then(decode_basic) else {
        return Authorization::Denied;
    };

    // Both halves are always compared so timing does not reveal which one failed
    let user_matches = given_user.as_bytes().ct_eq(user.as_bytes());
    let password_matches = given_password.as_bytes().ct_eq(password.as_bytes());

    if bool::from(user_matches & password_matches) {
        Authorization::Granted
    } else {
        Authorization::Denied
    }
}

/// Extracts `(user, password)` from a `Basic` credentials header.
fn decode_basic(header: &HeaderValue) -> Option<(String, String)> {
    let value = header.to_str().ok()?.trim();
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}
