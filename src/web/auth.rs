//! Shared-token authentication for the client-facing endpoints.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::state::AppState;
use crate::error::Error;

/// Header carrying the shared secret.
pub const TOKEN_HEADER: &str = "X-Token";

/// Extractor that only succeeds when `X-Token` matches the configured token exactly.
///
/// Handlers that take an `Authorized` argument reject with 401 before
/// touching the queue.
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

#[async_trait]
impl FromRequestParts<AppState> for Authorized {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());

        if check_token(presented, &state.token) {
            Ok(Authorized)
        } else {
            tracing::warn!(
                "Rejected {} {}: {}",
                parts.method,
                parts.uri.path(),
                if presented.is_some() { "bad token" } else { "missing token" }
            );
            Err(Error::Unauthorized)
        }
    }
}

/// Exact string comparison against the expected token.
pub fn check_token(presented: Option<&str>, expected: &str) -> bool {
    presented == Some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_token() {
        assert!(check_token(Some("secret"), "secret"));
        assert!(!check_token(Some("Secret"), "secret"));
        assert!(!check_token(Some("secret "), "secret"));
        assert!(!check_token(Some(""), "secret"));
        assert!(!check_token(None, "secret"));
    }
}
