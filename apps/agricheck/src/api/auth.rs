//! # Authentication Module
//!
//! Optional API key check for the JSON API.
//!
//! ## Configuration
//!
//! - `AGRICHECK_API_KEY`: if set, every `/api/*` request needs this key
//!
//! The HTML pages and `/health` stay public: the pages are opened by
//! following plain links, which cannot carry a header.
//!
//! ```text
//! Authorization: Bearer <your-api-key>
//! ```

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// Paths that never require a key.
const PUBLIC_PATHS: [&str; 3] = ["/health", "/", "/checklist"];

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// `AGRICHECK_API_KEY`, if set and non-empty.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var("AGRICHECK_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
}

fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Constant-time key comparison.
///
/// Both keys are zero-padded to the same length before `ct_eq`, so the
/// comparison time does not depend on where they differ.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

/// API key authentication middleware.
///
/// Accepts `Authorization: Bearer <key>` or the raw key.
pub async fn api_key_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(expected) = get_api_key_from_env() else {
        return Ok(next.run(request).await);
    };

    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) => {
            let provided = value.strip_prefix("Bearer ").unwrap_or(value);
            if keys_match(provided, &expected) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!(
                    event = "auth_failure",
                    reason = "invalid_api_key",
                    path = %request.uri().path(),
                    "Authentication failed: invalid API key"
                );
                Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                path = %request.uri().path(),
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_and_health_are_public() {
        assert!(is_public_path("/health"));
        assert!(is_public_path("/"));
        assert!(is_public_path("/checklist"));
        assert!(!is_public_path("/api/tree"));
        assert!(!is_public_path("/checklist/extra"));
    }

    #[test]
    fn key_comparison() {
        assert!(keys_match("secret", "secret"));
        assert!(!keys_match("secret", "secreT"));
        assert!(!keys_match("secret", "secret2"));
        assert!(!keys_match("", "secret"));
    }
}
