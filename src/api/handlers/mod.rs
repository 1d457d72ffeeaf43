//! Route handlers and small shared helpers.

pub mod health;
pub mod members;
pub mod reset;
pub mod root;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::identity::RecoverySession;

/// Pull the session out of a `Authorization: Bearer <token>` header.
pub(crate) fn bearer_session(headers: &HeaderMap) -> Option<RecoverySession> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(RecoverySession::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::ExposeSecret;

    #[test]
    fn bearer_session_extracts_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        let session = bearer_session(&headers).unwrap();
        assert_eq!(session.access_token.expose_secret(), "abc123");
    }

    #[test]
    fn bearer_session_rejects_missing_or_empty() {
        assert!(bearer_session(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_session(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert!(bearer_session(&headers).is_none());
    }
}
