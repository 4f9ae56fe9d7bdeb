use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
};
use time::OffsetDateTime;
use tracing::{error, warn};

use super::{dto::Session, errors::AuthError, jwt::SessionKeys};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated(Session),
    Anonymous,
    /// A token was presented but the keys could not check it. Only key-level
    /// failures land here (see [`AuthError::from_verification`]); HS256 keys
    /// built from a shared secret never fail that way, so with the current
    /// session keys this state is not reached.
    Unknown,
}

/// Resolves the caller's session, never rejecting the request.
pub struct CurrentSession {
    pub status: SessionStatus,
    /// Expiry of the presented token; `None` unless authenticated.
    pub expires_at: Option<OffsetDateTime>,
}

impl CurrentSession {
    pub fn session(&self) -> Option<&Session> {
        match &self.status {
            SessionStatus::Authenticated(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_session(self) -> Option<Session> {
        self.into_parts().map(|(session, _)| session)
    }

    /// The session together with the instant it stops being valid.
    pub fn into_parts(self) -> Option<(Session, OffsetDateTime)> {
        match (self.status, self.expires_at) {
            (SessionStatus::Authenticated(s), Some(at)) => Some((s, at)),
            _ => None,
        }
    }
}

/// Requires a valid session, rejecting with 401 otherwise.
pub struct AuthSession(pub Session);

/// Reads the token from `Authorization: Bearer` first, then from the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ").or_else(|| auth.strip_prefix("bearer ")) {
            return Some(token.trim());
        }
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|v| !v.is_empty())
}

pub fn resolve_session(headers: &HeaderMap, keys: &SessionKeys) -> CurrentSession {
    let unauthenticated = |status| CurrentSession {
        status,
        expires_at: None,
    };
    let Some(token) = session_token(headers) else {
        return unauthenticated(SessionStatus::Anonymous);
    };
    match keys.verify_until(token) {
        Ok((session, expires_at)) => CurrentSession {
            status: SessionStatus::Authenticated(session),
            expires_at: Some(expires_at),
        },
        Err(AuthError::KeyUnusable(reason)) => {
            error!(%reason, "session keys unusable");
            unauthenticated(SessionStatus::Unknown)
        }
        Err(e) => {
            warn!(error = %e, "ignoring session token");
            unauthenticated(SessionStatus::Anonymous)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        Ok(resolve_session(&parts.headers, &keys))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        resolve_session(&parts.headers, &keys)
            .into_session()
            .map(AuthSession)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, "sign-in required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=from-cookie"));
        assert_eq!(session_token(&headers), Some("from-header"));
    }

    #[test]
    fn token_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sessionid=nope; session=abc.def.ghi"),
        );
        assert_eq!(session_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn cleared_cookie_means_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_token(&headers), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn invalid_token_resolves_to_anonymous() {
        let keys = SessionKeys::from_ref(&crate::state::AppState::fake());
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer garbage"));
        let current = resolve_session(&headers, &keys);
        assert_eq!(current.status, SessionStatus::Anonymous);
        assert!(current.expires_at.is_none());
    }

    #[test]
    fn valid_token_carries_its_expiry() {
        let keys = SessionKeys::from_ref(&crate::state::AppState::fake());
        let session = Session {
            email: "a@x.com".into(),
            name: None,
        };
        let token = keys.sign(&session, "google").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, format!("session={token}").parse().unwrap());

        let (resolved, expires_at) = resolve_session(&headers, &keys).into_parts().unwrap();
        assert_eq!(resolved, session);
        assert!(expires_at > OffsetDateTime::now_utc());
    }
}
