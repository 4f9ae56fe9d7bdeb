use axum::http::StatusCode;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown sign-in provider `{0}`")]
    UnknownProvider(String),
    #[error("identity assertion rejected")]
    InvalidAssertion,
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid or expired session")]
    InvalidToken,
    /// The keys themselves are unusable, so the session state cannot be decided.
    #[error("session keys unusable: {0}")]
    KeyUnusable(String),
    #[error("could not sign session: {0}")]
    Signing(#[source] JwtError),
}

impl AuthError {
    /// Splits verification failures into "bad token" and "cannot tell".
    ///
    /// Only asymmetric or malformed key material yields the key-level kinds;
    /// the HS256 secret keys used for sessions reject a token only as invalid.
    pub fn from_verification(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::Crypto(_) => AuthError::KeyUnusable(e.to_string()),
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<AuthError> for (StatusCode, String) {
    fn from(e: AuthError) -> Self {
        let status = match e {
            AuthError::UnknownProvider(_) => StatusCode::NOT_FOUND,
            AuthError::InvalidAssertion | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
            AuthError::KeyUnusable(_) | AuthError::Signing(_) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, "sign-in unavailable".into())
            }
        };
        (status, e.to_string())
    }
}
