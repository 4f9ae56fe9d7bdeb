use axum::http::StatusCode;
use thiserror::Error;

/// Outcome of a task/comment operation that did not succeed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("sign-in required")]
    Unauthenticated,
    #[error("not allowed")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Invalid(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<ServiceError> for (StatusCode, String) {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unauthenticated => (StatusCode::UNAUTHORIZED, e.to_string()),
            ServiceError::Forbidden => (StatusCode::FORBIDDEN, e.to_string()),
            ServiceError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
            ServiceError::Invalid(_) => (StatusCode::BAD_REQUEST, e.to_string()),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, e.to_string()),
            // details were logged where the failure happened
            ServiceError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "something went wrong, try again later".into(),
            ),
        }
    }
}
