use serde::{Deserialize, Serialize};

/// The signed-in user as seen by handlers. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    pub name: Option<String>,
}

impl Session {
    /// Display name, or `None` when the provider did not share a usable one.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Request body for `POST /auth/signin/:provider`.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub assertion: String,
}

/// Response returned after sign-in.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: Session,
}

/// Body of `GET /auth/session`; serialized as `null` when anonymous.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Session,
}
