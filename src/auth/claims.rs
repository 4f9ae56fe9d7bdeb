use serde::{Deserialize, Serialize};

/// JWT payload of a session issued by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,          // user email
    pub name: Option<String>, // display name, if the provider shared one
    pub provider: String,     // provider the user signed in with
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Identity assertion minted by the upstream OAuth broker after a provider login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub aud: String,
    pub exp: usize,
}
