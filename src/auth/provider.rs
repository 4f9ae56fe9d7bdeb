use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::{claims::AssertionClaims, dto::Session, errors::AuthError};
use crate::config::AppConfig;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Turns whatever the upstream OAuth flow hands back into a verified identity.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn id(&self) -> &str;
    async fn resolve(&self, assertion: &str) -> Result<Session, AuthError>;
}

/// Verifies HS256 assertions signed by the OAuth broker with a per-provider secret.
pub struct AssertionProvider {
    id: String,
    decoding: DecodingKey,
    audience: String,
}

impl AssertionProvider {
    pub fn new(id: impl Into<String>, secret: &str, audience: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for AssertionProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn resolve(&self, assertion: &str) -> Result<Session, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        let claims = decode::<AssertionClaims>(assertion, &self.decoding, &validation)
            .map_err(|e| {
                warn!(provider = %self.id, error = %e, "assertion rejected");
                AuthError::InvalidAssertion
            })?
            .claims;

        let email = claims.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            warn!(provider = %self.id, email = %email, "invalid email in assertion");
            return Err(AuthError::InvalidEmail);
        }
        Ok(Session {
            email,
            name: claims.name,
        })
    }
}

#[derive(Clone, Default)]
pub struct IdentityProviders {
    by_id: HashMap<String, Arc<dyn IdentityProvider>>,
}

impl IdentityProviders {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut providers = Self::default();
        for p in &config.providers {
            providers.register(Arc::new(AssertionProvider::new(
                p.id.clone(),
                &p.assertion_secret,
                config.session.audience.clone(),
            )));
        }
        providers
    }

    pub fn register(&mut self, provider: Arc<dyn IdentityProvider>) {
        self.by_id.insert(provider.id().to_string(), provider);
    }

    pub fn get(&self, id: &str) -> Result<&Arc<dyn IdentityProvider>, AuthError> {
        self.by_id
            .get(id)
            .ok_or_else(|| AuthError::UnknownProvider(id.to_string()))
    }
}
