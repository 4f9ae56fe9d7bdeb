use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::{claims::SessionClaims, dto::Session, errors::AuthError};
use crate::{config::SessionConfig, state::AppState};

#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::from_config(&state.config.session)
    }
}

impl SessionKeys {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        let SessionConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = cfg.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn sign(&self, session: &Session, provider: &str) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = SessionClaims {
            sub: session.email.clone(),
            name: session.name.clone(),
            provider: provider.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding).map_err(AuthError::Signing)?;
        debug!(email = %session.email, %provider, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        self.verify_until(token).map(|(session, _)| session)
    }

    /// Verifies the token and returns the session with the instant it expires.
    pub fn verify_until(&self, token: &str) -> Result<(Session, OffsetDateTime), AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(AuthError::from_verification)?;
        let expires_at = OffsetDateTime::from_unix_timestamp(data.claims.exp as i64)
            .map_err(|_| AuthError::InvalidToken)?;
        debug!(email = %data.claims.sub, %expires_at, "session verified");
        Ok((
            Session {
                email: data.claims.sub,
                name: data.claims.name,
            },
            expires_at,
        ))
    }
}
