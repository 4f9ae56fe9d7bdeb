use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Upstream OAuth broker settings for one sign-in provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub assertion_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub public_url: String,
    pub session: SessionConfig,
    pub providers: Vec<ProviderConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let public_url = std::env::var("PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:8080".into())
            .trim_end_matches('/')
            .to_string();

        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET must be set")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "tarefas".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "tarefas-users".into()),
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 30),
        };

        let provider_ids = std::env::var("AUTH_PROVIDERS").unwrap_or_else(|_| "google".into());
        let providers = parse_provider_ids(&provider_ids)
            .into_iter()
            .map(|id| {
                let key = format!("AUTH_{}_SECRET", id.to_uppercase().replace('-', "_"));
                let assertion_secret =
                    std::env::var(&key).with_context(|| format!("{key} must be set"))?;
                Ok(ProviderConfig { id, assertion_secret })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            database_url,
            db_max_connections,
            public_url,
            session,
            providers,
        })
    }

    /// Provider used by the header's sign-in action.
    pub fn default_provider(&self) -> Option<&str> {
        self.providers.first().map(|p| p.id.as_str())
    }

    pub fn share_url(&self, task_id: uuid::Uuid) -> String {
        format!("{}/task/{}", self.public_url, task_id)
    }
}

fn parse_provider_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
