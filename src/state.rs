use crate::auth::provider::IdentityProviders;
use crate::config::AppConfig;
use crate::store::{DocumentStore, MemoryStore, PgStore};
use crate::tasks::feed::TaskFeed;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<AppConfig>,
    pub providers: Arc<IdentityProviders>,
    pub feed: TaskFeed,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url, config.db_max_connections).await?;
                if let Err(e) = pg.migrate().await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(pg) as Arc<dyn DocumentStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using the in-memory store");
                Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>
            }
        };

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn DocumentStore>, config: Arc<AppConfig>) -> Self {
        let providers = Arc::new(IdentityProviders::from_config(&config));
        Self {
            store,
            config,
            providers,
            feed: TaskFeed::new(),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_store(Arc::new(MemoryStore::new()))
    }

    /// Test state over a given in-memory store, with a `google` provider
    /// whose assertions are signed with `broker-secret`.
    #[cfg(test)]
    pub fn fake_with_store(store: Arc<MemoryStore>) -> Self {
        use crate::config::{ProviderConfig, SessionConfig};

        let config = Arc::new(AppConfig {
            database_url: None,
            db_max_connections: 1,
            public_url: "http://tarefas.test".into(),
            session: SessionConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            providers: vec![ProviderConfig {
                id: "google".into(),
                assertion_secret: "broker-secret".into(),
            }],
        });

        Self::from_parts(store as Arc<dyn DocumentStore>, config)
    }
}
