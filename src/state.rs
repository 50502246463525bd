use std::sync::Arc;

use crate::config::{AppConfig, JwtConfig, StoreKind};
use crate::store::{MemoryStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.store {
            StoreKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
                Arc::new(PgStore::connect(url, config.max_connections).await?) as Arc<dyn Store>
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn Store>
            }
        };

        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }

    /// State backed by the given in-memory store and a fixed test secret.
    pub fn fake_with_store(store: Arc<MemoryStore>) -> Self {
        let config = Arc::new(AppConfig {
            store: StoreKind::Memory,
            database_url: None,
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                audience: "authenticated".into(),
                issuer: None,
            },
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(config, store)
    }
}
