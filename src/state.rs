use std::sync::Arc;

use tracing::info;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::{AppConfig, JwtConfig, StoreBackend};
use crate::contacts::repo::{ContactStore, PgContactStore};
use crate::db;
use crate::memory::{MemoryContactStore, MemoryUserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub contacts: Arc<dyn ContactStore>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let (contacts, users): (Arc<dyn ContactStore>, Arc<dyn UserStore>) = match config.store {
            StoreBackend::Postgres => {
                let pool = db::connect(&config).await?;
                db::migrate(&pool).await?;
                (
                    Arc::new(PgContactStore::new(pool.clone())),
                    Arc::new(PgUserStore::new(pool)),
                )
            }
            StoreBackend::Memory => {
                info!("using in-memory stores; data is lost on restart");
                (
                    Arc::new(MemoryContactStore::default()),
                    Arc::new(MemoryUserStore::default()),
                )
            }
        };
        Ok(Self::from_parts(config, contacts, users))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        contacts: Arc<dyn ContactStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let jwt = JwtKeys::from(&config.jwt);
        Self {
            config,
            jwt,
            contacts,
            users,
        }
    }

    /// Memory-backed state with fixed test credentials.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(
            config,
            Arc::new(MemoryContactStore::default()),
            Arc::new(MemoryUserStore::default()),
        )
    }
}
