//! Application state for market-server

use std::sync::Arc;

use crate::auth::identity::{IdentityProvider, JwtIdentityProvider};
use crate::auth::jwt::{JwtConfig, JwtService};
use crate::auth::rate_limit::RateLimiter;
use crate::config::{Config, StoreBackend};
use crate::db::{MarketStore, MemoryStore, PgStore};
use crate::orders::OrderManager;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn MarketStore>,
    /// Bearer token verification and issuance
    pub identity: Arc<dyn IdentityProvider>,
    /// Order lifecycle
    pub orders: OrderManager,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Create a new AppState from configuration
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn MarketStore> = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or("DATABASE_URL must be set")?;
                let store = PgStore::connect(url).await?;
                tracing::info!("PostgreSQL store ready");
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let jwt = JwtService::with_config(JwtConfig::from(config));
        Ok(Self::with_parts(store, jwt))
    }

    /// Assemble state around an existing store
    pub fn with_parts(store: Arc<dyn MarketStore>, jwt: JwtService) -> Self {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(JwtIdentityProvider::new(jwt, store.clone()));
        Self {
            orders: OrderManager::new(store.clone()),
            store,
            identity,
            rate_limiter: RateLimiter::new(),
        }
    }
}
