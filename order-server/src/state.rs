//! Shared application state

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::config::Config;
use crate::db::DbService;
use crate::services::{PaymentGateway, SimulatedGateway};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Per-process state handed to every handler
///
/// Everything here is either the pool or immutable; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    /// Auth token issue/validation
    pub jwt: Arc<JwtService>,
    /// Payment collaborator
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Open the configured database and build state with the simulated gateway
    pub async fn new(config: Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_url).await?;
        Ok(Self::with_pool(config, db.pool))
    }

    /// Build state around an existing pool
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let jwt = Arc::new(JwtService::new(&config.jwt_secret));
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            gateway: Arc::new(SimulatedGateway),
        }
    }

    /// Swap the payment gateway
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = gateway;
        self
    }
}
