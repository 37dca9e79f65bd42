use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::utils::AppError;

/// Shared per-process state handed to every handler.
///
/// Constructed once at startup and passed by reference through axum's
/// `State` extractor — no hidden globals, so tests can build their own
/// state around a throwaway database.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
}

impl ServerState {
    /// Open the database and assemble the state
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self {
            config: config.clone(),
            db,
        })
    }

    /// Build state on top of an already-open pool (tests, embedding)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        Self {
            config,
            db: DbService { pool },
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }
}
