use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::{DbResult, RetryPolicy};

mod bootstrap;
mod chain_indexer;
mod contract_indexer;
pub mod models;
mod reader;

pub use bootstrap::ensure_database;

static LEDGER_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("src/postgres/migrations");

/// Rows per multi-row `INSERT`, keeps the bind count of the widest table
/// (blocks, 28 columns) under the protocol limit of 65535.
const INSERT_CHUNK_SIZE: usize = 1000;

pub struct PostgresDBManager {
    pool: sqlx::Pool<sqlx::Postgres>,
    retry: RetryPolicy,
}

impl PostgresDBManager {
    /// Wraps an existing pool, e.g. one shared with other components
    pub fn from_pool(pool: sqlx::Pool<sqlx::Postgres>, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// `database_url` with the user, password and database name overrides applied
    pub fn connect_options(config: &configuration::DatabaseConfig) -> DbResult<PgConnectOptions> {
        let mut options = PgConnectOptions::from_str(&config.database_url)?;
        if let Some(user) = &config.database_user {
            options = options.username(user);
        }
        if let Some(password) = &config.database_password {
            options = options.password(password);
        }
        if let Some(database_name) = &config.database_name {
            options = options.database(database_name);
        }
        Ok(options)
    }

    /// `pool_size` connections are kept open, only the overflow is closed
    /// after `idle_timeout`
    fn pool_options(pool: &configuration::PoolConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(pool.max_connections())
            .min_connections(pool.pool_size)
            .acquire_timeout(pool.acquire_timeout())
            .idle_timeout(Some(pool.idle_timeout()))
    }

    async fn create_pool(
        config: &configuration::DatabaseConfig,
    ) -> DbResult<sqlx::Pool<sqlx::Postgres>> {
        let pool = Self::pool_options(&config.pool)
            .connect_with(Self::connect_options(config)?)
            .await?;
        Ok(pool)
    }

    async fn run_migrations(pool: &sqlx::Pool<sqlx::Postgres>) -> DbResult<()> {
        LEDGER_MIGRATOR.run(pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::BaseDbManager for PostgresDBManager {
    async fn new(config: &configuration::DatabaseConfig) -> DbResult<Box<Self>> {
        ensure_database(config).await?;
        let pool = Self::create_pool(config).await?;
        if !config.read_only {
            Self::run_migrations(&pool).await?;
        }
        tracing::info!(
            target: crate::DATABASE,
            "Postgres pool ready (max {} connections, read_only: {})",
            config.pool.max_connections(),
            config.read_only,
        );
        Ok(Box::new(Self {
            pool,
            retry: RetryPolicy::from(&config.write),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn pool_keeps_pool_size_and_reaps_overflow() {
        let pool = configuration::PoolConfig {
            pool_size: 8,
            max_overflow: 2,
            pool_timeout: 5,
            idle_timeout: 60,
        };
        let options = PostgresDBManager::pool_options(&pool);
        assert_eq!(options.get_min_connections(), 8);
        assert_eq!(options.get_max_connections(), 10);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(5));
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(60)));
    }
}
