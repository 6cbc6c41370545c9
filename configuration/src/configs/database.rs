use std::time::Duration;

use serde_derive::Deserialize;

use crate::configs::{deserialize_optional_data_or_env, required_value};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub database_user: Option<String>,
    pub database_password: Option<String>,
    /// Overrides the database name of `database_url`
    pub database_name: Option<String>,
    /// Read-only processes never create the database nor run migrations
    pub read_only: bool,
    pub pool: PoolConfig,
    pub bootstrap: BootstrapConfig,
    pub write: WriteConfig,
}

/// Connection pool limits.
///
/// The pool keeps up to `pool_size` connections around and may open
/// `max_overflow` more under load. Overflow connections are closed after
/// `idle_timeout` seconds of inactivity. Acquiring a connection waits at most
/// `pool_timeout` seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub pool_size: u32,
    pub max_overflow: u32,
    pub pool_timeout: u64,
    pub idle_timeout: u64,
}

impl PoolConfig {
    pub fn default_pool_size() -> u32 {
        128
    }

    pub fn default_max_overflow() -> u32 {
        24
    }

    pub fn default_pool_timeout() -> u64 {
        128
    }

    pub fn default_idle_timeout() -> u64 {
        600
    }

    /// Hard cap of open connections
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: Self::default_pool_size(),
            max_overflow: Self::default_max_overflow(),
            pool_timeout: Self::default_pool_timeout(),
            idle_timeout: Self::default_idle_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Create the database and apply migrations when it does not exist yet.
    /// Otherwise wait for another process to do it.
    pub create_database: bool,
    pub poll_interval_ms: u64,
}

impl BootstrapConfig {
    pub fn default_create_database() -> bool {
        false
    }

    pub fn default_poll_interval_ms() -> u64 {
        500
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            create_database: Self::default_create_database(),
            poll_interval_ms: Self::default_poll_interval_ms(),
        }
    }
}

/// Retry budget for writes whose referenced rows are not committed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteConfig {
    pub max_retry: u8,
    pub retry_base_delay_ms: u64,
}

impl WriteConfig {
    pub fn default_max_retry() -> u8 {
        5
    }

    pub fn default_retry_base_delay_ms() -> u64 {
        100
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            max_retry: Self::default_max_retry(),
            retry_base_delay_ms: Self::default_retry_base_delay_ms(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommonDatabaseConfig {
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub database_url: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub database_user: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub database_password: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub database_name: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub read_only: Option<bool>,
    #[serde(default)]
    pub pool: CommonPoolConfig,
    #[serde(default)]
    pub bootstrap: CommonBootstrapConfig,
    #[serde(default)]
    pub write: CommonWriteConfig,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommonPoolConfig {
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub pool_size: Option<u32>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub max_overflow: Option<u32>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub pool_timeout: Option<u64>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub idle_timeout: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommonBootstrapConfig {
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub create_database: Option<bool>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommonWriteConfig {
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub max_retry: Option<u8>,
    #[serde(deserialize_with = "deserialize_optional_data_or_env", default)]
    pub retry_base_delay_ms: Option<u64>,
}

impl From<CommonPoolConfig> for PoolConfig {
    fn from(common_config: CommonPoolConfig) -> Self {
        Self {
            pool_size: common_config
                .pool_size
                .unwrap_or_else(PoolConfig::default_pool_size),
            max_overflow: common_config
                .max_overflow
                .unwrap_or_else(PoolConfig::default_max_overflow),
            pool_timeout: common_config
                .pool_timeout
                .unwrap_or_else(PoolConfig::default_pool_timeout),
            idle_timeout: common_config
                .idle_timeout
                .unwrap_or_else(PoolConfig::default_idle_timeout),
        }
    }
}

impl From<CommonBootstrapConfig> for BootstrapConfig {
    fn from(common_config: CommonBootstrapConfig) -> Self {
        Self {
            create_database: common_config
                .create_database
                .unwrap_or_else(BootstrapConfig::default_create_database),
            poll_interval_ms: common_config
                .poll_interval_ms
                .unwrap_or_else(BootstrapConfig::default_poll_interval_ms),
        }
    }
}

impl From<CommonWriteConfig> for WriteConfig {
    fn from(common_config: CommonWriteConfig) -> Self {
        Self {
            max_retry: common_config
                .max_retry
                .unwrap_or_else(WriteConfig::default_max_retry),
            retry_base_delay_ms: common_config
                .retry_base_delay_ms
                .unwrap_or_else(WriteConfig::default_retry_base_delay_ms),
        }
    }
}

impl TryFrom<CommonDatabaseConfig> for DatabaseConfig {
    type Error = anyhow::Error;

    fn try_from(common_config: CommonDatabaseConfig) -> anyhow::Result<Self> {
        let pool = PoolConfig::from(common_config.pool);
        if pool.pool_size == 0 {
            anyhow::bail!("`database.pool.pool_size` must be greater than zero");
        }
        Ok(Self {
            database_url: required_value("database_url", common_config.database_url)?,
            database_user: common_config.database_user,
            database_password: common_config.database_password,
            database_name: common_config.database_name,
            read_only: common_config.read_only.unwrap_or_default(),
            pool,
            bootstrap: common_config.bootstrap.into(),
            write: common_config.write.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_defaults_follow_the_indexer_deployment() {
        let pool = PoolConfig::default();
        assert_eq!(pool.max_connections(), 152);
        assert_eq!(pool.acquire_timeout(), Duration::from_secs(128));
    }

    #[test]
    fn literal_values_are_parsed() {
        let common: CommonDatabaseConfig = toml::from_str(
            r#"
            database_url = "postgres://localhost/ton_index"
            read_only = true

            [pool]
            pool_size = 8
            max_overflow = 2
            pool_timeout = 5

            [bootstrap]
            create_database = true
            "#,
        )
        .unwrap();
        let config = DatabaseConfig::try_from(common).unwrap();
        assert_eq!(config.database_url, "postgres://localhost/ton_index");
        assert!(config.read_only);
        assert_eq!(config.pool.max_connections(), 10);
        assert_eq!(config.pool.idle_timeout, PoolConfig::default_idle_timeout());
        assert!(config.bootstrap.create_database);
        assert_eq!(config.bootstrap.poll_interval_ms, 500);
        assert_eq!(config.write, WriteConfig::default());
    }

    #[test]
    fn placeholders_are_resolved_from_env() {
        std::env::set_var("LEDGER_TEST_DATABASE_URL", "postgres://db/ledger");
        std::env::set_var("LEDGER_TEST_POOL_SIZE", "16");
        let common: CommonDatabaseConfig = toml::from_str(
            r#"
            database_url = "${LEDGER_TEST_DATABASE_URL}"
            database_password = "${LEDGER_TEST_MISSING_PASSWORD}"

            [pool]
            pool_size = "${LEDGER_TEST_POOL_SIZE}"
            "#,
        )
        .unwrap();
        let config = DatabaseConfig::try_from(common).unwrap();
        assert_eq!(config.database_url, "postgres://db/ledger");
        assert_eq!(config.database_password, None);
        assert_eq!(config.pool.pool_size, 16);
    }

    #[test]
    fn database_url_is_required() {
        let common: CommonDatabaseConfig = toml::from_str("read_only = false").unwrap();
        assert!(DatabaseConfig::try_from(common).is_err());
    }

    #[test]
    fn empty_pool_is_rejected() {
        let common: CommonDatabaseConfig = toml::from_str(
            r#"
            database_url = "postgres://localhost/ton_index"
            [pool]
            pool_size = 0
            "#,
        )
        .unwrap();
        assert!(DatabaseConfig::try_from(common).is_err());
    }
}
