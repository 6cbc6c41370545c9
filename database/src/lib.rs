#[macro_use]
extern crate lazy_static;

mod base;
mod errors;
mod metrics;
mod retry;
pub mod schema;

pub mod mockdb;
pub mod postgres;

pub use crate::base::{
    BaseDbManager, ChainIndexerDbManager, ContractIndexerDbManager, Pagination, ReaderDbManager,
    SortOrder,
};
pub use crate::errors::{DbError, DbResult};
pub use crate::mockdb::MockDBManager;
pub use crate::postgres::PostgresDBManager;
pub use crate::retry::RetryPolicy;

pub(crate) const DATABASE: &str = "database";

pub async fn prepare_db_manager<T>(config: &configuration::DatabaseConfig) -> anyhow::Result<T>
where
    T: BaseDbManager + Send + Sync + 'static,
{
    Ok(*T::new(config).await?)
}
