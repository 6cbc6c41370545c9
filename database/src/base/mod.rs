mod chain_indexer;
pub(crate) use crate::base::chain_indexer::{check_masterchain_link, unique_blocks};
pub use crate::base::chain_indexer::ChainIndexerDbManager;
mod contract_indexer;
pub use crate::base::contract_indexer::ContractIndexerDbManager;
mod reader;
pub use crate::base::reader::ReaderDbManager;

use serde::Deserialize;

/// Ordering of paginated results by their natural key (lt, gen_utime, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
    pub sort: SortOrder,
}

impl Pagination {
    pub fn new(limit: u32, offset: u32, sort: SortOrder) -> Self {
        Self {
            limit,
            offset,
            sort,
        }
    }

    /// Orders rows already sorted ascending and cuts the requested page
    pub(crate) fn apply<T>(&self, mut rows: Vec<T>) -> Vec<T> {
        if self.sort == SortOrder::Desc {
            rows.reverse();
        }
        self.window(rows)
    }

    pub(crate) fn window<T>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        rows.into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            sort: SortOrder::Desc,
        }
    }
}

#[async_trait::async_trait]
pub trait BaseDbManager {
    async fn new(config: &configuration::DatabaseConfig) -> crate::DbResult<Box<Self>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_to_newest_twenty() {
        let pagination = Pagination::default();
        assert_eq!(pagination.limit, 20);
        assert_eq!(pagination.offset, 0);
        assert_eq!(pagination.sort, SortOrder::Desc);
    }

    #[test]
    fn pagination_is_deserialized_with_defaults() {
        let pagination: Pagination = serde_json::from_str(r#"{"sort": "asc", "limit": 5}"#).unwrap();
        assert_eq!(pagination, Pagination::new(5, 0, SortOrder::Asc));
    }

    #[test]
    fn window_is_applied_after_sorting() {
        let rows: Vec<u32> = (1..=10).collect();
        assert_eq!(Pagination::new(3, 1, SortOrder::Desc).apply(rows.clone()), vec![9, 8, 7]);
        assert_eq!(Pagination::new(3, 8, SortOrder::Asc).apply(rows), vec![9, 10]);
    }
}
