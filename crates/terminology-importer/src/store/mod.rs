//! Remote code store clients.
//!
//! [`CodeStore`] is the contract the reconciler talks to. Two clients are
//! provided: [`HttpCodeStore`] for a live store and [`InMemoryCodeStore`] for
//! tests and dry runs.

mod http;
mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use terminology_types::{StoredCode, WrittenCode};

use crate::error::StoreResult;

pub use http::HttpCodeStore;
pub use memory::InMemoryCodeStore;

/// Inclusive `(type, code, version)` interval.
///
/// A `None` start version starts at the lowest version of `start_code`; a
/// `None` end version ends at the highest version of `end_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    /// Code type on both bounds.
    pub code_type: String,
    /// First code of the interval.
    pub start_code: String,
    /// Version of the first code.
    pub start_version: Option<String>,
    /// Last code of the interval.
    pub end_code: String,
    /// Version of the last code.
    pub end_version: Option<String>,
}

impl RangeQuery {
    /// Creates a query over `[start, end]`.
    pub fn new(
        code_type: impl Into<String>,
        start: (&str, Option<&str>),
        end: (&str, Option<&str>),
    ) -> Self {
        Self {
            code_type: code_type.into(),
            start_code: start.0.to_string(),
            start_version: start.1.map(str::to_string),
            end_code: end.0.to_string(),
            end_version: end.1.map(str::to_string),
        }
    }

    /// Returns the same query starting from another key.
    pub fn resume_from(&self, code: &str, version: Option<&str>) -> Self {
        Self {
            start_code: code.to_string(),
            start_version: version.map(str::to_string),
            ..self.clone()
        }
    }
}

/// Versioned code store.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Returns up to `limit` stored codes inside `query`, in key order.
    async fn range_query(&self, query: &RangeQuery, limit: usize) -> StoreResult<Vec<StoredCode>>;

    /// Returns the stored codes with the given ids; unknown ids are omitted.
    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<StoredCode>>;

    /// Creates new codes.
    async fn create_batch(&self, codes: Vec<StoredCode>) -> StoreResult<Vec<WrittenCode>>;

    /// Modifies existing codes.
    async fn modify_batch(&self, codes: Vec<StoredCode>) -> StoreResult<Vec<WrittenCode>>;
}

/// Scans a whole range with successive pages of `limit` rows.
///
/// Each page restarts at the key of the previous page's last row, inclusive,
/// so resumed pages ask for one extra row. Rows are de-duplicated by id. The
/// scan ends on a short page, or on a page that brings no new rows.
pub async fn fetch_range(
    store: &dyn CodeStore,
    query: &RangeQuery,
    limit: usize,
) -> StoreResult<Vec<StoredCode>> {
    let limit = limit.max(1);
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    let mut current = query.clone();
    let mut page_limit = limit;

    loop {
        let page = store.range_query(&current, page_limit).await?;
        let page_len = page.len();
        let next = page
            .last()
            .map(|last| current.resume_from(&last.code, last.version.as_deref()));

        let before = rows.len();
        for code in page {
            if seen.insert(code.id.clone()) {
                rows.push(code);
            }
        }

        match next {
            Some(next) if page_len >= page_limit && rows.len() > before => {
                current = next;
                page_limit = limit + 1;
            }
            _ => return Ok(rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(code: &str, version: &str) -> StoredCode {
        StoredCode::new("SNOMED", code, Some(version.to_string()))
    }

    async fn seeded() -> InMemoryCodeStore {
        let store = InMemoryCodeStore::new();
        store
            .create_batch(vec![
                stored("100", "1"),
                stored("100", "2"),
                stored("200", "1"),
                stored("300", "1"),
                stored("400", "1"),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_fetch_range_pages_through() {
        let store = seeded().await;
        let query = RangeQuery::new("SNOMED", ("100", None), ("300", None));

        for limit in [1, 2, 3, 10] {
            let rows = fetch_range(&store, &query, limit).await.unwrap();
            let ids: Vec<&str> = rows.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(
                ids,
                vec!["SNOMED|100|1", "SNOMED|100|2", "SNOMED|200|1", "SNOMED|300|1"],
                "limit {}",
                limit
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_range_empty() {
        let store = seeded().await;
        let query = RangeQuery::new("LOINC", ("100", None), ("300", None));
        assert!(fetch_range(&store, &query, 5).await.unwrap().is_empty());
    }

    #[test]
    fn test_resume_from() {
        let query = RangeQuery::new("SNOMED", ("1", Some("a")), ("9", None));
        let next = query.resume_from("5", Some("b"));
        assert_eq!(next.start_code, "5");
        assert_eq!(next.start_version.as_deref(), Some("b"));
        assert_eq!(next.end_code, "9");
        assert_eq!(next.end_version, None);
    }
}
