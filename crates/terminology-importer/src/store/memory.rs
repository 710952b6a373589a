//! In-memory code store.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;
use terminology_types::{CodeKey, StoredCode, WrittenCode};

use super::{CodeStore, RangeQuery};
use crate::error::{StoreError, StoreResult};

/// Code store kept in process memory.
///
/// Keys order by type, then code and version compared case-insensitively.
/// Created records get revision `1`; every modification must echo the current
/// revision and increments it.
#[derive(Debug, Default)]
pub struct InMemoryCodeStore {
    codes: RwLock<HashMap<String, StoredCode>>,
    create_calls: AtomicUsize,
    modify_calls: AtomicUsize,
}

impl InMemoryCodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stored record by id.
    pub fn get(&self, id: &str) -> Option<StoredCode> {
        self.codes.read().get(id).cloned()
    }

    /// Returns every record in key order.
    pub fn all(&self) -> Vec<StoredCode> {
        let mut codes: Vec<StoredCode> = self.codes.read().values().cloned().collect();
        codes.sort_by(compare_records);
        codes
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.codes.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of create batches received.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(AtomicOrdering::Relaxed)
    }

    /// Number of modify batches received.
    pub fn modify_calls(&self) -> usize {
        self.modify_calls.load(AtomicOrdering::Relaxed)
    }
}

fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
    CodeKey::compare(a.unwrap_or_default(), b.unwrap_or_default())
}

fn compare_records(a: &StoredCode, b: &StoredCode) -> Ordering {
    a.code_type
        .cmp(&b.code_type)
        .then_with(|| CodeKey::compare(&a.code, &b.code))
        .then_with(|| compare_versions(a.version.as_deref(), b.version.as_deref()))
}

fn after_start(code: &StoredCode, query: &RangeQuery) -> bool {
    match CodeKey::compare(&code.code, &query.start_code) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => match &query.start_version {
            None => true,
            Some(start) => compare_versions(code.version.as_deref(), Some(start)) != Ordering::Less,
        },
    }
}

fn before_end(code: &StoredCode, query: &RangeQuery) -> bool {
    match CodeKey::compare(&code.code, &query.end_code) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => match &query.end_version {
            None => true,
            Some(end) => compare_versions(code.version.as_deref(), Some(end)) != Ordering::Greater,
        },
    }
}

fn next_revision(rev: Option<&str>) -> String {
    let current: u64 = rev.and_then(|r| r.parse().ok()).unwrap_or(0);
    (current + 1).to_string()
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn range_query(&self, query: &RangeQuery, limit: usize) -> StoreResult<Vec<StoredCode>> {
        let mut rows: Vec<StoredCode> = self
            .codes
            .read()
            .values()
            .filter(|c| c.code_type == query.code_type)
            .filter(|c| after_start(c, query) && before_end(c, query))
            .cloned()
            .collect();
        rows.sort_by(compare_records);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn get_by_ids(&self, ids: &[String]) -> StoreResult<Vec<StoredCode>> {
        let codes = self.codes.read();
        Ok(ids.iter().filter_map(|id| codes.get(id).cloned()).collect())
    }

    async fn create_batch(&self, batch: Vec<StoredCode>) -> StoreResult<Vec<WrittenCode>> {
        self.create_calls.fetch_add(1, AtomicOrdering::Relaxed);
        let mut codes = self.codes.write();

        if let Some(existing) = batch.iter().find(|c| codes.contains_key(&c.id)) {
            return Err(StoreError::Conflict {
                id: existing.id.clone(),
            });
        }

        let mut written = Vec::with_capacity(batch.len());
        for mut code in batch {
            code.rev = Some(next_revision(None));
            written.push(WrittenCode { id: code.id.clone() });
            codes.insert(code.id.clone(), code);
        }
        Ok(written)
    }

    async fn modify_batch(&self, batch: Vec<StoredCode>) -> StoreResult<Vec<WrittenCode>> {
        self.modify_calls.fetch_add(1, AtomicOrdering::Relaxed);
        let mut codes = self.codes.write();

        for code in &batch {
            match codes.get(&code.id) {
                None => {
                    return Err(StoreError::NotFound {
                        id: code.id.clone(),
                    })
                }
                Some(current) if current.rev != code.rev => {
                    return Err(StoreError::Conflict {
                        id: code.id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        let mut written = Vec::with_capacity(batch.len());
        for mut code in batch {
            code.rev = Some(next_revision(code.rev.as_deref()));
            written.push(WrittenCode { id: code.id.clone() });
            codes.insert(code.id.clone(), code);
        }
        Ok(written)
    }
}
