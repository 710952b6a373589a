//! Reconciliation of code updates against the code store.
//!
//! The update map is cut into contiguous chunks. For each chunk the stored
//! records overlapping its key range are fetched, at most one record per code
//! is selected for amendment, and the resulting create and modify batches are
//! written.

use std::collections::HashMap;
use std::sync::Arc;

use terminology_types::{CodeKey, CodeUpdate, CodeUpdateMap, StoredCode};

use crate::context::JobContext;
use crate::error::ImportResult;
use crate::store::{fetch_range, CodeStore, RangeQuery};

/// Outcome of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Records created.
    pub created: usize,
    /// Records amended.
    pub updated: usize,
    /// Unversioned updates with nothing to amend.
    pub skipped: usize,
    /// Ids of every written record, in write order.
    pub written_ids: Vec<String>,
}

impl UploadSummary {
    fn absorb(&mut self, other: UploadSummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.written_ids.extend(other.written_ids);
    }
}

/// Selects the stored record an update amends.
///
/// A versioned update amends the record with the same version, or nothing.
/// An unversioned update amends the record with the greatest version,
/// compared case-insensitively.
pub fn select_existing<'a>(update: &CodeUpdate, candidates: &'a [StoredCode]) -> Option<&'a StoredCode> {
    match update.version.as_deref() {
        Some(version) => candidates
            .iter()
            .find(|c| c.version.as_deref() == Some(version)),
        None => candidates.iter().max_by(|a, b| {
            CodeKey::compare(
                a.version.as_deref().unwrap_or_default(),
                b.version.as_deref().unwrap_or_default(),
            )
        }),
    }
}

/// Builds the record to write for `update`, amending `existing` if given.
///
/// # Example
///
/// ```
/// use terminology_importer::reconcile::make_code_from_update;
/// use terminology_types::CodeUpdate;
///
/// let mut update = CodeUpdate::versioned("1001", "xx", "20210101", false);
/// update.add_synonym("en", "Heart attack");
///
/// let code = make_code_from_update(&update, "SNOMED", None);
/// assert_eq!(code.id, "SNOMED|1001|20210101");
/// assert_eq!(code.label["en"], "Heart attack");
/// ```
pub fn make_code_from_update(
    update: &CodeUpdate,
    code_type: &str,
    existing: Option<&StoredCode>,
) -> StoredCode {
    let mut code = match existing {
        Some(existing) => existing.clone(),
        None => StoredCode::new(code_type, &update.code, None),
    };

    for (relation, targets) in &update.relations_add {
        code.qualified_links
            .entry(relation.clone())
            .or_default()
            .extend(targets.iter().cloned());
    }
    for (relation, targets) in &update.relations_remove {
        if let Some(links) = code.qualified_links.get_mut(relation) {
            for target in targets {
                links.remove(target);
            }
        }
    }
    code.qualified_links.retain(|_, links| !links.is_empty());

    for (language, description) in &update.description {
        if !description.trim().is_empty() {
            code.label.insert(language.clone(), description.clone());
        }
    }
    for (language, synonyms) in &update.synonyms {
        let described = update
            .description
            .get(language)
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false);
        if let (false, Some(first)) = (described, synonyms.first()) {
            code.label.insert(language.clone(), first.clone());
        }
    }

    code.regions.extend(update.regions.iter().cloned());
    for (language, terms) in &update.search_terms {
        code.search_terms
            .entry(language.clone())
            .or_default()
            .extend(terms.iter().cloned());
    }

    if let Some(disabled) = update.disabled {
        code.disabled = disabled;
    }
    if update.version.is_some() {
        code.version = update.version.clone();
    }
    code.code_type = code_type.to_string();
    code.id = StoredCode::compose_id(code_type, &code.code, code.version.as_deref());
    code
}

/// Writes code updates to a [`CodeStore`] chunk by chunk.
pub struct BatchUploader {
    store: Arc<dyn CodeStore>,
    code_type: String,
    chunk_size: usize,
    page_limit: usize,
}

impl BatchUploader {
    /// Creates an uploader for codes of `code_type`.
    ///
    /// Range queries use pages of `chunk_size` rows unless
    /// [`with_page_limit`](Self::with_page_limit) says otherwise.
    pub fn new(store: Arc<dyn CodeStore>, code_type: impl Into<String>, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            store,
            code_type: code_type.into(),
            chunk_size,
            page_limit: chunk_size,
        }
    }

    /// Sets the page size of range queries.
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    /// Uploads every update, checking for cancellation before each chunk.
    pub async fn upload(&self, codes: &CodeUpdateMap, ctx: &JobContext) -> ImportResult<UploadSummary> {
        let updates: Vec<&CodeUpdate> = codes.values().collect();
        let total = updates.len() as u64;
        let mut summary = UploadSummary::default();
        let mut processed = 0u64;

        ctx.start_upload(total)?;

        for (index, chunk) in updates.chunks(self.chunk_size).enumerate() {
            ctx.ensure_active()?;

            let chunk_summary = self.upload_chunk(chunk).await?;
            tracing::debug!(
                "Chunk {}: {} created, {} updated, {} skipped",
                index,
                chunk_summary.created,
                chunk_summary.updated,
                chunk_summary.skipped
            );
            summary.absorb(chunk_summary);

            processed += chunk.len() as u64;
            ctx.report_progress(total, processed)?;
        }

        tracing::info!(
            "Uploaded {} codes: {} created, {} updated, {} skipped",
            self.code_type,
            summary.created,
            summary.updated,
            summary.skipped
        );
        Ok(summary)
    }

    async fn upload_chunk(&self, chunk: &[&CodeUpdate]) -> ImportResult<UploadSummary> {
        let mut summary = UploadSummary::default();
        let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
            return Ok(summary);
        };

        let query = RangeQuery::new(
            self.code_type.as_str(),
            (first.code.as_str(), first.version.as_deref()),
            (last.code.as_str(), last.version.as_deref()),
        );
        let existing = self.group_by_code(fetch_range(self.store.as_ref(), &query, self.page_limit).await?);

        let mut create_batch = Vec::new();
        let mut update_batch = Vec::new();
        for update in chunk {
            let candidates = existing
                .get(&update.code.to_lowercase())
                .map(Vec::as_slice)
                .unwrap_or_default();

            match select_existing(update, candidates) {
                Some(found) => update_batch.push(make_code_from_update(update, &self.code_type, Some(found))),
                None if update.version.is_some() => {
                    create_batch.push(make_code_from_update(update, &self.code_type, None))
                }
                None => summary.skipped += 1,
            }
        }

        if !create_batch.is_empty() {
            let written = self.store.create_batch(create_batch).await?;
            summary.created = written.len();
            summary.written_ids.extend(written.into_iter().map(|w| w.id));
        }
        if !update_batch.is_empty() {
            let written = self.store.modify_batch(update_batch).await?;
            summary.updated = written.len();
            summary.written_ids.extend(written.into_iter().map(|w| w.id));
        }

        Ok(summary)
    }

    /// Groups stored records of this uploader's type by lower-cased code.
    fn group_by_code(&self, rows: Vec<StoredCode>) -> HashMap<String, Vec<StoredCode>> {
        let mut groups: HashMap<String, Vec<StoredCode>> = HashMap::new();
        for row in rows.into_iter().filter(|r| r.code_type == self.code_type) {
            groups.entry(row.code.to_lowercase()).or_default().push(row);
        }
        groups
    }
}

impl std::fmt::Debug for BatchUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchUploader")
            .field("code_type", &self.code_type)
            .field("chunk_size", &self.chunk_size)
            .field("page_limit", &self.page_limit)
            .finish()
    }
}
