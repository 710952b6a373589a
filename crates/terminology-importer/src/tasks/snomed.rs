//! SNOMED CT import task.

use std::sync::Arc;

use async_trait::async_trait;
use terminology_loader::{ReleaseType, SnomedReleaseParser};
use terminology_types::{well_known, ProcessStatus};

use super::{ImportTask, TaskResources};
use crate::context::JobContext;
use crate::error::ImportResult;
use crate::reconcile::{BatchUploader, UploadSummary};
use crate::source::SnomedEdition;

/// Imports one slice of a SNOMED CT edition.
#[derive(Debug)]
pub struct SnomedImportTask {
    process_id: String,
    edition: SnomedEdition,
    release_type: ReleaseType,
    resources: TaskResources,
}

impl SnomedImportTask {
    /// Creates a task for `process_id`.
    pub fn new(
        process_id: impl Into<String>,
        edition: SnomedEdition,
        release_type: ReleaseType,
        resources: TaskResources,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            edition,
            release_type,
            resources,
        }
    }
}

#[async_trait]
impl ImportTask for SnomedImportTask {
    fn process_id(&self) -> &str {
        &self.process_id
    }

    fn describe(&self) -> String {
        format!(
            "SNOMED CT {} {} import",
            self.edition,
            self.release_type.folder_name()
        )
    }

    async fn execute(&self, ctx: &JobContext) -> ImportResult<UploadSummary> {
        ctx.start("Downloading codification files")?;
        let files = self
            .resources
            .source
            .snomed_release(self.edition, self.release_type)
            .await?;
        tracing::info!(
            "Found {} release {} for region {}",
            self.describe(),
            files.release_date.as_deref().unwrap_or("(undated)"),
            files.region
        );

        ctx.transition(ProcessStatus::Parsing, "Parsing codification files")?;
        let tokenizer = Arc::clone(&self.resources.tokenizer);
        let cancel = ctx.clone();
        let (codes, stats) = tokio::task::spawn_blocking(move || {
            SnomedReleaseParser::new(files.region.clone(), tokenizer.as_ref(), &cancel).parse_files(&files)
        })
        .await??;
        tracing::info!(
            "Parsed {} rows into {} codes ({} bare, {} inactive descriptions skipped) in {} ms",
            stats.rows_read,
            codes.len(),
            stats.bare_codes,
            stats.inactive_skipped,
            stats.parse_time_ms
        );

        BatchUploader::new(
            Arc::clone(&self.resources.store),
            well_known::SNOMED_CODE_TYPE,
            self.resources.chunk_size,
        )
        .with_page_limit(self.resources.page_limit)
        .upload(&codes, ctx)
        .await
    }
}
