//! LOINC import task.

use std::sync::Arc;

use async_trait::async_trait;
use terminology_loader::LoincReleaseParser;
use terminology_types::{well_known, ProcessStatus};

use super::{ImportTask, TaskResources};
use crate::context::JobContext;
use crate::error::ImportResult;
use crate::reconcile::{BatchUploader, UploadSummary};

/// Imports the LOINC table and its linguistic variants.
#[derive(Debug)]
pub struct LoincImportTask {
    process_id: String,
    resources: TaskResources,
}

impl LoincImportTask {
    /// Creates a task for `process_id`.
    pub fn new(process_id: impl Into<String>, resources: TaskResources) -> Self {
        Self {
            process_id: process_id.into(),
            resources,
        }
    }
}

#[async_trait]
impl ImportTask for LoincImportTask {
    fn process_id(&self) -> &str {
        &self.process_id
    }

    fn describe(&self) -> String {
        "LOINC import".to_string()
    }

    async fn execute(&self, ctx: &JobContext) -> ImportResult<UploadSummary> {
        ctx.start("Downloading codification files")?;
        let files = self.resources.source.loinc_release().await?;
        tracing::info!(
            "Found LOINC table {} with {} linguistic variants",
            files.table_file.display(),
            files.variant_files.len()
        );

        ctx.transition(ProcessStatus::Parsing, "Parsing codification files")?;
        let tokenizer = Arc::clone(&self.resources.tokenizer);
        let cancel = ctx.clone();
        let (codes, stats) = tokio::task::spawn_blocking(move || {
            LoincReleaseParser::new(tokenizer.as_ref(), &cancel).parse_files(&files)
        })
        .await??;
        tracing::info!(
            "Parsed {} rows into {} codes ({} variant rows ignored) in {} ms",
            stats.rows_read,
            codes.len(),
            stats.variants_ignored,
            stats.parse_time_ms
        );

        BatchUploader::new(
            Arc::clone(&self.resources.store),
            well_known::LOINC_CODE_TYPE,
            self.resources.chunk_size,
        )
        .with_page_limit(self.resources.page_limit)
        .upload(&codes, ctx)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProcessRegistry;
    use crate::source::LocalReleaseSource;
    use crate::store::InMemoryCodeStore;
    use crate::tasks::testing::{write_loinc_release, WhitespaceTokenizer};
    use terminology_types::Process;

    #[tokio::test]
    async fn test_loinc_import_uploads_table() {
        let dir = tempfile::tempdir().unwrap();
        write_loinc_release(dir.path());

        let store = Arc::new(InMemoryCodeStore::new());
        let registry = Arc::new(ProcessRegistry::default());
        registry.insert(Process::queued("job-1", 0));
        let ctx = JobContext::new("job-1", registry);

        let task = LoincImportTask::new(
            "job-1",
            TaskResources {
                source: Arc::new(LocalReleaseSource::new(dir.path())),
                store: store.clone(),
                tokenizer: Arc::new(WhitespaceTokenizer),
                chunk_size: 1,
                page_limit: 1,
            },
        );
        let summary = task.execute(&ctx).await.unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(store.create_calls(), 2);

        let active = store.get("LOINC|1-8|2.73").unwrap();
        assert!(!active.disabled);
        assert_eq!(
            active.label.get("en").map(String::as_str),
            Some("Acyclovir:SCnc:Pt:Ser/Plas:Qn")
        );
        assert!(active.search_terms["en"].contains("acyclovir"));

        let deprecated = store.get("LOINC|10-7|2.70").unwrap();
        assert!(deprecated.disabled);
    }
}
