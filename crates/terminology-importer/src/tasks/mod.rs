//! Import tasks run by the scheduler.
//!
//! A task walks its job through DOWNLOADING, PARSING and UPLOADING. The
//! scheduler owns the terminal transitions.

mod loinc;
mod snomed;

use std::sync::Arc;

use async_trait::async_trait;
use terminology_loader::Tokenize;

use crate::context::JobContext;
use crate::error::ImportResult;
use crate::reconcile::UploadSummary;
use crate::source::ReleaseSource;
use crate::store::CodeStore;

pub use loinc::LoincImportTask;
pub use snomed::SnomedImportTask;

/// Unit of work queued on the [`TaskScheduler`](crate::scheduler::TaskScheduler).
#[async_trait]
pub trait ImportTask: Send + Sync {
    /// Id of the process tracking this task.
    fn process_id(&self) -> &str;

    /// Short human-readable name used in logs.
    fn describe(&self) -> String;

    /// Runs the task to the end of its upload.
    async fn execute(&self, ctx: &JobContext) -> ImportResult<UploadSummary>;
}

/// Collaborators shared by every task of a job.
#[derive(Clone)]
pub struct TaskResources {
    /// Where release files come from.
    pub source: Arc<dyn ReleaseSource>,
    /// Where reconciled codes go.
    pub store: Arc<dyn CodeStore>,
    /// Search-term tokenizer.
    pub tokenizer: Arc<dyn Tokenize>,
    /// Updates per upload chunk.
    pub chunk_size: usize,
    /// Rows per range-query page.
    pub page_limit: usize,
}

impl std::fmt::Debug for TaskResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskResources")
            .field("chunk_size", &self.chunk_size)
            .field("page_limit", &self.page_limit)
            .finish()
    }
}
