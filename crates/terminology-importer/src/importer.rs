//! Job submission facade.
//!
//! [`Importer`] is what a host talks to: it turns an [`ImportRequest`] into a
//! queued task and a [`Process`] record, and answers status and cancel
//! requests from the registry.

use std::sync::Arc;

use terminology_loader::{MultiLanguageTokenizer, ReleaseType, Tokenize};
use terminology_types::{Process, ProcessStatus};
use uuid::Uuid;

use crate::config::ImporterConfig;
use crate::error::ImportResult;
use crate::registry::{now_millis, ProcessRegistry};
use crate::scheduler::TaskScheduler;
use crate::source::{LocalReleaseSource, ReleaseSource, SnomedEdition};
use crate::store::CodeStore;
use crate::tasks::{ImportTask, LoincImportTask, SnomedImportTask, TaskResources};

/// What to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// A SNOMED CT edition slice.
    Snomed {
        /// Edition to import.
        edition: SnomedEdition,
        /// Snapshot or delta.
        release_type: ReleaseType,
    },
    /// The LOINC table and its linguistic variants.
    Loinc,
}

/// Parameters of a submitted job.
#[derive(Clone)]
pub struct ImportRequest {
    /// What to import.
    pub kind: ImportKind,
    /// Store the codes are reconciled against.
    pub store: Arc<dyn CodeStore>,
    /// Updates per upload chunk; `None` uses the configured default.
    pub chunk_size: Option<usize>,
}

impl std::fmt::Debug for ImportRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportRequest")
            .field("kind", &self.kind)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Queues import jobs and reports on them.
pub struct Importer {
    config: ImporterConfig,
    registry: Arc<ProcessRegistry>,
    scheduler: TaskScheduler,
    source: Arc<dyn ReleaseSource>,
    tokenizer: Arc<dyn Tokenize>,
}

impl Importer {
    /// Creates an importer reading releases below the configured base folder.
    ///
    /// Must be called from within a tokio runtime: the scheduler worker is
    /// spawned immediately.
    pub fn new(config: ImporterConfig) -> Self {
        let source = Arc::new(LocalReleaseSource::new(config.base_folder.clone()));
        Self::with_collaborators(config, source, Arc::new(MultiLanguageTokenizer::new()))
    }

    /// Creates an importer with an explicit release source and tokenizer.
    pub fn with_collaborators(
        config: ImporterConfig,
        source: Arc<dyn ReleaseSource>,
        tokenizer: Arc<dyn Tokenize>,
    ) -> Self {
        let registry = Arc::new(ProcessRegistry::new(config.retention));
        let (scheduler, _worker) = TaskScheduler::start(Arc::clone(&registry));
        Self {
            config,
            registry,
            scheduler,
            source,
            tokenizer,
        }
    }

    /// The process registry.
    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    /// Queues a job and returns its process id.
    pub fn submit(&self, request: ImportRequest) -> ImportResult<String> {
        let id = Uuid::new_v4().to_string();
        let default_chunk = match request.kind {
            ImportKind::Snomed { .. } => self.config.snomed_chunk_size,
            ImportKind::Loinc => self.config.loinc_chunk_size,
        };
        let chunk_size = request.chunk_size.filter(|size| *size > 0).unwrap_or(default_chunk);
        let resources = TaskResources {
            source: Arc::clone(&self.source),
            store: request.store,
            tokenizer: Arc::clone(&self.tokenizer),
            chunk_size,
            page_limit: self.config.page_limit_for(chunk_size),
        };

        let task: Arc<dyn ImportTask> = match request.kind {
            ImportKind::Snomed {
                edition,
                release_type,
            } => Arc::new(SnomedImportTask::new(id.clone(), edition, release_type, resources)),
            ImportKind::Loinc => Arc::new(LoincImportTask::new(id.clone(), resources)),
        };

        self.registry.insert(Process::queued(id.clone(), now_millis()));
        if let Err(err) = self.scheduler.submit(Arc::clone(&task)) {
            self.registry.update(&id, |process| {
                process.status = ProcessStatus::Stopped;
                process.message = Some(err.to_string());
            });
            return Err(err);
        }

        tracing::info!("Queued {} as process {}", task.describe(), id);
        Ok(id)
    }

    /// Returns the current state of a process.
    pub fn status(&self, id: &str) -> Option<Process> {
        self.registry.get(id)
    }

    /// Asks a process to stop at its next checkpoint.
    ///
    /// Returns `None` for an unknown id. A process that already finished is
    /// returned unchanged.
    pub fn request_cancel(&self, id: &str) -> Option<Process> {
        let process = self.registry.request_cancel(id)?;
        if process.status == ProcessStatus::WaitingForTermination {
            tracing::info!("Cancellation requested for process {}", id);
        }
        Some(process)
    }
}

impl std::fmt::Debug for Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("config", &self.config)
            .field("processes", &self.registry.len())
            .finish()
    }
}
