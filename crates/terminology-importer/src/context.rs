//! Per-job handle on the process registry.

use std::sync::Arc;

use terminology_loader::CancellationCheck;
use terminology_types::{Process, ProcessStatus};

use crate::error::{ImportError, ImportResult};
use crate::registry::{now_millis, ProcessRegistry};

/// Identifies a running job and gives it access to its [`Process`] record.
#[derive(Debug, Clone)]
pub struct JobContext {
    process_id: String,
    registry: Arc<ProcessRegistry>,
}

impl JobContext {
    /// Creates a context for `process_id`.
    pub fn new(process_id: impl Into<String>, registry: Arc<ProcessRegistry>) -> Self {
        Self {
            process_id: process_id.into(),
            registry,
        }
    }

    /// The job's process id.
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// The registry holding the job's process.
    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    /// Returns a snapshot of the job's process.
    pub fn process(&self) -> Option<Process> {
        self.registry.get(&self.process_id)
    }

    /// Fails with [`ImportError::Cancelled`] once the job must stop.
    pub fn ensure_active(&self) -> ImportResult<()> {
        if self.registry.is_canceled(&self.process_id) {
            Err(ImportError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Moves the job to `status` with a progress message.
    ///
    /// A job that was canceled in the meantime is left untouched and
    /// [`ImportError::Cancelled`] is returned instead.
    pub fn transition(&self, status: ProcessStatus, message: &str) -> ImportResult<()> {
        self.guarded_update(|process| {
            process.status = status;
            process.message = Some(message.to_string());
        })
    }

    /// Marks the job as picked up by the worker.
    pub fn start(&self, message: &str) -> ImportResult<()> {
        let now = now_millis();
        self.guarded_update(|process| {
            process.status = ProcessStatus::Downloading;
            process.started = Some(now);
            process.message = Some(message.to_string());
        })
    }

    /// Enters the upload phase for `total` updates.
    pub fn start_upload(&self, total: u64) -> ImportResult<()> {
        let now = now_millis();
        self.guarded_update(|process| {
            process.status = ProcessStatus::Uploading;
            process.upload_started = Some(now);
            process.uploaded = Some(0);
            process.total = Some(total);
            process.message = Some(format!("Uploading {} codes", total));
        })
    }

    /// Records `processed` of `total` updates as done and refreshes the ETA.
    pub fn report_progress(&self, total: u64, processed: u64) -> ImportResult<()> {
        let now = now_millis();
        self.guarded_update(|process| process.update_eta(total, processed, now))
    }

    fn guarded_update<F>(&self, f: F) -> ImportResult<()>
    where
        F: FnOnce(&mut Process),
    {
        let mut canceled = true;
        self.registry.update(&self.process_id, |process| {
            if !process.is_canceled() {
                canceled = false;
                f(process);
            }
        });
        if canceled {
            Err(ImportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl CancellationCheck for JobContext {
    fn is_cancelled(&self) -> bool {
        self.registry.is_canceled(&self.process_id)
    }
}
