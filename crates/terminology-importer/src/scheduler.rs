//! Single-worker FIFO task scheduler.
//!
//! Tasks are queued on an unbounded channel and run one at a time by a
//! background worker. The worker owns the terminal transitions of every
//! process: COMPLETED on success, STOPPED on cancellation or failure. A
//! failing task never stops the queue.

use std::sync::Arc;

use terminology_types::ProcessStatus;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::context::JobContext;
use crate::error::{render_chain, ImportError, ImportResult};
use crate::reconcile::UploadSummary;
use crate::registry::ProcessRegistry;
use crate::tasks::ImportTask;

/// Handle for queueing tasks on the worker.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    sender: mpsc::UnboundedSender<Arc<dyn ImportTask>>,
}

impl TaskScheduler {
    /// Spawns the worker on the current tokio runtime.
    ///
    /// The worker runs until every scheduler handle is dropped and the queue
    /// is drained.
    pub fn start(registry: Arc<ProcessRegistry>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(receiver, registry));
        (Self { sender }, worker)
    }

    /// Queues a task. Never blocks.
    pub fn submit(&self, task: Arc<dyn ImportTask>) -> ImportResult<()> {
        self.sender.send(task).map_err(|_| ImportError::SchedulerClosed)
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<Arc<dyn ImportTask>>, registry: Arc<ProcessRegistry>) {
    tracing::info!("Task scheduler started");
    while let Some(task) = receiver.recv().await {
        run_task(&registry, task).await;
    }
    tracing::info!("Task scheduler stopped");
}

/// Runs one task to its terminal state.
pub async fn run_task(registry: &Arc<ProcessRegistry>, task: Arc<dyn ImportTask>) {
    let process_id = task.process_id().to_string();
    if registry.is_canceled(&process_id) {
        tracing::info!("Skipping {} ({}): canceled before start", task.describe(), process_id);
        record_outcome(registry, &process_id, Err(ImportError::Cancelled));
        return;
    }

    tracing::info!("Starting {} ({})", task.describe(), process_id);
    let ctx = JobContext::new(process_id.clone(), Arc::clone(registry));
    let running = Arc::clone(&task);
    let outcome = match tokio::spawn(async move { running.execute(&ctx).await }).await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(ImportError::Worker(join_error)),
    };
    record_outcome(registry, &process_id, outcome);
}

fn record_outcome(registry: &ProcessRegistry, process_id: &str, outcome: ImportResult<UploadSummary>) {
    match outcome {
        Ok(summary) => {
            tracing::info!(
                "Process {} completed: {} created, {} updated, {} skipped",
                process_id,
                summary.created,
                summary.updated,
                summary.skipped
            );
            registry.update(process_id, |process| {
                process.status = ProcessStatus::Completed;
                process.eta = None;
                process.message = Some(format!(
                    "Import completed: {} codes created, {} updated, {} skipped",
                    summary.created, summary.updated, summary.skipped
                ));
            });
        }
        Err(ImportError::Cancelled) => {
            tracing::info!("Process {} stopped on user request", process_id);
            registry.update(process_id, |process| {
                process.status = ProcessStatus::Stopped;
                process.eta = None;
                process.stacktrace = None;
                process.message = Some(ImportError::Cancelled.to_string());
            });
        }
        Err(err) => {
            tracing::warn!("Process {} failed: {}", process_id, err);
            let stacktrace = render_chain(&err);
            registry.update(process_id, |process| {
                process.status = ProcessStatus::Stopped;
                process.eta = None;
                process.stacktrace = Some(stacktrace);
                process.message = Some(err.to_string());
            });
        }
    }
}
