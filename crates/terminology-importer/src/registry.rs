//! Process registry.
//!
//! Holds the [`Process`] record of every job. Entries expire a fixed time
//! after their last write.

use std::time::Duration;

use moka::sync::Cache;
use parking_lot::Mutex;
use terminology_types::{Process, ProcessStatus};

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Shared, expiring map of process id to [`Process`].
pub struct ProcessRegistry {
    processes: Cache<String, Process>,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl ProcessRegistry {
    /// Creates a registry whose entries live for `retention` after each write.
    pub fn new(retention: Duration) -> Self {
        Self {
            processes: Cache::builder().time_to_live(retention).build(),
            write_lock: Mutex::new(()),
        }
    }

    /// Stores a process, replacing any entry with the same id.
    pub fn insert(&self, process: Process) {
        let _guard = self.write_lock.lock();
        self.processes.insert(process.id.clone(), process);
    }

    /// Returns a snapshot of a process.
    pub fn get(&self, id: &str) -> Option<Process> {
        self.processes.get(id)
    }

    /// Applies `f` to a process and stores the result.
    ///
    /// Returns the updated process, or `None` if the id is unknown or expired.
    pub fn update<F>(&self, id: &str, f: F) -> Option<Process>
    where
        F: FnOnce(&mut Process),
    {
        let _guard = self.write_lock.lock();
        let mut process = self.processes.get(id)?;
        f(&mut process);
        self.processes.insert(id.to_string(), process.clone());
        Some(process)
    }

    /// Returns true if the job must stop: canceled, finished or expired.
    pub fn is_canceled(&self, id: &str) -> bool {
        self.get(id).map(|p| p.is_canceled()).unwrap_or(true)
    }

    /// Marks an active process as waiting for termination.
    ///
    /// Finished processes are returned unchanged.
    pub fn request_cancel(&self, id: &str) -> Option<Process> {
        self.update(id, |process| {
            if process.status.is_terminal() {
                return;
            }
            process.status = ProcessStatus::WaitingForTermination;
            process.eta = None;
            process.message = Some("Process is scheduled for termination".to_string());
        })
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.processes.run_pending_tasks();
        self.processes.entry_count() as usize
    }

    /// Returns true if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(7 * 24 * 3600))
    }
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("entries", &self.processes.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_update() {
        let registry = ProcessRegistry::default();
        registry.insert(Process::queued("job-1", 10));

        let updated = registry
            .update("job-1", |p| p.status = ProcessStatus::Parsing)
            .unwrap();
        assert_eq!(updated.status, ProcessStatus::Parsing);
        assert_eq!(registry.get("job-1").unwrap().status, ProcessStatus::Parsing);
        assert!(registry.update("missing", |p| p.status = ProcessStatus::Parsing).is_none());
    }

    #[test]
    fn test_unknown_process_counts_as_canceled() {
        let registry = ProcessRegistry::default();
        assert!(registry.is_canceled("missing"));

        registry.insert(Process::queued("job-1", 0));
        assert!(!registry.is_canceled("job-1"));
    }

    #[test]
    fn test_request_cancel() {
        let registry = ProcessRegistry::default();
        let mut process = Process::queued("job-1", 0);
        process.status = ProcessStatus::Uploading;
        process.eta = Some(1_000);
        registry.insert(process);

        let canceled = registry.request_cancel("job-1").unwrap();
        assert_eq!(canceled.status, ProcessStatus::WaitingForTermination);
        assert_eq!(canceled.eta, None);
        assert_eq!(
            canceled.message.as_deref(),
            Some("Process is scheduled for termination")
        );
        assert!(registry.is_canceled("job-1"));
    }

    #[test]
    fn test_request_cancel_leaves_finished_process() {
        let registry = ProcessRegistry::default();
        let mut process = Process::queued("job-1", 0);
        process.status = ProcessStatus::Completed;
        process.message = Some("done".to_string());
        registry.insert(process.clone());

        assert_eq!(registry.request_cancel("job-1"), Some(process));
        assert!(registry.request_cancel("missing").is_none());
    }

    #[test]
    fn test_entries_expire() {
        let registry = ProcessRegistry::new(Duration::from_millis(20));
        registry.insert(Process::queued("job-1", 0));
        assert!(registry.get("job-1").is_some());

        std::thread::sleep(Duration::from_millis(60));
        assert!(registry.get("job-1").is_none());
        assert!(registry.is_canceled("job-1"));
    }
}
