//! Import job state.

/// Lifecycle state of an import job.
///
/// Transitions move forward through the list, except that any active job
/// may move to [`ProcessStatus::WaitingForTermination`] on a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ProcessStatus {
    /// Submitted, waiting for the worker.
    Queued,
    /// Acquiring release files.
    Downloading,
    /// Folding release rows into code updates.
    Parsing,
    /// Reconciling updates against the code store.
    Uploading,
    /// Cancel requested; the worker has not yet observed it.
    WaitingForTermination,
    /// Finished successfully.
    Completed,
    /// Canceled or failed.
    Stopped,
}

impl ProcessStatus {
    /// Returns true for states no job ever leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped)
    }

    /// Returns the wire name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Downloading => "DOWNLOADING",
            Self::Parsing => "PARSING",
            Self::Uploading => "UPLOADING",
            Self::WaitingForTermination => "WAITING_FOR_TERMINATION",
            Self::Completed => "COMPLETED",
            Self::Stopped => "STOPPED",
        }
    }
}

/// One entry of the process registry.
///
/// Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Process {
    /// Job identifier.
    pub id: String,
    /// Current state.
    pub status: ProcessStatus,
    /// Submission time.
    pub queued: i64,
    /// Time the worker picked the job up.
    pub started: Option<i64>,
    /// Time the upload phase began.
    pub upload_started: Option<i64>,
    /// Updates processed so far during upload.
    pub uploaded: Option<u64>,
    /// Updates to process during upload.
    pub total: Option<u64>,
    /// Estimated completion time.
    pub eta: Option<i64>,
    /// Captured error report of a failed job.
    pub stacktrace: Option<String>,
    /// Human-readable progress or failure message.
    pub message: Option<String>,
}

impl Process {
    /// Creates a queued process.
    pub fn queued(id: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            status: ProcessStatus::Queued,
            queued: now,
            started: None,
            upload_started: None,
            uploaded: None,
            total: None,
            eta: None,
            stacktrace: None,
            message: Some("Waiting to start the process".to_string()),
        }
    }

    /// Returns true if the job must not perform further work.
    ///
    /// This covers both terminal states and a pending cancel request.
    pub fn is_canceled(&self) -> bool {
        matches!(
            self.status,
            ProcessStatus::Completed | ProcessStatus::Stopped | ProcessStatus::WaitingForTermination
        )
    }

    /// Records upload progress and recomputes the ETA.
    ///
    /// The ETA extrapolates the average time per processed update since the
    /// upload started over the remaining updates. Nothing changes while
    /// `processed` is zero.
    ///
    /// ```
    /// use terminology_types::Process;
    ///
    /// let mut process = Process::queued("job", 0);
    /// process.upload_started = Some(1_000);
    /// process.update_eta(100, 25, 2_000);
    ///
    /// assert_eq!(process.uploaded, Some(25));
    /// assert_eq!(process.eta, Some(2_000 + 40 * 75));
    /// ```
    pub fn update_eta(&mut self, total: u64, processed: u64, now: i64) {
        if processed == 0 {
            return;
        }
        let started = self.upload_started.unwrap_or(now);
        let per_item = (now - started).max(0) / processed as i64;
        let remaining = total.saturating_sub(processed) as i64;
        self.eta = Some(per_item * remaining + now);
        self.uploaded = Some(processed);
        self.total = Some(total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_process() {
        let process = Process::queued("abc", 42);
        assert_eq!(process.status, ProcessStatus::Queued);
        assert_eq!(process.queued, 42);
        assert!(!process.is_canceled());
    }

    #[test]
    fn test_is_canceled() {
        let mut process = Process::queued("abc", 0);
        for (status, canceled) in [
            (ProcessStatus::Downloading, false),
            (ProcessStatus::Parsing, false),
            (ProcessStatus::Uploading, false),
            (ProcessStatus::WaitingForTermination, true),
            (ProcessStatus::Completed, true),
            (ProcessStatus::Stopped, true),
        ] {
            process.status = status;
            assert_eq!(process.is_canceled(), canceled, "{:?}", status);
        }
    }

    #[test]
    fn test_update_eta_ignores_zero_progress() {
        let mut process = Process::queued("abc", 0);
        process.upload_started = Some(0);
        process.update_eta(10, 0, 500);
        assert_eq!(process.eta, None);
        assert_eq!(process.uploaded, None);
    }

    #[test]
    fn test_update_eta_when_done() {
        let mut process = Process::queued("abc", 0);
        process.upload_started = Some(0);
        process.update_eta(10, 12, 600);
        assert_eq!(process.eta, Some(600));
    }

    #[test]
    fn test_terminal_states() {
        assert!(ProcessStatus::Completed.is_terminal());
        assert!(ProcessStatus::Stopped.is_terminal());
        assert!(!ProcessStatus::WaitingForTermination.is_terminal());
        assert_eq!(ProcessStatus::WaitingForTermination.as_str(), "WAITING_FOR_TERMINATION");
    }
}
