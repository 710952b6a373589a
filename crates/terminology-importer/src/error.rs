//! Error types for the import pipeline.

use terminology_loader::Rf2Error;
use thiserror::Error;

/// Errors raised by a [`CodeStore`](crate::store::CodeStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport failure talking to the remote store.
    #[error("Code store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store answered with a non-success status.
    #[error("Code store returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// A created code already exists, or a modified code has a stale revision.
    #[error("Conflict writing code {id}")]
    Conflict {
        /// Code identifier.
        id: String,
    },

    /// A modified code does not exist.
    #[error("Code not found: {id}")]
    NotFound {
        /// Code identifier.
        id: String,
    },
}

/// Result type for code store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that end an import job.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The job was canceled by a user request.
    #[error("Operation was cancelled by the user")]
    Cancelled,

    /// A release file could not be parsed.
    #[error("Release parsing failed: {0}")]
    Parse(#[source] Rf2Error),

    /// The code store rejected a request.
    #[error("Code store update failed: {0}")]
    Store(#[from] StoreError),

    /// The release could not be acquired.
    #[error("Release unavailable: {0}")]
    Release(String),

    /// A blocking parse task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// The scheduler worker is gone and no longer accepts tasks.
    #[error("Task scheduler is shut down")]
    SchedulerClosed,
}

impl From<Rf2Error> for ImportError {
    fn from(err: Rf2Error) -> Self {
        match err {
            Rf2Error::Cancelled => ImportError::Cancelled,
            other => ImportError::Parse(other),
        }
    }
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Renders an error and its source chain, one cause per line.
pub fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = format!("{}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\nCaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_not_a_parse_error() {
        assert!(matches!(ImportError::from(Rf2Error::Cancelled), ImportError::Cancelled));
        assert!(matches!(
            ImportError::from(Rf2Error::MissingColumn {
                column: "STATUS".to_string()
            }),
            ImportError::Parse(_)
        ));
    }

    #[test]
    fn test_render_chain() {
        let err = ImportError::Parse(Rf2Error::ColumnCount {
            line: 7,
            expected: 5,
            found: 3,
        });
        let rendered = render_chain(&err);
        assert!(rendered.starts_with("Release parsing failed"));
        assert!(rendered.contains("Caused by: Malformed row at line 7"));
    }

    #[test]
    fn test_status_message() {
        let err = StoreError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Code store returned 503: unavailable");
    }
}
