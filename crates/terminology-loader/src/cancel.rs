//! Cooperative cancellation seam.
//!
//! Parsers poll a [`CancellationCheck`] before every row and abort with
//! [`Rf2Error::Cancelled`] once it reports a pending cancel request.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::{Rf2Error, Rf2Result};

/// Reports whether the job driving a parse has been canceled.
pub trait CancellationCheck: Send + Sync {
    /// Returns true once no further work should be done.
    fn is_cancelled(&self) -> bool;

    /// Returns [`Rf2Error::Cancelled`] if the job has been canceled.
    fn checkpoint(&self) -> Rf2Result<()> {
        if self.is_cancelled() {
            Err(Rf2Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A check that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancellationCheck for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancellationCheck for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}
