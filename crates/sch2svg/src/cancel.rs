//! Cooperative cancellation.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::error::RenderError;

/// A shared cancellation flag.
///
/// Clones observe the same flag. A render checks it before every record,
/// before every library symbol and before every I/O call, and stops with
/// [`RenderError::Cancelled`] once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every render holding a clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fails with [`RenderError::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> Result<(), RenderError> {
        if self.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        Ok(())
    }
}
