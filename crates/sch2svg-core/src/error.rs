//! Errors shared by the core types.

use thiserror::Error;

/// A broken internal invariant.
///
/// Never caused by document content. The message is meant for logs and bug
/// reports, not for end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
