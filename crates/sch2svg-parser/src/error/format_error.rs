//! The [`FileFormatError`] type.

use std::sync::Arc;

use thiserror::Error;

use crate::{error::ErrorCode, position::Position};

/// A type alias for `Result<T, FileFormatError>`.
pub type Result<T> = std::result::Result<T, FileFormatError>;

/// A document that does not match the expected grammar.
///
/// Safe to show to end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_id}:{position}: {message}")]
pub struct FileFormatError {
    code: ErrorCode,
    message: String,
    help: Option<&'static str>,
    position: Position,
    source_id: Arc<str>,
}

impl FileFormatError {
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        position: Position,
        source_id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            help: None,
            position,
            source_id: source_id.into(),
        }
    }

    /// Attaches a hint for fixing the document.
    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help(&self) -> Option<&'static str> {
        self.help
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line(&self) -> u32 {
        self.position.line()
    }

    pub fn column(&self) -> u32 {
        self.position.column()
    }

    /// Identifier of the document or library the error was found in.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }
}
