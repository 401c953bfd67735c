//! Error types for rendering.
//!
//! [`RenderError`] is the single error returned by the renderer. Format
//! errors are about the document and safe to show to its author; engine
//! errors are bugs in the renderer and only print a generic message.

use std::io;

use thiserror::Error;

use sch2svg_core::{error::EngineError, writer::WriterError};
use sch2svg_parser::FileFormatError;

use crate::source::SourceError;

/// The main error type for rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Format(#[from] FileFormatError),

    #[error("internal renderer error")]
    Engine(#[source] EngineError),

    #[error("cannot open `{id}`: {source}")]
    Source { id: String, source: SourceError },

    #[error("Output error: {0}")]
    Output(Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("render cancelled")]
    Cancelled,
}

impl From<WriterError> for RenderError {
    fn from(error: WriterError) -> Self {
        match error {
            WriterError::Engine(err) => Self::Engine(err),
            WriterError::Io(err) => Self::Io(err),
            WriterError::Xml(err) => Self::Output(Box::new(err)),
        }
    }
}

impl RenderError {
    pub(crate) fn from_source(id: &str, source: SourceError) -> Self {
        match source {
            SourceError::Cancelled => Self::Cancelled,
            source => Self::Source {
                id: id.to_string(),
                source,
            },
        }
    }

    /// Whether the message can be shown to the author of the document.
    ///
    /// Only engine errors are internal.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Engine(_))
    }
}
