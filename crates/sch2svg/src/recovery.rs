//! What to do when a document turns out to be malformed mid-render.

use sch2svg_parser::FileFormatError;

/// The outcome of a [`RecoveryPolicy`] decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Recovery {
    /// Fail the render with the format error.
    #[default]
    Abort,
    /// Write the error as a comment, close every open element and finish
    /// the document. Only possible while the root element is still open.
    Annotate,
}

/// Decides whether a format error aborts the render.
///
/// `bytes_emitted` tells whether any output already reached the sink, which
/// matters to callers that cannot take back what they streamed.
pub trait RecoveryPolicy: Send + Sync {
    fn decide(&self, error: &FileFormatError, bytes_emitted: bool) -> Recovery;
}

impl RecoveryPolicy for Recovery {
    fn decide(&self, _error: &FileFormatError, _bytes_emitted: bool) -> Recovery {
        *self
    }
}

impl<F> RecoveryPolicy for F
where
    F: Fn(&FileFormatError, bool) -> Recovery + Send + Sync,
{
    fn decide(&self, error: &FileFormatError, bytes_emitted: bool) -> Recovery {
        self(error, bytes_emitted)
    }
}
