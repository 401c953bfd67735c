//! Where schematics and libraries come from.
//!
//! The renderer never touches the file system itself. It asks a
//! [`DocumentSource`] for the schematic and, during the library pass, for
//! the cache library named by the schematic's `LIBS:` line.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use log::{debug, trace};
use thiserror::Error;

use crate::cancel::CancelToken;

/// The text of one document and an optional revision tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    revision: Option<String>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// A tag that changes whenever the document changes, if the source has
    /// one.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }
}

/// Errors raised by a [`DocumentSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("`{0}` not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("cancelled")]
    Cancelled,
}

/// Provides schematic and library documents.
///
/// Implementations are shared by concurrent renders and should check the
/// cancel token before blocking.
pub trait DocumentSource: Send + Sync {
    /// Opens the schematic `id`.
    fn open_document(&self, id: &str, cancel: &CancelToken) -> Result<Document, SourceError>;

    /// Opens the library with base name `name`, without its extension.
    fn open_library(&self, name: &str, cancel: &CancelToken) -> Result<Document, SourceError>;
}

/// Reads documents from a directory. Libraries are `<name>.lib` files
/// next to the schematic.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: PathBuf, cancel: &CancelToken) -> Result<Document, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }

        let text = fs::read_to_string(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
            _ => SourceError::Io(err),
        })?;

        let revision = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map(|age| age.as_secs().to_string());

        debug!(path:? = path, bytes = text.len(); "Read document");
        let document = Document::new(text);
        Ok(match revision {
            Some(revision) => document.with_revision(revision),
            None => document,
        })
    }
}

impl DocumentSource for FileSource {
    fn open_document(&self, id: &str, cancel: &CancelToken) -> Result<Document, SourceError> {
        self.read(self.root.join(id), cancel)
    }

    fn open_library(&self, name: &str, cancel: &CancelToken) -> Result<Document, SourceError> {
        self.read(self.root.join(format!("{name}.lib")), cancel)
    }
}

/// Serves documents from memory.
///
/// # Examples
///
/// ```
/// # use sch2svg::{CancelToken, source::{DocumentSource, MemorySource}};
/// let source = MemorySource::new()
///     .with_document("a.sch", "EESchema Schematic File Version 2\n$EndSCHEMATC\n")
///     .with_library("a-cache", "EESchema-LIBRARY Version 2.3\n");
///
/// let cancel = CancelToken::new();
/// assert!(source.open_document("a.sch", &cancel).is_ok());
/// assert!(source.open_library("b-cache", &cancel).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, Document>,
    libraries: HashMap<String, Document>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(id.into(), Document::new(text));
        self
    }

    pub fn with_library(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.libraries.insert(name.into(), Document::new(text));
        self
    }

    fn lookup(documents: &HashMap<String, Document>, key: &str, cancel: &CancelToken) -> Result<Document, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        trace!(key; "Looking up in-memory document");
        documents
            .get(key)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(key.to_string()))
    }
}

impl DocumentSource for MemorySource {
    fn open_document(&self, id: &str, cancel: &CancelToken) -> Result<Document, SourceError> {
        Self::lookup(&self.documents, id, cancel)
    }

    fn open_library(&self, name: &str, cancel: &CancelToken) -> Result<Document, SourceError> {
        Self::lookup(&self.libraries, name, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_respects_cancellation() {
        let source = MemorySource::new().with_document("a.sch", "text");
        let cancel = CancelToken::new();
        assert_eq!(source.open_document("a.sch", &cancel).unwrap().text(), "text");

        cancel.cancel();
        assert!(matches!(
            source.open_document("a.sch", &cancel),
            Err(SourceError::Cancelled)
        ));
    }

    #[test]
    fn test_missing_document() {
        let source = MemorySource::new();
        let error = source.open_library("power", &CancelToken::new()).unwrap_err();
        assert_eq!(error.to_string(), "`power` not found");
    }
}
