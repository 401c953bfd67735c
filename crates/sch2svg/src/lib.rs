//! sch2svg - Renders legacy EESchema schematics to SVG.
//!
//! A schematic (`EESchema Schematic File Version 2`) is streamed record by
//! record into an SVG document. Component bodies come from the project's
//! cache library, which is scanned once after the schematic.

pub mod config;
pub mod source;

mod cancel;
mod error;
mod recovery;
mod render;

pub use sch2svg_core::{color, font, geometry};
pub use sch2svg_parser::{ErrorCode, FileFormatError, Position};

pub use cancel::CancelToken;
pub use error::RenderError;
pub use recovery::{Recovery, RecoveryPolicy};

use std::{fmt, io::Write, sync::Arc};

use log::{debug, info};

use sch2svg_core::{
    color::Palette,
    font::{GlyphSource, StrokeFont},
};

use config::AppConfig;
use source::DocumentSource;

/// Renders schematics with one configuration.
///
/// A renderer holds no per-document state, so one instance can be shared
/// between threads and used for any number of renders at the same time.
///
/// # Examples
///
/// ```
/// use sch2svg::{CancelToken, SchematicRenderer, config::AppConfig, source::MemorySource};
///
/// let source = MemorySource::new().with_document(
///     "demo.sch",
///     "EESchema Schematic File Version 2\nConnection ~ 100 200\n$EndSCHEMATC\n",
/// );
///
/// let renderer = SchematicRenderer::new(AppConfig::default()).expect("valid config");
/// let svg = renderer
///     .render_to_string(&source, "demo.sch", &CancelToken::new())
///     .expect("Failed to render");
/// assert!(svg.starts_with("<svg"));
/// ```
pub struct SchematicRenderer {
    config: AppConfig,
    palette: Palette,
    glyphs: Option<Arc<dyn GlyphSource>>,
    recovery: Arc<dyn RecoveryPolicy>,
}

impl SchematicRenderer {
    /// Create a renderer for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] when the style section names an
    /// unknown color role or an unparsable color.
    pub fn new(config: AppConfig) -> Result<Self, RenderError> {
        let palette = config.style().palette().map_err(RenderError::Config)?;
        let recovery = if config.render().annotate_errors() {
            Recovery::Annotate
        } else {
            Recovery::Abort
        };
        debug!(recovery:? = recovery; "Renderer configured");

        Ok(Self {
            config,
            palette,
            glyphs: None,
            recovery: Arc::new(recovery),
        })
    }

    /// Replace the built-in stroke font.
    pub fn with_glyphs(mut self, glyphs: Arc<dyn GlyphSource>) -> Self {
        self.glyphs = Some(glyphs);
        self
    }

    /// Replace the recovery policy chosen from the configuration.
    pub fn with_recovery_policy(mut self, policy: impl RecoveryPolicy + 'static) -> Self {
        self.recovery = Arc::new(policy);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Render the schematic `id` from `source` into `out`.
    ///
    /// Output is streamed while the schematic is read. On error `out` may
    /// hold a partial document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Format`] for a malformed schematic or library
    /// (unless the recovery policy annotates it), [`RenderError::Source`]
    /// when a document cannot be opened, and [`RenderError::Cancelled`]
    /// once `cancel` is triggered.
    pub fn render<W: Write>(
        &self,
        source: &dyn DocumentSource,
        id: &str,
        out: W,
        cancel: &CancelToken,
    ) -> Result<RenderSummary, RenderError> {
        info!(source = id; "Rendering schematic");
        let glyphs: &dyn GlyphSource = match &self.glyphs {
            Some(glyphs) => glyphs.as_ref(),
            None => StrokeFont::builtin(),
        };

        let job = render::Job {
            source,
            id,
            cancel,
            config: self.config.render(),
            palette: &self.palette,
            glyphs,
            recovery: self.recovery.as_ref(),
        };
        render::run(&job, out)
    }

    /// Render into a string.
    ///
    /// # Errors
    ///
    /// See [`SchematicRenderer::render`].
    pub fn render_to_string(
        &self,
        source: &dyn DocumentSource,
        id: &str,
        cancel: &CancelToken,
    ) -> Result<String, RenderError> {
        let mut out = Vec::new();
        self.render(source, id, &mut out, cancel)?;
        String::from_utf8(out).map_err(|err| RenderError::Output(Box::new(err)))
    }
}

impl fmt::Debug for SchematicRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchematicRenderer")
            .field("config", &self.config)
            .field("custom_glyphs", &self.glyphs.is_some())
            .finish_non_exhaustive()
    }
}

/// What a finished render did.
#[derive(Debug)]
pub struct RenderSummary {
    source_id: String,
    revision: Option<String>,
    pub(crate) records: usize,
    pub(crate) symbols_drawn: usize,
    pub(crate) unresolved: Vec<String>,
    pub(crate) placements: usize,
    pub(crate) recovered: Option<FileFormatError>,
}

impl RenderSummary {
    pub(crate) fn new(source_id: &str, revision: Option<&str>) -> Self {
        Self {
            source_id: source_id.to_string(),
            revision: revision.map(str::to_string),
            records: 0,
            symbols_drawn: 0,
            unresolved: Vec::new(),
            placements: 0,
            recovered: None,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Revision reported by the document source.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Number of schematic records read.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn placements(&self) -> usize {
        self.placements
    }

    /// Number of component bodies drawn from the library.
    pub fn symbols_drawn(&self) -> usize {
        self.symbols_drawn
    }

    /// Symbols placed in the schematic but missing from the library, in
    /// placement order.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// The format error the document was closed around, if any.
    pub fn recovered(&self) -> Option<&FileFormatError> {
        self.recovered.as_ref()
    }
}
