//! Error adapter for converting RenderError to miette diagnostics.
//!
//! Format errors only carry a line and column. The adapter re-reads the
//! offending document and turns the position into a byte span so the report
//! can show the source line.

use std::{fmt, fs, path::Path};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use sch2svg::{FileFormatError, RenderError};

/// Adapter for a [`FileFormatError`] together with the document text.
pub struct FormatErrorAdapter<'a> {
    err: &'a FileFormatError,
    src: Option<NamedSource<String>>,
}

impl<'a> FormatErrorAdapter<'a> {
    /// Create an adapter. Without `src` the report has no snippet.
    pub fn new(err: &'a FileFormatError, src: Option<String>) -> Self {
        let src = src.map(|text| NamedSource::new(err.source_id(), text));
        Self { err, src }
    }

    fn span(&self) -> Option<SourceSpan> {
        let src = self.src.as_ref()?;
        let offset = byte_offset(src.inner(), self.err.line(), self.err.column())?;
        let len = src.inner()[offset..]
            .chars()
            .next()
            .filter(|ch| *ch != '\n')
            .map_or(0, char::len_utf8);
        Some(SourceSpan::new(offset.into(), len))
    }
}

impl fmt::Debug for FormatErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatErrorAdapter").field("err", &self.err).finish()
    }
}

impl fmt::Display for FormatErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.err.message())
    }
}

impl std::error::Error for FormatErrorAdapter<'_> {}

impl MietteDiagnostic for FormatErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.err.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.err.help().map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.src.as_ref().map(|src| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span()?;
        let label = LabeledSpan::new_primary_with_span(Some("here".to_string()), span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for the [`RenderError`] variants without a source position.
pub struct ErrorAdapter<'a>(pub &'a RenderError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        // Engine details stay out of user reports.
        if self.0.is_user_facing() {
            std::error::Error::source(self.0)
        } else {
            None
        }
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            RenderError::Io(_) => "sch2svg::io",
            RenderError::Format(_) => "sch2svg::format",
            RenderError::Engine(_) => "sch2svg::engine",
            RenderError::Source { .. } => "sch2svg::source",
            RenderError::Output(_) => "sch2svg::output",
            RenderError::Config(_) => "sch2svg::config",
            RenderError::Cancelled => "sch2svg::cancelled",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self.0 {
            RenderError::Engine(_) => Some(Box::new("this is a bug in sch2svg, please report it")),
            _ => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A format error pointing into its document.
    Format(FormatErrorAdapter<'a>),
    /// Any other error.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Format(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Format(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Format(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Format(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Format(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Format(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Byte offset of a one-based line and character column, if it exists.
fn byte_offset(text: &str, line: u32, column: u32) -> Option<usize> {
    let line_index = usize::try_from(line.checked_sub(1)?).ok()?;
    let column_index = usize::try_from(column.checked_sub(1)?).ok()?;

    let start = if line_index == 0 {
        0
    } else {
        text.match_indices('\n').nth(line_index - 1)?.0 + 1
    };
    let rest = &text[start..];
    let line_text = rest.split('\n').next().unwrap_or_default();

    match line_text.char_indices().nth(column_index) {
        Some((offset, _)) => Some(start + offset),
        // Errors at the end of a line point just past it.
        None if column_index == line_text.chars().count() => Some(start + line_text.len()),
        None => None,
    }
}

/// Convert a [`RenderError`] into a reportable error.
///
/// Format errors re-read their document from `source_root` to show a
/// snippet. When that fails the report goes without one.
pub fn to_reportable<'a>(err: &'a RenderError, source_root: &Path) -> Reportable<'a> {
    match err {
        RenderError::Format(format) => {
            let src = fs::read_to_string(source_root.join(format.source_id())).ok();
            Reportable::Format(FormatErrorAdapter::new(format, src))
        }
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}
