//! The render pipeline.
//!
//! A render runs in three phases over one output stream:
//!
//! 1. the schematic pass reads records one at a time and draws everything
//!    that needs no library, while collecting placements and the wire and
//!    no-connect coordinates,
//! 2. the library pass scans the cache library once and draws each
//!    placement when its symbol comes by,
//! 3. the field pass draws every placement field once.
//!
//! Every handler receives the [`Canvas`] and [`RenderState`] it works on
//! explicitly.

mod field;
mod label;
mod sheet;
mod state;
mod style;
mod symbol;
mod text;
mod wire;

use std::io::Write;

use log::{debug, info, warn};

use sch2svg_core::{
    color::{Color, ColorRole, Palette},
    font::GlyphSource,
    geometry::Point,
    writer::{self, Number, SvgWriter},
};
use sch2svg_parser::{
    FileFormatError, LibraryReader, SchematicReader,
    records::{PageDescription, Record, WireKind},
};

use crate::{
    RenderSummary,
    cancel::CancelToken,
    config::RenderConfig,
    error::RenderError,
    recovery::{Recovery, RecoveryPolicy},
    source::DocumentSource,
};

use state::RenderState;

const MILS_TO_MM: f64 = 0.0254;

/// Formats a point as `x,y`.
pub(crate) fn point_attr(p: Point) -> String {
    format!("{},{}", p.x(), p.y())
}

/// The writer together with the read-only settings every handler needs.
pub(crate) struct Canvas<'r, W: Write> {
    writer: SvgWriter<W>,
    config: &'r RenderConfig,
    palette: &'r Palette,
    glyphs: &'r dyn GlyphSource,
    /// Stroke color and dash of the open `g` shared by consecutive lines.
    line_group: Option<(ColorRole, Option<&'static str>)>,
}

impl<'r, W: Write> Canvas<'r, W> {
    pub(crate) fn new(
        writer: SvgWriter<W>,
        config: &'r RenderConfig,
        palette: &'r Palette,
        glyphs: &'r dyn GlyphSource,
    ) -> Self {
        Self {
            writer,
            config,
            palette,
            glyphs,
            line_group: None,
        }
    }

    pub(crate) fn writer(&mut self) -> &mut SvgWriter<W> {
        &mut self.writer
    }

    pub(crate) fn into_writer(self) -> SvgWriter<W> {
        self.writer
    }

    pub(crate) fn config(&self) -> &'r RenderConfig {
        self.config
    }

    pub(crate) fn glyphs(&self) -> &'r dyn GlyphSource {
        self.glyphs
    }

    pub(crate) fn color(&self, role: ColorRole) -> Color {
        self.palette.get(role)
    }

    /// Opens the root element with the document-wide defaults.
    pub(crate) fn open_root(&mut self) -> writer::Result<()> {
        let width = self.config.default_stroke_width();
        let writer = &mut self.writer;
        writer.start_element("svg")?;
        writer.inherited_attribute("stroke-linecap", "round")?;
        writer.inherited_attribute("stroke-linejoin", "round")?;
        writer.inherited_attribute("fill", "none")?;
        writer.inherited_attribute("stroke-width", width)
    }

    /// Opens `name` with a class and the stroke color of `role`.
    pub(crate) fn open(&mut self, name: &str, class: &str, role: ColorRole) -> writer::Result<()> {
        let stroke = self.color(role);
        self.writer.start_element(name)?;
        self.writer.class(class)?;
        self.writer.inherited_attribute("stroke", stroke)
    }

    pub(crate) fn close(&mut self, name: &str) -> writer::Result<()> {
        self.writer.end_element(name)
    }

    /// Puts the next lines in a group stroked with `role` and `dash`,
    /// reusing the open group when it already matches.
    pub(crate) fn enter_line_group(&mut self, role: ColorRole, dash: Option<&'static str>) -> writer::Result<()> {
        if self.line_group == Some((role, dash)) {
            return Ok(());
        }
        self.leave_line_group()?;

        let stroke = self.color(role);
        self.writer.start_element("g")?;
        self.writer.inherited_attribute("stroke", stroke)?;
        if let Some(dash) = dash {
            self.writer.inherited_attribute("stroke-dasharray", dash)?;
        }
        self.line_group = Some((role, dash));
        Ok(())
    }

    pub(crate) fn leave_line_group(&mut self) -> writer::Result<()> {
        if self.line_group.take().is_some() {
            self.writer.end_element("g")?;
        }
        Ok(())
    }

    pub(crate) fn line_coordinates(&mut self, start: Point, end: Point) -> writer::Result<()> {
        self.writer.attribute("x1", start.x())?;
        self.writer.attribute("y1", start.y())?;
        self.writer.attribute("x2", end.x())?;
        self.writer.attribute("y2", end.y())
    }

    /// Sets the `points` attribute of the current element.
    pub(crate) fn points(&mut self, points: impl IntoIterator<Item = Point>) -> writer::Result<()> {
        let points: Vec<String> = points.into_iter().map(point_attr).collect();
        self.writer.attribute("points", points.join(" "))
    }

    /// Writes a complete `polyline` element.
    pub(crate) fn polyline(&mut self, points: impl IntoIterator<Item = Point>) -> writer::Result<()> {
        self.writer.start_element("polyline")?;
        self.points(points)?;
        self.writer.end_element("polyline")
    }

    /// Applies the sheet size to the root element while its start tag is
    /// still pending.
    fn apply_page(&mut self, page: &PageDescription) -> writer::Result<()> {
        if !self.writer.is_root_pending() {
            warn!(paper = page.paper.as_str(); "Page description after drawing records, sheet size ignored");
            return Ok(());
        }

        let mm = |mils: i32| format!("{}mm", Number(f64::from(mils) * MILS_TO_MM));
        self.writer.attribute("width", mm(page.width))?;
        self.writer.attribute("height", mm(page.height))?;
        self.writer.attribute("viewBox", format!("0 0 {} {}", page.width, page.height))?;

        if !page.title.is_empty() {
            self.writer.start_element("title")?;
            self.writer.text(&page.title)?;
            self.writer.end_element("title")?;
        }
        Ok(())
    }
}

/// Everything one render borrows from its caller.
pub(crate) struct Job<'r> {
    pub source: &'r dyn DocumentSource,
    pub id: &'r str,
    pub cancel: &'r CancelToken,
    pub config: &'r RenderConfig,
    pub palette: &'r Palette,
    pub glyphs: &'r dyn GlyphSource,
    pub recovery: &'r dyn RecoveryPolicy,
}

pub(crate) fn run<W: Write>(job: &Job<'_>, out: W) -> Result<RenderSummary, RenderError> {
    job.cancel.check()?;
    let document = job
        .source
        .open_document(job.id, job.cancel)
        .map_err(|err| RenderError::from_source(job.id, err))?;
    info!(source = job.id, bytes = document.text().len(), revision:? = document.revision(); "Opened schematic");

    let mut reader = SchematicReader::new(document.text(), job.id)?;
    let mut summary = RenderSummary::new(job.id, document.revision());
    let mut canvas = Canvas::new(
        SvgWriter::new(out, job.config.writer_options()),
        job.config,
        job.palette,
        job.glyphs,
    );
    let mut state = RenderState::default();
    canvas.open_root()?;

    match draw_document(job, &mut reader, &mut canvas, &mut state, &mut summary) {
        Ok(()) => {}
        Err(RenderError::Format(error)) => recover(job, &mut canvas, error, &mut summary)?,
        Err(error) => return Err(error),
    }

    job.cancel.check()?;
    canvas.into_writer().finish()?;
    info!(
        source = job.id,
        records = summary.records(),
        placements = summary.placements(),
        symbols = summary.symbols_drawn(),
        unresolved = summary.unresolved().len();
        "Rendered schematic"
    );
    Ok(summary)
}

fn draw_document<W: Write>(
    job: &Job<'_>,
    reader: &mut SchematicReader<'_>,
    canvas: &mut Canvas<'_, W>,
    state: &mut RenderState,
    summary: &mut RenderSummary,
) -> Result<(), RenderError> {
    loop {
        job.cancel.check()?;
        let Some(record) = reader.next_record()? else {
            break;
        };
        summary.records += 1;
        draw_record(canvas, state, record)?;
    }
    canvas.leave_line_group()?;
    job.cancel.check()?;
    canvas.writer().flush()?;

    if state.has_placements() {
        draw_library(job, canvas, state, summary)?;
    }

    summary.placements = state.placements().len();
    for placement in state.placements() {
        field::draw_fields(canvas, placement, state.is_multi_unit(&placement.symbol))?;
    }
    summary.unresolved = state.unresolved();
    for name in &summary.unresolved {
        warn!(symbol = name.as_str(); "Symbol not found in the cache library");
    }

    canvas.close("svg")?;
    job.cancel.check()?;
    canvas.writer().flush()?;
    Ok(())
}

fn draw_record<W: Write>(canvas: &mut Canvas<'_, W>, state: &mut RenderState, record: Record) -> Result<(), RenderError> {
    // Only runs of lines share a group.
    if !matches!(
        record,
        Record::Wire(_) | Record::BusEntry(_) | Record::Libraries(_) | Record::Placement(_)
    ) {
        canvas.leave_line_group()?;
    }
    match record {
        Record::Libraries(names) => state.add_libraries(&names),
        Record::Page(page) => canvas.apply_page(&page)?,
        Record::Wire(wire) => {
            debug!(kind:? = wire.kind; "Drawing line");
            wire::draw_wire(canvas, &wire)?;
            if wire.kind != WireKind::Notes {
                state.add_wire_endpoints(wire.start, wire.end);
            }
        }
        Record::BusEntry(entry) => wire::draw_bus_entry(canvas, &entry)?,
        Record::Connection(at) => wire::draw_connection(canvas, at)?,
        Record::NoConnection(at) => {
            wire::draw_no_connect(canvas, at)?;
            state.add_no_connect(at);
        }
        Record::Text(text) => {
            debug!(kind:? = text.kind; "Drawing text");
            label::draw_text_record(canvas, &text)?;
        }
        Record::Sheet(sheet) => {
            debug!(pins = sheet.pins.len(); "Drawing sheet");
            sheet::draw_sheet(canvas, &sheet)?;
        }
        Record::Placement(placement) => {
            debug!(symbol = placement.symbol.as_str(), reference = placement.reference.as_str(); "Collected placement");
            state.add_placement(placement);
        }
    }
    Ok(())
}

fn draw_library<W: Write>(
    job: &Job<'_>,
    canvas: &mut Canvas<'_, W>,
    state: &mut RenderState,
    summary: &mut RenderSummary,
) -> Result<(), RenderError> {
    let Some(name) = state.cache_library().map(str::to_string) else {
        warn!(placements = state.placements().len(); "No cache library declared, drawing fields only");
        return Ok(());
    };

    job.cancel.check()?;
    let library = job
        .source
        .open_library(&name, job.cancel)
        .map_err(|err| RenderError::from_source(&name, err))?;
    info!(library = name.as_str(), placements = state.placements().len(); "Starting library pass");

    let library_id = format!("{name}.lib");
    let mut reader = LibraryReader::new(library.text(), library_id.as_str())?;
    loop {
        job.cancel.check()?;
        let Some(symbol) = reader.next_symbol()? else {
            break;
        };
        state.learn_symbol(&symbol);
        for index in state.take_matches(&symbol) {
            symbol::draw_component(canvas, state, &state.placements()[index], &symbol)?;
            summary.symbols_drawn += 1;
        }
    }

    job.cancel.check()?;
    canvas.writer().flush()?;
    Ok(())
}

/// Closes the document around a format error when the policy allows it.
fn recover<W: Write>(
    job: &Job<'_>,
    canvas: &mut Canvas<'_, W>,
    error: FileFormatError,
    summary: &mut RenderSummary,
) -> Result<(), RenderError> {
    let writer = canvas.writer();
    if !writer.is_root_open() {
        return Err(error.into());
    }
    if job.recovery.decide(&error, writer.has_emitted()) == Recovery::Abort {
        return Err(error.into());
    }

    warn!(error:% = error; "Annotating output with format error");
    writer.comment(&format!("sch2svg: {error}"))?;
    writer.end_all()?;
    canvas.line_group = None;
    summary.recovered = Some(error);
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use sch2svg_core::{color::Palette, font::StrokeFont, writer::SvgWriter};

    use super::Canvas;
    use crate::config::RenderConfig;

    /// Runs `draw` inside a root element and returns the document.
    pub(crate) fn draw<F>(config: &RenderConfig, draw: F) -> String
    where
        F: FnOnce(&mut Canvas<'_, &mut Vec<u8>>) -> sch2svg_core::writer::Result<()>,
    {
        let palette = Palette::default();
        let mut out = Vec::new();
        {
            let writer = SvgWriter::new(&mut out, config.writer_options());
            let mut canvas = Canvas::new(writer, config, &palette, StrokeFont::builtin());
            canvas.open_root().unwrap();
            draw(&mut canvas).unwrap();
            canvas.leave_line_group().unwrap();
            canvas.close("svg").unwrap();
            canvas.into_writer().finish().unwrap();
        }
        String::from_utf8(out).unwrap()
    }
}
