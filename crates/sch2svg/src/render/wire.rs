//! Wires, buses, bus entries, junctions and no-connect flags.

use std::io::Write;

use sch2svg_core::{color::ColorRole, geometry::Point, writer::Result};
use sch2svg_parser::records::{BusEntry, Wire, WireKind};

use super::{
    Canvas,
    style::{LineStyle, line_style},
};

const CONNECTION_RADIUS: i32 = 18;
const NO_CONNECT_HALF_SIZE: i32 = 24;

pub(crate) fn draw_wire<W: Write>(canvas: &mut Canvas<'_, W>, wire: &Wire) -> Result<()> {
    draw_line(canvas, line_style(wire.kind), wire.start, wire.end)
}

pub(crate) fn draw_bus_entry<W: Write>(canvas: &mut Canvas<'_, W>, entry: &BusEntry) -> Result<()> {
    let kind = if entry.bus { WireKind::Bus } else { WireKind::Wire };
    let style = LineStyle {
        class: "bus-entry",
        ..line_style(kind)
    };
    draw_line(canvas, style, entry.start, entry.end)
}

/// Draws one line inside the group of its color and dash, so the line
/// itself only carries its class, width and coordinates.
fn draw_line<W: Write>(canvas: &mut Canvas<'_, W>, style: LineStyle, start: Point, end: Point) -> Result<()> {
    let width = canvas.config().default_stroke_width() * style.width_factor;
    canvas.enter_line_group(style.role, style.dash)?;
    canvas.open("line", style.class, style.role)?;
    let writer = canvas.writer();
    writer.inherited_attribute("stroke-width", width)?;
    if let Some(dash) = style.dash {
        writer.inherited_attribute("stroke-dasharray", dash)?;
    }
    canvas.line_coordinates(start, end)?;
    canvas.close("line")
}

/// A junction dot.
pub(crate) fn draw_connection<W: Write>(canvas: &mut Canvas<'_, W>, at: Point) -> Result<()> {
    let fill = canvas.color(ColorRole::Junction);
    let writer = canvas.writer();
    writer.start_element("circle")?;
    writer.class("connection")?;
    writer.attribute("cx", at.x())?;
    writer.attribute("cy", at.y())?;
    writer.attribute("r", CONNECTION_RADIUS)?;
    writer.inherited_attribute("fill", fill)?;
    writer.inherited_attribute("stroke", "none")?;
    writer.end_element("circle")
}

/// An X centered on `at`.
pub(crate) fn draw_no_connect<W: Write>(canvas: &mut Canvas<'_, W>, at: Point) -> Result<()> {
    let d = NO_CONNECT_HALF_SIZE;
    canvas.open("g", "no-connect", ColorRole::NoConnect)?;
    for (start, end) in [
        (Point::new(-d, -d), Point::new(d, d)),
        (Point::new(d, -d), Point::new(-d, d)),
    ] {
        canvas.writer().start_element("line")?;
        canvas.line_coordinates(at + start, at + end)?;
        canvas.close("line")?;
    }
    canvas.close("g")
}
