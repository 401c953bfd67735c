//! Library symbols drawn at their placements.
//!
//! Library coordinates grow upwards. Every point goes through the
//! placement matrix and is then offset by the placement position.

use std::io::Write;

use sch2svg_core::{
    color::ColorRole,
    geometry::{Point, Rotation, Transform},
    writer::Result,
};
use sch2svg_parser::records::{Arc, Fill, Pin, Placement, Primitive, Symbol, SymbolText, VJustify};

use super::{
    Canvas, point_attr,
    state::RenderState,
    text::{Anchor, TextLayout, draw_text},
};
use crate::config::HiddenPins;

const INVERTED_RADIUS: i32 = 25;
const CLOCK_SIZE: i32 = 40;
const IEEE_SYMBOL_SIZE: i32 = 40;
const NON_LOGIC_HALF_SIZE: i32 = 30;
/// Gap between a pin line and the name or number written along it.
const PIN_TEXT_GAP: i32 = 10;

/// Maps library space onto the sheet for one placement.
#[derive(Debug, Clone, Copy)]
struct Placed {
    origin: Point,
    transform: Transform,
}

impl Placed {
    fn new(placement: &Placement) -> Self {
        Self {
            origin: placement.position,
            transform: placement.transform,
        }
    }

    fn map(self, p: Point) -> Point {
        self.origin + self.transform.apply(p)
    }
}

/// SVG arc flags `(large_arc, sweep)` for an arc from `start` to `end`
/// tenths of a degree, counter-clockwise in library space.
///
/// Both angles are wrapped into [0°, 360°) and ordered so the arc runs
/// counter-clockwise from the first to the second. A span over 180° is
/// taken the other way round from end to start, which keeps library arcs
/// minor. The default placement flips Y, so a counter-clockwise arc stays
/// counter-clockwise on screen unless the placement mirrors it.
pub(crate) fn arc_flags(start: i32, end: i32, transform: Transform) -> (bool, bool) {
    let start = start.rem_euclid(3600);
    let mut end = end.rem_euclid(3600);
    if end < start {
        end += 3600;
    }
    let mut span = end - start;
    let reversed = span > 1800;
    if reversed {
        span = 3600 - span;
    }
    let counter_clockwise = transform.determinant() < 0;
    (span > 1800, counter_clockwise == reversed)
}

pub(crate) fn draw_component<W: Write>(
    canvas: &mut Canvas<'_, W>,
    state: &RenderState,
    placement: &Placement,
    symbol: &Symbol,
) -> Result<()> {
    let placed = Placed::new(placement);
    canvas.writer().start_element("g")?;
    canvas.writer().class("component")?;

    for filled in [true, false] {
        for primitive in &symbol.primitives {
            let style = primitive.style();
            if !placement.selects(style.unit, style.convert) || (style.fill != Fill::None) != filled {
                continue;
            }
            match primitive {
                Primitive::Rectangle { start, end, .. } => {
                    let (a, b) = (placed.map(*start), placed.map(*end));
                    open_shape(canvas, "rect", style.width, style.fill)?;
                    let writer = canvas.writer();
                    writer.attribute("x", a.x().min(b.x()))?;
                    writer.attribute("y", a.y().min(b.y()))?;
                    writer.attribute("width", (a.x() - b.x()).abs())?;
                    writer.attribute("height", (a.y() - b.y()).abs())?;
                    canvas.close("rect")?;
                }
                Primitive::Circle { center, radius, .. } => {
                    let center = placed.map(*center);
                    open_shape(canvas, "circle", style.width, style.fill)?;
                    let writer = canvas.writer();
                    writer.attribute("cx", center.x())?;
                    writer.attribute("cy", center.y())?;
                    writer.attribute("r", radius)?;
                    canvas.close("circle")?;
                }
                Primitive::Polyline { points, .. } => {
                    open_shape(canvas, "polyline", style.width, style.fill)?;
                    canvas.points(points.iter().map(|&p| placed.map(p)))?;
                    canvas.close("polyline")?;
                }
                Primitive::Bezier { points, .. } => {
                    open_shape(canvas, "path", style.width, style.fill)?;
                    canvas.writer().attribute("d", bezier_path(points, placed))?;
                    canvas.close("path")?;
                }
                Primitive::Arc(arc) => draw_arc(canvas, arc, placed)?,
                Primitive::Text(text) => draw_symbol_text(canvas, text, placed)?,
                Primitive::Pin(pin) => draw_pin(canvas, state, symbol, pin, placed)?,
            }
        }
    }

    canvas.close("g")
}

fn open_shape<W: Write>(canvas: &mut Canvas<'_, W>, name: &str, width: i32, fill: Fill) -> Result<()> {
    canvas.open(name, "body", ColorRole::Body)?;
    let fill = match fill {
        Fill::None => None,
        Fill::Foreground => Some(canvas.color(ColorRole::Body)),
        Fill::Background => Some(canvas.color(ColorRole::BodyFill)),
    };
    let writer = canvas.writer();
    writer.inherited_attribute("stroke-width", width)?;
    match fill {
        Some(color) => writer.inherited_attribute("fill", color),
        None => writer.inherited_attribute("fill", "none"),
    }
}

/// Cubic segments when the point count allows them, straight segments
/// otherwise.
fn bezier_path(points: &[Point], placed: Placed) -> String {
    let mapped: Vec<Point> = points.iter().map(|&p| placed.map(p)).collect();
    let cubic = mapped.len() >= 4 && (mapped.len() - 1) % 3 == 0;

    let mut commands = Vec::with_capacity(mapped.len());
    for (index, point) in mapped.iter().enumerate() {
        let command = match index {
            0 => "M",
            1 if cubic => "C",
            _ if cubic => "",
            _ => "L",
        };
        commands.push(format!("{command}{}", point_attr(*point)));
    }
    commands.join(" ")
}

fn draw_arc<W: Write>(canvas: &mut Canvas<'_, W>, arc: &Arc, placed: Placed) -> Result<()> {
    let start = placed.map(arc.start);
    let end = placed.map(arc.end);
    let (large_arc, sweep) = arc_flags(arc.start_angle, arc.end_angle, placed.transform);
    let d = format!(
        "M{} A{r} {r} 0 {} {} {}",
        point_attr(start),
        u8::from(large_arc),
        u8::from(sweep),
        point_attr(end),
        r = arc.radius,
    );

    open_shape(canvas, "path", arc.style.width, arc.style.fill)?;
    canvas.writer().attribute("d", d)?;
    canvas.close("path")
}

fn draw_symbol_text<W: Write>(canvas: &mut Canvas<'_, W>, text: &SymbolText, placed: Placed) -> Result<()> {
    if text.hidden {
        return Ok(());
    }
    let degrees = placed.transform.angle() + text.angle / 10;
    let (rotation, h_justify, v_justify) =
        TextLayout::readable(Rotation::from_degrees(degrees), text.h_justify, text.v_justify);
    let layout = TextLayout::new(text.size, rotation, h_justify.into(), v_justify)
        .with_italic(text.italic)
        .with_bold(text.bold);
    draw_text(canvas, placed.map(text.position), &text.text, &layout, "symbol-text", ColorRole::Body)
}

fn pin_visible(mode: HiddenPins, state: &RenderState, pin: &Pin, placed: Placed) -> bool {
    if !pin.hidden {
        return true;
    }
    match mode {
        HiddenPins::Hide => false,
        HiddenPins::Show => true,
        HiddenPins::ShowIfWireConnected => state.is_connected(placed.map(pin.position)),
    }
}

fn draw_pin<W: Write>(
    canvas: &mut Canvas<'_, W>,
    state: &RenderState,
    symbol: &Symbol,
    pin: &Pin,
    placed: Placed,
) -> Result<()> {
    if !pin_visible(canvas.config().hidden_pins(), state, pin, placed) {
        return Ok(());
    }

    let along = pin.direction.unit();
    let across = if pin.direction.is_horizontal() { Point::new(0, 1) } else { Point::new(-1, 0) };
    let tip = pin.position;
    let body = pin.body_end();
    let decorations = pin.decorations;

    canvas.open("g", "pin", ColorRole::Pin)?;

    let line_end = if decorations.inverted { body - along * (2 * INVERTED_RADIUS) } else { body };
    canvas.writer().start_element("line")?;
    canvas.line_coordinates(placed.map(tip), placed.map(line_end))?;
    canvas.close("line")?;

    if decorations.inverted {
        let center = placed.map(body - along * INVERTED_RADIUS);
        let writer = canvas.writer();
        writer.start_element("circle")?;
        writer.attribute("cx", center.x())?;
        writer.attribute("cy", center.y())?;
        writer.attribute("r", INVERTED_RADIUS)?;
        writer.end_element("circle")?;
    }

    let mut outlines: Vec<Vec<Point>> = Vec::new();
    if decorations.clock {
        outlines.push(vec![
            body + across * CLOCK_SIZE,
            body + along * CLOCK_SIZE,
            body - across * CLOCK_SIZE,
        ]);
    }
    if decorations.falling_edge {
        outlines.push(vec![
            body + across * CLOCK_SIZE,
            body - along * CLOCK_SIZE,
            body - across * CLOCK_SIZE,
        ]);
    }
    if decorations.low_input {
        let foot = body - along * (2 * IEEE_SYMBOL_SIZE);
        outlines.push(vec![foot, foot + across * IEEE_SYMBOL_SIZE, body]);
    }
    if decorations.low_output {
        outlines.push(vec![body - along * (2 * IEEE_SYMBOL_SIZE), body + across * IEEE_SYMBOL_SIZE]);
    }
    if decorations.non_logic {
        let d = NON_LOGIC_HALF_SIZE;
        let first = Point::new(d, d);
        // The second diagonal is built from transposed offsets.
        let second = Point::new(d, -d).transposed();
        outlines.push(vec![tip - first, tip + first]);
        outlines.push(vec![tip - second, tip + second]);
    }
    for outline in outlines {
        canvas.writer().start_element("polyline")?;
        canvas.points(outline.into_iter().map(|p| placed.map(p)))?;
        canvas.close("polyline")?;
    }

    canvas.close("g")?;
    draw_pin_texts(canvas, symbol, pin, placed)
}

fn draw_pin_texts<W: Write>(canvas: &mut Canvas<'_, W>, symbol: &Symbol, pin: &Pin, placed: Placed) -> Result<()> {
    let show_name = symbol.show_pin_names && !pin.name.is_empty() && pin.name != "~";
    let show_number =
        canvas.config().pin_numbers() && symbol.show_pin_numbers && !pin.number.is_empty() && pin.number != "~";
    if !show_name && !show_number {
        return Ok(());
    }

    let direction = placed.transform.apply(pin.direction.unit());
    let rotation = if direction.y() == 0 { Rotation::R0 } else { Rotation::R90 };
    let tip = placed.map(pin.position);
    let body = placed.map(pin.body_end());
    let middle = Point::new((tip.x() + body.x()) / 2, (tip.y() + body.y()) / 2);
    let above = middle + rotation.apply(Point::new(0, -PIN_TEXT_GAP));
    let below = middle + rotation.apply(Point::new(0, PIN_TEXT_GAP));

    if show_name {
        if symbol.pin_name_offset > 0 {
            let at = placed.map(pin.body_end() + pin.direction.unit() * symbol.pin_name_offset);
            let layout = TextLayout::new(pin.name_size, rotation, Anchor::extending(rotation, direction), VJustify::Center);
            draw_text(canvas, at, &pin.name, &layout, "pin-name", ColorRole::PinName)?;
        } else {
            let layout = TextLayout::new(pin.name_size, rotation, Anchor::Middle, VJustify::Bottom);
            draw_text(canvas, above, &pin.name, &layout, "pin-name", ColorRole::PinName)?;
        }
    }

    if show_number {
        let (at, v_justify) = if symbol.pin_name_offset > 0 || !show_name {
            (above, VJustify::Bottom)
        } else {
            (below, VJustify::Top)
        };
        let layout = TextLayout::new(pin.number_size, rotation, Anchor::Middle, v_justify);
        draw_text(canvas, at, &pin.number, &layout, "pin-number", ColorRole::PinNumber)?;
    }
    Ok(())
}
