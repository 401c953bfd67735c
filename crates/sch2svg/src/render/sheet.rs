//! Hierarchical sheet frames.

use std::io::Write;

use sch2svg_core::{
    color::ColorRole,
    geometry::{Point, Rotation},
    writer::Result,
};
use sch2svg_parser::records::{Sheet, SheetSide, VJustify};

use super::{
    Canvas,
    label::{HierarchicalLabel, draw_hierarchical},
    text::{Anchor, TextLayout, draw_text},
};

/// Gap between the frame and its name or file name.
const CAPTION_GAP: i32 = 10;

/// Label orientation that makes pin text on `side` face into the sheet.
fn pin_orientation(side: SheetSide) -> u8 {
    match side {
        SheetSide::Right => 0,
        SheetSide::Bottom => 1,
        SheetSide::Left => 2,
        SheetSide::Top => 3,
    }
}

pub(crate) fn draw_sheet<W: Write>(canvas: &mut Canvas<'_, W>, sheet: &Sheet) -> Result<()> {
    canvas.open("g", "sheet", ColorRole::Sheet)?;

    let writer = canvas.writer();
    writer.start_element("rect")?;
    writer.attribute("x", sheet.position.x())?;
    writer.attribute("y", sheet.position.y())?;
    writer.attribute("width", sheet.width)?;
    writer.attribute("height", sheet.height)?;
    writer.end_element("rect")?;

    if let Some(name) = &sheet.name {
        let at = sheet.position + Point::new(0, -CAPTION_GAP);
        let layout = TextLayout::new(name.size, Rotation::R0, Anchor::Start, VJustify::Bottom);
        let text = format!("Sheet: {}", name.text);
        draw_text(canvas, at, &text, &layout, "sheet-name", ColorRole::SheetName)?;
    }

    if let Some(file) = &sheet.file {
        let at = sheet.position + Point::new(0, sheet.height + CAPTION_GAP);
        let layout = TextLayout::new(file.size, Rotation::R0, Anchor::Start, VJustify::Top);
        let text = format!("File: {}", file.text);
        draw_text(canvas, at, &text, &layout, "sheet-file", ColorRole::SheetFile)?;
    }

    for pin in &sheet.pins {
        let label = HierarchicalLabel {
            at: pin.position,
            orientation: pin_orientation(pin.side),
            size: pin.size,
            shape: pin.shape.swapped(),
            thickness: 0,
            italic: false,
            text: &pin.name,
        };
        draw_hierarchical(canvas, &label, ColorRole::SheetPin, "sheet-pin")?;
    }

    canvas.close("g")
}
