//! Stroke text.
//!
//! Text is drawn as one `path` per string, built from the pen strokes of a
//! [`GlyphSource`]. Glyph coordinates grow downwards with the baseline at
//! the cap height, so a glyph is scaled by `size / cap_height` and shifted
//! up by the cap height before it is rotated around the anchor.

use std::io::Write;

use sch2svg_core::{
    color::ColorRole,
    font::GlyphSource,
    geometry::{Point, Rotation},
    writer::{Number, Result},
};
use sch2svg_parser::records::{HJustify, VJustify};

use super::Canvas;

/// Horizontal shift of the top of a glyph relative to its baseline, per
/// unit of height.
const ITALIC_SLANT: f64 = 0.2;

/// Distance between baselines of consecutive lines, per unit of size.
const LINE_PITCH: f64 = 1.5;

/// Where the anchor sits along the reading direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    Start,
    Middle,
    End,
}

impl From<HJustify> for Anchor {
    fn from(justify: HJustify) -> Self {
        match justify {
            HJustify::Left => Anchor::Start,
            HJustify::Center => Anchor::Middle,
            HJustify::Right => Anchor::End,
        }
    }
}

impl Anchor {
    /// Anchor for text that must extend from its anchor in `direction`.
    pub(crate) fn extending(rotation: Rotation, direction: Point) -> Self {
        if rotation.apply(Point::new(1, 0)) == direction {
            Anchor::Start
        } else {
            Anchor::End
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TextLayout {
    pub size: i32,
    pub rotation: Rotation,
    pub anchor: Anchor,
    pub v_justify: VJustify,
    pub italic: bool,
    pub bold: bool,
    /// Stroke width in mils, `0` for the default.
    pub thickness: i32,
}

impl TextLayout {
    pub(crate) fn new(size: i32, rotation: Rotation, anchor: Anchor, v_justify: VJustify) -> Self {
        Self {
            size,
            rotation,
            anchor,
            v_justify,
            italic: false,
            bold: false,
            thickness: 0,
        }
    }

    pub(crate) fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub(crate) fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub(crate) fn with_thickness(mut self, thickness: i32) -> Self {
        self.thickness = thickness;
        self
    }

    /// Returns the layout as seen after a readable fold: text that would
    /// read upside down turns half way round and swaps both justifications.
    pub(crate) fn readable(rotation: Rotation, h_justify: HJustify, v_justify: VJustify) -> (Rotation, HJustify, VJustify) {
        if rotation.is_reversed() {
            (rotation.readable(), h_justify.flipped(), v_justify.flipped())
        } else {
            (rotation, h_justify, v_justify)
        }
    }

    fn stroke_width(&self) -> i32 {
        if self.thickness > 0 {
            self.thickness
        } else if self.bold {
            (self.size / 5).max(1)
        } else {
            0
        }
    }
}

/// Width of one line of text in font units, without the trailing gap.
fn line_units(glyphs: &dyn GlyphSource, line: &str) -> f64 {
    if line.is_empty() {
        return 0.0;
    }
    let advances: f64 = line
        .chars()
        .map(|ch| glyphs.glyph(ch).unwrap_or_else(|| glyphs.fallback()).advance())
        .sum();
    advances - glyphs.spacing()
}

/// Width in mils of the widest line of `text` at `size`.
pub(crate) fn text_width(glyphs: &dyn GlyphSource, text: &str, size: i32) -> f64 {
    let scale = f64::from(size) / glyphs.cap_height();
    text.split('\n')
        .map(|line| line_units(glyphs, line) * scale)
        .fold(0.0, f64::max)
}

/// Builds the path data for `text` anchored at `at`. Empty when the text
/// has no strokes.
pub(crate) fn text_path(glyphs: &dyn GlyphSource, at: Point, text: &str, layout: &TextLayout) -> String {
    let cap = glyphs.cap_height();
    let size = f64::from(layout.size);
    let scale = size / cap;
    let origin = (f64::from(at.x()), f64::from(at.y()));

    let mut commands = Vec::new();
    for (row, line) in text.split('\n').enumerate() {
        let width = line_units(glyphs, line) * scale;
        let mut pen = match layout.anchor {
            Anchor::Start => 0.0,
            Anchor::Middle => -width / 2.0,
            Anchor::End => -width,
        };
        let baseline = size * LINE_PITCH * row as f64
            + match layout.v_justify {
                VJustify::Top => size,
                VJustify::Center => size / 2.0,
                VJustify::Bottom => 0.0,
            };

        for ch in line.chars() {
            let glyph = glyphs.glyph(ch).unwrap_or_else(|| glyphs.fallback());
            for stroke in glyph.strokes() {
                for (index, &(gx, gy)) in stroke.iter().enumerate() {
                    let mut x = pen + gx * scale;
                    if layout.italic {
                        x += (cap - gy) * scale * ITALIC_SLANT;
                    }
                    let y = baseline + (gy - cap) * scale;
                    let (dx, dy) = layout.rotation.apply_f64((x, y));
                    let command = if index == 0 { 'M' } else { 'L' };
                    commands.push(format!(
                        "{command}{} {}",
                        Number(origin.0 + dx),
                        Number(origin.1 + dy)
                    ));
                }
            }
            pen += glyph.advance() * scale;
        }
    }
    commands.join(" ")
}

/// Draws `text` as a stroked path.
pub(crate) fn draw_text<W: Write>(
    canvas: &mut Canvas<'_, W>,
    at: Point,
    text: &str,
    layout: &TextLayout,
    class: &str,
    role: ColorRole,
) -> Result<()> {
    let d = text_path(canvas.glyphs(), at, text, layout);
    if d.is_empty() {
        return Ok(());
    }

    canvas.open("path", class, role)?;
    let writer = canvas.writer();
    writer.inherited_attribute("stroke-width", layout.stroke_width())?;
    writer.attribute("d", d)?;
    canvas.close("path")
}
