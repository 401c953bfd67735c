//! Labels and free text.
//!
//! Orientation codes `0..=3` select one of four directions the text grows
//! from its position (see [`TextRule::extends`]). The text itself is only
//! ever drawn horizontally or reading upwards; an anchor at its end makes
//! it grow the other way.

use std::io::Write;

use sch2svg_core::{
    color::ColorRole,
    geometry::{Point, Rotation},
    writer::Result,
};
use sch2svg_parser::records::{LabelShape, TextKind, TextRecord, VJustify};

use super::{
    Canvas,
    style::{TextRule, rotation_from_left, text_rule},
    text::{Anchor, TextLayout, draw_text, text_width},
};

/// Gap between a label and the wire it sits on.
const LABEL_LIFT: i32 = 10;

/// Smallest half-height of a hierarchical arrow or global flag.
const MIN_HALF_HEIGHT: i32 = 15;

/// Arrow outlines in halves of the text size, drawn for a label that
/// extends to the left of its position.
const ARROW_INPUT: &[(i32, i32)] = &[(0, 0), (-1, -1), (-2, -1), (-2, 1), (-1, 1), (0, 0)];
const ARROW_OUTPUT: &[(i32, i32)] = &[(-2, 0), (-1, -1), (0, -1), (0, 1), (-1, 1), (-2, 0)];
const ARROW_UNSPECIFIED: &[(i32, i32)] = &[(0, -1), (-2, -1), (-2, 1), (0, 1), (0, -1)];
const ARROW_BIDIRECTIONAL: &[(i32, i32)] = &[(0, 0), (-1, -1), (-2, 0), (-1, 1), (0, 0)];

fn arrow_template(shape: LabelShape) -> &'static [(i32, i32)] {
    match shape {
        LabelShape::Input => ARROW_INPUT,
        LabelShape::Output => ARROW_OUTPUT,
        LabelShape::Bidirectional | LabelShape::TriState => ARROW_BIDIRECTIONAL,
        LabelShape::Unspecified => ARROW_UNSPECIFIED,
    }
}

fn text_rotation(orientation: u8) -> Rotation {
    if orientation % 2 == 1 { Rotation::R90 } else { Rotation::R0 }
}

fn half_height(size: i32) -> i32 {
    (size / 2).max(MIN_HALF_HEIGHT)
}

pub(crate) fn draw_text_record<W: Write>(canvas: &mut Canvas<'_, W>, record: &TextRecord) -> Result<()> {
    let rule = text_rule(record.kind);
    match record.kind {
        TextKind::Label | TextKind::Notes => draw_plain(canvas, record, &rule),
        TextKind::HierarchicalLabel => {
            let label = HierarchicalLabel {
                at: record.position,
                orientation: record.orientation,
                size: record.size,
                shape: record.shape,
                thickness: record.thickness,
                italic: record.italic,
                text: &record.text,
            };
            draw_hierarchical(canvas, &label, rule.role, rule.class)
        }
        TextKind::GlobalLabel => draw_global(canvas, record, &rule),
    }
}

fn draw_plain<W: Write>(canvas: &mut Canvas<'_, W>, record: &TextRecord, rule: &TextRule) -> Result<()> {
    let rotation = text_rotation(record.orientation);
    let extends = rule.extends[usize::from(record.orientation % 4)];
    let lift = if rule.raised { LABEL_LIFT } else { 0 };
    let at = record.position + rotation.apply(Point::new(0, -lift));

    let layout = TextLayout::new(record.size, rotation, Anchor::extending(rotation, extends), VJustify::Bottom)
        .with_italic(record.italic)
        .with_thickness(record.thickness);
    draw_text(canvas, at, &record.text, &layout, rule.class, rule.role)
}

/// A hierarchical label or a sheet pin.
pub(crate) struct HierarchicalLabel<'a> {
    pub at: Point,
    pub orientation: u8,
    pub size: i32,
    pub shape: LabelShape,
    pub thickness: i32,
    pub italic: bool,
    pub text: &'a str,
}

/// Draws the arrow and the text behind it.
pub(crate) fn draw_hierarchical<W: Write>(
    canvas: &mut Canvas<'_, W>,
    label: &HierarchicalLabel<'_>,
    role: ColorRole,
    class: &str,
) -> Result<()> {
    let rule = text_rule(TextKind::HierarchicalLabel);
    let extends = rule.extends[usize::from(label.orientation % 4)];
    let turn = rotation_from_left(extends);
    let half = half_height(label.size);

    let points = arrow_template(label.shape)
        .iter()
        .map(|&(x, y)| label.at + turn.apply(Point::new(x * half, y * half)));

    canvas.open("g", class, role)?;
    canvas.writer().inherited_attribute("stroke-width", label.thickness)?;
    canvas.polyline(points)?;

    let rotation = text_rotation(label.orientation);
    let at = label.at + extends * (2 * half + label.size / 4);
    let layout = TextLayout::new(label.size, rotation, Anchor::extending(rotation, extends), VJustify::Center)
        .with_italic(label.italic)
        .with_thickness(label.thickness);
    draw_text(canvas, at, label.text, &layout, "label-text", role)?;
    canvas.close("g")
}

/// Draws the flag outline and the text inside it.
fn draw_global<W: Write>(canvas: &mut Canvas<'_, W>, record: &TextRecord, rule: &TextRule) -> Result<()> {
    let extends = rule.extends[usize::from(record.orientation % 4)];
    let across = Point::new(-extends.y(), extends.x());
    let half = half_height(record.size);
    let margin = record.size / 4;
    let length = text_width(canvas.glyphs(), &record.text, record.size).round() as i32;

    let (near_tip, far_tip) = match record.shape {
        LabelShape::Input => (true, false),
        LabelShape::Output => (false, true),
        LabelShape::Bidirectional | LabelShape::TriState => (true, true),
        LabelShape::Unspecified => (false, false),
    };
    let body_start = if near_tip { half } else { 0 };
    let body_end = body_start + 2 * margin + length;

    let mut outline = vec![(body_start, -half), (body_end, -half)];
    if far_tip {
        outline.push((body_end + half, 0));
    }
    outline.extend([(body_end, half), (body_start, half)]);
    if near_tip {
        outline.push((0, 0));
    }
    outline.push((body_start, -half));
    let points = outline
        .into_iter()
        .map(|(along, side)| record.position + extends * along + across * side);

    canvas.open("g", rule.class, rule.role)?;
    canvas.writer().inherited_attribute("stroke-width", record.thickness)?;
    canvas.polyline(points)?;

    let rotation = text_rotation(record.orientation);
    let at = record.position + extends * (body_start + margin);
    let layout = TextLayout::new(record.size, rotation, Anchor::extending(rotation, extends), VJustify::Center)
        .with_italic(record.italic)
        .with_thickness(record.thickness);
    draw_text(canvas, at, &record.text, &layout, "label-text", rule.role)?;
    canvas.close("g")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RenderConfig, render::testing};

    fn record(kind: TextKind, orientation: u8, shape: LabelShape) -> TextRecord {
        TextRecord {
            kind,
            position: Point::new(1000, 1000),
            orientation,
            size: 60,
            shape,
            italic: false,
            thickness: 0,
            text: "IN".to_string(),
        }
    }

    fn polyline_points(svg: &str) -> Vec<(i32, i32)> {
        let start = svg.find("points=\"").unwrap() + "points=\"".len();
        let end = start + svg[start..].find('"').unwrap();
        svg[start..end]
            .split(' ')
            .map(|pair| {
                let (x, y) = pair.split_once(',').unwrap();
                (x.parse().unwrap(), y.parse().unwrap())
            })
            .collect()
    }

    fn render(record: &TextRecord) -> String {
        testing::draw(&RenderConfig::default(), |canvas| draw_text_record(canvas, record))
    }

    #[test]
    fn test_input_arrow_points_at_the_connection() {
        let svg = render(&record(TextKind::HierarchicalLabel, 0, LabelShape::Input));
        assert_eq!(
            polyline_points(&svg),
            vec![(1000, 1000), (970, 970), (940, 970), (940, 1030), (970, 1030), (1000, 1000)]
        );
    }

    #[test]
    fn test_arrow_turns_with_orientation() {
        // Orientation 2 extends to the right.
        let svg = render(&record(TextKind::HierarchicalLabel, 2, LabelShape::Output));
        assert_eq!(polyline_points(&svg)[0], (1060, 1000));

        // Orientation 3 extends downwards.
        let svg = render(&record(TextKind::HierarchicalLabel, 3, LabelShape::Output));
        assert_eq!(polyline_points(&svg)[0], (1000, 1060));
    }

    #[test]
    fn test_small_text_keeps_minimum_arrow() {
        let mut small = record(TextKind::HierarchicalLabel, 0, LabelShape::Unspecified);
        small.size = 10;
        let svg = render(&small);
        assert_eq!(polyline_points(&svg)[1], (970, 985));
    }

    #[test]
    fn test_global_label_outline_is_closed() {
        let svg = render(&record(TextKind::GlobalLabel, 0, LabelShape::Bidirectional));
        let points = polyline_points(&svg);
        assert_eq!(points.first(), points.last());
        // Both ends are pointed; the near tip is the connection point.
        assert!(points.contains(&(1000, 1000)));
        assert!(points.iter().all(|&(x, _)| x <= 1000));
    }

    #[test]
    fn test_label_text_is_raised_above_the_wire() {
        let svg = render(&record(TextKind::Label, 0, LabelShape::Unspecified));
        // Every pen position is above the lifted baseline.
        let d_start = svg.find("d=\"").unwrap() + 3;
        let d_end = d_start + svg[d_start..].find('"').unwrap();
        let ys: Vec<f64> = svg[d_start..d_end]
            .split(' ')
            .skip(1)
            .step_by(2)
            .map(|y| y.parse().unwrap())
            .collect();
        assert!(ys.iter().all(|&y| y <= f64::from(1000 - LABEL_LIFT)));
    }

    #[test]
    fn test_label_colors_follow_kind() {
        let svg = render(&record(TextKind::Notes, 0, LabelShape::Unspecified));
        assert!(svg.contains(r##"stroke="#000084""##));

        let svg = render(&record(TextKind::HierarchicalLabel, 0, LabelShape::Input));
        assert!(svg.contains(r##"stroke="#848400""##));
    }
}
