//! Per-kind drawing rules.
//!
//! The record kinds share their geometry and only differ in color, class,
//! width and text placement, so those differences live in lookup tables
//! here instead of in the drawing code.

use sch2svg_core::{
    color::ColorRole,
    geometry::{Point, Rotation},
};
use sch2svg_parser::records::{TextKind, WireKind};

pub(crate) const RIGHT: Point = Point::new(1, 0);
pub(crate) const UP: Point = Point::new(0, -1);
pub(crate) const LEFT: Point = Point::new(-1, 0);
pub(crate) const DOWN: Point = Point::new(0, 1);

/// Stroke settings of a line record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineStyle {
    pub role: ColorRole,
    pub class: &'static str,
    /// Multiple of the default stroke width.
    pub width_factor: u32,
    pub dash: Option<&'static str>,
}

pub(crate) fn line_style(kind: WireKind) -> LineStyle {
    match kind {
        WireKind::Wire => LineStyle {
            role: ColorRole::Wire,
            class: "wire",
            width_factor: 1,
            dash: None,
        },
        WireKind::Bus => LineStyle {
            role: ColorRole::Bus,
            class: "bus",
            width_factor: 2,
            dash: None,
        },
        WireKind::Notes => LineStyle {
            role: ColorRole::Notes,
            class: "notes",
            width_factor: 1,
            dash: Some("40,30"),
        },
    }
}

/// How the text of a text record is colored and placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextRule {
    pub role: ColorRole,
    pub class: &'static str,
    /// Direction the text extends from its position, per orientation code.
    pub extends: [Point; 4],
    /// Whether the text sits above the connection point rather than
    /// centered on it.
    pub raised: bool,
}

pub(crate) fn text_rule(kind: TextKind) -> TextRule {
    match kind {
        TextKind::Label => TextRule {
            role: ColorRole::Label,
            class: "label",
            extends: [RIGHT, UP, LEFT, DOWN],
            raised: true,
        },
        TextKind::Notes => TextRule {
            role: ColorRole::Notes,
            class: "notes",
            extends: [RIGHT, UP, LEFT, DOWN],
            raised: false,
        },
        TextKind::GlobalLabel => TextRule {
            role: ColorRole::GlobalLabel,
            class: "global-label",
            extends: [LEFT, UP, RIGHT, DOWN],
            raised: false,
        },
        TextKind::HierarchicalLabel => TextRule {
            role: ColorRole::HierarchicalLabel,
            class: "hierarchical-label",
            extends: [LEFT, UP, RIGHT, DOWN],
            raised: false,
        },
    }
}

/// Rotation that turns a shape drawn extending left into one extending in
/// `direction`.
pub(crate) fn rotation_from_left(direction: Point) -> Rotation {
    match direction {
        UP => Rotation::R270,
        RIGHT => Rotation::R180,
        DOWN => Rotation::R90,
        _ => Rotation::R0,
    }
}
