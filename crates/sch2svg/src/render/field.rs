//! Placement fields: reference, value and the user fields.
//!
//! Fields are drawn after the library pass because the reference of a
//! multi-unit symbol gets a unit letter, and only the library knows the
//! unit count.

use std::io::Write;

use log::trace;

use sch2svg_core::{color::ColorRole, geometry::Rotation, writer::Result};
use sch2svg_parser::records::{Field, Placement, TextOrientation};

use super::{
    Canvas,
    text::{TextLayout, draw_text},
};
use crate::config::FieldVisibility;

/// `A` for unit 1, `B` for unit 2 and so on up to `Z`. Units past 26 fall
/// back to the number behind an underscore, `_27`.
fn unit_suffix(unit: u32) -> String {
    match u8::try_from(unit.saturating_sub(1)) {
        Ok(offset @ 0..=25) => char::from(b'A' + offset).to_string(),
        _ => format!("_{unit}"),
    }
}

/// The text drawn for a field, or `None` when nothing is drawn.
fn display_text(placement: &Placement, field: &Field, multi_unit: bool) -> Option<String> {
    if field.text.is_empty() || field.text == "~" {
        return None;
    }
    if field.index == 0 && multi_unit {
        return Some(format!("{}{}", field.text, unit_suffix(placement.unit)));
    }
    Some(field.text.clone())
}

fn role(index: u32) -> (ColorRole, &'static str) {
    match index {
        0 => (ColorRole::Reference, "reference"),
        1 => (ColorRole::Value, "value"),
        _ => (ColorRole::Field, "field"),
    }
}

pub(crate) fn draw_fields<W: Write>(canvas: &mut Canvas<'_, W>, placement: &Placement, multi_unit: bool) -> Result<()> {
    for field in &placement.fields {
        let visible = match canvas.config().field_visibility(field.index) {
            FieldVisibility::Default => !field.hidden,
            FieldVisibility::Show => true,
            FieldVisibility::Hide => false,
        };
        if !visible {
            continue;
        }
        let Some(text) = display_text(placement, field, multi_unit) else {
            continue;
        };

        // Offsets are stored unrotated with Y pointing down.
        let at = placement.position + placement.transform.apply_to_field(field.position - placement.position);
        let degrees = placement.transform.angle()
            + match field.orientation {
                TextOrientation::Horizontal => 0,
                TextOrientation::Vertical => 90,
            };
        let (rotation, h_justify, v_justify) =
            TextLayout::readable(Rotation::from_degrees(degrees), field.h_justify, field.v_justify);
        let layout = TextLayout::new(field.size, rotation, h_justify.into(), v_justify)
            .with_italic(field.italic)
            .with_bold(field.bold);

        trace!(reference = placement.reference.as_str(), index = field.index; "Drawing field");
        let (role, class) = role(field.index);
        draw_text(canvas, at, &text, &layout, class, role)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sch2svg_core::geometry::{Point, Transform};
    use sch2svg_parser::records::{HJustify, VJustify};

    use super::*;
    use crate::{
        config::{FieldOverride, RenderConfig},
        render::testing,
    };

    fn field(index: u32, text: &str, hidden: bool) -> Field {
        Field {
            index,
            text: text.to_string(),
            orientation: TextOrientation::Horizontal,
            position: Point::new(1100, 950),
            size: 50,
            hidden,
            h_justify: HJustify::Left,
            v_justify: VJustify::Center,
            italic: false,
            bold: false,
            name: None,
        }
    }

    fn placement(unit: u32, transform: Transform, fields: Vec<Field>) -> Placement {
        Placement {
            symbol: "74LS00".to_string(),
            reference: "U1".to_string(),
            unit,
            convert: 1,
            timestamp: None,
            position: Point::new(1000, 1000),
            transform,
            fields,
        }
    }

    #[test]
    fn test_unit_letters() {
        assert_eq!(unit_suffix(1), "A");
        assert_eq!(unit_suffix(4), "D");
        assert_eq!(unit_suffix(0), "A");
        assert_eq!(unit_suffix(26), "Z");
    }

    #[test]
    fn test_reference_gets_unit_letter_only_for_multi_unit_symbols() {
        let placement = placement(2, Transform::default(), vec![field(0, "U1", false), field(1, "74LS00", false)]);
        assert_eq!(display_text(&placement, &placement.fields[0], true).as_deref(), Some("U1B"));
        assert_eq!(display_text(&placement, &placement.fields[1], true).as_deref(), Some("74LS00"));
        assert_eq!(display_text(&placement, &placement.fields[0], false).as_deref(), Some("U1"));
    }

    #[test]
    fn test_units_past_z_use_a_numeric_suffix() {
        assert_eq!(unit_suffix(27), "_27");
        assert_eq!(unit_suffix(300), "_300");
        let placement = placement(27, Transform::default(), vec![field(0, "U1", false)]);
        assert_eq!(display_text(&placement, &placement.fields[0], true).as_deref(), Some("U1_27"));
    }

    #[test]
    fn test_empty_and_tilde_fields_are_skipped() {
        let placement = placement(1, Transform::default(), vec![field(2, "", false), field(3, "~", false)]);
        assert!(display_text(&placement, &placement.fields[0], false).is_none());
        assert!(display_text(&placement, &placement.fields[1], false).is_none());
    }

    #[test]
    fn test_visibility_overrides() {
        let placement = placement(1, Transform::default(), vec![field(0, "U1", false), field(2, "DIP-14", true)]);
        let count = |config: &RenderConfig| {
            testing::draw(config, |canvas| draw_fields(canvas, &placement, false)).matches("<path").count()
        };

        assert_eq!(count(&RenderConfig::default()), 1);
        let shown = RenderConfig::default().with_field(FieldOverride::new(2, FieldVisibility::Show));
        assert_eq!(count(&shown), 2);
        let hidden = RenderConfig::default().with_field(FieldOverride::new(0, FieldVisibility::Hide));
        assert_eq!(count(&hidden), 0);
    }

    #[test]
    fn test_field_follows_rotated_placement() {
        // Rotated a quarter turn counter-clockwise, a field 100 mils to the
        // right of the placement ends up 100 mils above it.
        let transform = Transform::new(0, -1, -1, 0);
        let placement = placement(1, transform, vec![field(1, "I", false)]);
        let at = placement.position + transform.apply_to_field(placement.fields[0].position - placement.position);
        assert_eq!(at, Point::new(950, 900));
        assert_eq!(transform.angle(), 90);

        let svg = testing::draw(&RenderConfig::default(), |canvas| draw_fields(canvas, &placement, false));
        assert!(svg.contains("<path"));
    }
}
