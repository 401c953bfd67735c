//! Configuration types for schematic rendering.
//!
//! All types implement [`serde::Deserialize`] so the whole tree can be read
//! from a TOML file. Every field has a default, so an empty file is a valid
//! configuration.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining render and style settings.
//! - [`RenderConfig`] - Output options and visibility rules.
//! - [`StyleConfig`] - Per-role color overrides.
//!
//! # Example
//!
//! ```
//! # use sch2svg::config::{AppConfig, HiddenPins};
//! let config = AppConfig::default();
//! assert_eq!(config.render().hidden_pins(), HiddenPins::Hide);
//! assert!(config.style().palette().is_ok());
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use sch2svg_core::{
    color::{Color, ColorRole, Palette},
    writer::WriterOptions,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Render configuration section.
    #[serde(default)]
    render: RenderConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    pub fn new(render: RenderConfig, style: StyleConfig) -> Self {
        Self { render, style }
    }

    /// Returns the render configuration.
    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Returns the render configuration for in-place overrides.
    pub fn render_mut(&mut self) -> &mut RenderConfig {
        &mut self.render
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// How pins flagged as hidden in the library are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HiddenPins {
    #[default]
    Hide,
    Show,
    /// Show a hidden pin only when a wire ends on its tip or a no-connect
    /// flag sits on it.
    ShowIfWireConnected,
}

/// Visibility override for one field index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldVisibility {
    /// Follow the field's own hidden flag.
    #[default]
    Default,
    Show,
    Hide,
}

/// A visibility rule for every placement field with the given index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FieldOverride {
    index: u32,
    #[serde(default)]
    visibility: FieldVisibility,
}

impl FieldOverride {
    pub fn new(index: u32, visibility: FieldVisibility) -> Self {
        Self { index, visibility }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn visibility(&self) -> FieldVisibility {
        self.visibility
    }
}

/// Output options and visibility rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    css_classes: bool,
    hidden_pins: HiddenPins,
    pin_numbers: bool,
    pretty: bool,
    default_stroke_width: u32,
    annotate_errors: bool,
    fields: Vec<FieldOverride>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            css_classes: false,
            hidden_pins: HiddenPins::default(),
            pin_numbers: true,
            pretty: false,
            default_stroke_width: 6,
            annotate_errors: false,
            fields: Vec::new(),
        }
    }
}

impl RenderConfig {
    /// Whether elements carry a `class` attribute.
    pub fn css_classes(&self) -> bool {
        self.css_classes
    }

    pub fn hidden_pins(&self) -> HiddenPins {
        self.hidden_pins
    }

    /// Whether pin numbers are drawn for symbols that show them.
    pub fn pin_numbers(&self) -> bool {
        self.pin_numbers
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }

    /// Stroke width in mils used where the document says `0`.
    pub fn default_stroke_width(&self) -> u32 {
        self.default_stroke_width
    }

    /// Whether a format error turns into a comment in the still-open output
    /// instead of failing the render.
    pub fn annotate_errors(&self) -> bool {
        self.annotate_errors
    }

    pub fn fields(&self) -> &[FieldOverride] {
        &self.fields
    }

    /// Returns the visibility rule for a field index.
    pub fn field_visibility(&self, index: u32) -> FieldVisibility {
        self.fields
            .iter()
            .rev()
            .find(|rule| rule.index == index)
            .map_or(FieldVisibility::Default, |rule| rule.visibility)
    }

    pub fn with_css_classes(mut self, enabled: bool) -> Self {
        self.css_classes = enabled;
        self
    }

    pub fn with_hidden_pins(mut self, mode: HiddenPins) -> Self {
        self.hidden_pins = mode;
        self
    }

    pub fn with_pin_numbers(mut self, enabled: bool) -> Self {
        self.pin_numbers = enabled;
        self
    }

    pub fn with_pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    pub fn with_default_stroke_width(mut self, width: u32) -> Self {
        self.default_stroke_width = width;
        self
    }

    pub fn with_annotate_errors(mut self, enabled: bool) -> Self {
        self.annotate_errors = enabled;
        self
    }

    pub fn with_field(mut self, rule: FieldOverride) -> Self {
        self.fields.push(rule);
        self
    }

    pub(crate) fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            default_stroke_width: self.default_stroke_width,
            css_classes: self.css_classes,
            pretty: self.pretty,
        }
    }
}

/// Per-role color overrides.
///
/// Keys are role names such as `wire` or `body-fill`, values are CSS color
/// strings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    colors: BTreeMap<String, String>,
}

impl StyleConfig {
    pub fn with_color(mut self, role: &str, color: &str) -> Self {
        self.colors.insert(role.to_string(), color.to_string());
        self
    }

    /// Builds the palette: the defaults with every configured role replaced.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unknown role or unparsable color.
    pub fn palette(&self) -> Result<Palette, String> {
        let mut palette = Palette::default();
        for (role, color) in &self.colors {
            let role: ColorRole = role.parse().map_err(|err| format!("Invalid style color in config: {err}"))?;
            let color = Color::new(color).map_err(|err| format!("Invalid `{role}` color in config: {err}"))?;
            palette.set(role, color);
        }
        Ok(palette)
    }
}
