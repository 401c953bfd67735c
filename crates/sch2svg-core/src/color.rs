//! Color handling for rendered schematics
//!
//! [`Color`] wraps the `DynamicColor` type from the color crate and always
//! prints as a `#rrggbb` hex string. [`Palette`] maps every drawing role to a
//! color and can be overridden role by role from configuration.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{DynamicColor, Srgb};
use serde::Deserialize;

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a CSS color string such as "#ff0000",
    /// "rgb(255, 0, 0)" or "red".
    ///
    /// # Examples
    ///
    /// ```
    /// use sch2svg_core::color::Color;
    ///
    /// let green = Color::new("#008400").unwrap();
    /// assert_eq!(green.to_string(), "#008400");
    /// assert_eq!(Color::new("blue").unwrap().to_string(), "#0000ff");
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    fn builtin(hex: &str) -> Self {
        Self::new(hex).expect("built-in palette colors are valid hex colors")
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::builtin("#000000")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        write!(f, "#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    }
}

/// A drawing role that carries its own color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorRole {
    Wire,
    Bus,
    Notes,
    Junction,
    NoConnect,
    Label,
    GlobalLabel,
    HierarchicalLabel,
    Sheet,
    SheetName,
    SheetFile,
    SheetPin,
    Body,
    BodyFill,
    Pin,
    PinName,
    PinNumber,
    Reference,
    Value,
    Field,
}

const ROLE_COUNT: usize = 20;

impl ColorRole {
    const ALL: [ColorRole; ROLE_COUNT] = [
        Self::Wire,
        Self::Bus,
        Self::Notes,
        Self::Junction,
        Self::NoConnect,
        Self::Label,
        Self::GlobalLabel,
        Self::HierarchicalLabel,
        Self::Sheet,
        Self::SheetName,
        Self::SheetFile,
        Self::SheetPin,
        Self::Body,
        Self::BodyFill,
        Self::Pin,
        Self::PinName,
        Self::PinNumber,
        Self::Reference,
        Self::Value,
        Self::Field,
    ];

    /// Returns the configuration name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wire => "wire",
            Self::Bus => "bus",
            Self::Notes => "notes",
            Self::Junction => "junction",
            Self::NoConnect => "no-connect",
            Self::Label => "label",
            Self::GlobalLabel => "global-label",
            Self::HierarchicalLabel => "hierarchical-label",
            Self::Sheet => "sheet",
            Self::SheetName => "sheet-name",
            Self::SheetFile => "sheet-file",
            Self::SheetPin => "sheet-pin",
            Self::Body => "body",
            Self::BodyFill => "body-fill",
            Self::Pin => "pin",
            Self::PinName => "pin-name",
            Self::PinNumber => "pin-number",
            Self::Reference => "reference",
            Self::Value => "value",
            Self::Field => "field",
        }
    }

    fn default_hex(self) -> &'static str {
        match self {
            Self::Wire | Self::Junction => "#008400",
            Self::Bus | Self::Notes | Self::NoConnect => "#000084",
            Self::Label => "#000000",
            Self::GlobalLabel | Self::Body | Self::Pin | Self::PinNumber => "#840000",
            Self::HierarchicalLabel | Self::SheetFile | Self::SheetPin => "#848400",
            Self::Sheet => "#840084",
            Self::SheetName | Self::PinName | Self::Reference | Self::Value => "#008484",
            Self::BodyFill => "#ffffc2",
            Self::Field => "#848484",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for ColorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown color role `{s}`"))
    }
}

impl fmt::Display for ColorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colors for every [`ColorRole`].
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: [Color; ROLE_COUNT],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: ColorRole::ALL.map(|role| Color::builtin(role.default_hex())),
        }
    }
}

impl Palette {
    /// Returns the color of a role.
    pub fn get(&self, role: ColorRole) -> Color {
        self.colors[role.index()]
    }

    /// Overrides the color of a role.
    pub fn set(&mut self, role: ColorRole, color: Color) {
        self.colors[role.index()] = color;
    }

    /// Returns the palette with one role overridden.
    pub fn with(mut self, role: ColorRole, color: Color) -> Self {
        self.set(role, color);
        self
    }
}
