//! Records produced by the schematic and library readers.
//!
//! Records are plain data. Coordinates are integer mils. Schematic
//! coordinates grow downwards; library coordinates grow upwards and are
//! mapped onto the sheet by a placement's [`Transform`].

use sch2svg_core::geometry::{Point, Transform};

use crate::tokens::Keyword;

macro_rules! keywords {
    ($name:ident, $expected:literal, { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl Keyword for $name {
            const EXPECTED: &'static str = $expected;

            fn from_keyword(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

/// A record of the schematic file.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Libraries(Vec<String>),
    Page(PageDescription),
    Wire(Wire),
    BusEntry(BusEntry),
    Connection(Point),
    NoConnection(Point),
    Text(TextRecord),
    Sheet(Sheet),
    Placement(Placement),
}

/// The `$Descr` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescription {
    pub paper: String,
    pub width: i32,
    pub height: i32,
    pub portrait: bool,
    /// Empty when the document has no title.
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    Wire,
    Bus,
    Notes,
}

keywords!(WireKind, "`Wire`, `Bus` or `Notes`", {
    "Wire" => Wire,
    "Bus" => Bus,
    "Notes" => Notes,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire {
    pub kind: WireKind,
    pub start: Point,
    pub end: Point,
}

/// A diagonal stub joining a wire or a bus to a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusEntry {
    /// `true` for `Entry Bus Bus`, `false` for `Entry Wire Line`.
    pub bus: bool,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    Label,
    GlobalLabel,
    HierarchicalLabel,
    Notes,
}

keywords!(TextKind, "`Label`, `GLabel`, `HLabel` or `Notes`", {
    "Label" => Label,
    "GLabel" => GlobalLabel,
    "HLabel" => HierarchicalLabel,
    "Notes" => Notes,
});

/// Electrical direction of a global or hierarchical label or a sheet pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LabelShape {
    Input,
    Output,
    Bidirectional,
    TriState,
    #[default]
    Unspecified,
}

keywords!(LabelShape, "`Input`, `Output`, `BiDi`, `3State` or `UnSpc`", {
    "Input" => Input,
    "Output" => Output,
    "BiDi" => Bidirectional,
    "3State" => TriState,
    "UnSpc" => Unspecified,
});

impl LabelShape {
    /// Parses the single-letter code used by sheet pins.
    pub fn from_sheet_code(code: &str) -> Option<Self> {
        match code {
            "I" => Some(LabelShape::Input),
            "O" => Some(LabelShape::Output),
            "B" => Some(LabelShape::Bidirectional),
            "T" => Some(LabelShape::TriState),
            "U" => Some(LabelShape::Unspecified),
            _ => None,
        }
    }

    /// The shape seen from the other side of a sheet boundary.
    pub fn swapped(self) -> Self {
        match self {
            LabelShape::Input => LabelShape::Output,
            LabelShape::Output => LabelShape::Input,
            other => other,
        }
    }
}

/// A `Text` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub kind: TextKind,
    pub position: Point,
    /// Quarter turns, `0..=3`.
    pub orientation: u8,
    pub size: i32,
    pub shape: LabelShape,
    pub italic: bool,
    /// Zero means the document default.
    pub thickness: i32,
    /// Literal `\n` sequences are already split into line breaks.
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetSide {
    Left,
    Right,
    Top,
    Bottom,
}

keywords!(SheetSide, "`L`, `R`, `T` or `B`", {
    "L" => Left,
    "R" => Right,
    "T" => Top,
    "B" => Bottom,
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetText {
    pub text: String,
    pub size: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPin {
    pub name: String,
    pub shape: LabelShape,
    pub side: SheetSide,
    pub position: Point,
    pub size: i32,
}

/// A `$Sheet` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub position: Point,
    pub width: i32,
    pub height: i32,
    pub timestamp: Option<u32>,
    pub name: Option<SheetText>,
    pub file: Option<SheetText>,
    pub pins: Vec<SheetPin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextOrientation {
    #[default]
    Horizontal,
    Vertical,
}

keywords!(TextOrientation, "`H` or `V`", {
    "H" => Horizontal,
    "V" => Vertical,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HJustify {
    Left,
    #[default]
    Center,
    Right,
}

keywords!(HJustify, "`L`, `C` or `R`", {
    "L" => Left,
    "C" => Center,
    "R" => Right,
});

impl HJustify {
    pub fn flipped(self) -> Self {
        match self {
            HJustify::Left => HJustify::Right,
            HJustify::Center => HJustify::Center,
            HJustify::Right => HJustify::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VJustify {
    Top,
    #[default]
    Center,
    Bottom,
}

impl VJustify {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'T' => Some(VJustify::Top),
            'C' => Some(VJustify::Center),
            'B' => Some(VJustify::Bottom),
            _ => None,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            VJustify::Top => VJustify::Bottom,
            VJustify::Center => VJustify::Center,
            VJustify::Bottom => VJustify::Top,
        }
    }
}

/// A text field of a placement or of a library symbol.
///
/// Index 0 is the reference, 1 the value, 2 the footprint and 3 the
/// datasheet. Higher indices are user fields and carry a `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub index: u32,
    pub text: String,
    pub orientation: TextOrientation,
    /// Absolute for placement fields, relative to the symbol origin for
    /// library fields.
    pub position: Point,
    pub size: i32,
    pub hidden: bool,
    pub h_justify: HJustify,
    pub v_justify: VJustify,
    pub italic: bool,
    pub bold: bool,
    pub name: Option<String>,
}

/// A `$Comp` block: one instance of a library symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub symbol: String,
    pub reference: String,
    pub unit: u32,
    pub convert: u32,
    pub timestamp: Option<u32>,
    pub position: Point,
    pub transform: Transform,
    pub fields: Vec<Field>,
}

impl Placement {
    /// Whether a library item drawn for `unit`/`convert` belongs to this
    /// placement. Zero on the item matches every unit or convert.
    pub fn selects(&self, unit: u32, convert: u32) -> bool {
        (unit == 0 || unit == self.unit) && (convert == 0 || convert == self.convert)
    }
}

/// A `DEF` ... `ENDDEF` block of the cache library.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Symbol {
    pub name: String,
    pub aliases: Vec<String>,
    pub reference: String,
    pub pin_name_offset: i32,
    pub show_pin_numbers: bool,
    pub show_pin_names: bool,
    pub unit_count: u32,
    pub units_locked: bool,
    pub power: bool,
    pub fields: Vec<Field>,
    pub primitives: Vec<Primitive>,
}

impl Symbol {
    /// The DEF name followed by the aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn is_multi_unit(&self) -> bool {
        self.unit_count > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fill {
    #[default]
    None,
    /// Filled with the outline colour.
    Foreground,
    /// Filled with the body background colour.
    Background,
}

keywords!(Fill, "`N`, `F` or `f`", {
    "N" => None,
    "F" => Foreground,
    "f" => Background,
});

/// Unit, convert, line width and fill shared by every drawing primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStyle {
    pub unit: u32,
    pub convert: u32,
    pub width: i32,
    pub fill: Fill,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rectangle {
        style: DrawStyle,
        start: Point,
        end: Point,
    },
    Circle {
        style: DrawStyle,
        center: Point,
        radius: i32,
    },
    Polyline {
        style: DrawStyle,
        points: Vec<Point>,
    },
    Bezier {
        style: DrawStyle,
        points: Vec<Point>,
    },
    Arc(Arc),
    Text(SymbolText),
    Pin(Pin),
}

impl Primitive {
    pub fn style(&self) -> DrawStyle {
        match self {
            Primitive::Rectangle { style, .. }
            | Primitive::Circle { style, .. }
            | Primitive::Polyline { style, .. }
            | Primitive::Bezier { style, .. } => *style,
            Primitive::Arc(arc) => arc.style,
            Primitive::Text(text) => text.style,
            Primitive::Pin(pin) => pin.style,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    pub style: DrawStyle,
    pub center: Point,
    pub radius: i32,
    /// Tenths of a degree, counter-clockwise in library space.
    pub start_angle: i32,
    pub end_angle: i32,
    pub start: Point,
    pub end: Point,
}

/// A `T` line inside `DRAW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolText {
    pub style: DrawStyle,
    /// Tenths of a degree.
    pub angle: i32,
    pub position: Point,
    pub size: i32,
    pub hidden: bool,
    pub text: String,
    pub italic: bool,
    pub bold: bool,
    pub h_justify: HJustify,
    pub v_justify: VJustify,
}

/// Direction a pin extends in from its connection point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinDirection {
    Up,
    Down,
    Left,
    Right,
}

keywords!(PinDirection, "`U`, `D`, `L` or `R`", {
    "U" => Up,
    "D" => Down,
    "L" => Left,
    "R" => Right,
});

impl PinDirection {
    /// Unit vector in library space.
    pub fn unit(self) -> Point {
        match self {
            PinDirection::Up => Point::new(0, 1),
            PinDirection::Down => Point::new(0, -1),
            PinDirection::Left => Point::new(-1, 0),
            PinDirection::Right => Point::new(1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, PinDirection::Left | PinDirection::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElectricalType {
    Input,
    Output,
    Bidirectional,
    TriState,
    Passive,
    Unspecified,
    PowerInput,
    PowerOutput,
    OpenCollector,
    OpenEmitter,
    NotConnected,
}

keywords!(ElectricalType, "an electrical type (`I`, `O`, `B`, `T`, `P`, `U`, `W`, `w`, `C`, `E` or `N`)", {
    "I" => Input,
    "O" => Output,
    "B" => Bidirectional,
    "T" => TriState,
    "P" => Passive,
    "U" => Unspecified,
    "W" => PowerInput,
    "w" => PowerOutput,
    "C" => OpenCollector,
    "E" => OpenEmitter,
    "N" => NotConnected,
});

/// Pin graphic decorations, parsed from the optional shape atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PinDecorations {
    pub inverted: bool,
    pub clock: bool,
    pub low_input: bool,
    pub low_output: bool,
    pub falling_edge: bool,
    pub non_logic: bool,
}

/// An `X` line inside `DRAW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub style: DrawStyle,
    pub name: String,
    pub number: String,
    /// The connection point.
    pub position: Point,
    pub length: i32,
    pub direction: PinDirection,
    pub name_size: i32,
    pub number_size: i32,
    pub electrical: ElectricalType,
    pub hidden: bool,
    pub decorations: PinDecorations,
}

impl Pin {
    /// The end of the pin that touches the symbol body.
    pub fn body_end(&self) -> Point {
        self.position + self.direction.unit() * self.length
    }
}
