//! Reader for `EESchema-LIBRARY Version 2.x` component libraries.
//!
//! A library is a sequence of `DEF` ... `ENDDEF` blocks. Lines starting
//! with `#` are comments. [`LibraryReader::next_symbol`] yields one complete
//! [`Symbol`] at a time, so a caller can draw everything that uses a symbol
//! before the next one is parsed.

use std::sync::Arc;

use log::{debug, trace};
use sch2svg_core::geometry::Point;

use crate::{
    error::{ErrorCode, Result},
    records::{
        Arc as ArcPrimitive, DrawStyle, ElectricalType, Field, Fill, HJustify, Pin, PinDecorations, PinDirection,
        Primitive, Symbol, SymbolText, TextOrientation, VJustify,
    },
    schematic::{field_index, read_escaped_text, read_field_tail},
    tokenizer::Tokenizer,
    tokens::{Token, TokenKind},
};

const PRIMITIVE_KEYWORDS: &str = "a drawing primitive (`S`, `C`, `P`, `B`, `A`, `T` or `X`) or `ENDDRAW`";
const SYMBOL_KEYWORDS: &str = "`F<n>`, `ALIAS`, `$FPLIST`, `DRAW` or `ENDDEF`";

/// Incremental reader over one library document.
pub struct LibraryReader<'src> {
    tokens: Tokenizer<'src>,
    version: String,
}

impl<'src> LibraryReader<'src> {
    /// Reads and checks the header line.
    pub fn new(src: &'src str, source_id: impl Into<Arc<str>>) -> Result<Self> {
        let mut tokens = Tokenizer::new(src, source_id);
        tokens.skip_empty_lines()?;
        tokens.expect("EESchema-LIBRARY")?;
        tokens.expect("Version")?;

        let version = tokens.read_atom()?;
        if version.text().split('.').next() != Some("2") {
            return Err(version.error(
                ErrorCode::E104,
                format!("unsupported library version {}, expected version 2.x", version.text()),
            ));
        }
        tokens.skip_until_after_line_break();

        let version = version.into_text();
        debug!(version = version.as_str(); "Read library header");
        Ok(Self { tokens, version })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Reads the next symbol, or `None` at the end of the library.
    pub fn next_symbol(&mut self) -> Result<Option<Symbol>> {
        loop {
            self.tokens.skip_empty_lines()?;
            let next = self.tokens.peek()?;
            if next.kind() == TokenKind::EndOfFile {
                return Ok(None);
            }
            if next.kind() == TokenKind::Atom && next.text().starts_with('#') {
                self.tokens.skip_until_after_line_break();
                continue;
            }

            let keyword = self.tokens.read()?;
            if !keyword.is_atom("DEF") {
                return Err(keyword.unexpected("`DEF`"));
            }
            let symbol = parse_symbol(&mut self.tokens)?;
            debug!(
                name = symbol.name.as_str(),
                aliases = symbol.aliases.len(),
                primitives = symbol.primitives.len();
                "Read library symbol"
            );
            return Ok(Some(symbol));
        }
    }
}

/// Parses a symbol after its `DEF` keyword, up to and including `ENDDEF`.
pub fn parse_symbol(tokens: &mut Tokenizer<'_>) -> Result<Symbol> {
    let name = tokens.read_atom()?.into_text();
    let mut symbol = Symbol {
        name: name.strip_prefix('~').unwrap_or(&name).to_string(),
        reference: tokens.read_atom()?.into_text(),
        ..Symbol::default()
    };
    tokens.read_atom()?;
    symbol.pin_name_offset = tokens.read_i32()?;
    symbol.show_pin_numbers = tokens.read_bool()?;
    symbol.show_pin_names = tokens.read_bool()?;
    symbol.unit_count = tokens.read_u32()?;
    symbol.units_locked = tokens.read_expected(&["L", "F"])?.text() == "L";
    symbol.power = tokens.read_expected(&["N", "P"])?.text() == "P";
    tokens.read_end_of_line()?;

    loop {
        tokens.skip_empty_lines()?;
        let token = tokens.read()?;
        if let Some(index) = field_index(&token) {
            symbol.fields.push(parse_symbol_field(tokens, index)?);
            continue;
        }
        if token.kind() != TokenKind::Atom {
            return Err(token.unexpected(SYMBOL_KEYWORDS));
        }

        match token.text() {
            "ENDDEF" => {
                tokens.read_end_of_line()?;
                return Ok(symbol);
            }
            "ALIAS" => {
                while !tokens.at_end_of_line()? {
                    symbol.aliases.push(tokens.read_atom()?.into_text());
                }
                tokens.read_end_of_line()?;
            }
            "$FPLIST" => {
                tokens.skip_to_line_starting_with_not_eof("$ENDFPLIST")?;
                tokens.read()?;
                tokens.read_end_of_line()?;
            }
            "DRAW" => {
                tokens.read_end_of_line()?;
                read_primitives(tokens, &mut symbol.primitives)?;
            }
            _ => return Err(token.unexpected(SYMBOL_KEYWORDS)),
        }
    }
}

/// Parses a library field after its `F<n>` atom:
/// `"<text>" <x> <y> <size> <H|V> <V|I> [<hjust> <style>] ["<name>"]`.
fn parse_symbol_field(tokens: &mut Tokenizer<'_>, index: u32) -> Result<Field> {
    let text = read_escaped_text(tokens)?;
    let position = tokens.read_point()?;
    let size = tokens.read_i32()?;
    let orientation = tokens.read_keyword::<TextOrientation>()?;
    let hidden = tokens.read_expected(&["V", "I"])?.text() == "I";

    let mut field = Field {
        index,
        text,
        orientation,
        position,
        size,
        hidden,
        h_justify: HJustify::default(),
        v_justify: VJustify::default(),
        italic: false,
        bold: false,
        name: None,
    };
    read_field_tail(tokens, &mut field)?;
    Ok(field)
}

fn read_primitives(tokens: &mut Tokenizer<'_>, primitives: &mut Vec<Primitive>) -> Result<()> {
    loop {
        tokens.skip_empty_lines()?;
        let token = tokens.read()?;
        if token.kind() != TokenKind::Atom {
            return Err(token.unexpected(PRIMITIVE_KEYWORDS));
        }

        let primitive = match token.text() {
            "ENDDRAW" => return tokens.read_end_of_line(),
            "S" => {
                let start = tokens.read_point()?;
                let end = tokens.read_point()?;
                let style = read_style(tokens)?;
                Primitive::Rectangle { style, start, end }
            }
            "C" => {
                let center = tokens.read_point()?;
                let radius = tokens.read_i32()?;
                let style = read_style(tokens)?;
                Primitive::Circle { style, center, radius }
            }
            "P" | "B" => {
                let count = read_count(tokens)?;
                let mut style = read_style_without_fill(tokens)?;
                let points = (0..count).map(|_| tokens.read_point()).collect::<Result<Vec<_>>>()?;
                style.fill = read_optional_fill(tokens)?;
                if token.text() == "P" {
                    Primitive::Polyline { style, points }
                } else {
                    Primitive::Bezier { style, points }
                }
            }
            "A" => Primitive::Arc(read_arc(tokens)?),
            "T" => Primitive::Text(read_symbol_text(tokens)?),
            "X" => Primitive::Pin(read_pin(tokens)?),
            _ => return Err(token.unexpected(PRIMITIVE_KEYWORDS)),
        };
        tokens.read_end_of_line()?;
        trace!(keyword = token.text(), line = token.position().line(); "Read drawing primitive");
        primitives.push(primitive);
    }
}

fn read_count(tokens: &mut Tokenizer<'_>) -> Result<usize> {
    let token = tokens.read()?;
    let count = token.parse_u32()?;
    usize::try_from(count).map_err(|_| token.error(ErrorCode::E103, format!("point count {count} is too large")))
}

fn read_style_without_fill(tokens: &mut Tokenizer<'_>) -> Result<DrawStyle> {
    Ok(DrawStyle {
        unit: tokens.read_u32()?,
        convert: tokens.read_u32()?,
        width: tokens.read_i32()?,
        fill: Fill::None,
    })
}

fn read_style(tokens: &mut Tokenizer<'_>) -> Result<DrawStyle> {
    let mut style = read_style_without_fill(tokens)?;
    style.fill = read_optional_fill(tokens)?;
    Ok(style)
}

fn read_optional_fill(tokens: &mut Tokenizer<'_>) -> Result<Fill> {
    if tokens.at_end_of_line()? {
        return Ok(Fill::None);
    }
    tokens.read_keyword::<Fill>()
}

/// `A <x> <y> <r> <start> <end> <unit> <convert> <width> <fill> [<sx> <sy> <ex> <ey>]`
fn read_arc(tokens: &mut Tokenizer<'_>) -> Result<ArcPrimitive> {
    let center = tokens.read_point()?;
    let radius = tokens.read_i32()?;
    let start_angle = tokens.read_i32()?;
    let end_angle = tokens.read_i32()?;
    let style = read_style(tokens)?;

    let (start, end) = if tokens.at_end_of_line()? {
        (
            point_on_circle(center, radius, start_angle),
            point_on_circle(center, radius, end_angle),
        )
    } else {
        (tokens.read_point()?, tokens.read_point()?)
    };

    Ok(ArcPrimitive {
        style,
        center,
        radius,
        start_angle,
        end_angle,
        start,
        end,
    })
}

fn point_on_circle(center: Point, radius: i32, tenths: i32) -> Point {
    let radians = (f64::from(tenths) / 10.0).to_radians();
    let radius = f64::from(radius);
    Point::new(
        center.x() + (radius * radians.cos()).round() as i32,
        center.y() + (radius * radians.sin()).round() as i32,
    )
}

/// `T <angle> <x> <y> <size> <hidden> <unit> <convert> <text> [<Normal|Italic> <bold> <hjust> <vjust>]`
fn read_symbol_text(tokens: &mut Tokenizer<'_>) -> Result<SymbolText> {
    let angle = tokens.read_i32()?;
    let position = tokens.read_point()?;
    let size = tokens.read_i32()?;
    let hidden = tokens.read_i32()? != 0;
    let unit = tokens.read_u32()?;
    let convert = tokens.read_u32()?;

    let text_token = tokens.read()?;
    let text = match text_token.kind() {
        TokenKind::QuotedText => text_token.into_text(),
        TokenKind::Atom => text_token.text().replace('~', " "),
        _ => return Err(text_token.unexpected("text")),
    };

    let mut symbol_text = SymbolText {
        style: DrawStyle {
            unit,
            convert,
            width: 0,
            fill: Fill::None,
        },
        angle,
        position,
        size,
        hidden,
        text,
        italic: false,
        bold: false,
        h_justify: HJustify::Center,
        v_justify: VJustify::Center,
    };
    if tokens.at_end_of_line()? {
        return Ok(symbol_text);
    }

    symbol_text.italic = tokens.read_expected(&["Normal", "Italic"])?.text() == "Italic";
    symbol_text.bold = tokens.read_i32()? != 0;
    symbol_text.h_justify = tokens.read_keyword::<HJustify>()?;
    let v_justify = tokens.read()?;
    symbol_text.v_justify = v_justify
        .parse_char()
        .ok()
        .and_then(VJustify::from_code)
        .ok_or_else(|| v_justify.error(ErrorCode::E103, format!("expected `T`, `C` or `B`, found {v_justify}")))?;
    Ok(symbol_text)
}

/// `X <name> <number> <x> <y> <length> <U|D|L|R> <name size> <number size> <unit> <convert> <type> [<shape>]`
fn read_pin(tokens: &mut Tokenizer<'_>) -> Result<Pin> {
    let name = tokens.read_atom()?.into_text();
    let number = tokens.read_atom()?.into_text();
    let position = tokens.read_point()?;
    let length = tokens.read_i32()?;
    let direction = tokens.read_keyword::<PinDirection>()?;
    let name_size = tokens.read_i32()?;
    let number_size = tokens.read_i32()?;
    let unit = tokens.read_u32()?;
    let convert = tokens.read_u32()?;
    let electrical = tokens.read_keyword::<ElectricalType>()?;

    let (hidden, decorations) = if tokens.at_end_of_line()? {
        (false, PinDecorations::default())
    } else {
        parse_pin_shape(&tokens.read()?)?
    };

    Ok(Pin {
        style: DrawStyle {
            unit,
            convert,
            width: 0,
            fill: Fill::None,
        },
        name,
        number,
        position,
        length,
        direction,
        name_size,
        number_size,
        electrical,
        hidden,
        decorations,
    })
}

/// Parses a pin shape atom such as `NI` or `CL`. `N` hides the pin.
fn parse_pin_shape(token: &Token) -> Result<(bool, PinDecorations)> {
    if token.kind() != TokenKind::Atom {
        return Err(token.unexpected("a pin shape"));
    }

    let mut hidden = false;
    let mut decorations = PinDecorations::default();
    for code in token.text().chars() {
        match code {
            'N' => hidden = true,
            'I' => decorations.inverted = true,
            'C' => decorations.clock = true,
            'L' => decorations.low_input = true,
            'V' => decorations.low_output = true,
            'F' => decorations.falling_edge = true,
            'X' => decorations.non_logic = true,
            _ => {
                return Err(token.error(
                    ErrorCode::E103,
                    format!("expected a pin shape made of `N`, `I`, `C`, `L`, `V`, `F` and `X`, found {token}"),
                ));
            }
        }
    }
    Ok((hidden, decorations))
}
