//! Reader for `EESchema Schematic File Version 2` documents.
//!
//! [`SchematicReader`] checks the header once and then yields one
//! [`Record`] per call until `$EndSCHEMATC`. Lines that carry no drawing
//! (`EELAYER`, `Kmarq`, `$Bitmap` blocks) are consumed silently.
//!
//! The `parse_*` functions read the body of a single record after its
//! leading keyword and can be used on their own.

use std::sync::Arc;

use log::{debug, trace};
use sch2svg_core::geometry::{Point, Transform};

use crate::{
    error::{ErrorCode, Result},
    records::{
        BusEntry, Field, HJustify, LabelShape, PageDescription, Placement, Record, Sheet, SheetPin, SheetSide,
        SheetText, TextKind, TextOrientation, TextRecord, VJustify, Wire, WireKind,
    },
    tokenizer::{Dialect, Tokenizer},
    tokens::{Keyword, Token, TokenKind},
};

/// The only schematic format version understood.
pub const SUPPORTED_VERSION: i32 = 2;

const RECORD_KEYWORDS: &str =
    "a record keyword (`$Comp`, `$Sheet`, `$Descr`, `Wire`, `Entry`, `Connection`, `NoConn`, `Text`, `LIBS:` or `$EndSCHEMATC`)";

/// Incremental reader over one schematic document.
pub struct SchematicReader<'src> {
    tokens: Tokenizer<'src>,
    finished: bool,
}

impl<'src> SchematicReader<'src> {
    /// Reads and checks the header line.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorCode::E104`] for any version other than
    /// [`SUPPORTED_VERSION`].
    pub fn new(src: &'src str, source_id: impl Into<Arc<str>>) -> Result<Self> {
        let mut tokens = Tokenizer::new(src, source_id);
        tokens.skip_empty_lines()?;
        for word in ["EESchema", "Schematic", "File", "Version"] {
            tokens.expect(word)?;
        }

        let version_token = tokens.read()?;
        let version = version_token.parse_i32()?;
        if version != SUPPORTED_VERSION {
            return Err(version_token
                .error(
                    ErrorCode::E104,
                    format!("unsupported schematic file version {version}, expected version {SUPPORTED_VERSION}"),
                )
                .with_help("re-save the schematic with a KiCad 4 compatible tool"));
        }
        // Very old writers append a save date to the header.
        tokens.skip_until_after_line_break();

        let source: &str = tokens.source_id();
        debug!(source, version; "Read schematic header");
        Ok(Self { tokens, finished: false })
    }

    /// Position of the next unread character.
    pub fn position(&self) -> crate::Position {
        self.tokens.position()
    }

    pub fn source_id(&self) -> &Arc<str> {
        self.tokens.source_id()
    }

    /// Whether `$EndSCHEMATC` has been read.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reads the next record. Returns `None` once `$EndSCHEMATC` has been
    /// read.
    ///
    /// # Errors
    ///
    /// Any grammar violation, including the end of the input before
    /// `$EndSCHEMATC`.
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        while !self.finished {
            self.tokens.skip_empty_lines()?;
            let keyword = self.tokens.read()?;
            if keyword.kind() != TokenKind::Atom {
                return Err(keyword.unexpected(RECORD_KEYWORDS));
            }

            let tokens = &mut self.tokens;
            let record = match keyword.text() {
                "$EndSCHEMATC" => {
                    tokens.read_end_of_line()?;
                    self.finished = true;
                    None
                }
                "EELAYER" | "Kmarq" => {
                    tokens.skip_until_after_line_break();
                    None
                }
                "$Bitmap" => {
                    tokens.skip_to_line_starting_with_not_eof("$EndBitmap")?;
                    tokens.read()?;
                    tokens.read_end_of_line()?;
                    None
                }
                "$Descr" => Some(Record::Page(parse_page(tokens)?)),
                "Wire" => Some(Record::Wire(parse_wire(tokens)?)),
                "Entry" => Some(Record::BusEntry(parse_bus_entry(tokens)?)),
                "Connection" => Some(Record::Connection(parse_connection(tokens)?)),
                "NoConn" => Some(Record::NoConnection(parse_connection(tokens)?)),
                "Text" => Some(Record::Text(parse_text(tokens)?)),
                "$Sheet" => Some(Record::Sheet(parse_sheet(tokens)?)),
                "$Comp" => Some(Record::Placement(parse_placement(tokens)?)),
                text if text.starts_with("LIBS:") => Some(Record::Libraries(parse_libraries(&keyword, tokens)?)),
                _ => return Err(keyword.unexpected(RECORD_KEYWORDS)),
            };

            if let Some(record) = record {
                debug!(keyword = keyword.text(), line = keyword.position().line(); "Read record");
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// Parses the library list of a `LIBS:` line. `keyword` is the leading
/// atom, which already holds the first name.
pub fn parse_libraries(keyword: &Token, tokens: &mut Tokenizer<'_>) -> Result<Vec<String>> {
    let first = keyword.text().trim_start_matches("LIBS:");
    let rest = tokens.read_line_of_text()?;
    tokens.read_end_of_line()?;

    let line = format!("{first}{}", rest.text());
    Ok(line
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Parses `<paper> <width> <height> [portrait]` and the block up to
/// `$EndDescr`. Only the `Title` line is kept.
pub fn parse_page(tokens: &mut Tokenizer<'_>) -> Result<PageDescription> {
    let paper = tokens.read_atom()?.into_text();
    let width = tokens.read_i32()?;
    let height = tokens.read_i32()?;
    let portrait = if tokens.at_end_of_line()? {
        false
    } else {
        tokens.expect("portrait")?;
        true
    };
    tokens.expect_line_break()?;

    let mut title = String::new();
    loop {
        tokens.skip_empty_lines()?;
        let next = tokens.peek()?;
        if next.is_atom("$EndDescr") {
            tokens.read()?;
            tokens.read_end_of_line()?;
            break;
        }
        if next.is_atom("Title") {
            tokens.read()?;
            title = tokens.with_dialect(Dialect::Escaped, |tokens| tokens.read_quoted())?.into_text();
            tokens.read_end_of_line()?;
            continue;
        }
        if next.kind() == TokenKind::EndOfFile {
            return Err(tokens.read()?.unexpected("`$EndDescr`"));
        }
        tokens.skip_until_after_line_break();
    }

    Ok(PageDescription {
        paper,
        width,
        height,
        portrait,
        title,
    })
}

/// Parses `<Wire|Bus|Notes> Line` and the coordinate line.
///
/// ```
/// # use sch2svg_parser::{schematic::parse_wire, records::WireKind, tokenizer::Tokenizer};
/// let mut tokens = Tokenizer::new("Bus Line\n1 2 3 4\n", "doc.sch");
/// let wire = parse_wire(&mut tokens).unwrap();
/// assert_eq!(wire.kind, WireKind::Bus);
/// assert_eq!((wire.end.x(), wire.end.y()), (3, 4));
/// ```
pub fn parse_wire(tokens: &mut Tokenizer<'_>) -> Result<Wire> {
    let kind = tokens.read_keyword::<WireKind>()?;
    tokens.expect("Line")?;
    tokens.expect_line_break()?;
    let (start, end) = read_segment(tokens)?;
    Ok(Wire { kind, start, end })
}

/// Parses `<Wire|Bus> <Line|Bus>` and the coordinate line.
pub fn parse_bus_entry(tokens: &mut Tokenizer<'_>) -> Result<BusEntry> {
    let from = tokens.read_expected(&["Wire", "Bus"])?;
    tokens.read_expected(&["Line", "Bus"])?;
    tokens.expect_line_break()?;
    let (start, end) = read_segment(tokens)?;
    Ok(BusEntry {
        bus: from.text() == "Bus",
        start,
        end,
    })
}

/// Parses `~ <x> <y>`, the body of `Connection` and `NoConn`.
pub fn parse_connection(tokens: &mut Tokenizer<'_>) -> Result<Point> {
    tokens.expect("~")?;
    let point = tokens.read_point()?;
    tokens.read_end_of_line()?;
    Ok(point)
}

fn read_segment(tokens: &mut Tokenizer<'_>) -> Result<(Point, Point)> {
    let start = tokens.read_point()?;
    let end = tokens.read_point()?;
    tokens.read_end_of_line()?;
    Ok((start, end))
}

/// Parses a `Text` header line and the text line that follows it.
pub fn parse_text(tokens: &mut Tokenizer<'_>) -> Result<TextRecord> {
    let kind = tokens.read_keyword::<TextKind>()?;
    let position = tokens.read_point()?;
    let orientation = read_orientation(tokens)?;
    let size = tokens.read_i32()?;

    let mut shape = LabelShape::default();
    if let Some(parsed) = peek_keyword::<LabelShape>(tokens)? {
        tokens.read()?;
        shape = parsed;
    }

    let mut italic = false;
    if !tokens.at_end_of_line()? {
        italic = tokens.read_expected(&["~", "Italic"])?.text() == "Italic";
    }

    let mut thickness = 0;
    if !tokens.at_end_of_line()? {
        thickness = tokens.read_i32()?;
    }
    tokens.expect_line_break()?;

    let line = tokens.read_line_of_text()?;
    tokens.read_end_of_line()?;
    trace!(kind:?; "Read text line");

    Ok(TextRecord {
        kind,
        position,
        orientation,
        size,
        shape,
        italic,
        thickness,
        text: line.text().replace("\\n", "\n"),
    })
}

fn read_orientation(tokens: &mut Tokenizer<'_>) -> Result<u8> {
    let token = tokens.read()?;
    let value = token.parse_i32()?;
    u8::try_from(value)
        .ok()
        .filter(|orientation| *orientation <= 3)
        .ok_or_else(|| token.error(ErrorCode::E103, format!("expected orientation 0 to 3, found {token}")))
}

fn peek_keyword<K: Keyword>(tokens: &mut Tokenizer<'_>) -> Result<Option<K>> {
    let next = tokens.peek()?;
    if next.kind() != TokenKind::Atom {
        return Ok(None);
    }
    Ok(K::from_keyword(next.text()))
}

/// Splits a numbered field atom such as `F2` into its index.
pub(crate) fn field_index(token: &Token) -> Option<u32> {
    if token.kind() != TokenKind::Atom {
        return None;
    }
    let digits = token.text().strip_prefix('F')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parses a `$Sheet` block up to and including `$EndSheet`.
pub fn parse_sheet(tokens: &mut Tokenizer<'_>) -> Result<Sheet> {
    tokens.expect_line_break()?;

    let mut frame = None;
    let mut timestamp = None;
    let mut name = None;
    let mut file = None;
    let mut pins = Vec::new();
    let mut fields_seen = 0;

    loop {
        tokens.skip_empty_lines()?;
        let token = tokens.read()?;

        if let Some(index) = field_index(&token) {
            if index != fields_seen {
                return Err(token.error(
                    ErrorCode::E201,
                    format!("expected field `F{fields_seen}`, found {token}"),
                ));
            }
            fields_seen += 1;

            let text = tokens.read_quoted()?.into_text();
            match index {
                0 | 1 => {
                    let size = tokens.read_i32()?;
                    let sheet_text = Some(SheetText { text, size });
                    if index == 0 {
                        name = sheet_text;
                    } else {
                        file = sheet_text;
                    }
                }
                _ => pins.push(read_sheet_pin(tokens, text)?),
            }
            tokens.read_end_of_line()?;
            continue;
        }

        match token.text() {
            "S" if token.kind() == TokenKind::Atom => {
                let position = tokens.read_point()?;
                let width = tokens.read_i32()?;
                let height = tokens.read_i32()?;
                frame = Some((position, width, height));
            }
            "U" if token.kind() == TokenKind::Atom => {
                timestamp = Some(tokens.read()?.parse_hex()?);
            }
            "$EndSheet" if token.kind() == TokenKind::Atom => {
                tokens.read_end_of_line()?;
                let Some((position, width, height)) = frame else {
                    return Err(token.error(ErrorCode::E200, "incomplete sheet: missing the `S` line"));
                };
                return Ok(Sheet {
                    position,
                    width,
                    height,
                    timestamp,
                    name,
                    file,
                    pins,
                });
            }
            _ => return Err(token.unexpected("`S`, `U`, `F<n>` or `$EndSheet`")),
        }
        tokens.read_end_of_line()?;
    }
}

fn read_sheet_pin(tokens: &mut Tokenizer<'_>, name: String) -> Result<SheetPin> {
    let shape_token = tokens.read()?;
    let shape = LabelShape::from_sheet_code(shape_token.text())
        .filter(|_| shape_token.kind() == TokenKind::Atom)
        .ok_or_else(|| {
            shape_token.error(
                ErrorCode::E103,
                format!("expected `I`, `O`, `B`, `T` or `U`, found {shape_token}"),
            )
        })?;
    let side = tokens.read_keyword::<SheetSide>()?;
    let position = tokens.read_point()?;
    let size = tokens.read_i32()?;
    Ok(SheetPin {
        name,
        shape,
        side,
        position,
        size,
    })
}

/// Parses a `$Comp` block up to and including `$EndComp`.
pub fn parse_placement(tokens: &mut Tokenizer<'_>) -> Result<Placement> {
    tokens.expect_line_break()?;

    let mut symbol = None;
    let mut unit = 1;
    let mut convert = 1;
    let mut timestamp = None;
    let mut position = None;
    let mut transform = None;
    let mut fields = Vec::new();

    loop {
        tokens.skip_empty_lines()?;
        let token = tokens.read()?;
        if token.kind() != TokenKind::Atom {
            return Err(token.unexpected("`L`, `U`, `P`, `F`, `AR`, a coordinate line or `$EndComp`"));
        }

        match token.text() {
            "L" => {
                let name = tokens.read_atom()?.into_text();
                let reference = tokens.read_atom()?.into_text();
                symbol = Some((name, reference));
            }
            "U" => {
                unit = tokens.read_u32()?;
                convert = tokens.read_u32()?;
                if !tokens.at_end_of_line()? {
                    timestamp = Some(tokens.read()?.parse_hex()?);
                }
            }
            "P" => position = Some(tokens.read_point()?),
            "AR" => {
                tokens.skip_until_after_line_break();
                continue;
            }
            "F" => fields.push(parse_placement_field(tokens)?),
            "$EndComp" => {
                tokens.read_end_of_line()?;
                let Some((symbol, reference)) = symbol else {
                    return Err(token.error(ErrorCode::E200, "incomplete component: missing the `L` line"));
                };
                let Some(position) = position else {
                    return Err(token.error(ErrorCode::E200, "incomplete component: missing the `P` line"));
                };
                let Some(transform) = transform else {
                    return Err(token.error(ErrorCode::E200, "incomplete component: missing the orientation matrix"));
                };
                return Ok(Placement {
                    symbol,
                    reference,
                    unit,
                    convert,
                    timestamp,
                    position,
                    transform,
                    fields,
                });
            }
            _ if token.parse_i32().is_ok() => {
                if let Some(matrix) = read_number_line(&token, tokens)? {
                    transform = Some(matrix);
                }
                continue;
            }
            _ => return Err(token.unexpected("`L`, `U`, `P`, `F`, `AR`, a coordinate line or `$EndComp`")),
        }
        tokens.read_end_of_line()?;
    }
}

/// Reads the numeric lines that close a `$Comp` block. The three-number
/// `unit x y` line duplicates `U`/`P` and yields `None`; the four-number
/// line is the orientation matrix.
fn read_number_line(first: &Token, tokens: &mut Tokenizer<'_>) -> Result<Option<Transform>> {
    let mut numbers = vec![first.parse_i32()?];
    while !tokens.at_end_of_line()? {
        numbers.push(tokens.read_i32()?);
    }
    tokens.read_end_of_line()?;

    match numbers.as_slice() {
        [_, _, _] => Ok(None),
        &[x1, y1, x2, y2] if [x1, y1, x2, y2].iter().all(|entry| (-1..=1).contains(entry)) => {
            Ok(Some(Transform::new(x1, y1, x2, y2)))
        }
        [_, _, _, _] => Err(first.error(
            ErrorCode::E103,
            "orientation matrix entries must be -1, 0 or 1",
        )),
        _ => Err(first.error(
            ErrorCode::E103,
            format!("expected a line of 3 or 4 numbers, found {} numbers", numbers.len()),
        )),
    }
}

/// Parses the body of an `F` line inside `$Comp`:
/// `<n> "<text>" <H|V> <x> <y> <size> <flags> [<hjust> <vjust><italic><bold>] ["<name>"]`.
pub fn parse_placement_field(tokens: &mut Tokenizer<'_>) -> Result<Field> {
    let index = tokens.read_u32()?;
    let text = read_escaped_text(tokens)?;
    let orientation = tokens.read_keyword::<TextOrientation>()?;
    let position = tokens.read_point()?;
    let size = tokens.read_i32()?;
    let flags = tokens.read()?.parse_hex()?;

    let mut field = Field {
        index,
        text,
        orientation,
        position,
        size,
        hidden: flags & 1 != 0,
        h_justify: HJustify::default(),
        v_justify: VJustify::default(),
        italic: false,
        bold: false,
        name: None,
    };
    read_field_tail(tokens, &mut field)?;
    Ok(field)
}

/// Reads the optional justification, style and name that end a field line.
pub(crate) fn read_field_tail(tokens: &mut Tokenizer<'_>, field: &mut Field) -> Result<()> {
    if !tokens.at_end_of_line()? {
        field.h_justify = tokens.read_keyword::<HJustify>()?;
    }
    if !tokens.at_end_of_line()? {
        let style = tokens.read()?;
        let (v_justify, italic, bold) = parse_text_style(&style)?;
        field.v_justify = v_justify;
        field.italic = italic;
        field.bold = bold;
    }
    if !tokens.at_end_of_line()? {
        field.name = Some(read_escaped_text(tokens)?);
    }
    tokens.read_end_of_line()
}

pub(crate) fn read_escaped_text(tokens: &mut Tokenizer<'_>) -> Result<String> {
    tokens
        .with_dialect(Dialect::Escaped, |tokens| tokens.read_quoted())
        .map(Token::into_text)
}

/// Parses a style atom such as `CNN`: vertical justification, then `I` or
/// `N` for italic, then `B` or `N` for bold.
fn parse_text_style(token: &Token) -> Result<(VJustify, bool, bool)> {
    let invalid = || {
        token.error(
            ErrorCode::E103,
            format!("expected a text style such as `CNN`, found {token}"),
        )
    };
    if token.kind() != TokenKind::Atom {
        return Err(token.unexpected("a text style such as `CNN`"));
    }

    let mut chars = token.text().chars();
    let v_justify = chars.next().and_then(VJustify::from_code).ok_or_else(invalid)?;
    let italic = match chars.next() {
        None | Some('N') => false,
        Some('I') => true,
        Some(_) => return Err(invalid()),
    };
    let bold = match chars.next() {
        None | Some('N') => false,
        Some('B') => true,
        Some(_) => return Err(invalid()),
    };
    if chars.next().is_some() {
        return Err(invalid());
    }
    Ok((v_justify, italic, bold))
}
