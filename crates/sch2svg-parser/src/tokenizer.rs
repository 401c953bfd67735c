//! Tokenizer for schematic and library text.
//!
//! The [`Tokenizer`] hands out one [`Token`] at a time with one token of
//! lookahead. Scanning primitives are winnow parsers over a
//! [`LocatingSlice`]; the tokenizer keeps the line/column cursor itself.
//!
//! # Dialects
//!
//! - [`Dialect::Plain`]: quoted text ends at the next `"`, backslashes are
//!   ordinary characters.
//! - [`Dialect::Escaped`]: quoted text decodes C-style escapes:
//!
//! | Escape | Result |
//! |--------|--------|
//! | `\\` | backslash |
//! | `\n` | newline |
//! | `\` + 1-3 octal digits | the byte value, longest run up to `\377` wins |
//! | `\xHH` | the code unit, exactly 2 hex digits |
//! | `\uHHHH` | the UTF-16 code unit, exactly 4 hex digits |
//! | `\UHHHHHHHH` | the scalar value, exactly 8 hex digits |
//! | anything else | kept as written, backslash included |
//!
//! Decoded code units are joined as UTF-16. A quote only starts quoted text
//! at the beginning of a token.
//!
//! Changing the dialect drops the lookahead, so the next token is always
//! scanned with the dialect in effect when it is read.

use std::sync::Arc;

use log::trace;
use winnow::{
    Parser as _,
    combinator::{alt, cut_err, preceded, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{none_of, one_of, take_till, take_while},
};

use sch2svg_core::geometry::Point;

use crate::{
    error::{ErrorCode, FileFormatError, Result},
    position::Position,
    tokens::{Keyword, Token, TokenKind},
};

/// How quoted text is scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    #[default]
    Plain,
    Escaped,
}

/// Diagnostic attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScanDiagnostic {
    code: ErrorCode,
    message: &'static str,
    /// Offset of the construct the error is about.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<ScanDiagnostic>>;

/// A piece of decoded quoted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
    Text(&'a str),
    Unit(u16),
    Scalar(char),
    /// An unrecognized escape, kept with its backslash.
    Verbatim(char),
}

impl Piece<'_> {
    fn push_to(self, units: &mut Vec<u16>) {
        let mut buf = [0u16; 2];
        match self {
            Piece::Text(text) => units.extend(text.encode_utf16()),
            Piece::Unit(unit) => units.push(unit),
            Piece::Scalar(ch) => units.extend_from_slice(ch.encode_utf16(&mut buf)),
            Piece::Verbatim(ch) => {
                units.push(u16::from(b'\\'));
                units.extend_from_slice(ch.encode_utf16(&mut buf));
            }
        }
    }
}

fn blanks<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_while(0.., [' ', '\t', '\r']).parse_next(input)
}

fn atom<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_while(1.., |c: char| !c.is_whitespace()).parse_next(input)
}

fn rest_of_line<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_till(0.., '\n').parse_next(input)
}

fn plain_quoted(input: &mut Input<'_>) -> IResult<String> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;
    cut_err(terminated(take_till(0.., ['"', '\n']), '"'))
        .context(ScanDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated quoted text",
            start,
        })
        .map(str::to_owned)
        .parse_next(input)
}

fn hex_digits<'a>(count: usize) -> impl FnMut(&mut Input<'a>) -> IResult<u32> {
    move |input: &mut Input<'a>| {
        take_while(count, |c: char| c.is_ascii_hexdigit())
            .try_map(|digits: &str| u32::from_str_radix(digits, 16))
            .parse_next(input)
    }
}

/// Parses an escape after its backslash has been seen.
fn escape<'a>(input: &mut Input<'a>) -> IResult<Piece<'a>> {
    let start = input.current_token_start();
    '\\'.parse_next(input)?;

    let malformed = ScanDiagnostic {
        code: ErrorCode::E002,
        message: "malformed escape sequence",
        start,
    };

    alt((
        '\\'.value(Piece::Unit(u16::from(b'\\'))),
        'n'.value(Piece::Unit(u16::from(b'\n'))),
        preceded('x', cut_err(hex_digits(2).map(|value| Piece::Unit(value as u16)))),
        preceded('u', cut_err(hex_digits(4).map(|value| Piece::Unit(value as u16)))),
        preceded('U', cut_err(hex_digits(8).verify_map(char::from_u32).map(Piece::Scalar))),
        octal_byte.map(|byte| Piece::Unit(u16::from(byte))),
        none_of(['\n']).map(Piece::Verbatim),
    ))
    .context(malformed)
    .parse_next(input)
}

/// One to three octal digits. A third digit is only taken while the value
/// still fits a byte, so `\400` reads as `\40` followed by `0`.
fn octal_byte(input: &mut Input<'_>) -> IResult<u8> {
    alt((
        (one_of('0'..='3'), take_while(0..=2, '0'..='7')).take(),
        take_while(1..=2, '0'..='7'),
    ))
    .try_map(|digits: &str| u8::from_str_radix(digits, 8))
    .parse_next(input)
}

fn escaped_quoted(input: &mut Input<'_>) -> IResult<String> {
    let start = input.current_token_start();
    '"'.parse_next(input)?;

    let text = take_till(1.., ['"', '\\', '\n']).map(Piece::Text);
    let units = cut_err(terminated(
        repeat(0.., alt((escape, text))).fold(Vec::new, |mut units: Vec<u16>, piece| {
            piece.push_to(&mut units);
            units
        }),
        '"',
    ))
    .context(ScanDiagnostic {
        code: ErrorCode::E001,
        message: "unterminated quoted text",
        start,
    });

    cut_err(units.try_map(|units: Vec<u16>| String::from_utf16(&units)))
        .context(ScanDiagnostic {
            code: ErrorCode::E003,
            message: "quoted text is not valid UTF-16",
            start,
        })
        .parse_next(input)
}

/// Scans one token. Returns its kind, its text and where it started.
fn scan_token(input: &mut Input<'_>, dialect: Dialect) -> IResult<(TokenKind, String, usize)> {
    blanks(input)?;
    let start = input.current_token_start();

    let (kind, text) = match input.peek_token() {
        None => (TokenKind::EndOfFile, String::new()),
        Some('\n') => {
            input.next_token();
            (TokenKind::LineBreak, "\n".to_string())
        }
        Some('"') => {
            let text = match dialect {
                Dialect::Plain => plain_quoted(input)?,
                Dialect::Escaped => escaped_quoted(input)?,
            };
            (TokenKind::QuotedText, text)
        }
        Some(_) => (TokenKind::Atom, atom(input)?.to_string()),
    };

    Ok((kind, text, start))
}

/// Byte offset plus the line and column it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    offset: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    const START: Cursor = Cursor {
        offset: 0,
        line: 1,
        column: 1,
    };

    fn position(self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Moves over `text`, which holds no line break.
    fn advance(self, text: &str) -> Cursor {
        Cursor {
            offset: self.offset + text.len(),
            line: self.line,
            column: self.column + text.chars().count() as u32,
        }
    }

    /// Moves past a line break that is `len` bytes long.
    fn next_line(self, len: usize) -> Cursor {
        Cursor {
            offset: self.offset + len,
            line: self.line + 1,
            column: 1,
        }
    }
}

/// A tokenizing session over one document.
pub struct Tokenizer<'src> {
    src: &'src str,
    source_id: Arc<str>,
    cursor: Cursor,
    lookahead: Option<(Token, Cursor)>,
    dialect: Dialect,
}

impl<'src> Tokenizer<'src> {
    /// Creates a tokenizer over `src`. `source_id` names the document in
    /// error messages.
    pub fn new(src: &'src str, source_id: impl Into<Arc<str>>) -> Self {
        Self {
            src,
            source_id: source_id.into(),
            cursor: Cursor::START,
            lookahead: None,
            dialect: Dialect::Plain,
        }
    }

    pub fn source_id(&self) -> &Arc<str> {
        &self.source_id
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Position of the next character to be scanned.
    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    /// Switches the dialect and returns the previous one.
    pub fn set_dialect(&mut self, dialect: Dialect) -> Dialect {
        if dialect != self.dialect {
            self.lookahead = None;
        }
        std::mem::replace(&mut self.dialect, dialect)
    }

    /// Runs `f` with `dialect` active, restoring the previous dialect even
    /// when `f` fails.
    pub fn with_dialect<T>(&mut self, dialect: Dialect, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let previous = self.set_dialect(dialect);
        let result = f(self);
        self.set_dialect(previous);
        result
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token> {
        let scanned = match self.lookahead.take() {
            Some(scanned) => scanned,
            None => self.scan()?,
        };
        Ok(&self.lookahead.insert(scanned).0)
    }

    /// Consumes and returns the next token. At the end of the input this
    /// keeps returning [`TokenKind::EndOfFile`].
    pub fn read(&mut self) -> Result<Token> {
        let (token, next) = match self.lookahead.take() {
            Some(scanned) => scanned,
            None => self.scan()?,
        };
        trace!(kind:? = token.kind(), text = token.text(); "Read token");
        self.cursor = next;
        Ok(token)
    }

    /// Reads an atom whose text is one of `expected`.
    pub fn read_expected(&mut self, expected: &[&str]) -> Result<Token> {
        let token = self.read()?;
        if token.kind() == TokenKind::Atom && expected.contains(&token.text()) {
            return Ok(token);
        }
        Err(token.unexpected(describe_expected(expected)))
    }

    /// Reads the atom `keyword`.
    pub fn expect(&mut self, keyword: &str) -> Result<Token> {
        self.read_expected(&[keyword])
    }

    /// Reads any atom.
    pub fn read_atom(&mut self) -> Result<Token> {
        self.read_kind(TokenKind::Atom, "a word")
    }

    /// Reads quoted text.
    pub fn read_quoted(&mut self) -> Result<Token> {
        self.read_kind(TokenKind::QuotedText, "quoted text")
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read()?.parse_i32()
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read()?.parse_u32()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read()?.parse_f64()
    }

    pub fn read_char(&mut self) -> Result<char> {
        self.read()?.parse_char()
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.read()?.parse_bool()
    }

    pub fn read_keyword<K: Keyword>(&mut self) -> Result<K> {
        self.read()?.parse_keyword()
    }

    /// Reads an `x y` coordinate pair.
    pub fn read_point(&mut self) -> Result<Point> {
        let x = self.read_i32()?;
        let y = self.read_i32()?;
        Ok(Point::new(x, y))
    }

    /// Reads the rest of the current line verbatim, without its line break.
    ///
    /// Quotes and backslashes have no meaning here. A trailing `\r` is
    /// dropped.
    pub fn read_line_of_text(&mut self) -> Result<Token> {
        self.lookahead = None;
        let src = self.src;
        let mut input = LocatingSlice::new(&src[self.cursor.offset..]);
        let text = rest_of_line(&mut input).map_err(|err| self.scan_error(err))?;

        let token = Token::new(
            TokenKind::LineOfText,
            text.strip_suffix('\r').unwrap_or(text),
            self.cursor.position(),
            Arc::clone(&self.source_id),
        );
        self.cursor = self.cursor.advance(text);
        Ok(token)
    }

    /// Whether the next token ends the line.
    pub fn at_end_of_line(&mut self) -> Result<bool> {
        Ok(self.peek()?.is_end_of_line())
    }

    /// Consumes a line break. The end of the input also counts and is left
    /// in place.
    pub fn read_end_of_line(&mut self) -> Result<()> {
        match self.peek()?.kind() {
            TokenKind::LineBreak => {
                self.read()?;
                Ok(())
            }
            TokenKind::EndOfFile => Ok(()),
            _ => Err(self.read()?.unexpected("end of line")),
        }
    }

    /// Consumes a line break. Fails at the end of the input.
    pub fn expect_line_break(&mut self) -> Result<()> {
        self.read_kind(TokenKind::LineBreak, "line break").map(drop)
    }

    /// Consumes consecutive line breaks.
    pub fn skip_empty_lines(&mut self) -> Result<()> {
        while self.peek()?.kind() == TokenKind::LineBreak {
            self.read()?;
        }
        Ok(())
    }

    /// Skips everything up to and including the next line break, without
    /// tokenizing it. Returns `false` if the input ended first.
    pub fn skip_until_after_line_break(&mut self) -> bool {
        self.lookahead = None;
        let src = self.src;
        let rest = &src[self.cursor.offset..];
        match rest.find('\n') {
            Some(index) => {
                self.cursor = self.cursor.advance(&rest[..index]).next_line(1);
                true
            }
            None => {
                self.cursor = self.cursor.advance(rest);
                false
            }
        }
    }

    /// Like [`skip_until_after_line_break`](Self::skip_until_after_line_break)
    /// but the input must not end first.
    pub fn skip_until_after_line_break_not_eof(&mut self) -> Result<()> {
        if self.skip_until_after_line_break() {
            return Ok(());
        }
        Err(self.read()?.unexpected("line break"))
    }

    /// Skips whole lines until one starts with the atom `marker`, leaving
    /// the marker as the next token. Returns `false` if the input ended
    /// first.
    pub fn skip_to_line_starting_with(&mut self, marker: &str) -> Result<bool> {
        loop {
            self.skip_empty_lines()?;
            let next = self.peek()?;
            if next.kind() == TokenKind::EndOfFile {
                return Ok(false);
            }
            if next.is_atom(marker) {
                return Ok(true);
            }
            if !self.skip_until_after_line_break() {
                return Ok(false);
            }
        }
    }

    /// Like [`skip_to_line_starting_with`](Self::skip_to_line_starting_with)
    /// but the marker must be found.
    pub fn skip_to_line_starting_with_not_eof(&mut self, marker: &str) -> Result<()> {
        if self.skip_to_line_starting_with(marker)? {
            return Ok(());
        }
        Err(self.read()?.unexpected(format!("`{marker}`")))
    }

    fn read_kind(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        let token = self.read()?;
        if token.kind() == kind {
            return Ok(token);
        }
        Err(token.unexpected(expected))
    }

    fn scan(&self) -> Result<(Token, Cursor)> {
        let rest = &self.src[self.cursor.offset..];
        let mut input = LocatingSlice::new(rest);
        let (kind, text, start) = scan_token(&mut input, self.dialect).map_err(|err| self.scan_error(err))?;
        let end = input.current_token_start();

        let at = self.cursor.advance(&rest[..start]);
        let next = match kind {
            TokenKind::LineBreak => at.next_line(end - start),
            _ => at.advance(&rest[start..end]),
        };

        let token = Token::new(kind, text, at.position(), Arc::clone(&self.source_id));
        Ok((token, next))
    }

    /// Converts a scanner error into a positioned [`FileFormatError`].
    ///
    /// Uses the first diagnostic attached to the error. Errors never span a
    /// line break, so the column is counted from the cursor.
    fn scan_error(&self, err: ErrMode<ContextError<ScanDiagnostic>>) -> FileFormatError {
        let context = match err {
            ErrMode::Backtrack(context) | ErrMode::Cut(context) => context,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        let rest = &self.src[self.cursor.offset..];
        let (code, message, start) = match context.context().next() {
            Some(diagnostic) => (diagnostic.code, diagnostic.message, diagnostic.start),
            None => (ErrorCode::E004, "unexpected character", 0),
        };
        let start = floor_char_boundary(rest, start);
        let position = self.cursor.advance(&rest[..start]).position();

        FileFormatError::new(code, message, position, Arc::clone(&self.source_id))
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn describe_expected(expected: &[&str]) -> String {
    match expected {
        [] => "a keyword".to_string(),
        [single] => format!("`{single}`"),
        many => {
            let names: Vec<String> = many.iter().map(|name| format!("`{name}`")).collect();
            format!("one of {}", names.join(", "))
        }
    }
}
