//! Token definitions for schematic and library text.
//!
//! A [`Token`] owns its text and remembers where it came from, so every
//! conversion failure can report the exact position of the offending token.

use std::{fmt, sync::Arc};

use crate::{
    error::{ErrorCode, FileFormatError, Result},
    position::Position,
};

/// Largest magnitude accepted for a signed number in a document.
///
/// Coordinates, sizes and angles all stay within it, so placing and
/// mirroring them never overflows.
pub const MAX_MAGNITUDE: i32 = 10_000_000;

/// The lexical class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A run of non-whitespace characters.
    Atom,
    /// Text enclosed in double quotes, with the quotes removed.
    QuotedText,
    /// The rest of a line, taken verbatim.
    LineOfText,
    /// The end of a line.
    LineBreak,
    /// The end of the input.
    EndOfFile,
}

/// A keyword set that a single atom can be converted into.
///
/// ```
/// # use sch2svg_parser::tokens::Keyword;
/// #[derive(Debug, PartialEq)]
/// enum Side { Left, Right }
///
/// impl Keyword for Side {
///     const EXPECTED: &'static str = "`L` or `R`";
///
///     fn from_keyword(text: &str) -> Option<Self> {
///         match text {
///             "L" => Some(Side::Left),
///             "R" => Some(Side::Right),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Keyword: Sized {
    /// Human readable description of the accepted keywords.
    const EXPECTED: &'static str;

    fn from_keyword(text: &str) -> Option<Self>;
}

/// An immutable, position-annotated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: String,
    position: Position,
    source_id: Arc<str>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position, source_id: Arc<str>) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
            source_id,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consumes the token and returns its text.
    pub fn into_text(self) -> String {
        self.text
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn source_id(&self) -> &Arc<str> {
        &self.source_id
    }

    /// Whether this token is the atom `text`.
    pub fn is_atom(&self, text: &str) -> bool {
        self.kind == TokenKind::Atom && self.text == text
    }

    /// Whether this token ends a line, either by a line break or the end of
    /// the input.
    pub fn is_end_of_line(&self) -> bool {
        matches!(self.kind, TokenKind::LineBreak | TokenKind::EndOfFile)
    }

    /// Builds an error positioned at this token.
    pub fn error(&self, code: ErrorCode, message: impl Into<String>) -> FileFormatError {
        FileFormatError::new(code, message, self.position, Arc::clone(&self.source_id))
    }

    /// Builds an "expected X, found Y" error positioned at this token.
    pub fn unexpected(&self, expected: impl fmt::Display) -> FileFormatError {
        let code = match self.kind {
            TokenKind::EndOfFile => ErrorCode::E101,
            _ => ErrorCode::E100,
        };
        self.error(code, format!("expected {expected}, found {self}"))
    }

    /// Parses the token as a signed integer within [`MAX_MAGNITUDE`].
    pub fn parse_i32(&self) -> Result<i32> {
        let value = self.parse_number("integer", |text| text.parse::<i64>().ok())?;
        if value.abs() > i64::from(MAX_MAGNITUDE) {
            return Err(self.error(
                ErrorCode::E103,
                format!("integer {self} is out of range, the limit is {MAX_MAGNITUDE}"),
            ));
        }
        i32::try_from(value).map_err(|_| self.error(ErrorCode::E103, format!("integer {self} is out of range")))
    }

    /// Parses the token as an unsigned integer.
    pub fn parse_u32(&self) -> Result<u32> {
        self.parse_number("non-negative integer", |text| text.parse::<u32>().ok())
    }

    /// Parses the token as a hexadecimal integer such as `0001`.
    pub fn parse_hex(&self) -> Result<u32> {
        self.parse_number("hexadecimal number", |text| u32::from_str_radix(text, 16).ok())
    }

    /// Parses the token as a decimal number.
    pub fn parse_f64(&self) -> Result<f64> {
        self.parse_number("number", |text| text.parse::<f64>().ok().filter(|value| value.is_finite()))
    }

    /// Parses a token made of exactly one character.
    pub fn parse_char(&self) -> Result<char> {
        let mut chars = self.text.chars();
        match (self.kind, chars.next(), chars.next()) {
            (TokenKind::Atom, Some(ch), None) => Ok(ch),
            (TokenKind::Atom, _, _) => Err(self.error(
                ErrorCode::E103,
                format!("expected a single character, found {self}"),
            )),
            _ => Err(self.unexpected("a single character")),
        }
    }

    /// Parses a `Y`/`N` flag.
    pub fn parse_bool(&self) -> Result<bool> {
        match self.kind {
            TokenKind::Atom => match self.text.as_str() {
                "Y" => Ok(true),
                "N" => Ok(false),
                _ => Err(self.error(ErrorCode::E103, format!("expected `Y` or `N`, found {self}"))),
            },
            _ => Err(self.unexpected("`Y` or `N`")),
        }
    }

    /// Parses the token as one of the keywords of `K`.
    pub fn parse_keyword<K: Keyword>(&self) -> Result<K> {
        match self.kind {
            TokenKind::Atom => K::from_keyword(&self.text)
                .ok_or_else(|| self.error(ErrorCode::E103, format!("expected {}, found {self}", K::EXPECTED))),
            _ => Err(self.unexpected(K::EXPECTED)),
        }
    }

    fn parse_number<T>(&self, expected: &str, parse: impl FnOnce(&str) -> Option<T>) -> Result<T> {
        if self.kind != TokenKind::Atom {
            return Err(self.unexpected(expected));
        }
        parse(&self.text).ok_or_else(|| self.error(ErrorCode::E102, format!("expected {expected}, found {self}")))
    }
}

impl fmt::Display for Token {
    /// Describes the token the way error messages refer to it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Atom => write!(f, "`{}`", self.text),
            TokenKind::QuotedText => write!(f, "quoted text \"{}\"", self.text),
            TokenKind::LineOfText => write!(f, "text `{}`", self.text),
            TokenKind::LineBreak => f.write_str("line break"),
            TokenKind::EndOfFile => f.write_str("end of file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(text: &str) -> Token {
        Token::new(TokenKind::Atom, text, Position::new(4, 2), Arc::from("test.sch"))
    }

    #[derive(Debug, PartialEq)]
    enum Fill {
        None,
        Filled,
    }

    impl Keyword for Fill {
        const EXPECTED: &'static str = "`N` or `F`";

        fn from_keyword(text: &str) -> Option<Self> {
            match text {
                "N" => Some(Fill::None),
                "F" => Some(Fill::Filled),
                _ => None,
            }
        }
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(atom("-120").parse_i32().unwrap(), -120);
        assert_eq!(atom("7").parse_u32().unwrap(), 7);
        assert_eq!(atom("0001").parse_hex().unwrap(), 1);
        assert_eq!(atom("2.3").parse_f64().unwrap(), 2.3);
    }

    #[test]
    fn test_integer_magnitude_is_bounded() {
        assert_eq!(atom("-10000000").parse_i32().unwrap(), -MAX_MAGNITUDE);
        let err = atom("10000001").parse_i32().unwrap_err();
        assert_eq!(err.code(), ErrorCode::E103);
        assert_eq!(err.position(), Position::new(4, 2));
        assert_eq!(err.message(), "integer `10000001` is out of range, the limit is 10000000");
        assert_eq!(atom("2147483647").parse_i32().unwrap_err().code(), ErrorCode::E103);
        assert_eq!(atom("99999999999999999999").parse_i32().unwrap_err().code(), ErrorCode::E102);
    }

    #[test]
    fn test_invalid_number_reports_position() {
        let err = atom("12a").parse_i32().unwrap_err();
        assert_eq!(err.code(), ErrorCode::E102);
        assert_eq!(err.position(), Position::new(4, 2));
        assert_eq!(err.message(), "expected integer, found `12a`");
    }

    #[test]
    fn test_wrong_kind_is_unexpected_token() {
        let eof = Token::new(TokenKind::EndOfFile, "", Position::new(9, 1), Arc::from("test.sch"));
        let err = eof.parse_i32().unwrap_err();
        assert_eq!(err.code(), ErrorCode::E101);
        assert_eq!(err.message(), "expected integer, found end of file");

        let line_break = Token::new(TokenKind::LineBreak, "\n", Position::new(9, 1), Arc::from("test.sch"));
        assert_eq!(line_break.parse_bool().unwrap_err().code(), ErrorCode::E100);
    }

    #[test]
    fn test_parse_char_and_bool() {
        assert_eq!(atom("L").parse_char().unwrap(), 'L');
        assert_eq!(atom("LR").parse_char().unwrap_err().code(), ErrorCode::E103);
        assert!(atom("Y").parse_bool().unwrap());
        assert!(!atom("N").parse_bool().unwrap());
        assert_eq!(atom("1").parse_bool().unwrap_err().code(), ErrorCode::E103);
    }

    #[test]
    fn test_parse_keyword() {
        assert_eq!(atom("F").parse_keyword::<Fill>().unwrap(), Fill::Filled);
        let err = atom("X").parse_keyword::<Fill>().unwrap_err();
        assert_eq!(err.message(), "expected `N` or `F`, found `X`");
    }

    #[test]
    fn test_display() {
        assert_eq!(atom("Wire").to_string(), "`Wire`");
        let quoted = Token::new(TokenKind::QuotedText, "R1", Position::default(), Arc::from("x"));
        assert_eq!(quoted.to_string(), "quoted text \"R1\"");
    }
}
