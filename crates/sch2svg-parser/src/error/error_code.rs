//! Error codes for file format errors.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Tokenizer errors
//! - `E1xx` - Grammar errors shared by schematics and libraries
//! - `E2xx` - Record structure errors

use std::fmt;

/// Error codes for categorizing file format errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Tokenizer Errors (E0xx)
    // =========================================================================
    /// Unterminated quoted text.
    ///
    /// A quote opened a token but the line or file ended before it closed.
    E001,

    /// Malformed escape sequence.
    ///
    /// A `\x`, `\u` or `\U` escape has too few hex digits, or `\U` names a
    /// value that is not a Unicode scalar.
    E002,

    /// Invalid UTF-16 text.
    ///
    /// Decoded escapes left an unpaired surrogate code unit.
    E003,

    /// Unexpected character.
    E004,

    // =========================================================================
    // Grammar Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// A token of the wrong kind or with the wrong text was found.
    E100,

    /// Unexpected end of file.
    ///
    /// The input ended in the middle of a record.
    E101,

    /// Invalid number.
    E102,

    /// Invalid value.
    ///
    /// A token is not one of the values the field accepts.
    E103,

    /// Unsupported file version.
    E104,

    // =========================================================================
    // Record Errors (E2xx)
    // =========================================================================
    /// Incomplete record.
    ///
    /// A block ended before one of its mandatory lines was seen.
    E200,

    /// Out-of-order field.
    ///
    /// Sheet fields must be numbered `F0`, `F1`, ... without gaps.
    E201,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Tokenizer errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            // Grammar errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            // Record errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Tokenizer errors
            ErrorCode::E001 => "unterminated quoted text",
            ErrorCode::E002 => "malformed escape sequence",
            ErrorCode::E003 => "invalid UTF-16 text",
            ErrorCode::E004 => "unexpected character",
            // Grammar errors
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of file",
            ErrorCode::E102 => "invalid number",
            ErrorCode::E103 => "invalid value",
            ErrorCode::E104 => "unsupported file version",
            // Record errors
            ErrorCode::E200 => "incomplete record",
            ErrorCode::E201 => "out-of-order field",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
