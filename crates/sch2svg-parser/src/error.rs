//! Error types for the sch2svg parser.
//!
//! Every failure caused by document content is a [`FileFormatError`]. It
//! always carries an [`ErrorCode`], the source identifier, and the line and
//! column of the offending token, plus an expected-vs-found message.
//!
//! # Example
//!
//! ```
//! # use sch2svg_parser::{Position, error::{ErrorCode, FileFormatError}};
//! let err = FileFormatError::new(ErrorCode::E100, "expected `Line`, found `Lne`", Position::new(3, 10), "demo.sch");
//! assert_eq!(err.to_string(), "demo.sch:3:10: expected `Line`, found `Lne`");
//! ```

mod error_code;
mod format_error;

pub use error_code::ErrorCode;
pub use format_error::{FileFormatError, Result};
