//! # sch2svg parser
//!
//! Tokenizer and record readers for the legacy EESchema text formats: the
//! `EESchema Schematic File Version 2` schematic and the
//! `EESchema-LIBRARY Version 2.x` component cache library.
//!
//! ## Usage
//!
//! ```
//! # use sch2svg_parser::{SchematicReader, FileFormatError, records::Record};
//! fn main() -> Result<(), FileFormatError> {
//!     let source = "EESchema Schematic File Version 2\nConnection ~ 100 200\n$EndSCHEMATC\n";
//!
//!     let mut reader = SchematicReader::new(source, "demo.sch")?;
//!     let mut records = Vec::new();
//!     while let Some(record) = reader.next_record()? {
//!         records.push(record);
//!     }
//!     assert!(matches!(records[..], [Record::Connection(_)]));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod library;
mod position;
pub mod records;
pub mod schematic;
#[cfg(test)]
mod schematic_tests;
pub mod tokenizer;
pub mod tokens;

pub use error::{ErrorCode, FileFormatError, Result};
pub use library::LibraryReader;
pub use position::Position;
pub use schematic::SchematicReader;
