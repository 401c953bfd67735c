//! sch2svg Core Types
//!
//! This crate provides the building blocks shared by the sch2svg parser and
//! renderer. It includes:
//!
//! - **Geometry**: integer points, placement matrices and quarter-turn
//!   rotations ([`geometry`] module)
//! - **Colors**: CSS color parsing and the drawing palette ([`color`] module)
//! - **Font**: the glyph source trait and built-in stroke font ([`font`] module)
//! - **Writer**: the streaming, attribute-inheriting SVG writer ([`writer`] module)

pub mod color;
pub mod error;
pub mod font;
pub mod geometry;
pub mod writer;
