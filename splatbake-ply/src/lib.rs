//! Splatbake PLY Crate
//!
//! A self-contained reader for the PLY point-cloud files produced by
//! Gaussian-Splatting reconstruction pipelines. Handles all three PLY
//! encodings (ascii, binary little-endian, binary big-endian) and an open,
//! self-describing property schema, and extracts the `vertex` element into
//! owned per-property columns.
//!
//! This crate performs no I/O itself: [`parse`] is a pure function over a
//! byte buffer.

mod error;
mod header;
mod reader;

pub use error::ParseError;
pub use header::{Element, Encoding, PlyHeader, Property, ScalarType};
pub use reader::{VertexColumns, parse};
