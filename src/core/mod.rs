//! # Core Codec Components
//!
//! Matrix values, collections and their binary encoding.
//!
//! This module holds the wire-level building blocks: the matrix block format,
//! the pinned matrix handle, length-prefixed strings, the list codec and the
//! stream framing codec.
//!
//! ## Components
//! - **Matrix**: dense/sparse blocks with a self-describing binary form
//! - **Handle**: shared matrix handles with scoped read pins
//! - **Data**: collection entries and `NamedCollection`
//! - **List codec**: size / encode / decode for collections
//! - **Codec**: Tokio codec for framing RPC messages over byte streams
//!
//! ## Wire Format
//! ```text
//! [EntryCount(4)] [IsNamed(1)] ([Name(2+N)]? [Matrix(17+M)])*
//! ```
//!
//! ## Security
//! - Encoded sizes bounded by `i32::MAX`
//! - Declared lengths checked against remaining input before allocation

pub mod codec;
pub mod data;
pub mod handle;
pub mod list_codec;
pub mod matrix;
pub mod utf;
