//! # wsi-tiff-codec
//!
//! A TIFF/BigTIFF directory parser and length-framed transfer codec for
//! whole-slide pathology image pyramids.
//!
//! This crate parses the IFD chain of a (Big)TIFF whole-slide image,
//! classifies each IFD as a pyramid level, macro image, or label image, and
//! packs the result into a compact, block-framed wire format suitable for
//! sending over a network connection. The same format can be parsed back
//! into the original structure, optionally through a single LZ4-compressed
//! envelope.
//!
//! ## Architecture
//!
//! - [`tiff`] - the directory parser: `TiffHeader`, `Ifd`, `Tag`, and the
//!   `Tiff` walker that builds a full pyramid description from a file or
//!   in-memory buffer.
//! - [`wire`] - the block-framed transfer codec: `serialize`/`deserialize`
//!   between a `Tiff` and its wire representation.
//! - [`io`] - the shared `ByteOrderReader` used by both the header probe and
//!   the IFD walker.
//! - [`error`] - the crate's consolidated error type.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsi_tiff_codec::{tiff::Tiff, wire};
//!
//! let slide = Tiff::open("sample.tiff").expect("valid TIFF");
//! let wire_bytes = wire::serialize(&slide, true);
//! let restored = wire::deserialize(&wire_bytes).expect("valid wire stream");
//! assert_eq!(restored.ifds.len(), slide.ifds.len());
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod tiff;
pub mod wire;

pub use error::{Error, Result};
pub use tiff::{Ifd, SubimageType, Tag, TagValue, Tiff, TiffHeader};
pub use wire::{deserialize, serialize};
