//! Error types for TIFF/BigTIFF parsing and wire (de)serialization.
//!
//! The crate surfaces a single error enum to callers. Parsing and
//! serialization never retry, and any partially built state is dropped
//! (ownership makes this automatic) before the error propagates.

use thiserror::Error;

/// Errors that can occur while parsing a TIFF/BigTIFF file or while
/// serializing/deserializing the wire format.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying file or buffer read failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read reached the end of the file/buffer before satisfying the request.
    #[error("unexpected end of data: needed {needed} bytes at offset {offset}, have {available}")]
    Eof {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// The file's first two bytes are neither `II` nor `MM`.
    #[error("bad TIFF magic: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    BadMagic(u16),

    /// The version field after the byte-order mark is neither 42 nor 43.
    #[error("bad TIFF version: expected 42 (classic) or 43 (BigTIFF), got {0}")]
    BadVersion(u16),

    /// A BigTIFF header declared an offset size other than 8.
    #[error("bad BigTIFF offset size: expected 8, got {0}")]
    BadBigTiffOffsetSize(u16),

    /// A BigTIFF header's reserved field was non-zero.
    #[error("bad BigTIFF reserved field: expected 0, got {0}")]
    BadBigTiffReserved(u16),

    /// The header (or an IFD) claims more bytes than the file/buffer holds.
    #[error("file too small: need at least {required} bytes, have {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// The first (or next) IFD offset points outside the file.
    #[error("invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// An integer array tag has an element size this decoder cannot widen.
    #[error("cannot widen field of size {0} bytes to a uniform integer width")]
    BadFieldSize(usize),

    /// `TileByteCounts` and `TileOffsets` disagree on element count.
    #[error("tile count mismatch: TileOffsets has {offsets}, TileByteCounts has {byte_counts}")]
    TileCountMismatch { offsets: u64, byte_counts: u64 },

    /// A required tag was absent from an IFD that needed it.
    #[error("missing required tag: {0}")]
    MissingTag(&'static str),

    /// The wire stream violates block framing (wrong order, bad length, truncation).
    #[error("malformed wire stream: {0}")]
    MalformedStream(String),

    /// The same per-IFD payload block kind appeared twice for one IFD index.
    #[error("duplicate {kind} block for IFD {ifd_index}")]
    DuplicateBlock { kind: &'static str, ifd_index: u32 },

    /// The LZ4 envelope failed to compress or decompress.
    #[error("LZ4 (de)compression failed: {0}")]
    DecompressionFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
