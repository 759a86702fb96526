//! Endian-aware reads over a seekable byte source.
//!
//! TIFF files declare their own byte order in the header; every multi-byte
//! value in the file must be read respecting it. `ByteOrderReader` wraps any
//! `Read + Seek` (a local `File`, or an in-memory `Cursor<Vec<u8>>` for tests
//! and for the deserializer) and never relies on the host's native
//! endianness.
//!
//! The reader is synchronous and blocking throughout: the crate has no
//! network I/O and no async runtime in its core.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};

// =============================================================================
// Endian helpers
// =============================================================================

#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

#[inline]
pub fn read_u16_be(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
pub fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
pub fn read_u64_le(bytes: &[u8]) -> u64 {
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

#[inline]
pub fn read_u64_be(bytes: &[u8]) -> u64 {
    u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Byte order (endianness) declared by a TIFF file's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// `II` — Intel, little-endian.
    LittleEndian,
    /// `MM` — Motorola, big-endian.
    BigEndian,
}

impl ByteOrder {
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => read_u64_le(bytes),
            ByteOrder::BigEndian => read_u64_be(bytes),
        }
    }

    #[inline]
    pub fn is_big_endian(self) -> bool {
        matches!(self, ByteOrder::BigEndian)
    }
}

// =============================================================================
// ByteOrderReader
// =============================================================================

/// A thin wrapper over a seekable byte source that reads fixed-width
/// unsigned integers with a chosen endianness.
///
/// `read_at` is the only operation that seeks; it saves the current
/// position, performs the read, and restores the position afterwards, so a
/// single `ByteOrderReader` must never be driven from more than one thread
/// at a time (see the crate-level concurrency notes).
pub struct ByteOrderReader<R> {
    inner: R,
    byte_order: ByteOrder,
    len: u64,
}

impl<R: Read + Seek> ByteOrderReader<R> {
    pub fn new(inner: R, byte_order: ByteOrder, len: u64) -> Self {
        Self {
            inner,
            byte_order,
            len,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Unwrap the underlying reader. Used when the declared byte order
    /// changes mid-stream, e.g. once the TIFF header has been read with a
    /// placeholder order and the real one is now known.
    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Read exactly `buf.len()` bytes from the current position.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::Eof {
                    offset: 0,
                    needed: buf.len() as u64,
                    available: 0,
                }
            } else {
                Error::Io(e)
            }
        })
    }

    /// Read `len` bytes at `offset`, restoring the prior position afterwards.
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if offset.saturating_add(len as u64) > self.len {
            return Err(Error::Eof {
                offset,
                needed: len as u64,
                available: self.len.saturating_sub(offset),
            });
        }
        let saved = self.position()?;
        self.seek(offset)?;
        let mut buf = vec![0u8; len];
        let result = self.read_exact(&mut buf);
        self.seek(saved)?;
        result?;
        Ok(buf)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(self.byte_order.read_u16(&buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(self.byte_order.read_u32(&buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(self.byte_order.read_u64(&buf))
    }
}
