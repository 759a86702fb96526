//! TIFF tag decoding: field types, the inline-vs-offset union, and the
//! widened integer / ASCII / rational readers used to realise tag payloads.

use std::io::{Read, Seek};

use crate::error::{Error, Result};
use crate::io::{read_u32_le, read_u64_le, ByteOrder, ByteOrderReader};

// =============================================================================
// DataType
// =============================================================================

/// TIFF field (data) types.
///
/// Unrecognised type codes are tolerated rather than rejected: they are
/// captured in `Unknown`, their `field_size` is treated as zero, and the
/// caller logs a warning and surfaces the value as opaque bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
    Ifd,
    Long8,
    SLong8,
    Ifd8,
    Unknown(u16),
}

impl DataType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => DataType::Byte,
            2 => DataType::Ascii,
            3 => DataType::Short,
            4 => DataType::Long,
            5 => DataType::Rational,
            6 => DataType::SByte,
            7 => DataType::Undefined,
            8 => DataType::SShort,
            9 => DataType::SLong,
            10 => DataType::SRational,
            11 => DataType::Float,
            12 => DataType::Double,
            13 => DataType::Ifd,
            16 => DataType::Long8,
            17 => DataType::SLong8,
            18 => DataType::Ifd8,
            other => DataType::Unknown(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            DataType::Byte => 1,
            DataType::Ascii => 2,
            DataType::Short => 3,
            DataType::Long => 4,
            DataType::Rational => 5,
            DataType::SByte => 6,
            DataType::Undefined => 7,
            DataType::SShort => 8,
            DataType::SLong => 9,
            DataType::SRational => 10,
            DataType::Float => 11,
            DataType::Double => 12,
            DataType::Ifd => 13,
            DataType::Long8 => 16,
            DataType::SLong8 => 17,
            DataType::Ifd8 => 18,
            DataType::Unknown(v) => v,
        }
    }

    /// Bytes occupied by a single element of this type. Zero for an
    /// unrecognised type per the tolerate-and-warn rule.
    pub fn field_size(self) -> usize {
        match self {
            DataType::Byte | DataType::SByte | DataType::Ascii | DataType::Undefined => 1,
            DataType::Short | DataType::SShort => 2,
            DataType::Long | DataType::SLong | DataType::Ifd | DataType::Float => 4,
            DataType::Rational | DataType::SRational => 8,
            DataType::Double | DataType::Long8 | DataType::SLong8 | DataType::Ifd8 => 8,
            DataType::Unknown(_) => 0,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, DataType::Unknown(_))
    }
}

// =============================================================================
// Tag
// =============================================================================

/// Either an inline value buffer or an absolute file offset, chosen once at
/// decode time based on whether the encoded value fits in the IFD entry's
/// value/offset field.
#[derive(Debug, Clone)]
pub enum TagValue {
    /// Value bytes, zero-padded to the inline capacity (4 classic, 8
    /// BigTIFF) and normalised to little-endian regardless of the file's
    /// own byte order.
    Inline(Vec<u8>),
    /// Absolute offset into the file where the value is stored.
    Offset(u64),
}

/// A normalised TIFF tag: ephemeral, it exists only while an IFD is being
/// decoded.
#[derive(Debug, Clone)]
pub struct Tag {
    pub code: u16,
    pub data_type: DataType,
    pub count: u64,
    pub value: TagValue,
}

impl Tag {
    /// Decode one raw IFD entry (12 bytes classic, 20 bytes BigTIFF).
    pub fn decode(raw: &[u8], byte_order: ByteOrder, is_bigtiff: bool) -> Tag {
        let code = byte_order.read_u16(&raw[0..2]);
        let data_type = DataType::from_u16(byte_order.read_u16(&raw[2..4]));

        let (count, value_field) = if is_bigtiff {
            (byte_order.read_u64(&raw[4..12]), &raw[12..20])
        } else {
            (byte_order.read_u32(&raw[4..8]) as u64, &raw[8..12])
        };

        let inline_capacity = if is_bigtiff { 8 } else { 4 };
        let field_size = data_type.field_size();
        let data_size = field_size as u64 * count;

        let value = if data_size <= inline_capacity as u64 {
            let valid_len = data_size as usize;
            let mut buf = vec![0u8; inline_capacity];
            buf[..valid_len].copy_from_slice(&value_field[..valid_len]);
            normalize_inline(&mut buf, field_size, data_type, byte_order, valid_len);
            TagValue::Inline(buf)
        } else {
            let offset = if is_bigtiff {
                read_u64_le_native(value_field, byte_order)
            } else {
                read_u32_le_native(value_field, byte_order) as u64
            };
            TagValue::Offset(offset)
        };

        Tag {
            code,
            data_type,
            count,
            value,
        }
    }

    pub fn field_size(&self) -> usize {
        self.data_type.field_size()
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.value, TagValue::Inline(_))
    }

    /// Read a scalar inline value widened to `u64`. `None` if the tag's
    /// value is offset-stored.
    pub fn inline_u64(&self) -> Option<u64> {
        match &self.value {
            TagValue::Inline(bytes) => widen_le(&bytes[..self.field_size().max(1)], self.field_size()).ok(),
            TagValue::Offset(_) => None,
        }
    }

    pub fn inline_u32(&self) -> Option<u32> {
        self.inline_u64().map(|v| v as u32)
    }

    /// The widened-to-u64 integer array reader. Handles both inline
    /// and offset-stored arrays of any element count.
    pub fn read_integers<R: Read + Seek>(&self, reader: &mut ByteOrderReader<R>) -> Result<Vec<u64>> {
        let field_size = self.field_size();
        if field_size == 0 {
            return Err(Error::BadFieldSize(0));
        }

        match &self.value {
            TagValue::Inline(bytes) => {
                if self.count == 1 {
                    return Ok(vec![widen_le(bytes, field_size)?]);
                }
                let mut out = Vec::with_capacity(self.count as usize);
                for i in 0..self.count as usize {
                    let start = i * field_size;
                    let end = start + field_size;
                    if end > bytes.len() {
                        break;
                    }
                    out.push(widen_le(&bytes[start..end], field_size)?);
                }
                Ok(out)
            }
            TagValue::Offset(offset) => {
                let total = field_size * self.count as usize;
                let raw = reader.read_at(*offset, total)?;
                let byte_order = reader.byte_order();
                let mut out = Vec::with_capacity(self.count as usize);
                for i in 0..self.count as usize {
                    let start = i * field_size;
                    out.push(widen(&raw[start..start + field_size], field_size, byte_order)?);
                }
                Ok(out)
            }
        }
    }

    /// The ASCII/opaque-blob reader: allocates `max(8, count + 1)`
    /// zero-initialised bytes so ASCII consumers always see a trailing NUL,
    /// regardless of whether the file's own string was terminated.
    pub fn read_ascii_or_opaque<R: Read + Seek>(&self, reader: &mut ByteOrderReader<R>) -> Result<Vec<u8>> {
        let count = self.count as usize;
        let buf_len = count.saturating_add(1).max(8);
        let mut buf = vec![0u8; buf_len];

        match &self.value {
            TagValue::Inline(bytes) => {
                let n = count.min(bytes.len());
                buf[..n].copy_from_slice(&bytes[..n]);
            }
            TagValue::Offset(offset) => {
                if count > 0 {
                    let raw = reader.read_at(*offset, count)?;
                    buf[..count].copy_from_slice(&raw);
                }
            }
        }
        Ok(buf)
    }

    /// The rational array reader.
    pub fn read_rationals<R: Read + Seek>(&self, reader: &mut ByteOrderReader<R>) -> Result<Vec<Rational>> {
        let count = self.count as usize;
        match &self.value {
            TagValue::Inline(bytes) => {
                let mut out = Vec::with_capacity(count);
                for i in 0..count {
                    let start = i * 8;
                    if start + 8 > bytes.len() {
                        break;
                    }
                    out.push(Rational {
                        numerator: read_u32_le(&bytes[start..start + 4]),
                        denominator: read_u32_le(&bytes[start + 4..start + 8]),
                    });
                }
                Ok(out)
            }
            TagValue::Offset(offset) => {
                let raw = reader.read_at(*offset, count * 8)?;
                let byte_order = reader.byte_order();
                let mut out = Vec::with_capacity(count);
                for i in 0..count {
                    let start = i * 8;
                    out.push(Rational {
                        numerator: byte_order.read_u32(&raw[start..start + 4]),
                        denominator: byte_order.read_u32(&raw[start + 4..start + 8]),
                    });
                }
                Ok(out)
            }
        }
    }
}

/// A TIFF rational: a 32-bit numerator over a 32-bit denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub fn as_f64(self) -> f64 {
        if self.denominator == 0 {
            0.0
        } else {
            self.numerator as f64 / self.denominator as f64
        }
    }
}

// =============================================================================
// Endian normalisation (applied exactly once, at decode time)
// =============================================================================

/// Swap each element of an inline value buffer in place so the buffer ends
/// up little-endian regardless of the file's declared byte order.
/// `Rational`/`SRational` swap their two 4-byte halves independently.
fn normalize_inline(buf: &mut [u8], field_size: usize, data_type: DataType, byte_order: ByteOrder, valid_len: usize) {
    if !byte_order.is_big_endian() {
        return;
    }
    let unit = match data_type {
        DataType::Rational | DataType::SRational => 4,
        _ => field_size,
    };
    if unit == 0 {
        return;
    }
    let mut i = 0;
    while i + unit <= valid_len {
        buf[i..i + unit].reverse();
        i += unit;
    }
}

fn read_u32_le_native(bytes: &[u8], byte_order: ByteOrder) -> u32 {
    // The value/offset field of an already-inline-ineligible entry holds a
    // raw file-order offset; read it with the file's declared byte order.
    byte_order.read_u32(bytes)
}

fn read_u64_le_native(bytes: &[u8], byte_order: ByteOrder) -> u64 {
    byte_order.read_u64(bytes)
}

/// Widen a little-endian-normalised inline value of `field_size` bytes to `u64`.
fn widen_le(bytes: &[u8], field_size: usize) -> Result<u64> {
    match field_size {
        1 => Ok(bytes[0] as u64),
        2 => Ok(crate::io::read_u16_le(bytes) as u64),
        4 => Ok(crate::io::read_u32_le(bytes) as u64),
        8 => Ok(crate::io::read_u64_le(bytes)),
        other => Err(Error::BadFieldSize(other)),
    }
}

/// Widen a raw file-order value of `field_size` bytes to `u64`.
fn widen(bytes: &[u8], field_size: usize, byte_order: ByteOrder) -> Result<u64> {
    match field_size {
        1 => Ok(bytes[0] as u64),
        2 => Ok(byte_order.read_u16(bytes) as u64),
        4 => Ok(byte_order.read_u32(bytes) as u64),
        8 => Ok(byte_order.read_u64(bytes)),
        other => Err(Error::BadFieldSize(other)),
    }
}
