//! Fixed-layout wire records: block framing, the top-level `SerialHeader`,
//! and the per-IFD `SerialIfd`. All multi-byte fields are little-endian;
//! the layouts are hand-rolled (no serde), matching how the rest of this
//! crate hand-rolls its own TIFF byte layouts.

use crate::error::{Error, Result};
use crate::tiff::{Rational, SubimageType};

/// `SerialBlock` = {u32 block_type, u32 index, u64 length}: 16 bytes.
pub const SERIAL_BLOCK_SIZE: usize = 16;

/// Stable numeric block-type assignments. Part of the wire contract:
/// unknown values must be skipped, not rejected (forward compatibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Terminator,
    HeaderAndMeta,
    Ifds,
    ImageDescription,
    TileOffsets,
    TileByteCounts,
    JpegTables,
    Lz4CompressedData,
    Unknown(u32),
}

impl BlockType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => BlockType::Terminator,
            1 => BlockType::HeaderAndMeta,
            2 => BlockType::Ifds,
            3 => BlockType::ImageDescription,
            4 => BlockType::TileOffsets,
            5 => BlockType::TileByteCounts,
            6 => BlockType::JpegTables,
            7 => BlockType::Lz4CompressedData,
            other => BlockType::Unknown(other),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            BlockType::Terminator => 0,
            BlockType::HeaderAndMeta => 1,
            BlockType::Ifds => 2,
            BlockType::ImageDescription => 3,
            BlockType::TileOffsets => 4,
            BlockType::TileByteCounts => 5,
            BlockType::JpegTables => 6,
            BlockType::Lz4CompressedData => 7,
            BlockType::Unknown(v) => v,
        }
    }
}

/// A block-framing record: precedes every block's payload in the stream.
#[derive(Debug, Clone, Copy)]
pub struct SerialBlock {
    pub block_type: BlockType,
    pub index: u32,
    pub length: u64,
}

impl SerialBlock {
    pub fn new(block_type: BlockType, index: u32, length: u64) -> Self {
        SerialBlock {
            block_type,
            index,
            length,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.block_type.as_u32().to_le_bytes());
        out.extend_from_slice(&self.index.to_le_bytes());
        out.extend_from_slice(&self.length.to_le_bytes());
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SERIAL_BLOCK_SIZE {
            return Err(Error::MalformedStream(format!(
                "short block header: {} bytes",
                bytes.len()
            )));
        }
        let block_type = BlockType::from_u32(u32::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
        ]));
        let index = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let length = u64::from_le_bytes([
            bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
        ]);
        Ok(SerialBlock {
            block_type,
            index,
            length,
        })
    }
}

/// Wire sentinel for an unset role index: role 0 doubles as "first IFD", so
/// a `Tiff` whose macro/label/level role genuinely points at IFD 0 is
/// indistinguishable from "unset" on the wire. This ambiguity is inherited,
/// not introduced; see DESIGN.md.
const UNSET_ROLE: u32 = 0;

pub(crate) fn encode_role_index(role: Option<usize>) -> u32 {
    role.map(|i| i as u32).unwrap_or(UNSET_ROLE)
}

pub(crate) fn decode_role_index(wire: u32) -> Option<usize> {
    if wire == UNSET_ROLE {
        None
    } else {
        Some(wire as usize)
    }
}

/// The `Tiff` scalars, fixed-size and independent of `ifd_count`. Layout:
/// filesize(8) ifd_count(4) main(4) macro(4) label(4) level_image(4)
/// level_count(4) offset_width(1) is_big_endian(1) is_bigtiff(1) pad(1)
/// mpp_x(8) mpp_y(8) = 52 bytes.
pub const SERIAL_HEADER_SIZE: usize = 52;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SerialHeader {
    pub filesize: u64,
    pub ifd_count: u32,
    pub main_image_index: u32,
    pub macro_image_index: u32,
    pub label_image_index: u32,
    pub level_image_index: u32,
    pub level_count: u32,
    pub offset_width: u8,
    pub is_big_endian: bool,
    pub is_bigtiff: bool,
    pub mpp_x: f64,
    pub mpp_y: f64,
}

impl SerialHeader {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SERIAL_HEADER_SIZE);
        out.extend_from_slice(&self.filesize.to_le_bytes());
        out.extend_from_slice(&self.ifd_count.to_le_bytes());
        out.extend_from_slice(&self.main_image_index.to_le_bytes());
        out.extend_from_slice(&self.macro_image_index.to_le_bytes());
        out.extend_from_slice(&self.label_image_index.to_le_bytes());
        out.extend_from_slice(&self.level_image_index.to_le_bytes());
        out.extend_from_slice(&self.level_count.to_le_bytes());
        out.push(self.offset_width);
        out.push(self.is_big_endian as u8);
        out.push(self.is_bigtiff as u8);
        out.push(0); // padding
        out.extend_from_slice(&self.mpp_x.to_le_bytes());
        out.extend_from_slice(&self.mpp_y.to_le_bytes());
        debug_assert_eq!(out.len(), SERIAL_HEADER_SIZE);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SERIAL_HEADER_SIZE {
            return Err(Error::MalformedStream(format!(
                "short SerialHeader: {} bytes",
                bytes.len()
            )));
        }
        let u32_at = |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        let f64_at = |o: usize| f64::from_le_bytes(bytes[o..o + 8].try_into().unwrap());

        Ok(SerialHeader {
            filesize: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            ifd_count: u32_at(8),
            main_image_index: u32_at(12),
            macro_image_index: u32_at(16),
            label_image_index: u32_at(20),
            level_image_index: u32_at(24),
            level_count: u32_at(28),
            offset_width: bytes[32],
            is_big_endian: bytes[33] != 0,
            is_bigtiff: bytes[34] != 0,
            mpp_x: f64_at(36),
            mpp_y: f64_at(44),
        })
    }
}

/// Maximum `ReferenceBlackWhite` rationals carried inline in a `SerialIfd`
/// (2 per channel × 3 channels, the standard RGB layout).
pub const MAX_REFERENCE_BLACK_WHITE: usize = 6;

/// The `Ifd` scalars and lengths; the variable-length payloads
/// (image_description, tile_offsets, tile_byte_counts, jpeg_tables) travel
/// in their own per-IFD blocks. Layout: ifd_index(4) image_width(4)
/// image_height(4) tile_width(4) tile_height(4) tile_count(8)
/// compression(2) color_space(2) chroma_x(2) chroma_y(2) subimage_type(1)
/// pad(3) subfile_type(4) image_description_len(4) jpeg_tables_len(4)
/// um_per_pixel_x(8) um_per_pixel_y(8) reference_black_white_count(4)
/// reference_black_white[MAX_REFERENCE_BLACK_WHITE](8 each) = 120 bytes.
pub const SERIAL_IFD_SIZE: usize = 72 + MAX_REFERENCE_BLACK_WHITE * 8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerialIfd {
    pub ifd_index: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u64,
    pub compression: u16,
    pub color_space: u16,
    pub chroma_subsampling: (u16, u16),
    pub subimage_type: SubimageType,
    pub subfile_type: u32,
    pub image_description_len: u32,
    pub jpeg_tables_len: u32,
    pub um_per_pixel_x: f64,
    pub um_per_pixel_y: f64,
    pub reference_black_white: Vec<Rational>,
}

fn subimage_type_to_u8(t: SubimageType) -> u8 {
    match t {
        SubimageType::Unknown => 0,
        SubimageType::Level => 1,
        SubimageType::Macro => 2,
        SubimageType::Label => 3,
    }
}

fn subimage_type_from_u8(v: u8) -> SubimageType {
    match v {
        1 => SubimageType::Level,
        2 => SubimageType::Macro,
        3 => SubimageType::Label,
        _ => SubimageType::Unknown,
    }
}

impl SerialIfd {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SERIAL_IFD_SIZE);
        out.extend_from_slice(&self.ifd_index.to_le_bytes());
        out.extend_from_slice(&self.image_width.to_le_bytes());
        out.extend_from_slice(&self.image_height.to_le_bytes());
        out.extend_from_slice(&self.tile_width.to_le_bytes());
        out.extend_from_slice(&self.tile_height.to_le_bytes());
        out.extend_from_slice(&self.tile_count.to_le_bytes());
        out.extend_from_slice(&self.compression.to_le_bytes());
        out.extend_from_slice(&self.color_space.to_le_bytes());
        out.extend_from_slice(&self.chroma_subsampling.0.to_le_bytes());
        out.extend_from_slice(&self.chroma_subsampling.1.to_le_bytes());
        out.push(subimage_type_to_u8(self.subimage_type));
        out.extend_from_slice(&[0u8; 3]);
        out.extend_from_slice(&self.subfile_type.to_le_bytes());
        out.extend_from_slice(&self.image_description_len.to_le_bytes());
        out.extend_from_slice(&self.jpeg_tables_len.to_le_bytes());
        out.extend_from_slice(&self.um_per_pixel_x.to_le_bytes());
        out.extend_from_slice(&self.um_per_pixel_y.to_le_bytes());
        out.extend_from_slice(&(self.reference_black_white.len() as u32).to_le_bytes());
        for i in 0..MAX_REFERENCE_BLACK_WHITE {
            let r = self.reference_black_white.get(i).copied().unwrap_or_default();
            out.extend_from_slice(&r.numerator.to_le_bytes());
            out.extend_from_slice(&r.denominator.to_le_bytes());
        }
        debug_assert_eq!(out.len(), SERIAL_IFD_SIZE);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SERIAL_IFD_SIZE {
            return Err(Error::MalformedStream(format!(
                "short SerialIfd: {} bytes",
                bytes.len()
            )));
        }
        let u32_at = |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        let u16_at = |o: usize| u16::from_le_bytes([bytes[o], bytes[o + 1]]);
        let u64_at = |o: usize| u64::from_le_bytes(bytes[o..o + 8].try_into().unwrap());
        let f64_at = |o: usize| f64::from_le_bytes(bytes[o..o + 8].try_into().unwrap());

        let ref_count = u32_at(68).min(MAX_REFERENCE_BLACK_WHITE as u32) as usize;
        let mut reference_black_white = Vec::with_capacity(ref_count);
        for i in 0..ref_count {
            let o = 72 + i * 8;
            reference_black_white.push(Rational {
                numerator: u32_at(o),
                denominator: u32_at(o + 4),
            });
        }

        Ok(SerialIfd {
            ifd_index: u32_at(0),
            image_width: u32_at(4),
            image_height: u32_at(8),
            tile_width: u32_at(12),
            tile_height: u32_at(16),
            tile_count: u64_at(20),
            compression: u16_at(28),
            color_space: u16_at(30),
            chroma_subsampling: (u16_at(32), u16_at(34)),
            subimage_type: subimage_type_from_u8(bytes[36]),
            subfile_type: u32_at(40),
            image_description_len: u32_at(44),
            jpeg_tables_len: u32_at(48),
            um_per_pixel_x: f64_at(52),
            um_per_pixel_y: f64_at(60),
            reference_black_white,
        })
    }
}
