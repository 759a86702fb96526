//! The IFD walker: parses a file header, walks the IFD chain, classifies
//! each IFD, and assembles the top-level `Tiff` description.

use std::fs::File;
use std::io::Cursor;
use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::io::{ByteOrder, ByteOrderReader};

use super::header::TiffHeader;
use super::ifd::{Ifd, SubimageType, REDUCEDIMAGE_BIT};
use super::tag::{DataType, Tag};

/// Safety cap on the number of IFDs walked, so a cyclic or adversarial
/// `next_ifd_offset` chain cannot hang the parser.
const MAX_IFDS: usize = 1000;

const TAG_NEW_SUBFILE_TYPE: u16 = 254;
const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC_INTERPRETATION: u16 = 262;
const TAG_IMAGE_DESCRIPTION: u16 = 270;
const TAG_TILE_WIDTH: u16 = 322;
const TAG_TILE_LENGTH: u16 = 323;
const TAG_TILE_OFFSETS: u16 = 324;
const TAG_TILE_BYTE_COUNTS: u16 = 325;
const TAG_JPEG_TABLES: u16 = 347;
const TAG_YCBCR_SUBSAMPLING: u16 = 530;
const TAG_REFERENCE_BLACK_WHITE: u16 = 532;

/// Baseline resolution at level 0, in micrometres per pixel. Real vendor
/// files encode this in the `ImageDescription` string (`MPP=`, `AppMag=`);
/// this parser uses a fixed baseline and doubles it per level, leaving
/// non-level images untouched.
const BASELINE_MPP: f64 = 0.25;

/// Top-level parsed TIFF/BigTIFF description: the whole IFD chain plus the
/// role indices and pyramid scalars derived from it.
#[derive(Debug, Clone)]
pub struct Tiff {
    pub filesize: u64,
    pub is_big_endian: bool,
    pub is_bigtiff: bool,
    pub offset_width: u8,

    pub ifds: Vec<Ifd>,

    pub main_image_index: usize,
    pub macro_image_index: Option<usize>,
    pub label_image_index: Option<usize>,
    pub level_image_index: Option<usize>,

    pub level_count: u32,
    pub mpp_x: f64,
    pub mpp_y: f64,
}

impl Tiff {
    /// Open and fully parse a TIFF/BigTIFF file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let filesize = file.metadata()?.len();
        Self::from_reader(file, filesize)
    }

    /// Parse a TIFF/BigTIFF file already held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let filesize = bytes.len() as u64;
        Self::from_reader(Cursor::new(bytes), filesize)
    }

    fn from_reader<R: Read + Seek>(inner: R, filesize: u64) -> Result<Self> {
        if filesize < super::header::TIFF_HEADER_SIZE as u64 {
            return Err(Error::FileTooSmall {
                required: super::header::TIFF_HEADER_SIZE as u64,
                actual: filesize,
            });
        }

        // Placeholder byte order until the header tells us the real one; the
        // header bytes are read with a hand-rolled little-endian probe of the
        // magic, so any order here is fine for the first 16 bytes.
        let mut reader = ByteOrderReader::new(inner, ByteOrder::LittleEndian, filesize);
        let header_len = (super::header::BIGTIFF_HEADER_SIZE as u64).min(filesize) as usize;
        let header_bytes = reader.read_at(0, header_len)?;
        let header = TiffHeader::parse(&header_bytes, filesize)?;

        let mut reader = ByteOrderReader::new(reader_into_inner(reader), header.byte_order, filesize);

        let ifds = walk_ifds(&mut reader, &header)?;

        let mut tiff = Tiff {
            filesize,
            is_big_endian: header.byte_order.is_big_endian(),
            is_bigtiff: header.is_bigtiff,
            offset_width: header.offset_width(),
            ifds,
            main_image_index: 0,
            macro_image_index: None,
            label_image_index: None,
            level_image_index: None,
            level_count: 0,
            mpp_x: 0.0,
            mpp_y: 0.0,
        };
        tiff.post_process();

        info!(
            filesize = tiff.filesize,
            big_endian = tiff.is_big_endian,
            bigtiff = tiff.is_bigtiff,
            level_count = tiff.level_count,
            "parsed TIFF pyramid"
        );

        Ok(tiff)
    }

    /// Assign role indices, level count and µm/pixel scalars once every IFD
    /// has been classified.
    fn post_process(&mut self) {
        let mut first_level: Option<usize> = None;
        let mut level_ordinal: u32 = 0;

        for (i, ifd) in self.ifds.iter_mut().enumerate() {
            match ifd.subimage_type {
                SubimageType::Macro => {
                    if self.macro_image_index.is_none() {
                        self.macro_image_index = Some(i);
                    }
                }
                SubimageType::Label => {
                    if self.label_image_index.is_none() {
                        self.label_image_index = Some(i);
                    }
                }
                SubimageType::Level => {
                    if first_level.is_none() {
                        first_level = Some(i);
                    }
                    let mpp_x = BASELINE_MPP * 2f64.powi(level_ordinal as i32);
                    let mpp_y = mpp_x;
                    ifd.um_per_pixel_x = mpp_x;
                    ifd.um_per_pixel_y = mpp_y;
                    level_ordinal += 1;
                }
                SubimageType::Unknown => {}
            }
        }

        self.level_image_index = first_level;
        self.level_count = level_ordinal;
        if let Some(idx) = first_level {
            self.mpp_x = self.ifds[idx].um_per_pixel_x;
            self.mpp_y = self.ifds[idx].um_per_pixel_y;
        }
    }
}

/// Reclaim the inner `R` out of a `ByteOrderReader`, for the header-probe /
/// real-reader split in `from_reader`. `ByteOrderReader` has no public
/// accessor for this because normal callers never need it; the header parse
/// is the one place the byte order changes mid-stream.
fn reader_into_inner<R>(reader: ByteOrderReader<R>) -> R {
    reader.into_inner()
}

fn walk_ifds<R: Read + Seek>(reader: &mut ByteOrderReader<R>, header: &TiffHeader) -> Result<Vec<Ifd>> {
    let mut ifds = Vec::new();
    let mut offset = header.first_ifd_offset;
    let mut seen = std::collections::HashSet::new();

    while offset != 0 && ifds.len() < MAX_IFDS {
        if !seen.insert(offset) {
            warn!(offset, "IFD chain cycle detected, stopping walk");
            break;
        }

        let (ifd, next_offset) = read_one_ifd(reader, header, ifds.len() as u32, offset)?;
        debug!(ifd_index = ifd.ifd_index, subimage_type = ?ifd.subimage_type, "classified IFD");
        ifds.push(ifd);
        offset = next_offset;
    }

    Ok(ifds)
}

fn read_one_ifd<R: Read + Seek>(
    reader: &mut ByteOrderReader<R>,
    header: &TiffHeader,
    ifd_index: u32,
    offset: u64,
) -> Result<(Ifd, u64)> {
    reader.seek(offset)?;

    let count_bytes = {
        let mut buf = vec![0u8; header.count_field_size()];
        reader.read_exact(&mut buf)?;
        buf
    };
    let tag_count = if header.is_bigtiff {
        header.byte_order.read_u64(&count_bytes)
    } else {
        header.byte_order.read_u16(&count_bytes) as u64
    };

    let mut raw_entries = vec![0u8; tag_count as usize * header.entry_size()];
    reader.read_exact(&mut raw_entries)?;

    let mut next_offset_buf = vec![0u8; header.next_offset_size()];
    reader.read_exact(&mut next_offset_buf)?;
    let next_offset = if header.is_bigtiff {
        header.byte_order.read_u64(&next_offset_buf)
    } else {
        header.byte_order.read_u32(&next_offset_buf) as u64
    };

    let mut ifd = Ifd::new(ifd_index);

    for i in 0..tag_count as usize {
        let start = i * header.entry_size();
        let raw = &raw_entries[start..start + header.entry_size()];
        let tag = Tag::decode(raw, header.byte_order, header.is_bigtiff);
        if tag.data_type.is_unknown() {
            warn!(code = tag.code, "unrecognised tag data type");
        }
        apply_tag(&mut ifd, &tag, reader)?;
    }

    classify(&mut ifd, ifd_index);

    Ok((ifd, next_offset))
}

fn apply_tag<R: Read + Seek>(ifd: &mut Ifd, tag: &Tag, reader: &mut ByteOrderReader<R>) -> Result<()> {
    match tag.code {
        TAG_NEW_SUBFILE_TYPE => {
            ifd.subfile_type = tag.inline_u32().unwrap_or(0);
        }
        TAG_IMAGE_WIDTH => {
            ifd.image_width = tag.inline_u32().unwrap_or(0);
        }
        TAG_IMAGE_LENGTH => {
            ifd.image_height = tag.inline_u32().unwrap_or(0);
        }
        TAG_BITS_PER_SAMPLE => {
            // Must be 8 per sample; not otherwise tracked.
        }
        TAG_COMPRESSION => {
            ifd.compression = tag.inline_u32().unwrap_or(0) as u16;
        }
        TAG_PHOTOMETRIC_INTERPRETATION => {
            ifd.color_space = tag.inline_u32().unwrap_or(ifd.color_space as u32) as u16;
        }
        TAG_IMAGE_DESCRIPTION => {
            ifd.image_description = tag.read_ascii_or_opaque(reader)?;
        }
        TAG_TILE_WIDTH => {
            ifd.tile_width = tag.inline_u32().unwrap_or(0);
        }
        TAG_TILE_LENGTH => {
            ifd.tile_height = tag.inline_u32().unwrap_or(0);
        }
        TAG_TILE_OFFSETS => {
            ifd.tile_count = tag.count;
            ifd.tile_offsets = tag.read_integers(reader)?;
        }
        TAG_TILE_BYTE_COUNTS => {
            if tag.count != ifd.tile_count {
                return Err(Error::TileCountMismatch {
                    offsets: ifd.tile_count,
                    byte_counts: tag.count,
                });
            }
            ifd.tile_byte_counts = tag.read_integers(reader)?;
        }
        TAG_JPEG_TABLES => {
            ifd.jpeg_tables = tag.read_ascii_or_opaque(reader)?;
        }
        TAG_YCBCR_SUBSAMPLING => {
            let values = match tag.data_type {
                DataType::Short => tag.read_integers(reader).unwrap_or_default(),
                _ => Vec::new(),
            };
            if values.len() >= 2 {
                ifd.chroma_subsampling = (values[0] as u16, values[1] as u16);
            }
        }
        TAG_REFERENCE_BLACK_WHITE => {
            ifd.reference_black_white = tag.read_rationals(reader)?;
        }
        _ => {}
    }
    Ok(())
}

fn classify(ifd: &mut Ifd, ifd_index: u32) {
    let description = ifd.image_description.as_slice();

    if starts_with_ignore_nul(description, b"Macro") {
        ifd.subimage_type = SubimageType::Macro;
    } else if starts_with_ignore_nul(description, b"Label") {
        ifd.subimage_type = SubimageType::Label;
    } else if starts_with_ignore_nul(description, b"level") {
        ifd.subimage_type = SubimageType::Level;
    } else if ifd.subimage_type == SubimageType::Unknown
        && ifd.tile_width > 0
        && (ifd_index == 0 || ifd.subfile_type & REDUCEDIMAGE_BIT != 0)
    {
        ifd.subimage_type = SubimageType::Level;
    }
}

fn starts_with_ignore_nul(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && &haystack[..needle.len()] == needle
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A classic TIFF whose first IFD has a single `ImageWidth = 512` tag.
    #[test]
    fn single_tag_image_width() {
        let mut bytes = vec![0u8; 64];
        // Header: II, 42, first IFD at 8.
        bytes[0..8].copy_from_slice(&[0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]);
        // IFD at offset 8: tag_count = 1 (u16 LE)
        bytes[8..10].copy_from_slice(&1u16.to_le_bytes());
        // Entry: code=256, type=SHORT(3), count=1, value=512 (LE)
        bytes[10..12].copy_from_slice(&256u16.to_le_bytes());
        bytes[12..14].copy_from_slice(&3u16.to_le_bytes());
        bytes[14..18].copy_from_slice(&1u32.to_le_bytes());
        bytes[18..22].copy_from_slice(&512u32.to_le_bytes());
        // next IFD offset = 0
        bytes[22..26].copy_from_slice(&0u32.to_le_bytes());

        let tiff = Tiff::from_bytes(bytes).unwrap();
        assert_eq!(tiff.ifds.len(), 1);
        assert_eq!(tiff.ifds[0].image_width, 512);
    }

    #[test]
    fn rejects_bigtiff_offset_width_mismatch() {
        let bytes = vec![
            0x4D, 0x4D, 0x00, 0x2B, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x10,
        ];
        let err = Tiff::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, Error::BadBigTiffOffsetSize(9)));
    }

    #[test]
    fn classifies_macro_and_label_by_description() {
        let mut ifd = Ifd::new(5);
        ifd.image_description = b"Macro image\0".to_vec();
        classify(&mut ifd, 5);
        assert_eq!(ifd.subimage_type, SubimageType::Macro);

        let mut ifd2 = Ifd::new(6);
        ifd2.image_description = b"Label\0".to_vec();
        classify(&mut ifd2, 6);
        assert_eq!(ifd2.subimage_type, SubimageType::Label);
    }

    #[test]
    fn classifies_first_tiled_ifd_as_level_without_description() {
        let mut ifd = Ifd::new(0);
        ifd.tile_width = 256;
        classify(&mut ifd, 0);
        assert_eq!(ifd.subimage_type, SubimageType::Level);
    }

    #[test]
    fn tile_count_mismatch_is_an_error() {
        let mut bytes = vec![0u8; 128];
        bytes[0..8].copy_from_slice(&[0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00]);
        bytes[8..10].copy_from_slice(&2u16.to_le_bytes());

        // TileOffsets: code=324, type=LONG(4), count=1, value=100
        bytes[10..12].copy_from_slice(&324u16.to_le_bytes());
        bytes[12..14].copy_from_slice(&4u16.to_le_bytes());
        bytes[14..18].copy_from_slice(&1u32.to_le_bytes());
        bytes[18..22].copy_from_slice(&100u32.to_le_bytes());

        // TileByteCounts: code=325, type=LONG(4), count=2 -> offset-stored, mismatched count
        bytes[22..24].copy_from_slice(&325u16.to_le_bytes());
        bytes[24..26].copy_from_slice(&4u16.to_le_bytes());
        bytes[26..30].copy_from_slice(&2u32.to_le_bytes());
        bytes[30..34].copy_from_slice(&40u32.to_le_bytes());

        bytes[34..38].copy_from_slice(&0u32.to_le_bytes());

        let err = Tiff::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, Error::TileCountMismatch { offsets: 1, byte_counts: 2 }));
    }
}
