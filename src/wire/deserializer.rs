//! The inverse of `serializer`: tolerates reordered per-IFD payload blocks,
//! an optional leading HTTP header, and an optional LZ4 envelope.

use tracing::warn;

use crate::error::{Error, Result};
use crate::tiff::{Ifd, Tiff};

use super::block::{
    decode_role_index, BlockType, SerialBlock, SerialHeader, SerialIfd, SERIAL_BLOCK_SIZE,
    SERIAL_IFD_SIZE,
};
use super::http_header;

/// Tracks which per-IFD payload blocks have already been populated, so a
/// repeat of the same kind for the same IFD is rejected as `DuplicateBlock`.
#[derive(Default, Clone)]
struct Seen {
    image_description: bool,
    tile_offsets: bool,
    tile_byte_counts: bool,
    jpeg_tables: bool,
}

/// Parse a byte stream produced by [`super::serialize`] back into a `Tiff`.
pub fn deserialize(bytes: &[u8]) -> Result<Tiff> {
    let mut cursor = http_header::skip(bytes);
    let first_block = read_block(bytes, &mut cursor)?;

    if first_block.block_type != BlockType::Lz4CompressedData {
        return parse_body(bytes, cursor, first_block);
    }

    let compressed = read_payload(bytes, &mut cursor, first_block.length as usize)?;
    let expected_len = first_block.index as usize;
    let decompressed = lz4_flex::block::decompress(compressed, expected_len)
        .map_err(|e| Error::DecompressionFailed(e.to_string()))?;
    if decompressed.len() != expected_len {
        return Err(Error::DecompressionFailed(format!(
            "expected {expected_len} bytes, got {}",
            decompressed.len()
        )));
    }

    let mut inner_cursor = 0usize;
    let header_block = read_block(&decompressed, &mut inner_cursor)?;
    parse_body(&decompressed, inner_cursor, header_block)
}

fn parse_body(bytes: &[u8], mut cursor: usize, header_block: SerialBlock) -> Result<Tiff> {
    if header_block.block_type != BlockType::HeaderAndMeta {
        return Err(Error::MalformedStream(
            "expected HEADER_AND_META as the first block".into(),
        ));
    }
    let header_bytes = read_payload(bytes, &mut cursor, header_block.length as usize)?;
    let header = SerialHeader::decode(header_bytes)?;

    let ifds_block = read_block(bytes, &mut cursor)?;
    if ifds_block.block_type != BlockType::Ifds {
        return Err(Error::MalformedStream("expected IFDS as the second block".into()));
    }
    let expected_ifds_len = header.ifd_count as u64 * SERIAL_IFD_SIZE as u64;
    if ifds_block.length != expected_ifds_len {
        return Err(Error::MalformedStream(format!(
            "IFDS block length {} does not match ifd_count {}",
            ifds_block.length, header.ifd_count
        )));
    }
    let ifds_bytes = read_payload(bytes, &mut cursor, ifds_block.length as usize)?;

    let mut serial_ifds = Vec::with_capacity(header.ifd_count as usize);
    for i in 0..header.ifd_count as usize {
        let start = i * SERIAL_IFD_SIZE;
        serial_ifds.push(SerialIfd::decode(&ifds_bytes[start..start + SERIAL_IFD_SIZE])?);
    }

    let mut ifds: Vec<Ifd> = serial_ifds
        .into_iter()
        .map(|s| Ifd {
            ifd_index: s.ifd_index,
            image_width: s.image_width,
            image_height: s.image_height,
            tile_width: s.tile_width,
            tile_height: s.tile_height,
            tile_count: s.tile_count,
            tile_offsets: Vec::new(),
            tile_byte_counts: Vec::new(),
            compression: s.compression,
            color_space: s.color_space,
            chroma_subsampling: s.chroma_subsampling,
            jpeg_tables: Vec::new(),
            image_description: Vec::new(),
            reference_black_white: s.reference_black_white,
            subimage_type: s.subimage_type,
            subfile_type: s.subfile_type,
            level_magnification: 0.0,
            um_per_pixel_x: s.um_per_pixel_x,
            um_per_pixel_y: s.um_per_pixel_y,
        })
        .collect();

    let mut seen = vec![Seen::default(); ifds.len()];

    loop {
        let block = read_block(bytes, &mut cursor)?;
        if block.block_type == BlockType::Terminator {
            break;
        }

        let idx = block.index as usize;
        if idx >= ifds.len() {
            return Err(Error::MalformedStream(format!(
                "block references IFD {idx}, but only {} IFDs exist",
                ifds.len()
            )));
        }

        match block.block_type {
            BlockType::ImageDescription => {
                reject_duplicate(&mut seen[idx].image_description, "image_description", idx)?;
                ifds[idx].image_description = read_payload(bytes, &mut cursor, block.length as usize)?.to_vec();
            }
            BlockType::TileOffsets => {
                reject_duplicate(&mut seen[idx].tile_offsets, "tile_offsets", idx)?;
                let payload = read_payload(bytes, &mut cursor, block.length as usize)?;
                ifds[idx].tile_offsets = decode_u64_array(payload)?;
            }
            BlockType::TileByteCounts => {
                reject_duplicate(&mut seen[idx].tile_byte_counts, "tile_byte_counts", idx)?;
                let payload = read_payload(bytes, &mut cursor, block.length as usize)?;
                ifds[idx].tile_byte_counts = decode_u64_array(payload)?;
            }
            BlockType::JpegTables => {
                reject_duplicate(&mut seen[idx].jpeg_tables, "jpeg_tables", idx)?;
                ifds[idx].jpeg_tables = read_payload(bytes, &mut cursor, block.length as usize)?.to_vec();
            }
            BlockType::Unknown(code) => {
                warn!(code, "skipping unknown block type for forward compatibility");
                read_payload(bytes, &mut cursor, block.length as usize)?;
            }
            other => {
                return Err(Error::MalformedStream(format!(
                    "unexpected block type {:?} in payload section",
                    other
                )));
            }
        }
    }

    Ok(Tiff {
        filesize: header.filesize,
        is_big_endian: header.is_big_endian,
        is_bigtiff: header.is_bigtiff,
        offset_width: header.offset_width,
        ifds,
        main_image_index: header.main_image_index as usize,
        macro_image_index: decode_role_index(header.macro_image_index),
        label_image_index: decode_role_index(header.label_image_index),
        level_image_index: decode_role_index(header.level_image_index),
        level_count: header.level_count,
        mpp_x: header.mpp_x,
        mpp_y: header.mpp_y,
    })
}

fn reject_duplicate(flag: &mut bool, kind: &'static str, idx: usize) -> Result<()> {
    if *flag {
        return Err(Error::DuplicateBlock {
            kind,
            ifd_index: idx as u32,
        });
    }
    *flag = true;
    Ok(())
}

fn decode_u64_array(bytes: &[u8]) -> Result<Vec<u64>> {
    if bytes.len() % 8 != 0 {
        return Err(Error::MalformedStream(format!(
            "tile array payload length {} is not a multiple of 8",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
        .collect())
}

fn read_block(bytes: &[u8], cursor: &mut usize) -> Result<SerialBlock> {
    if *cursor + SERIAL_BLOCK_SIZE > bytes.len() {
        return Err(Error::Eof {
            offset: *cursor as u64,
            needed: SERIAL_BLOCK_SIZE as u64,
            available: bytes.len().saturating_sub(*cursor) as u64,
        });
    }
    let block = SerialBlock::decode(&bytes[*cursor..*cursor + SERIAL_BLOCK_SIZE])?;
    *cursor += SERIAL_BLOCK_SIZE;
    Ok(block)
}

fn read_payload<'a>(bytes: &'a [u8], cursor: &mut usize, length: usize) -> Result<&'a [u8]> {
    if *cursor + length > bytes.len() {
        return Err(Error::Eof {
            offset: *cursor as u64,
            needed: length as u64,
            available: bytes.len().saturating_sub(*cursor) as u64,
        });
    }
    let payload = &bytes[*cursor..*cursor + length];
    *cursor += length;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::SubimageType;

    fn sample_tiff() -> Tiff {
        let mut ifd = Ifd::new(0);
        ifd.image_width = 1024;
        ifd.image_height = 1024;
        ifd.tile_width = 512;
        ifd.tile_height = 512;
        ifd.tile_count = 4;
        ifd.tile_offsets = vec![100, 200, 300, 400];
        ifd.tile_byte_counts = vec![50, 50, 50, 50];
        ifd.image_description = b"level0\0".to_vec();
        ifd.subimage_type = SubimageType::Level;
        ifd.um_per_pixel_x = 0.25;
        ifd.um_per_pixel_y = 0.25;

        Tiff {
            filesize: 4096,
            is_big_endian: false,
            is_bigtiff: false,
            offset_width: 4,
            ifds: vec![ifd],
            main_image_index: 0,
            macro_image_index: None,
            label_image_index: None,
            level_image_index: Some(0),
            level_count: 1,
            mpp_x: 0.25,
            mpp_y: 0.25,
        }
    }

    /// A two-IFD Tiff serializes to HEADER_AND_META + IFDS + 4 per-IFD
    /// blocks per IFD, followed by TERMINATOR.
    #[test]
    fn serialize_two_ifds_has_five_blocks_per_ifd_section() {
        let mut tiff = sample_tiff();
        let mut second = tiff.ifds[0].clone();
        second.ifd_index = 1;
        tiff.ifds.push(second);

        let bytes = super::super::serialize(&tiff, false);
        let mut cursor = 0usize;
        let mut block_types = Vec::new();
        loop {
            let block = read_block(&bytes, &mut cursor).unwrap();
            let is_terminator = block.block_type == BlockType::Terminator;
            block_types.push(block.block_type);
            if is_terminator {
                break;
            }
            read_payload(&bytes, &mut cursor, block.length as usize).unwrap();
        }
        // HEADER_AND_META, IFDS, then 4 blocks per IFD * 2 IFDs, + TERMINATOR = 11
        assert_eq!(block_types.len(), 2 + 4 * 2 + 1);
    }

    #[test]
    fn round_trip_preserves_scalars_and_tile_arrays() {
        let tiff = sample_tiff();
        let bytes = super::super::serialize(&tiff, false);
        let back = deserialize(&bytes).unwrap();

        assert_eq!(back.filesize, tiff.filesize);
        assert_eq!(back.level_count, tiff.level_count);
        assert_eq!(back.ifds[0].tile_offsets, tiff.ifds[0].tile_offsets);
        assert_eq!(back.ifds[0].tile_byte_counts, tiff.ifds[0].tile_byte_counts);
        assert_eq!(back.ifds[0].image_description, tiff.ifds[0].image_description);
        assert_eq!(back.ifds[0].um_per_pixel_x, tiff.ifds[0].um_per_pixel_x);
    }

    /// A 3-level pyramid doubles mpp per level.
    #[test]
    fn three_level_pyramid_round_trip() {
        let mut tiff = sample_tiff();
        for i in 1..3 {
            let mut ifd = tiff.ifds[0].clone();
            ifd.ifd_index = i;
            ifd.um_per_pixel_x = 0.25 * 2f64.powi(i as i32);
            ifd.um_per_pixel_y = ifd.um_per_pixel_x;
            tiff.ifds.push(ifd);
        }
        tiff.level_count = 3;

        let bytes = super::super::serialize(&tiff, true);
        let back = deserialize(&bytes).unwrap();
        assert_eq!(back.level_count, 3);
        assert_eq!(back.ifds[2].um_per_pixel_x, 1.0);
    }

    #[test]
    fn lz4_decompressed_size_mismatch_is_an_error() {
        let tiff = sample_tiff();
        let bytes = super::super::serialize(&tiff, true);
        let header_end = http_header::skip(&bytes);
        let mut cursor = header_end;
        let block = read_block(&bytes, &mut cursor).unwrap();
        assert_eq!(block.block_type, BlockType::Lz4CompressedData);

        // Corrupt the declared decompressed size (`index`) so it no longer
        // matches what LZ4 actually produces.
        let mut corrupted = bytes.clone();
        let index_offset = header_end + 4; // block_type(4) precedes index(4)
        let bad_index = (block.index + 1).to_le_bytes();
        corrupted[index_offset..index_offset + 4].copy_from_slice(&bad_index);

        let err = deserialize(&corrupted).unwrap_err();
        assert!(matches!(err, Error::DecompressionFailed(_)));
    }

    #[test]
    fn duplicate_tile_offsets_block_is_rejected() {
        let tiff = sample_tiff();
        let mut bytes = super::super::serialize(&tiff, false);

        // Find the TILE_OFFSETS block for IFD 0 and duplicate it just
        // before the terminator.
        let header_end = http_header::skip(&bytes);
        let mut cursor = header_end;
        let mut tile_offsets_block_bytes = None;
        loop {
            let start = cursor;
            let block = read_block(&bytes, &mut cursor).unwrap();
            if block.block_type == BlockType::Terminator {
                break;
            }
            let payload_start = cursor;
            cursor += block.length as usize;
            if block.block_type == BlockType::TileOffsets {
                tile_offsets_block_bytes = Some(bytes[start..payload_start + block.length as usize].to_vec());
            }
        }
        let duplicate = tile_offsets_block_bytes.expect("sample tiff has a TILE_OFFSETS block");

        let terminator_pos = bytes.len() - SERIAL_BLOCK_SIZE;
        bytes.splice(terminator_pos..terminator_pos, duplicate);

        let err = deserialize(&bytes).unwrap_err();
        assert!(matches!(err, Error::DuplicateBlock { kind: "tile_offsets", .. }));
    }
}
