//! Packs a `Tiff` into the block-framed wire format.

use tracing::{debug, warn};

use crate::tiff::Tiff;

use super::block::{
    encode_role_index, BlockType, SerialBlock, SerialHeader, SerialIfd, SERIAL_BLOCK_SIZE,
    SERIAL_HEADER_SIZE, SERIAL_IFD_SIZE,
};
use super::http_header;

/// Serialize `tiff` into one contiguous buffer: an HTTP response header
/// followed by the block-framed payload, optionally LZ4-compressed.
pub fn serialize(tiff: &Tiff, compress: bool) -> Vec<u8> {
    let payload = build_payload(tiff);

    let final_payload = if compress {
        let compressed = lz4_flex::block::compress(&payload);
        debug!(
            uncompressed = payload.len(),
            compressed = compressed.len(),
            "LZ4-compressed wire payload"
        );
        let mut framed = Vec::with_capacity(SERIAL_BLOCK_SIZE + compressed.len());
        SerialBlock::new(BlockType::Lz4CompressedData, payload.len() as u32, compressed.len() as u64)
            .encode(&mut framed);
        framed.extend_from_slice(&compressed);
        framed
    } else {
        payload
    };

    let header = http_header::build(final_payload.len() as u64);
    let mut out = Vec::with_capacity(header.len() + final_payload.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&final_payload);
    out
}

fn build_payload(tiff: &Tiff) -> Vec<u8> {
    let mut out = Vec::new();

    let header = SerialHeader {
        filesize: tiff.filesize,
        ifd_count: tiff.ifds.len() as u32,
        main_image_index: tiff.main_image_index as u32,
        macro_image_index: encode_role_index(tiff.macro_image_index),
        label_image_index: encode_role_index(tiff.label_image_index),
        level_image_index: encode_role_index(tiff.level_image_index),
        level_count: tiff.level_count,
        offset_width: tiff.offset_width,
        is_big_endian: tiff.is_big_endian,
        is_bigtiff: tiff.is_bigtiff,
        mpp_x: tiff.mpp_x,
        mpp_y: tiff.mpp_y,
    };
    SerialBlock::new(BlockType::HeaderAndMeta, 0, SERIAL_HEADER_SIZE as u64).encode(&mut out);
    out.extend_from_slice(&header.encode());

    let ifds_len = tiff.ifds.len() as u64 * SERIAL_IFD_SIZE as u64;
    SerialBlock::new(BlockType::Ifds, 0, ifds_len).encode(&mut out);
    for ifd in &tiff.ifds {
        let serial = SerialIfd {
            ifd_index: ifd.ifd_index,
            image_width: ifd.image_width,
            image_height: ifd.image_height,
            tile_width: ifd.tile_width,
            tile_height: ifd.tile_height,
            tile_count: ifd.tile_count,
            compression: ifd.compression,
            color_space: ifd.color_space,
            chroma_subsampling: ifd.chroma_subsampling,
            subimage_type: ifd.subimage_type,
            subfile_type: ifd.subfile_type,
            image_description_len: ifd.image_description.len() as u32,
            jpeg_tables_len: ifd.jpeg_tables.len() as u32,
            um_per_pixel_x: ifd.um_per_pixel_x,
            um_per_pixel_y: ifd.um_per_pixel_y,
            reference_black_white: ifd.reference_black_white.clone(),
        };
        if ifd.reference_black_white.len() > super::block::MAX_REFERENCE_BLACK_WHITE {
            warn!(
                ifd_index = ifd.ifd_index,
                count = ifd.reference_black_white.len(),
                "truncating reference_black_white to inline capacity"
            );
        }
        out.extend_from_slice(&serial.encode());
    }

    for (i, ifd) in tiff.ifds.iter().enumerate() {
        let idx = i as u32;

        SerialBlock::new(BlockType::ImageDescription, idx, ifd.image_description.len() as u64)
            .encode(&mut out);
        out.extend_from_slice(&ifd.image_description);

        SerialBlock::new(BlockType::TileOffsets, idx, ifd.tile_offsets.len() as u64 * 8)
            .encode(&mut out);
        for v in &ifd.tile_offsets {
            out.extend_from_slice(&v.to_le_bytes());
        }

        SerialBlock::new(BlockType::TileByteCounts, idx, ifd.tile_byte_counts.len() as u64 * 8)
            .encode(&mut out);
        for v in &ifd.tile_byte_counts {
            out.extend_from_slice(&v.to_le_bytes());
        }

        SerialBlock::new(BlockType::JpegTables, idx, ifd.jpeg_tables.len() as u64).encode(&mut out);
        out.extend_from_slice(&ifd.jpeg_tables);
    }

    SerialBlock::new(BlockType::Terminator, 0, 0).encode(&mut out);

    out
}
