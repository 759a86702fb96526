//! Synthetic TIFF/BigTIFF byte fixtures for integration tests, built by hand:
//! fixed offsets computed up front, then poked directly into a byte buffer.

pub const TILE_DATA: &[u8; 50] = &[0xAB; 50];

/// A single tiled IFD, classic (non-Big) TIFF, byte order selectable.
///
/// Layout:
/// - `0..8`: header
/// - `8..10`: tag count (8)
/// - `10..106`: 8 entries x 12 bytes, sorted by tag
/// - `106..110`: next IFD offset (0)
/// - `110..117`: ImageDescription ("level0\0")
/// - `117..133`: TileOffsets array (4 x u32)
/// - `133..149`: TileByteCounts array (4 x u32)
/// - `149..349`: 4 tiles x 50 bytes
pub fn classic_tiff(big_endian: bool) -> Vec<u8> {
    let mut data = vec![0u8; 400];

    write_bo_bytes(&mut data, 0, big_endian);
    write_u16(&mut data, 2, 42, big_endian);
    write_u32(&mut data, 4, 8, big_endian);

    write_u16(&mut data, 8, 8, big_endian);

    let desc = b"level0\0";
    let desc_offset = 110u32;
    let tile_offsets_offset = 117u32;
    let tile_byte_counts_offset = 133u32;
    let tile_offsets = [149u32, 199, 249, 299];
    let tile_byte_counts = [50u32; 4];

    let mut entry = |data: &mut Vec<u8>, idx: usize, tag: u16, ty: u16, count: u32, value: u32, short_inline: bool| {
        let off = 10 + idx * 12;
        write_u16(data, off, tag, big_endian);
        write_u16(data, off + 2, ty, big_endian);
        write_u32(data, off + 4, count, big_endian);
        if short_inline {
            write_u16(data, off + 8, value as u16, big_endian);
        } else {
            write_u32(data, off + 8, value, big_endian);
        }
    };

    entry(&mut data, 0, 256, 4, 1, 1024, false); // ImageWidth
    entry(&mut data, 1, 257, 4, 1, 1024, false); // ImageLength
    entry(&mut data, 2, 259, 3, 1, 7, true); // Compression = JPEG
    entry(&mut data, 3, 270, 2, desc.len() as u32, desc_offset, false); // ImageDescription
    entry(&mut data, 4, 322, 4, 1, 512, false); // TileWidth
    entry(&mut data, 5, 323, 4, 1, 512, false); // TileLength
    entry(&mut data, 6, 324, 4, 4, tile_offsets_offset, false); // TileOffsets
    entry(&mut data, 7, 325, 4, 4, tile_byte_counts_offset, false); // TileByteCounts

    write_u32(&mut data, 106, 0, big_endian); // next IFD

    data[110..110 + desc.len()].copy_from_slice(desc);
    for (i, &off) in tile_offsets.iter().enumerate() {
        write_u32(&mut data, 117 + i * 4, off, big_endian);
    }
    for (i, &len) in tile_byte_counts.iter().enumerate() {
        write_u32(&mut data, 133 + i * 4, len, big_endian);
    }
    for &off in &tile_offsets {
        data[off as usize..off as usize + TILE_DATA.len()].copy_from_slice(TILE_DATA);
    }

    data
}

/// A single tiled IFD, BigTIFF, little-endian.
///
/// Layout:
/// - `0..16`: header
/// - `16..24`: tag count (8, u64)
/// - `24..184`: 8 entries x 20 bytes
/// - `184..192`: next IFD offset (0, u64)
/// - `192..199`: ImageDescription
/// - `199..231`: TileOffsets array (4 x u64)
/// - `231..263`: TileByteCounts array (4 x u64)
/// - `263..463`: 4 tiles x 50 bytes
pub fn bigtiff_le() -> Vec<u8> {
    let mut data = vec![0u8; 500];

    data[0..2].copy_from_slice(b"II");
    data[2..4].copy_from_slice(&43u16.to_le_bytes());
    data[4..6].copy_from_slice(&8u16.to_le_bytes());
    data[6..8].copy_from_slice(&0u16.to_le_bytes());
    data[8..16].copy_from_slice(&16u64.to_le_bytes());

    data[16..24].copy_from_slice(&8u64.to_le_bytes());

    let desc = b"level0\0";
    let desc_offset = 192u64;
    let tile_offsets_offset = 199u64;
    let tile_byte_counts_offset = 231u64;
    let tile_offsets = [263u64, 313, 363, 413];
    let tile_byte_counts = [50u64; 4];

    let mut entry = |data: &mut Vec<u8>, idx: usize, tag: u16, ty: u16, count: u64, value: u64| {
        let off = 24 + idx * 20;
        data[off..off + 2].copy_from_slice(&tag.to_le_bytes());
        data[off + 2..off + 4].copy_from_slice(&ty.to_le_bytes());
        data[off + 4..off + 12].copy_from_slice(&count.to_le_bytes());
        data[off + 12..off + 20].copy_from_slice(&value.to_le_bytes());
    };

    entry(&mut data, 0, 256, 4, 1, 2048);
    entry(&mut data, 1, 257, 4, 1, 2048);
    entry(&mut data, 2, 259, 3, 1, 7);
    entry(&mut data, 3, 270, 2, desc.len() as u64, desc_offset);
    entry(&mut data, 4, 322, 4, 1, 512);
    entry(&mut data, 5, 323, 4, 1, 512);
    entry(&mut data, 6, 324, 16, 4, tile_offsets_offset);
    entry(&mut data, 7, 325, 16, 4, tile_byte_counts_offset);

    data[184..192].copy_from_slice(&0u64.to_le_bytes());

    data[192..192 + desc.len()].copy_from_slice(desc);
    for (i, &off) in tile_offsets.iter().enumerate() {
        let p = 199 + i * 8;
        data[p..p + 8].copy_from_slice(&off.to_le_bytes());
    }
    for (i, &len) in tile_byte_counts.iter().enumerate() {
        let p = 231 + i * 8;
        data[p..p + 8].copy_from_slice(&len.to_le_bytes());
    }
    for &off in &tile_offsets {
        let off = off as usize;
        data[off..off + TILE_DATA.len()].copy_from_slice(TILE_DATA);
    }

    data
}

fn write_bo_bytes(data: &mut [u8], offset: usize, big_endian: bool) {
    if big_endian {
        data[offset] = b'M';
        data[offset + 1] = b'M';
    } else {
        data[offset] = b'I';
        data[offset + 1] = b'I';
    }
}

fn write_u16(data: &mut [u8], offset: usize, value: u16, big_endian: bool) {
    if big_endian {
        data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    } else {
        data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
}

fn write_u32(data: &mut [u8], offset: usize, value: u32, big_endian: bool) {
    if big_endian {
        data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
    } else {
        data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}
