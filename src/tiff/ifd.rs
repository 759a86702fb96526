//! The `Ifd` record and its derived fields.

use super::tag::Rational;

/// What role an IFD plays within the slide pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubimageType {
    #[default]
    Unknown,
    Level,
    Macro,
    Label,
}

/// Bit 0 of `NewSubfileType`: this IFD is a reduced-resolution version of
/// another image (used by the classifier to recognise pyramid levels).
pub const REDUCEDIMAGE_BIT: u32 = 0x1;

/// One Image File Directory, normalised from its raw on-disk tags.
///
/// Every heap buffer reachable from an `Ifd` (image_description, jpeg_tables,
/// tile_offsets, tile_byte_counts) is owned by it; there is no borrowing back
/// into the file.
#[derive(Debug, Clone, Default)]
pub struct Ifd {
    pub ifd_index: u32,

    pub image_width: u32,
    pub image_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,

    pub tile_count: u64,
    pub tile_offsets: Vec<u64>,
    pub tile_byte_counts: Vec<u64>,

    pub compression: u16,
    pub color_space: u16,
    pub chroma_subsampling: (u16, u16),

    pub jpeg_tables: Vec<u8>,
    pub image_description: Vec<u8>,
    pub reference_black_white: Vec<Rational>,

    pub subimage_type: SubimageType,
    pub subfile_type: u32,

    pub level_magnification: f64,
    pub um_per_pixel_x: f64,
    pub um_per_pixel_y: f64,
}

/// Default `PhotometricInterpretation` when the tag is absent: RGB.
pub const DEFAULT_COLOR_SPACE: u16 = 2;

impl Ifd {
    pub fn new(ifd_index: u32) -> Self {
        Ifd {
            ifd_index,
            color_space: DEFAULT_COLOR_SPACE,
            ..Default::default()
        }
    }

    /// Ceiling division: `image_width / tile_width` rounded up.
    pub fn width_in_tiles(&self) -> u32 {
        ceil_div(self.image_width, self.tile_width)
    }

    /// Ceiling division: `image_height / tile_height` rounded up.
    pub fn height_in_tiles(&self) -> u32 {
        ceil_div(self.image_height, self.tile_height)
    }

    /// Side length of one tile in micrometres, along X.
    pub fn tile_side_um_x(&self) -> f64 {
        self.tile_width as f64 * self.um_per_pixel_x
    }

    /// Side length of one tile in micrometres, along Y.
    pub fn tile_side_um_y(&self) -> f64 {
        self.tile_height as f64 * self.um_per_pixel_y
    }

    pub fn is_reduced_image(&self) -> bool {
        self.subfile_type & REDUCEDIMAGE_BIT != 0
    }
}

fn ceil_div(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (numerator + denominator - 1) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_in_tiles_rounds_up() {
        let mut ifd = Ifd::new(0);
        ifd.image_width = 1000;
        ifd.tile_width = 512;
        assert_eq!(ifd.width_in_tiles(), 2);
    }

    #[test]
    fn width_in_tiles_exact_division() {
        let mut ifd = Ifd::new(0);
        ifd.image_width = 1024;
        ifd.tile_width = 512;
        assert_eq!(ifd.width_in_tiles(), 2);
    }

    #[test]
    fn width_in_tiles_zero_tile_width_is_zero() {
        let ifd = Ifd::new(0);
        assert_eq!(ifd.width_in_tiles(), 0);
    }

    #[test]
    fn default_color_space_is_rgb() {
        let ifd = Ifd::new(3);
        assert_eq!(ifd.color_space, DEFAULT_COLOR_SPACE);
        assert_eq!(ifd.ifd_index, 3);
    }

    #[test]
    fn reduced_image_bit_detection() {
        let mut ifd = Ifd::new(0);
        ifd.subfile_type = 0x1;
        assert!(ifd.is_reduced_image());
        ifd.subfile_type = 0x2;
        assert!(!ifd.is_reduced_image());
    }
}
