//! TIFF/BigTIFF directory parsing: header, tag decoding, IFD walking.

mod header;
mod ifd;
mod parser;
mod tag;

pub use header::{TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use ifd::{Ifd, SubimageType, DEFAULT_COLOR_SPACE, REDUCEDIMAGE_BIT};
pub use parser::Tiff;
pub use tag::{DataType, Rational, Tag, TagValue};
