//! The block-framed transfer wire format: packs a parsed `Tiff` into a
//! compact byte stream and back.

mod block;
mod deserializer;
mod http_header;
mod serializer;

pub use block::{
    BlockType, SerialBlock, SerialHeader, SerialIfd, SERIAL_BLOCK_SIZE, SERIAL_HEADER_SIZE,
    SERIAL_IFD_SIZE,
};
pub use deserializer::deserialize;
pub use serializer::serialize;
