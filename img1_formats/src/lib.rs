//! IMG1 raster container: pixel storage, the binary codec and the canonical
//! fixture images used by the viewer and the tool binaries.

pub mod error;
pub mod fixtures;
pub mod img1;
pub mod pixel;

pub use error::ImageError;
pub use fixtures::{Fixture, canonical_fixtures};
pub use img1::{
    ContainerHeader, HEADER_LEN, PIXEL_TYPE_RGB8, SIGNATURE, decode, decode_bytes, encode,
    encode_to_vec, encoded_len, peek_header, read_file, write_file,
};
pub use pixel::{Pixel, PixelBuffer};
