use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::error::ImageError;
use crate::pixel::{PixelBuffer, checked_pixel_count};

/// Bytes that open every IMG1 container.
pub const SIGNATURE: [u8; 4] = *b"IMG1";

/// Signature plus width, height and pixel type.
pub const HEADER_LEN: usize = 16;

/// The only defined pixel layout: packed 8-bit R,G,B.
pub const PIXEL_TYPE_RGB8: i32 = 1;

const BYTES_PER_PIXEL: usize = 3;

/// Header fields as stored on disk.
///
/// `pixel_type` is informational. Readers accept any value and leave it to
/// callers to decide whether an unknown tag matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    pub width: i32,
    pub height: i32,
    pub pixel_type: i32,
}

impl ContainerHeader {
    pub fn for_buffer(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width() as i32,
            height: buffer.height() as i32,
            pixel_type: PIXEL_TYPE_RGB8,
        }
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self, ImageError> {
        let mut signature = [0u8; 4];
        reader
            .read_exact(&mut signature)
            .map_err(|err| eof_as(err, ImageError::InvalidFormat))?;
        if signature != SIGNATURE {
            return Err(ImageError::InvalidFormat);
        }

        let width = read_i32(reader)?;
        let height = read_i32(reader)?;
        let pixel_type = read_i32(reader)?;
        Ok(Self {
            width,
            height,
            pixel_type,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), ImageError> {
        writer.write_all(&SIGNATURE)?;
        writer.write_i32::<LittleEndian>(self.width)?;
        writer.write_i32::<LittleEndian>(self.height)?;
        writer.write_i32::<LittleEndian>(self.pixel_type)?;
        Ok(())
    }

    pub fn is_packed_rgb(&self) -> bool {
        self.pixel_type == PIXEL_TYPE_RGB8
    }

    /// Number of payload bytes that must follow the header.
    pub fn payload_len(&self) -> Result<usize, ImageError> {
        let count = checked_pixel_count(i64::from(self.width), i64::from(self.height))?;
        Ok(count * BYTES_PER_PIXEL)
    }
}

/// Total container size for a `width` x `height` image.
pub fn encoded_len(width: u32, height: u32) -> usize {
    HEADER_LEN + width as usize * height as usize * BYTES_PER_PIXEL
}

/// Reads one container from `reader`.
///
/// On failure the reader is left partially consumed. Bytes after the pixel
/// payload are never read.
pub fn decode<R: Read>(reader: &mut R) -> Result<PixelBuffer, ImageError> {
    let header = ContainerHeader::read(reader)?;
    let payload_len = header.payload_len()?;

    // Grow with the data actually present so a lying header cannot force a
    // huge allocation before truncation is detected.
    let mut payload = Vec::with_capacity(payload_len.min(1 << 20));
    reader
        .by_ref()
        .take(payload_len as u64)
        .read_to_end(&mut payload)?;
    if payload.len() < payload_len {
        return Err(ImageError::TruncatedData);
    }

    PixelBuffer::from_rgb_bytes(header.width as u32, header.height as u32, &payload)
}

pub fn decode_bytes(bytes: &[u8]) -> Result<PixelBuffer, ImageError> {
    let mut cursor = bytes;
    decode(&mut cursor)
}

/// Validates the header at the start of `bytes` without touching the payload.
pub fn peek_header(bytes: &[u8]) -> Result<ContainerHeader, ImageError> {
    let mut cursor = bytes;
    let header = ContainerHeader::read(&mut cursor)?;
    header.payload_len()?;
    Ok(header)
}

pub fn encode<W: Write>(buffer: &PixelBuffer, writer: &mut W) -> Result<(), ImageError> {
    ContainerHeader::for_buffer(buffer).write(writer)?;
    for pixel in buffer.pixels() {
        writer.write_all(&pixel.to_array())?;
    }
    Ok(())
}

pub fn encode_to_vec(buffer: &PixelBuffer) -> Vec<u8> {
    let header = ContainerHeader::for_buffer(buffer);
    let mut out = Vec::with_capacity(encoded_len(buffer.width(), buffer.height()));
    out.extend_from_slice(&SIGNATURE);
    out.extend_from_slice(&header.width.to_le_bytes());
    out.extend_from_slice(&header.height.to_le_bytes());
    out.extend_from_slice(&header.pixel_type.to_le_bytes());
    for pixel in buffer.pixels() {
        out.extend_from_slice(&pixel.to_array());
    }
    out
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<PixelBuffer, ImageError> {
    let file = File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    decode(&mut reader)
}

pub fn write_file<P: AsRef<Path>>(path: P, buffer: &PixelBuffer) -> Result<(), ImageError> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode(buffer, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32, ImageError> {
    reader
        .read_i32::<LittleEndian>()
        .map_err(|err| eof_as(err, ImageError::TruncatedData))
}

fn eof_as(err: io::Error, on_eof: ImageError) -> ImageError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        on_eof
    } else {
        ImageError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;

    fn two_by_two() -> PixelBuffer {
        PixelBuffer::from_pixels(
            2,
            2,
            vec![
                Pixel::new(255, 0, 0),
                Pixel::new(0, 255, 0),
                Pixel::new(0, 0, 255),
                Pixel::new(255, 255, 255),
            ],
        )
        .unwrap()
    }

    #[test]
    fn encodes_two_by_two_exactly() {
        let bytes = encode_to_vec(&two_by_two());
        let expected: Vec<u8> = vec![
            0x49, 0x4D, 0x47, 0x31, // IMG1
            0x02, 0x00, 0x00, 0x00, // width
            0x02, 0x00, 0x00, 0x00, // height
            0x01, 0x00, 0x00, 0x00, // pixel type
            0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        ];
        assert_eq!(bytes, expected);
        assert_eq!(bytes.len(), encoded_len(2, 2));
    }

    #[test]
    fn decodes_two_by_two_back_to_coordinates() {
        let bytes = encode_to_vec(&two_by_two());
        let buffer = decode_bytes(&bytes).unwrap();
        assert_eq!(buffer.dimensions(), (2, 2));
        assert_eq!(buffer.get(0, 0).unwrap(), Pixel::new(255, 0, 0));
        assert_eq!(buffer.get(1, 0).unwrap(), Pixel::new(0, 255, 0));
        assert_eq!(buffer.get(0, 1).unwrap(), Pixel::new(0, 0, 255));
        assert_eq!(buffer.get(1, 1).unwrap(), Pixel::WHITE);
    }

    #[test]
    fn streaming_encode_matches_vec_encode() {
        let buffer = two_by_two();
        let mut streamed = Vec::new();
        encode(&buffer, &mut streamed).unwrap();
        assert_eq!(streamed, encode_to_vec(&buffer));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = encode_to_vec(&two_by_two());
        bytes[3] = b'2';
        assert!(matches!(decode_bytes(&bytes), Err(ImageError::InvalidFormat)));
    }

    #[test]
    fn short_signature_is_invalid_format() {
        assert!(matches!(decode_bytes(b"IM"), Err(ImageError::InvalidFormat)));
        assert!(matches!(decode_bytes(&[]), Err(ImageError::InvalidFormat)));
    }

    #[test]
    fn partial_header_is_truncated() {
        let bytes = encode_to_vec(&two_by_two());
        assert!(matches!(
            decode_bytes(&bytes[..10]),
            Err(ImageError::TruncatedData)
        ));
    }

    #[test]
    fn payload_one_byte_short_is_truncated() {
        let bytes = encode_to_vec(&two_by_two());
        assert!(matches!(
            decode_bytes(&bytes[..bytes.len() - 1]),
            Err(ImageError::TruncatedData)
        ));
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        for (width, height) in [(0, 2), (2, 0), (-1, 2), (2, -5)] {
            let mut bytes = Vec::new();
            ContainerHeader {
                width,
                height,
                pixel_type: PIXEL_TYPE_RGB8,
            }
            .write(&mut bytes)
            .unwrap();
            bytes.extend_from_slice(&[0u8; 12]);
            assert!(
                matches!(
                    decode_bytes(&bytes),
                    Err(ImageError::InvalidDimensions { .. })
                ),
                "{width}x{height} should be rejected"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = encode_to_vec(&two_by_two());
        bytes.extend_from_slice(b"trailer");
        assert_eq!(decode_bytes(&bytes).unwrap(), two_by_two());
    }

    #[test]
    fn decode_leaves_trailing_bytes_unread() {
        let mut bytes = encode_to_vec(&two_by_two());
        bytes.extend_from_slice(b"next");
        let mut cursor = &bytes[..];
        decode(&mut cursor).unwrap();
        assert_eq!(cursor, b"next");
    }

    #[test]
    fn unknown_pixel_type_is_accepted() {
        let mut bytes = encode_to_vec(&two_by_two());
        bytes[12..16].copy_from_slice(&7i32.to_le_bytes());
        let header = peek_header(&bytes).unwrap();
        assert_eq!(header.pixel_type, 7);
        assert!(!header.is_packed_rgb());
        assert_eq!(decode_bytes(&bytes).unwrap(), two_by_two());
    }

    #[test]
    fn huge_header_without_payload_is_truncated() {
        let mut bytes = Vec::new();
        ContainerHeader {
            width: i32::MAX,
            height: i32::MAX,
            pixel_type: PIXEL_TYPE_RGB8,
        }
        .write(&mut bytes)
        .unwrap();
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            decode_bytes(&bytes),
            Err(ImageError::TruncatedData)
        ));
    }
}
