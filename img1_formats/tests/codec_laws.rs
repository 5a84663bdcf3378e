use img1_formats::{
    ImageError, Pixel, PixelBuffer, decode_bytes, encode_to_vec, encoded_len, read_file,
    write_file,
};
use proptest::prelude::*;
use tempfile::tempdir;

fn buffer_strategy() -> impl Strategy<Value = PixelBuffer> {
    (1u32..=50, 1u32..=50).prop_flat_map(|(width, height)| {
        let count = (width * height) as usize;
        prop::collection::vec(any::<[u8; 3]>(), count).prop_map(move |raw| {
            let pixels = raw.into_iter().map(Pixel::from).collect();
            PixelBuffer::from_pixels(width, height, pixels).unwrap()
        })
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(buffer in buffer_strategy()) {
        let bytes = encode_to_vec(&buffer);
        prop_assert_eq!(bytes.len(), encoded_len(buffer.width(), buffer.height()));
        let decoded = decode_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded, buffer);
    }

    #[test]
    fn foreign_signature_is_rejected(
        signature in any::<[u8; 4]>().prop_filter("not IMG1", |sig| sig != b"IMG1"),
        rest in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut bytes = signature.to_vec();
        bytes.extend_from_slice(&rest);
        prop_assert!(matches!(decode_bytes(&bytes), Err(ImageError::InvalidFormat)));
    }

    #[test]
    fn one_byte_short_is_truncated(buffer in buffer_strategy()) {
        let bytes = encode_to_vec(&buffer);
        let result = decode_bytes(&bytes[..bytes.len() - 1]);
        prop_assert!(matches!(result, Err(ImageError::TruncatedData)));
    }
}

#[test]
fn file_round_trip_preserves_pixels() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.img");
    let mut buffer = PixelBuffer::new(3, 2).unwrap();
    buffer.set(2, 1, Pixel::new(9, 8, 7)).unwrap();

    write_file(&path, &buffer).unwrap();
    assert_eq!(
        std::fs::metadata(&path).unwrap().len() as usize,
        encoded_len(3, 2)
    );
    assert_eq!(read_file(&path).unwrap(), buffer);
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempdir().unwrap();
    let result = read_file(dir.path().join("absent.img"));
    assert!(matches!(result, Err(ImageError::Io(_))));
}
