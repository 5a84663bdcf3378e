use thiserror::Error;

/// Failures raised by pixel access and the IMG1 codec.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("missing or invalid IMG1 signature")]
    InvalidFormat,
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("stream ended before the full header and payload were read")]
    TruncatedData,
    #[error("pixel ({x}, {y}) outside {width}x{height} image")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
