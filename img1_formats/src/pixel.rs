use serde::Serialize;

use crate::error::ImageError;

/// One packed 8-bit RGB sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::new(0, 0, 0);
    pub const WHITE: Pixel = Pixel::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Pixel {
    fn from(value: [u8; 3]) -> Self {
        Pixel::new(value[0], value[1], value[2])
    }
}

/// Fixed-size row-major grid of [`Pixel`]s.
///
/// Dimensions are always non-zero and fit in an `i32` so every buffer can be
/// written back out as an IMG1 container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelBuffer {
    /// Allocates a black `width` x `height` buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, ImageError> {
        let count = checked_pixel_count(i64::from(width), i64::from(height))?;
        Ok(Self {
            width,
            height,
            pixels: vec![Pixel::BLACK; count],
        })
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self, ImageError> {
        let count = checked_pixel_count(i64::from(width), i64::from(height))?;
        if pixels.len() != count {
            return Err(ImageError::InvalidDimensions {
                width: i64::from(width),
                height: i64::from(height),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a buffer from tightly packed `R,G,B` triples in row-major order.
    pub fn from_rgb_bytes(width: u32, height: u32, data: &[u8]) -> Result<Self, ImageError> {
        let count = checked_pixel_count(i64::from(width), i64::from(height))?;
        if data.len() < count * 3 {
            return Err(ImageError::TruncatedData);
        }
        let pixels = data[..count * 3]
            .chunks_exact(3)
            .map(|chunk| Pixel::new(chunk[0], chunk[1], chunk[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Result<Pixel, ImageError> {
        let index = self.index_of(x, y)?;
        Ok(self.pixels[index])
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<(), ImageError> {
        let index = self.index_of(x, y)?;
        self.pixels[index] = pixel;
        Ok(())
    }

    /// Yields `(x, y, pixel)` with `x` varying fastest.
    pub fn enumerate(&self) -> impl Iterator<Item = (u32, u32, Pixel)> + '_ {
        let width = self.width as usize;
        self.pixels.iter().enumerate().map(move |(index, pixel)| {
            ((index % width) as u32, (index / width) as u32, *pixel)
        })
    }

    /// Expands the buffer into opaque RGBA8 bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            rgba.extend_from_slice(&[pixel.r, pixel.g, pixel.b, 0xFF]);
        }
        rgba
    }

    fn index_of(&self, x: u32, y: u32) -> Result<usize, ImageError> {
        if x >= self.width || y >= self.height {
            return Err(ImageError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }
}

/// Validates dimensions and returns the pixel count.
///
/// Both sides must be positive and representable as an `i32`, and the packed
/// payload (`3` bytes per pixel) must be addressable.
pub(crate) fn checked_pixel_count(width: i64, height: i64) -> Result<usize, ImageError> {
    let invalid = || ImageError::InvalidDimensions { width, height };
    if width <= 0 || height <= 0 || width > i64::from(i32::MAX) || height > i64::from(i32::MAX) {
        return Err(invalid());
    }
    let count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(invalid)?;
    count.checked_mul(3).ok_or_else(invalid)?;
    Ok(count)
}
