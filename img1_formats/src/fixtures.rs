//! Synthetic test images written by `img1_generate`.
//!
//! Every generator is deterministic; the noise image draws from a seeded
//! ChaCha stream so fixtures can be regenerated byte-for-byte.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::pixel::{Pixel, PixelBuffer};

/// A named canonical image.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub file_name: &'static str,
    pub buffer: PixelBuffer,
}

const CHECKER_CELL: u32 = 8;

/// Seven vertical bands, left to right.
const COLOR_BARS: [Pixel; 7] = [
    Pixel::new(255, 255, 255),
    Pixel::new(255, 255, 0),
    Pixel::new(0, 255, 255),
    Pixel::new(0, 255, 0),
    Pixel::new(255, 0, 255),
    Pixel::new(255, 0, 0),
    Pixel::new(0, 0, 255),
];

pub fn canonical_fixtures(seed: u64) -> Vec<Fixture> {
    vec![
        Fixture {
            file_name: "test_gradient.img",
            buffer: gradient(256, 256),
        },
        Fixture {
            file_name: "test_checkerboard.img",
            buffer: checkerboard(64, 64, CHECKER_CELL),
        },
        Fixture {
            file_name: "test_colorbars.img",
            buffer: color_bars(280, 100),
        },
        Fixture {
            file_name: "test_circles.img",
            buffer: circles(200, 200),
        },
        Fixture {
            file_name: "test_noise.img",
            buffer: noise(128, 128, seed),
        },
    ]
}

/// Red ramps along x, green along y, blue is the inverse of red.
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    fill(width, height, |x, y| {
        let r = ramp(x, width);
        let g = ramp(y, height);
        Pixel::new(r, g, 255 - r)
    })
}

pub fn checkerboard(width: u32, height: u32, cell: u32) -> PixelBuffer {
    let cell = cell.max(1);
    fill(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Pixel::WHITE
        } else {
            Pixel::BLACK
        }
    })
}

pub fn color_bars(width: u32, height: u32) -> PixelBuffer {
    let bands = COLOR_BARS.len() as u32;
    fill(width, height, |x, _| {
        let band = (x * bands / width).min(bands - 1);
        COLOR_BARS[band as usize]
    })
}

/// Concentric rings whose intensity follows a sine of the centre distance.
pub fn circles(width: u32, height: u32) -> PixelBuffer {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    fill(width, height, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        let distance = (dx * dx + dy * dy).sqrt();
        let wave = (distance * 0.3).sin() * 0.5 + 0.5;
        let value = (wave * 255.0).round() as u8;
        Pixel::new(value, value / 2, 255 - value)
    })
}

pub fn noise(width: u32, height: u32, seed: u64) -> PixelBuffer {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    fill(width, height, |_, _| Pixel::new(rng.r#gen(), rng.r#gen(), rng.r#gen()))
}

fn ramp(value: u32, extent: u32) -> u8 {
    if extent <= 1 {
        return 0;
    }
    (value * 255 / (extent - 1)) as u8
}

// Generators only use hard-coded positive sizes.
fn fill(width: u32, height: u32, mut shade: impl FnMut(u32, u32) -> Pixel) -> PixelBuffer {
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push(shade(x, y));
        }
    }
    PixelBuffer::from_pixels(width, height, pixels)
        .unwrap_or_else(|err| panic!("fixture {width}x{height} is invalid: {err}"))
}
