use std::path::Path;

use anyhow::{Context, Result};
use font8x8::legacy::BASIC_LEGACY;
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};
use img1_formats::Pixel;

use crate::controller::Renderer;

const GLYPH_SIZE: i32 = 8;
const STATUS_PADDING: i32 = 6;
const STATUS_BG: Pixel = Pixel::new(16, 20, 28);
const STATUS_FG: Pixel = Pixel::new(235, 235, 235);

/// RGBA8 software framebuffer. All drawing is clipped to the canvas.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if (width, height) != (self.width, self.height) {
            *self = Self::new(width, height);
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        Some(Pixel::new(
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ))
    }

    /// Draws a one-line status strip along the bottom edge.
    pub fn draw_status_bar(&mut self, text: &str) {
        let bar_height = GLYPH_SIZE + STATUS_PADDING * 2;
        let top = self.height as i32 - bar_height;
        self.fill_rect(0, top, self.width, bar_height as u32, STATUS_BG);
        self.draw_text(STATUS_PADDING, top + STATUS_PADDING, text, STATUS_FG);
    }

    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Pixel) {
        for (index, ch) in text.chars().enumerate() {
            let glyph = glyph_for_char(ch);
            let origin_x = x + index as i32 * GLYPH_SIZE;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) != 0 {
                        self.put(origin_x + col, y + row as i32, color);
                    }
                }
            }
        }
    }

    pub fn export_png(&self, path: &Path) -> Result<()> {
        export_rgba_to_png(path, self.width, self.height, &self.pixels)
    }

    fn put(&mut self, x: i32, y: i32, color: Pixel) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[offset..offset + 4].copy_from_slice(&[color.r, color.g, color.b, 0xFF]);
    }
}

impl Renderer for Canvas {
    fn clear(&mut self, color: Pixel) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.r, color.g, color.b, 0xFF]);
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Pixel) {
        let left = i64::from(x).max(0);
        let top = i64::from(y).max(0);
        let right = (i64::from(x) + i64::from(width)).min(i64::from(self.width));
        let bottom = (i64::from(y) + i64::from(height)).min(i64::from(self.height));
        if left >= right || top >= bottom {
            return;
        }
        let rgba = [color.r, color.g, color.b, 0xFF];
        let stride = self.width as usize * 4;
        for row in top as usize..bottom as usize {
            let start = row * stride + left as usize * 4;
            let end = row * stride + right as usize * 4;
            for chunk in self.pixels[start..end].chunks_exact_mut(4) {
                chunk.copy_from_slice(&rgba);
            }
        }
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Pixel) {
        // Axis-aligned lines (the grid) become clipped rectangles.
        if y1 == y2 {
            let (left, right) = (x1.min(x2), x1.max(x2));
            let width = (i64::from(right) - i64::from(left) + 1).min(u32::MAX as i64) as u32;
            self.fill_rect(left, y1, width, 1, color);
            return;
        }
        if x1 == x2 {
            let (top, bottom) = (y1.min(y2), y1.max(y2));
            let height = (i64::from(bottom) - i64::from(top) + 1).min(u32::MAX as i64) as u32;
            self.fill_rect(x1, top, 1, height, color);
            return;
        }

        // Bresenham for everything else.
        let (mut x, mut y) = (i64::from(x1), i64::from(y1));
        let (x2, y2) = (i64::from(x2), i64::from(y2));
        let dx = (x2 - x).abs();
        let dy = -(y2 - y).abs();
        let step_x = if x < x2 { 1 } else { -1 };
        let step_y = if y < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            if let (Ok(px), Ok(py)) = (i32::try_from(x), i32::try_from(y)) {
                self.put(px, py, color);
            }
            if x == x2 && y == y2 {
                break;
            }
            let doubled = 2 * err;
            if doubled >= dy {
                err += dy;
                x += step_x;
            }
            if doubled <= dx {
                err += dx;
                y += step_y;
            }
        }
    }
}

pub fn export_rgba_to_png(path: &Path, width: u32, height: u32, data: &[u8]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating PNG output {}", path.display()))?;
    let encoder = PngEncoder::new(file);
    encoder
        .write_image(data, width, height, ColorType::Rgba8)
        .with_context(|| format!("encoding PNG {}", path.display()))?;
    Ok(())
}

fn glyph_for_char(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Pixel = Pixel::new(255, 0, 0);

    #[test]
    fn fill_rect_clips_to_canvas() {
        let mut canvas = Canvas::new(4, 4);
        canvas.clear(Pixel::BLACK);
        canvas.fill_rect(-2, -2, 3, 3, RED);
        assert_eq!(canvas.pixel(0, 0), Some(RED));
        assert_eq!(canvas.pixel(1, 0), Some(Pixel::BLACK));
        assert_eq!(canvas.pixel(0, 1), Some(Pixel::BLACK));

        canvas.fill_rect(3, 3, 50, 50, RED);
        assert_eq!(canvas.pixel(3, 3), Some(RED));
        canvas.fill_rect(i32::MAX, 0, u32::MAX, 1, RED);
        canvas.fill_rect(100, 100, 1, 1, RED);
    }

    #[test]
    fn axis_aligned_lines_are_inclusive() {
        let mut canvas = Canvas::new(5, 5);
        canvas.clear(Pixel::BLACK);
        canvas.draw_line(1, 2, 3, 2, RED);
        assert_eq!(canvas.pixel(0, 2), Some(Pixel::BLACK));
        assert_eq!(canvas.pixel(1, 2), Some(RED));
        assert_eq!(canvas.pixel(3, 2), Some(RED));
        assert_eq!(canvas.pixel(4, 2), Some(Pixel::BLACK));

        canvas.draw_line(4, 4, 4, 0, RED);
        assert!((0..5).all(|y| canvas.pixel(4, y) == Some(RED)));
    }

    #[test]
    fn diagonal_line_hits_both_ends() {
        let mut canvas = Canvas::new(4, 4);
        canvas.clear(Pixel::BLACK);
        canvas.draw_line(0, 0, 3, 3, RED);
        assert!((0..4).all(|i| canvas.pixel(i, i) == Some(RED)));
    }

    #[test]
    fn status_bar_paints_bottom_strip() {
        let mut canvas = Canvas::new(64, 40);
        canvas.clear(Pixel::WHITE);
        canvas.draw_status_bar("Zoom");
        assert_eq!(canvas.pixel(63, 39), Some(STATUS_BG));
        assert_eq!(canvas.pixel(0, 0), Some(Pixel::WHITE));
        let text_rows = (26..34).any(|y| (6..38).any(|x| canvas.pixel(x, y) == Some(STATUS_FG)));
        assert!(text_rows);
    }

    #[test]
    fn exports_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut canvas = Canvas::new(3, 2);
        canvas.clear(RED);
        canvas.export_png(&path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [255, 0, 0, 255]);
    }
}
