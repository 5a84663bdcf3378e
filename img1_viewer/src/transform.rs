pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 50.0;

/// Grid lines are only drawn once a cell is at least this many screen pixels.
pub const GRID_MIN_SCALE: f64 = 4.0;

pub const KEY_ZOOM_STEP: f64 = 1.2;
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Screen-space segment with inclusive endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Scale and pan applied when mapping image space onto the viewport.
///
/// The image is centred in the viewport first; `offset_x`/`offset_y` are the
/// accumulated drag deltas on top of that centring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    scale: f64,
    offset_x: i32,
    offset_y: i32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

impl ViewTransform {
    #[cfg(test)]
    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale: clamp_scale(scale),
            ..Self::default()
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_y)
    }

    pub fn zoom_percent(&self) -> i64 {
        (self.scale * 100.0).round() as i64
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.scale = clamp_scale(self.scale * factor);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Unbounded; the image may be dragged fully off-screen.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.offset_x = self.offset_x.saturating_add(dx);
        self.offset_y = self.offset_y.saturating_add(dy);
    }

    /// Top-left screen position of image pixel `(0, 0)`.
    pub fn screen_origin(
        &self,
        viewport_width: u32,
        viewport_height: u32,
        image_width: u32,
        image_height: u32,
    ) -> (i32, i32) {
        let start_x = centered(viewport_width, image_width, self.scale);
        let start_y = centered(viewport_height, image_height, self.scale);
        (
            start_x.saturating_add(self.offset_x),
            start_y.saturating_add(self.offset_y),
        )
    }

    pub fn image_to_screen(&self, x: u32, y: u32, start_x: i32, start_y: i32) -> (i32, i32) {
        (
            start_x.saturating_add(scaled(x, self.scale)),
            start_y.saturating_add(scaled(y, self.scale)),
        )
    }

    /// Side length of one image pixel on screen, never below one.
    pub fn cell_size_on_screen(&self) -> u32 {
        (self.scale.floor() as u32).max(1)
    }

    pub fn grid_visible(&self, show_grid: bool) -> bool {
        show_grid && self.scale >= GRID_MIN_SCALE
    }

    /// Lines on every pixel boundary: `image_height + 1` horizontal lines
    /// followed by `image_width + 1` vertical ones.
    pub fn grid_lines(
        &self,
        origin: (i32, i32),
        image_width: u32,
        image_height: u32,
    ) -> impl Iterator<Item = Line> + '_ {
        let (start_x, start_y) = origin;
        let right = start_x.saturating_add(scaled(image_width, self.scale));
        let bottom = start_y.saturating_add(scaled(image_height, self.scale));

        let horizontal = (0..=image_height).map(move |k| {
            let y = start_y.saturating_add(scaled(k, self.scale));
            Line {
                x1: start_x,
                y1: y,
                x2: right,
                y2: y,
            }
        });
        let vertical = (0..=image_width).map(move |k| {
            let x = start_x.saturating_add(scaled(k, self.scale));
            Line {
                x1: x,
                y1: start_y,
                x2: x,
                y2: bottom,
            }
        });
        horizontal.chain(vertical)
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

fn scaled(value: u32, scale: f64) -> i32 {
    (value as f64 * scale).floor() as i32
}

fn centered(viewport: u32, image: u32, scale: f64) -> i32 {
    ((viewport as f64 - image as f64 * scale) / 2.0).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centres_unscaled_image() {
        let transform = ViewTransform::default();
        assert_eq!(transform.screen_origin(10, 10, 2, 2), (4, 4));
        assert_eq!(transform.screen_origin(5, 5, 2, 2), (1, 1));
    }

    #[test]
    fn origin_floors_negative_centring() {
        let transform = ViewTransform::with_scale(3.0);
        // (10 - 7*3) / 2 = -5.5
        assert_eq!(transform.screen_origin(10, 10, 7, 7), (-6, -6));
    }

    #[test]
    fn origin_includes_pan_offset() {
        let mut transform = ViewTransform::default();
        transform.pan(7, -3);
        assert_eq!(transform.screen_origin(10, 10, 2, 2), (11, 1));
    }

    #[test]
    fn image_to_screen_floors_fractional_scale() {
        let transform = ViewTransform::with_scale(1.5);
        assert_eq!(transform.image_to_screen(0, 0, 10, 20), (10, 20));
        assert_eq!(transform.image_to_screen(1, 3, 10, 20), (11, 24));
    }

    #[test]
    fn cell_size_never_below_one() {
        assert_eq!(ViewTransform::with_scale(0.1).cell_size_on_screen(), 1);
        assert_eq!(ViewTransform::with_scale(2.9).cell_size_on_screen(), 2);
        assert_eq!(ViewTransform::with_scale(50.0).cell_size_on_screen(), 50);
    }

    #[test]
    fn repeated_zoom_in_stops_at_max() {
        let mut transform = ViewTransform::default();
        for _ in 0..100 {
            transform.zoom_by(KEY_ZOOM_STEP);
            assert!(transform.scale() <= MAX_SCALE);
        }
        assert_eq!(transform.scale(), MAX_SCALE);
    }

    #[test]
    fn repeated_zoom_out_stops_at_min() {
        let mut transform = ViewTransform::default();
        for _ in 0..100 {
            transform.zoom_by(1.0 / KEY_ZOOM_STEP);
            assert!(transform.scale() >= MIN_SCALE);
        }
        assert_eq!(transform.scale(), MIN_SCALE);
    }

    #[test]
    fn reset_restores_identity_after_any_history() {
        let mut transform = ViewTransform::default();
        transform.pan(40, -12);
        transform.zoom_by(WHEEL_ZOOM_STEP);
        transform.zoom_by(1.0 / KEY_ZOOM_STEP);
        transform.pan(-3, 9);
        transform.reset();
        assert_eq!(transform.scale(), 1.0);
        assert_eq!(transform.offset(), (0, 0));
        transform.reset();
        assert_eq!(transform, ViewTransform::default());
    }

    #[test]
    fn pan_is_unbounded() {
        let mut transform = ViewTransform::default();
        transform.pan(100_000, -100_000);
        assert_eq!(transform.offset(), (100_000, -100_000));
    }

    #[test]
    fn grid_threshold() {
        assert!(!ViewTransform::with_scale(3.9).grid_visible(true));
        assert!(ViewTransform::with_scale(4.0).grid_visible(true));
        assert!(!ViewTransform::with_scale(8.0).grid_visible(false));
    }

    #[test]
    fn grid_lines_sit_on_pixel_boundaries() {
        let transform = ViewTransform::with_scale(4.0);
        let lines: Vec<Line> = transform.grid_lines((10, 20), 3, 2).collect();
        assert_eq!(lines.len(), (2 + 1) + (3 + 1));
        assert_eq!(
            lines[0],
            Line {
                x1: 10,
                y1: 20,
                x2: 22,
                y2: 20
            }
        );
        assert_eq!(lines[2].y1, 28);
        assert_eq!(
            lines[3],
            Line {
                x1: 10,
                y1: 20,
                x2: 10,
                y2: 28
            }
        );
        assert_eq!(lines[6].x1, 22);
    }

    #[test]
    fn zoom_percent_rounds() {
        let mut transform = ViewTransform::default();
        transform.zoom_by(KEY_ZOOM_STEP);
        assert_eq!(transform.zoom_percent(), 120);
        transform.zoom_by(1.0 / WHEEL_ZOOM_STEP);
        assert_eq!(transform.zoom_percent(), 109);
    }
}
