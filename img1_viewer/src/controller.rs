use std::path::PathBuf;

use img1_formats::{Pixel, PixelBuffer};
use log::{debug, error, info};

use crate::loader::{ImageLoader, LoadedImage};
use crate::transform::{KEY_ZOOM_STEP, ViewTransform, WHEEL_ZOOM_STEP};

/// Drawing primitives the controller renders through.
pub trait Renderer {
    fn clear(&mut self, color: Pixel);
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Pixel);
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Pixel);
}

/// One-line status output plus the error dialog.
pub trait StatusSink {
    fn set_text(&mut self, text: &str);
    fn show_error(&mut self, message: &str);
}

/// File chooser. `None` means the user cancelled.
pub trait OpenDialog {
    fn pick_image(&mut self) -> Option<PathBuf>;
}

/// Input delivered by the windowing layer, in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Open(PathBuf),
    OpenDialog,
    ZoomIn,
    ZoomOut,
    ZoomWheel(f64),
    ResetView,
    ToggleGrid,
    DragStart { x: i32, y: i32 },
    DragMove { x: i32, y: i32 },
    DragEnd,
    Resize { width: u32, height: u32 },
    Exit,
}

/// What the event loop should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Idle,
    Redraw,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Pixel,
    pub grid: Pixel,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Pixel::new(32, 36, 44),
            grid: Pixel::new(96, 96, 96),
        }
    }
}

/// Everything the viewer knows about the current session.
#[derive(Debug, Default)]
pub struct ViewerState {
    pub image: Option<PixelBuffer>,
    pub transform: ViewTransform,
    pub show_grid: bool,
    pub is_dragging: bool,
    pub last_pointer: (i32, i32),
}

pub struct ViewerController {
    state: ViewerState,
    viewport: (u32, u32),
    palette: Palette,
    loader: Box<dyn ImageLoader>,
    dialog: Box<dyn OpenDialog>,
}

impl ViewerController {
    pub fn new(
        viewport: (u32, u32),
        palette: Palette,
        loader: Box<dyn ImageLoader>,
        dialog: Box<dyn OpenDialog>,
    ) -> Self {
        Self {
            state: ViewerState::default(),
            viewport,
            palette,
            loader,
            dialog,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn set_show_grid(&mut self, show_grid: bool) {
        self.state.show_grid = show_grid;
    }

    pub fn handle(&mut self, event: ViewerEvent, status: &mut dyn StatusSink) -> Reaction {
        debug!("viewer event {event:?}");
        match event {
            ViewerEvent::Open(path) => {
                self.loader.request(path);
                self.poll_loads(status)
            }
            ViewerEvent::OpenDialog => match self.dialog.pick_image() {
                Some(path) => self.handle(ViewerEvent::Open(path), status),
                None => Reaction::Idle,
            },
            ViewerEvent::ZoomIn => self.zoom(KEY_ZOOM_STEP, status),
            ViewerEvent::ZoomOut => self.zoom(1.0 / KEY_ZOOM_STEP, status),
            ViewerEvent::ZoomWheel(delta) => {
                let factor = if delta > 0.0 {
                    WHEEL_ZOOM_STEP
                } else {
                    1.0 / WHEEL_ZOOM_STEP
                };
                self.zoom(factor, status)
            }
            ViewerEvent::ResetView => {
                self.state.transform.reset();
                status.set_text("Reset");
                Reaction::Redraw
            }
            ViewerEvent::ToggleGrid => {
                self.state.show_grid = !self.state.show_grid;
                status.set_text(if self.state.show_grid {
                    "Grid: ON"
                } else {
                    "Grid: OFF"
                });
                Reaction::Redraw
            }
            ViewerEvent::DragStart { x, y } => {
                self.state.is_dragging = true;
                self.state.last_pointer = (x, y);
                Reaction::Idle
            }
            ViewerEvent::DragMove { x, y } => {
                if !self.state.is_dragging {
                    return Reaction::Idle;
                }
                let (last_x, last_y) = self.state.last_pointer;
                self.state
                    .transform
                    .pan(x.saturating_sub(last_x), y.saturating_sub(last_y));
                self.state.last_pointer = (x, y);
                Reaction::Redraw
            }
            ViewerEvent::DragEnd => {
                if self.state.is_dragging {
                    debug!("pan offset now {:?}", self.state.transform.offset());
                }
                self.state.is_dragging = false;
                Reaction::Idle
            }
            ViewerEvent::Resize { width, height } => {
                self.viewport = (width, height);
                Reaction::Redraw
            }
            ViewerEvent::Exit => Reaction::Exit,
        }
    }

    /// Applies finished loads. Only the newest request ever reaches here.
    pub fn poll_loads(&mut self, status: &mut dyn StatusSink) -> Reaction {
        let mut reaction = Reaction::Idle;
        while let Some(loaded) = self.loader.try_next() {
            if self.apply_load(loaded, status) {
                reaction = Reaction::Redraw;
            }
        }
        reaction
    }

    fn apply_load(&mut self, loaded: LoadedImage, status: &mut dyn StatusSink) -> bool {
        match loaded.result {
            Ok(image) => {
                let (width, height) = image.dimensions();
                info!("loaded {} ({width}x{height})", loaded.path.display());
                self.state.image = Some(image);
                self.state.transform.reset();
                self.state.is_dragging = false;
                status.set_text(&format!("Loaded: {width}x{height}"));
                true
            }
            Err(err) => {
                let message = format!("Failed to open {}: {err}", loaded.path.display());
                error!("{message}");
                status.show_error(&message);
                false
            }
        }
    }

    fn zoom(&mut self, factor: f64, status: &mut dyn StatusSink) -> Reaction {
        self.state.transform.zoom_by(factor);
        debug!("scale now {:.3}", self.state.transform.scale());
        status.set_text(&format!("Zoom: {}%", self.state.transform.zoom_percent()));
        Reaction::Redraw
    }

    /// Paints the current view: one rectangle per image pixel in row-major
    /// order, then the grid overlay when it is enabled and cells are large
    /// enough.
    pub fn redraw(&self, renderer: &mut dyn Renderer) {
        renderer.clear(self.palette.background);
        let Some(image) = self.state.image.as_ref() else {
            return;
        };

        let transform = &self.state.transform;
        let (image_width, image_height) = image.dimensions();
        let (viewport_width, viewport_height) = self.viewport;
        let (start_x, start_y) =
            transform.screen_origin(viewport_width, viewport_height, image_width, image_height);
        let cell = transform.cell_size_on_screen();

        for (x, y, pixel) in image.enumerate() {
            let (screen_x, screen_y) = transform.image_to_screen(x, y, start_x, start_y);
            renderer.fill_rect(screen_x, screen_y, cell, cell, pixel);
        }

        if transform.grid_visible(self.state.show_grid) {
            for line in transform.grid_lines((start_x, start_y), image_width, image_height) {
                renderer.draw_line(line.x1, line.y1, line.x2, line.y2, self.palette.grid);
            }
        }
    }
}
