mod canvas;
mod cli;
mod controller;
mod display;
mod loader;
mod picker;
mod transform;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use pollster::FutureExt;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use crate::canvas::{Canvas, export_rgba_to_png};
use crate::cli::{Args, ViewerConfig, ViewerPreset, load_viewer_preset};
use crate::controller::{OpenDialog, Reaction, Renderer, StatusSink, ViewerController, ViewerEvent};
use crate::display::Display;
use crate::loader::{BackgroundLoader, SyncLoader};
use crate::picker::DirectoryPicker;

const WINDOW_TITLE: &str = "IMG1 Viewer";

/// Wakes the event loop when a background decode finishes.
#[derive(Debug, Clone, Copy)]
struct LoadFinished;

/// Status line shown in the window title and the on-canvas status bar.
#[derive(Default)]
struct StatusLine {
    text: String,
    window: Option<Arc<winit::window::Window>>,
}

impl StatusLine {
    fn text(&self) -> &str {
        &self.text
    }

    fn publish(&mut self, text: String) {
        if let Some(window) = self.window.as_ref() {
            window.set_title(&format!("{WINDOW_TITLE} - {text}"));
        }
        self.text = text;
    }
}

impl StatusSink for StatusLine {
    fn set_text(&mut self, text: &str) {
        info!("{text}");
        self.publish(text.to_string());
    }

    fn show_error(&mut self, message: &str) {
        // The log already carries the full error; keep the bar short.
        self.publish(format!("Error: {message}"));
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let preset = match args.config.as_ref() {
        Some(path) => load_viewer_preset(path)?,
        None => ViewerPreset::default(),
    };
    let config = ViewerConfig::resolve(&args, &preset);

    if args.headless {
        return run_headless(&args, &config);
    }

    run_windowed(&args, config)
}

fn browse_dialog(args: &Args) -> Box<dyn OpenDialog> {
    let mut picker = DirectoryPicker::new(ViewerConfig::browse_root(args));
    if let Some(path) = args.path.as_ref() {
        picker = picker.start_after(path);
    }
    Box::new(picker)
}

fn run_headless(args: &Args, config: &ViewerConfig) -> Result<()> {
    let mut controller = ViewerController::new(
        config.window_size,
        config.palette,
        Box::new(SyncLoader::default()),
        browse_dialog(args),
    );
    controller.set_show_grid(config.show_grid);
    let mut status = StatusLine::default();

    if let Some(path) = args.path.as_ref() {
        controller.handle(ViewerEvent::Open(path.clone()), &mut status);
        if controller.state().image.is_none() {
            bail!("{}", status.text());
        }
    }

    if let Some(output_path) = args.dump_frame.as_ref() {
        let Some(image) = controller.state().image.as_ref() else {
            bail!("--dump-frame needs an image path");
        };
        export_rgba_to_png(output_path, image.width(), image.height(), &image.to_rgba8())
            .with_context(|| format!("writing PNG to {}", output_path.display()))?;
        println!(
            "Image exported to {} ({}x{})",
            output_path.display(),
            image.width(),
            image.height()
        );
    }

    if let Some(output_path) = args.dump_render.as_ref() {
        let canvas = render_view(&controller, config, status.text());
        canvas
            .export_png(output_path)
            .with_context(|| format!("writing render to {}", output_path.display()))?;
        println!(
            "View rendered to {} ({}x{})",
            output_path.display(),
            canvas.width(),
            canvas.height()
        );
    }

    println!("Headless mode requested; viewer window bootstrap skipped.");
    Ok(())
}

fn render_view(controller: &ViewerController, config: &ViewerConfig, status: &str) -> Canvas {
    let (width, height) = controller.viewport();
    let mut canvas = Canvas::new(width, height);
    controller.redraw(&mut canvas as &mut dyn Renderer);
    if config.status_bar && !status.is_empty() {
        canvas.draw_status_bar(status);
    }
    canvas
}

fn run_windowed(args: &Args, config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::<LoadFinished>::with_user_event()
        .build()
        .context("creating winit event loop")?;
    let (width, height) = config.window_size;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let mut display = Display::new(window.clone()).block_on()?;
    let size = display.size();

    let proxy = Mutex::new(event_loop.create_proxy());
    let loader = BackgroundLoader::new(move || {
        if let Ok(proxy) = proxy.lock() {
            let _ = proxy.send_event(LoadFinished);
        }
    });
    let mut controller = ViewerController::new(
        (size.width, size.height),
        config.palette,
        Box::new(loader),
        browse_dialog(args),
    );
    controller.set_show_grid(config.show_grid);

    let mut status = StatusLine {
        window: Some(window.clone()),
        ..StatusLine::default()
    };
    status.publish(String::from("Press O to open, G grid, R reset, +/- zoom"));

    if let Some(path) = args.path.as_ref() {
        controller.handle(ViewerEvent::Open(path.clone()), &mut status);
    }

    let mut canvas = Canvas::new(size.width, size.height);
    let mut cursor = PhysicalPosition::new(0.0f64, 0.0f64);

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Wait);

            let reaction = match event {
                Event::UserEvent(LoadFinished) => controller.poll_loads(&mut status),
                Event::WindowEvent { window_id, event } if window_id == display.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => Reaction::Exit,
                        WindowEvent::Resized(new_size) => {
                            display.resize(new_size);
                            controller.handle(
                                ViewerEvent::Resize {
                                    width: new_size.width,
                                    height: new_size.height,
                                },
                                &mut status,
                            )
                        }
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key,
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => match key_event(&logical_key) {
                            Some(viewer_event) => controller.handle(viewer_event, &mut status),
                            None => Reaction::Idle,
                        },
                        WindowEvent::CursorMoved { position, .. } => {
                            cursor = position;
                            let (x, y) = pointer(cursor);
                            controller.handle(ViewerEvent::DragMove { x, y }, &mut status)
                        }
                        WindowEvent::MouseInput {
                            state,
                            button: MouseButton::Left,
                            ..
                        } => {
                            let (x, y) = pointer(cursor);
                            let viewer_event = match state {
                                ElementState::Pressed => ViewerEvent::DragStart { x, y },
                                ElementState::Released => ViewerEvent::DragEnd,
                            };
                            controller.handle(viewer_event, &mut status)
                        }
                        WindowEvent::MouseWheel { delta, .. } => {
                            let amount = match delta {
                                MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                                MouseScrollDelta::PixelDelta(position) => position.y,
                            };
                            if amount == 0.0 {
                                Reaction::Idle
                            } else {
                                controller.handle(ViewerEvent::ZoomWheel(amount), &mut status)
                            }
                        }
                        WindowEvent::DroppedFile(path) => {
                            controller.handle(ViewerEvent::Open(path), &mut status)
                        }
                        WindowEvent::RedrawRequested => {
                            let size = display.size();
                            canvas.resize(size.width, size.height);
                            controller.redraw(&mut canvas);
                            if config.status_bar {
                                canvas.draw_status_bar(status.text());
                            }
                            match display.present(&canvas) {
                                Ok(()) => {}
                                Err(wgpu::SurfaceError::Lost) => display.resize(display.size()),
                                Err(wgpu::SurfaceError::OutOfMemory) => target.exit(),
                                Err(err) => warn!("render error: {err:?}"),
                            }
                            Reaction::Idle
                        }
                        _ => Reaction::Idle,
                    }
                }
                _ => Reaction::Idle,
            };

            match reaction {
                Reaction::Idle => {}
                Reaction::Redraw => display.window().request_redraw(),
                Reaction::Exit => target.exit(),
            }
        })
        .context("running viewer application")?;
    Ok(())
}

fn key_event(key: &Key) -> Option<ViewerEvent> {
    match key {
        Key::Named(NamedKey::Escape) => Some(ViewerEvent::Exit),
        Key::Character(text) => match text.to_ascii_lowercase().as_str() {
            "o" => Some(ViewerEvent::OpenDialog),
            "+" | "=" => Some(ViewerEvent::ZoomIn),
            "-" | "_" => Some(ViewerEvent::ZoomOut),
            "r" | "0" => Some(ViewerEvent::ResetView),
            "g" => Some(ViewerEvent::ToggleGrid),
            "q" => Some(ViewerEvent::Exit),
            _ => None,
        },
        _ => None,
    }
}

fn pointer(position: PhysicalPosition<f64>) -> (i32, i32) {
    (position.x.round() as i32, position.y.round() as i32)
}
