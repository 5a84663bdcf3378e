use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use img1_formats::{ImageError, PixelBuffer, read_file};
use log::{debug, warn};

/// Result of reading and decoding one file.
#[derive(Debug)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub result: Result<PixelBuffer, ImageError>,
}

/// Source of decoded images for the controller.
///
/// A newer `request` supersedes older ones: once it is issued, results of
/// earlier requests are never returned from `try_next`.
pub trait ImageLoader {
    fn request(&mut self, path: PathBuf);
    fn try_next(&mut self) -> Option<LoadedImage>;
}

/// Decodes on the calling thread before `request` returns.
#[derive(Debug, Default)]
pub struct SyncLoader {
    pending: Option<LoadedImage>,
}

impl ImageLoader for SyncLoader {
    fn request(&mut self, path: PathBuf) {
        let result = read_file(&path);
        self.pending = Some(LoadedImage { path, result });
    }

    fn try_next(&mut self) -> Option<LoadedImage> {
        self.pending.take()
    }
}

struct LoadMessage {
    generation: u64,
    loaded: LoadedImage,
}

/// Decodes on worker threads and hands results back over a channel.
///
/// Each request is tagged with a generation number; only the result for the
/// latest generation is surfaced, so a slow decode that finishes after a
/// newer request is dropped.
pub struct BackgroundLoader {
    tx: Sender<LoadMessage>,
    rx: Receiver<LoadMessage>,
    latest: u64,
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl BackgroundLoader {
    /// `notify` runs on the worker thread after each result is queued, so
    /// the event loop can wake up and poll.
    pub fn new(notify: impl Fn() + Send + Sync + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            latest: 0,
            notify: Arc::new(notify),
        }
    }
}

impl ImageLoader for BackgroundLoader {
    fn request(&mut self, path: PathBuf) {
        self.latest += 1;
        let generation = self.latest;
        let tx = self.tx.clone();
        let notify = Arc::clone(&self.notify);

        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name(format!("img1_loader_{generation}"))
            .spawn(move || {
                let result = read_file(&worker_path);
                let message = LoadMessage {
                    generation,
                    loaded: LoadedImage {
                        path: worker_path,
                        result,
                    },
                };
                if tx.send(message).is_ok() {
                    notify();
                }
            });

        if let Err(err) = spawned {
            warn!("failed to spawn loader thread: {err}");
            let _ = self.tx.send(LoadMessage {
                generation,
                loaded: LoadedImage {
                    path,
                    result: Err(ImageError::Io(err)),
                },
            });
        }
    }

    fn try_next(&mut self) -> Option<LoadedImage> {
        while let Ok(message) = self.rx.try_recv() {
            if message.generation == self.latest {
                return Some(message.loaded);
            }
            debug!(
                "discarding stale load of {} (generation {} < {})",
                message.loaded.path.display(),
                message.generation,
                self.latest
            );
        }
        None
    }
}
