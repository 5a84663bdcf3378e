use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use img1_formats::Pixel;
use serde::Deserialize;

use crate::controller::Palette;

const DEFAULT_WINDOW_WIDTH: u32 = 800;
const DEFAULT_WINDOW_HEIGHT: u32 = 600;

#[derive(Parser, Debug)]
#[command(about = "Pan/zoom viewer for IMG1 raster images", version)]
pub struct Args {
    /// IMG1 file to open at startup
    pub path: Option<PathBuf>,

    /// Directory the open key (O) cycles through; defaults to the startup file's directory
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Optional viewer preset JSON (colors, window size, grid default)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Window width in pixels (overrides the preset)
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height in pixels (overrides the preset)
    #[arg(long)]
    pub height: Option<u32>,

    /// Start with the pixel grid enabled
    #[arg(long)]
    pub grid: bool,

    /// When set, write the decoded image to disk (PNG) before launching the viewer
    #[arg(long)]
    pub dump_frame: Option<PathBuf>,

    /// When set, render the initial view offscreen and write it as PNG
    #[arg(long)]
    pub dump_render: Option<PathBuf>,

    /// Skip creating a winit window/event loop; useful for headless automation
    #[arg(long)]
    pub headless: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewerPreset {
    #[serde(default)]
    pub background: Option<[u8; 3]>,
    #[serde(default)]
    pub grid_color: Option<[u8; 3]>,
    #[serde(default)]
    pub status_bar: Option<bool>,
    #[serde(default)]
    pub window_width: Option<u32>,
    #[serde(default)]
    pub window_height: Option<u32>,
    #[serde(default)]
    pub show_grid: Option<bool>,
}

pub fn load_viewer_preset(path: &Path) -> Result<ViewerPreset> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading viewer preset {}", path.display()))?;
    let preset: ViewerPreset = serde_json::from_str(&data)
        .with_context(|| format!("parsing viewer preset {}", path.display()))?;
    Ok(preset)
}

/// Settings after merging the preset with command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub palette: Palette,
    pub status_bar: bool,
    pub window_size: (u32, u32),
    pub show_grid: bool,
}

impl ViewerConfig {
    pub fn resolve(args: &Args, preset: &ViewerPreset) -> Self {
        let defaults = Palette::default();
        let palette = Palette {
            background: preset
                .background
                .map(Pixel::from)
                .unwrap_or(defaults.background),
            grid: preset.grid_color.map(Pixel::from).unwrap_or(defaults.grid),
        };
        let width = args
            .width
            .or(preset.window_width)
            .unwrap_or(DEFAULT_WINDOW_WIDTH)
            .max(1);
        let height = args
            .height
            .or(preset.window_height)
            .unwrap_or(DEFAULT_WINDOW_HEIGHT)
            .max(1);
        Self {
            palette,
            status_bar: preset.status_bar.unwrap_or(true),
            window_size: (width, height),
            show_grid: args.grid || preset.show_grid.unwrap_or(false),
        }
    }

    /// Directory the open dialog browses.
    pub fn browse_root(args: &Args) -> PathBuf {
        if let Some(dir) = args.dir.as_ref() {
            return dir.clone();
        }
        args.path
            .as_ref()
            .and_then(|path| path.parent())
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cli_overrides_preset() {
        let args = Args::parse_from(["img1_viewer", "--width", "320", "--grid"]);
        let preset = ViewerPreset {
            window_width: Some(1024),
            window_height: Some(768),
            background: Some([1, 2, 3]),
            ..ViewerPreset::default()
        };
        let config = ViewerConfig::resolve(&args, &preset);
        assert_eq!(config.window_size, (320, 768));
        assert!(config.show_grid);
        assert!(config.status_bar);
        assert_eq!(config.palette.background, Pixel::new(1, 2, 3));
        assert_eq!(config.palette.grid, Palette::default().grid);
    }

    #[test]
    fn preset_parses_partial_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        fs::write(&path, r#"{ "grid_color": [255, 0, 0], "status_bar": false }"#).unwrap();
        let preset = load_viewer_preset(&path).unwrap();
        assert_eq!(preset.grid_color, Some([255, 0, 0]));
        assert_eq!(preset.status_bar, Some(false));
        assert!(preset.window_width.is_none());
    }

    #[test]
    fn browse_root_defaults_to_image_directory() {
        let args = Args::parse_from(["img1_viewer", "fixtures/test_noise.img"]);
        assert_eq!(ViewerConfig::browse_root(&args), PathBuf::from("fixtures"));
        let args = Args::parse_from(["img1_viewer", "test_noise.img"]);
        assert_eq!(ViewerConfig::browse_root(&args), PathBuf::from("."));
        let args = Args::parse_from(["img1_viewer", "--dir", "/tmp/images"]);
        assert_eq!(ViewerConfig::browse_root(&args), PathBuf::from("/tmp/images"));
    }
}
