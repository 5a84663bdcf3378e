use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use img1_formats::{ContainerHeader, HEADER_LEN, peek_header};
use serde::Serialize;
use walkdir::WalkDir;

/// Print IMG1 header information for files or directories of `.img` files.
#[derive(Parser)]
struct Args {
    /// Files to inspect; directories are searched recursively for `*.img`
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Emit one JSON object per file instead of a table row
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct DumpRow {
    path: PathBuf,
    size: usize,
    #[serde(flatten)]
    header: Option<ContainerHeader>,
    payload_complete: bool,
    error: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut files = Vec::new();
    for path in &args.paths {
        if path.is_dir() {
            collect_images(path, &mut files);
        } else {
            files.push(path.clone());
        }
    }

    for path in files {
        let row = inspect(&path)?;
        if args.json {
            println!("{}", serde_json::to_string(&row)?);
        } else {
            print_row(&row);
        }
    }
    Ok(())
}

fn collect_images(root: &Path, out: &mut Vec<PathBuf>) {
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        let is_img = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("img"));
        if entry.file_type().is_file() && is_img {
            out.push(entry.into_path());
        }
    }
}

fn inspect(path: &Path) -> Result<DumpRow> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let row = match peek_header(&bytes) {
        Ok(header) => {
            let expected = header.payload_len()? + HEADER_LEN;
            DumpRow {
                path: path.to_path_buf(),
                size: bytes.len(),
                header: Some(header),
                payload_complete: bytes.len() >= expected,
                error: None,
            }
        }
        Err(err) => DumpRow {
            path: path.to_path_buf(),
            size: bytes.len(),
            header: None,
            payload_complete: false,
            error: Some(err.to_string()),
        },
    };
    Ok(row)
}

fn print_row(row: &DumpRow) {
    match (&row.header, &row.error) {
        (Some(header), _) => {
            let note = match (header.is_packed_rgb(), row.payload_complete) {
                (true, true) => String::new(),
                (false, true) => format!("  (unknown pixel type {})", header.pixel_type),
                (_, false) => String::from("  (payload truncated)"),
            };
            println!(
                "{path:<40} {width:>6}x{height:<6} type {ptype:>2} {size:>10} bytes{note}",
                path = row.path.display(),
                width = header.width,
                height = header.height,
                ptype = header.pixel_type,
                size = row.size,
            );
        }
        (None, Some(error)) => println!("{:<40} error: {error}", row.path.display()),
        (None, None) => println!("{:<40} unreadable", row.path.display()),
    }
}
