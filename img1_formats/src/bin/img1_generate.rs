use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use img1_formats::{canonical_fixtures, write_file};

/// Write the canonical IMG1 fixture images.
#[derive(Parser)]
struct Args {
    /// Directory that receives the `.img` files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Seed for the noise fixture
    #[arg(long, default_value_t = 0x1316)]
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    for fixture in canonical_fixtures(args.seed) {
        let path = args.out_dir.join(fixture.file_name);
        write_file(&path, &fixture.buffer)
            .with_context(|| format!("writing {}", path.display()))?;
        let (width, height) = fixture.buffer.dimensions();
        println!("Created {} ({width}x{height})", path.display());
    }

    Ok(())
}
