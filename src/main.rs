use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use pagemark::DocumentSession;
use pagemark::render::DEFAULT_RENDER_SCALE;

/// Render a page of a PDF document to a PNG file.
#[derive(Parser)]
#[command(name = "pagemark", version, about)]
struct Args {
    /// Path to the PDF document
    file: PathBuf,

    /// Zero-based page index to render
    #[arg(short, long, default_value_t = 0)]
    page: usize,

    /// Scale factor over the page's native resolution
    #[arg(short, long, default_value_t = DEFAULT_RENDER_SCALE)]
    scale: f32,

    /// Output PNG path (defaults to page-<INDEX>.png)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write debug logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = fs::File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        WriteLogger::init(LevelFilter::Debug, Config::default(), file)?;
    }

    let bytes =
        fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;

    let mut session = DocumentSession::new();
    session.set_render_scale(args.scale);
    session.wait_ready()?;

    let page_count = session
        .load(bytes)
        .with_context(|| format!("loading {}", args.file.display()))?;
    info!("loaded {}: {page_count} pages", args.file.display());
    println!("{page_count} pages");

    session.show_page_blocking(args.page)?;
    let image = session
        .current_image()
        .context("render produced no image")?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("page-{}.png", args.page)));
    fs::write(&out, image.bytes()).with_context(|| format!("writing {}", out.display()))?;
    println!("wrote {} ({} bytes)", out.display(), image.bytes().len());

    session.teardown();
    Ok(())
}
