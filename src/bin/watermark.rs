use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use watermark::ResourceLoader as _;

#[derive(Parser, Debug)]
#[command(name = "watermark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply an overlay plan to an image and write a PNG.
    Apply(ApplyArgs),
    /// Print the natural size of an image or SVG resource.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Base image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Overlay plan JSON. Resources are resolved relative to its directory.
    #[arg(long)]
    plan: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Font file (TTF/OTF) used for text overlays.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Override the plan's display density.
    #[arg(long)]
    density: Option<f32>,

    /// Override the plan's font scale.
    #[arg(long)]
    font_scale: Option<f32>,

    /// Decode image overlay resources in parallel.
    #[arg(long)]
    parallel_decode: bool,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Resource file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let plan = watermark::WatermarkPlan::from_path(&args.plan)?;

    let mut settings = plan.settings.clone().with_env_overrides();
    if let Some(density) = args.density {
        settings.density_scale = density;
    }
    if let Some(font_scale) = args.font_scale {
        settings.font_scale = font_scale;
    }
    settings.parallel_decode |= args.parallel_decode;

    let base = image::open(&args.in_path)
        .with_context(|| format!("open base image '{}'", args.in_path.display()))?;
    let base = watermark::RasterImage::from_dynamic(&base);

    let resources_root = args.plan.parent().unwrap_or_else(|| Path::new("."));
    let mut wm = watermark::Watermark::from_settings(base, &settings)?
        .with_loader(Arc::new(watermark::FsResourceLoader::new(resources_root)));
    if let Some(font) = &args.font {
        wm = wm.with_text_renderer(Box::new(watermark::ParleyTextRenderer::from_font_file(
            font,
        )?));
    } else if !plan.texts.is_empty() {
        anyhow::bail!("plan has text overlays; pass --font");
    }

    plan.apply(&mut wm)?;
    wm.render()?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    wm.result()
        .to_rgba_image()
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let name = args
        .in_path
        .file_name()
        .and_then(|n| n.to_str())
        .context("resource path has no UTF-8 file name")?;
    let loader = watermark::FsResourceLoader::new(root);
    let (w, h) = loader.probe(&watermark::ResourceHandle::new(name))?;
    println!("{w}x{h}");
    Ok(())
}
