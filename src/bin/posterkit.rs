use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use posterkit::{Image, ImageKind, Rgb8, ShapeOptions, TextOptions};

#[derive(Parser, Debug)]
#[command(name = "posterkit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw one or more text blocks onto an image, each below the previous one.
    Caption(CaptionArgs),
    /// Print the fitted line layout of a text block as JSON.
    Measure(MeasureArgs),
}

#[derive(Parser, Debug)]
struct Source {
    /// Input image to draw on.
    #[arg(long = "in", conflicts_with = "canvas")]
    in_path: Option<PathBuf>,

    /// Blank canvas size, e.g. `1200x630` or `800`.
    #[arg(long)]
    canvas: Option<String>,

    /// Background color for a blank canvas (`#rgb` or `#rrggbb`).
    #[arg(long)]
    background: Option<String>,

    /// Text options as JSON, e.g. `{"fontfile": "a.ttf", "fontsize": 40}`.
    #[arg(long, default_value = "{}")]
    options: String,
}

#[derive(Parser, Debug)]
struct CaptionArgs {
    #[command(flatten)]
    source: Source,

    /// Text block; repeat to stack several blocks.
    #[arg(long = "text", required = true)]
    texts: Vec<String>,

    /// Vertical gap in pixels between stacked blocks.
    #[arg(long, default_value_t = 0)]
    gap: i32,

    /// Output path; the format follows the extension.
    #[arg(long)]
    out: PathBuf,

    /// Encoder quality (0-100).
    #[arg(long, default_value_t = 90)]
    quality: u8,

    /// Explicit output format (gif, jpeg, png, webp).
    #[arg(long)]
    format: Option<ImageKind>,
}

#[derive(Parser, Debug)]
struct MeasureArgs {
    #[command(flatten)]
    source: Source,

    #[arg(long)]
    text: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Caption(args) => cmd_caption(args),
        Command::Measure(args) => cmd_measure(args),
    }
}

fn parse_size(s: &str) -> anyhow::Result<(u32, Option<u32>)> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .with_context(|| format!("invalid canvas size '{s}'"))
    };
    match s.split_once(['x', 'X']) {
        Some((w, h)) => Ok((parse(w)?, Some(parse(h)?))),
        None => Ok((parse(s)?, None)),
    }
}

fn open_image(source: &Source) -> anyhow::Result<Image> {
    if let Some(path) = &source.in_path {
        return Ok(Image::make(path)?);
    }
    let size = source.canvas.as_deref().unwrap_or("800x600");
    let (w, h) = parse_size(size)?;
    let mut image = Image::canvas(w, h)?;
    if let Some(bg) = &source.background {
        let color = Rgb8::parse_hex(bg)?;
        let (w, h) = (image.width(), image.height());
        let fill = ShapeOptions {
            color,
            ..ShapeOptions::default()
        };
        image.rectangle(0, 0, w, h, &fill)?;
    }
    Ok(image)
}

fn parse_options(json: &str) -> anyhow::Result<TextOptions> {
    serde_json::from_str(json).with_context(|| "parse text options JSON")
}

fn cmd_caption(args: CaptionArgs) -> anyhow::Result<()> {
    let mut image = open_image(&args.source)?;
    let mut options = parse_options(&args.source.options)?;

    let mut boundaries = Vec::with_capacity(args.texts.len());
    for text in &args.texts {
        let boundary = image
            .text(text, &options)
            .with_context(|| format!("draw text block {}", boundaries.len() + 1))?;
        options.y = Some(boundary.bottom() + args.gap);
        // later blocks take whatever height is left
        options.height = None;
        boundaries.push(boundary);
    }

    ensure_parent(&args.out)?;
    image.save(&args.out, args.quality, args.format)?;
    println!("{}", serde_json::to_string_pretty(&boundaries)?);
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_measure(args: MeasureArgs) -> anyhow::Result<()> {
    let image = open_image(&args.source)?;
    let options = parse_options(&args.source.options)?;
    let layout = image.layout_text(&args.text, &options)?;
    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
