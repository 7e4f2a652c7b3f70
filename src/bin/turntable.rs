use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "turntable", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the spinning logo as an animated PNG or GIF.
    Export(ExportArgs),
    /// Dump the cropped frames as numbered PNGs.
    Frames(FramesArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Logo text.
    #[arg(long)]
    text: Option<String>,

    /// Longer canvas side before padding, in pixels.
    #[arg(long)]
    base_size: Option<u32>,

    /// Export settings JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    fps: Option<f64>,

    /// Loop length in seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Alpha at or above which a pixel counts as logo content.
    #[arg(long)]
    cutoff: Option<u8>,

    /// Pixels kept around the content bounds.
    #[arg(long)]
    padding: Option<u32>,

    /// Rock back and forth instead of spinning.
    #[arg(long, conflicts_with = "readable")]
    bounce: bool,

    /// Spin, but never show the mirrored back face.
    #[arg(long)]
    readable: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long, value_enum, default_value_t = FormatChoice::Gif)]
    format: FormatChoice,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Output file stem (defaults to `logo`).
    #[arg(long)]
    name: Option<String>,

    #[command(flatten)]
    scene: SceneArgs,
}

#[derive(Args, Debug)]
struct FramesArgs {
    #[arg(long, value_enum, default_value_t = FormatChoice::Apng)]
    format: FormatChoice,

    /// Directory that receives `frame_000.png`, `frame_001.png`, ...
    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    scene: SceneArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Apng,
    Gif,
}

impl From<FormatChoice> for turntable::OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Apng => turntable::OutputFormat::Apng,
            FormatChoice::Gif => turntable::OutputFormat::Gif,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frames(args) => cmd_frames(args),
    }
}

fn load_settings(args: &SceneArgs) -> anyhow::Result<turntable::ExportSettings> {
    let mut settings = match &args.config {
        Some(path) => turntable::ExportSettings::parse_json_path(path)?,
        None => turntable::ExportSettings::default(),
    };
    if let Some(fps) = args.fps {
        settings.fps = fps;
    }
    if let Some(duration) = args.duration {
        settings.duration_secs = duration;
    }
    if let Some(cutoff) = args.cutoff {
        settings.alpha_cutoff = cutoff;
    }
    if let Some(padding) = args.padding {
        settings.padding_px = padding;
    }
    if args.bounce {
        settings.rotation = turntable::RotationMode::bounce();
    } else if args.readable {
        settings.rotation = turntable::RotationMode::AlwaysReadable;
    }
    settings.validate()?;
    Ok(settings)
}

fn spawn_source(args: &SceneArgs) -> anyhow::Result<turntable::ThreadedSource> {
    let mut scene = turntable::LogoScene::default();
    if let Some(text) = &args.text {
        scene.label = text.clone();
    }
    if let Some(base) = args.base_size {
        scene.base_size = base;
    }
    let source = turntable::TurntableSource::new(scene).context("build logo renderer")?;
    Ok(turntable::ThreadedSource::spawn(source)?)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut settings = load_settings(&args.scene)?;
    if args.name.is_some() {
        settings.base_name = args.name.clone();
    }
    let mut source = spawn_source(&args.scene)?;

    let exporter = turntable::Exporter::new();
    let artifact = exporter.export(
        &mut source,
        &settings,
        args.format.into(),
        &mut turntable::TracingProgress,
    )?;

    let path = turntable::write_artifact(&artifact, &args.out_dir, settings.base_name.as_deref())?;
    eprintln!(
        "wrote {} ({} frames, {}x{}, {} bytes)",
        path.display(),
        artifact.frame_count,
        artifact.crop.width,
        artifact.crop.height,
        artifact.bytes.len()
    );
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let settings = load_settings(&args.scene)?;
    let mut source = spawn_source(&args.scene)?;

    let (result, crop) = turntable::Exporter::new().prepare(
        &mut source,
        &settings,
        args.format.into(),
        &mut turntable::TracingProgress,
    )?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    for (i, frame) in result.frames().iter().enumerate() {
        let path = frame_path(&args.out_dir, i);
        frame
            .to_rgba_image()?
            .save(&path)
            .with_context(|| format!("write png '{}'", path.display()))?;
    }

    eprintln!(
        "wrote {} frames to {} (crop {}x{} at {},{})",
        result.len(),
        args.out_dir.display(),
        crop.width,
        crop.height,
        crop.x,
        crop.y
    );
    Ok(())
}

fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:03}.png"))
}
