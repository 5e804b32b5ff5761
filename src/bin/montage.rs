use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::Level;

use montage::{
    AudioOutput, MediaConfig, Project, VideoWriterOpts, WriteVideoOpts, extract_subclip,
    parse_timestamp, probe, subclip_target_name, write_videofile,
};

#[derive(Parser, Debug)]
#[command(name = "montage", version)]
struct Cli {
    /// Log subprocess command lines and decoder activity.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a project to a video file (requires `ffmpeg`).
    Render(RenderArgs),
    /// Render a single project frame as a PNG.
    Frame(FrameArgs),
    /// Copy a section of a media file without re-encoding (requires `ffmpeg`).
    Subclip(SubclipArgs),
    /// Print the metadata `ffmpeg` reports for a media file as JSON.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output video path; the extension picks the codec.
    #[arg(long)]
    out: PathBuf,

    /// Output frame rate (defaults to the project's).
    #[arg(long)]
    fps: Option<f64>,

    /// Video codec override.
    #[arg(long)]
    codec: Option<String>,

    /// Target bitrate such as `5000k`.
    #[arg(long)]
    bitrate: Option<String>,

    #[arg(long, default_value = "medium")]
    preset: String,

    /// Encoder threads.
    #[arg(long)]
    threads: Option<u32>,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = true)]
    overwrite: bool,

    /// Write a silent video.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time of the frame, e.g. `2.5` or `00:01:02.25`.
    #[arg(long, default_value = "0")]
    time: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Store the project's mask as alpha channel.
    #[arg(long, default_value_t = false)]
    with_mask: bool,
}

#[derive(Parser, Debug)]
struct SubclipArgs {
    /// Input media file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Start of the section.
    #[arg(long, default_value = "0")]
    start: String,

    /// Length of the section in seconds (or as a timestamp).
    #[arg(long)]
    duration: String,

    /// Output path; defaults to `<name>_SUB<start ms>_<end ms>.<ext>` next to the input.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Media file to inspect.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let cfg = MediaConfig::from_env();
    match cli.cmd {
        Command::Render(args) => cmd_render(args, &cfg),
        Command::Frame(args) => cmd_frame(args, &cfg),
        Command::Subclip(args) => cmd_subclip(args, &cfg),
        Command::Probe(args) => cmd_probe(args, &cfg),
    }
}

fn cmd_render(args: RenderArgs, cfg: &MediaConfig) -> anyhow::Result<()> {
    let project = Project::from_path(&args.in_path)?;
    let clip = project.build(cfg)?;

    let opts = WriteVideoOpts {
        fps: args.fps,
        writer: VideoWriterOpts {
            codec: args.codec,
            bitrate: args.bitrate,
            preset: args.preset,
            threads: args.threads,
            overwrite: args.overwrite,
            ..VideoWriterOpts::default()
        },
        audio: if args.no_audio {
            AudioOutput::None
        } else {
            AudioOutput::FromClip
        },
        ..WriteVideoOpts::default()
    };
    let stats = write_videofile(&clip, &args.out, &opts, cfg)?;

    eprintln!(
        "wrote {} ({} frames)",
        args.out.display(),
        stats.frames_total
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs, cfg: &MediaConfig) -> anyhow::Result<()> {
    let t = parse_timestamp(&args.time)?;
    let project = Project::from_path(&args.in_path)?;
    let mut clip = project.build(cfg)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    clip.save_frame(&args.out, t, args.with_mask)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_subclip(args: SubclipArgs, cfg: &MediaConfig) -> anyhow::Result<()> {
    let t1 = parse_timestamp(&args.start)?;
    let t2 = t1 + parse_timestamp(&args.duration)?;
    let out = args
        .out
        .unwrap_or_else(|| subclip_target_name(&args.in_path, t1, t2));
    extract_subclip(&args.in_path, t1, t2, &out, cfg)?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_probe(args: ProbeArgs, cfg: &MediaConfig) -> anyhow::Result<()> {
    let info = probe(&args.in_path, true, cfg)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
