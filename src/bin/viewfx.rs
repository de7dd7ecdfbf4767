use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "viewfx", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a configured session until the input ends.
    Run(RunArgs),
    /// Process one frame and write it as an image.
    Frame(FrameArgs),
    /// List registered step types.
    Steps,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Application config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Stop after this many frames (overrides the config's max_frames for streams).
    #[arg(long)]
    max_frames: Option<u64>,

    /// Record final frames to an MP4 (requires `ffmpeg` on PATH).
    #[arg(long)]
    record: Option<PathBuf>,

    /// Write the loaded pipeline back out as JSON after the run.
    #[arg(long)]
    dump_pipeline: Option<PathBuf>,

    /// Write a screenshot of the first final frame.
    #[arg(long)]
    screenshot: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Application config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Output image path; the format follows the extension.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Steps => cmd_steps(),
    }
}

fn open_session(config: &std::path::Path) -> anyhow::Result<viewfx::Session> {
    let cfg = viewfx::AppConfig::load(config)
        .with_context(|| format!("load config '{}'", config.display()))?;
    let registry = viewfx::StepRegistry::with_builtin_steps();
    let session = viewfx::Session::from_config(&cfg, &registry).context("start session")?;
    Ok(session)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut session = open_session(&args.config)?;
    if let Some(path) = &args.record {
        session.record_to(path);
    }
    if args.screenshot {
        session.request_screenshot();
    }

    let limit = args.max_frames.or(session.global().max_frames);
    session.run(limit).context("run session")?;
    let frames = session.frame_index().0;

    if let Some(path) = &args.dump_pipeline {
        session
            .pipeline()
            .save_decls(path)
            .with_context(|| format!("write pipeline '{}'", path.display()))?;
    }

    if let Some(video) = session.finish().context("finish session")? {
        eprintln!("wrote {}", video.display());
    }
    eprintln!("processed {frames} frames");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut session = open_session(&args.config)?;
    let frame = session
        .step_frame()
        .context("process frame")?
        .context("input produced no frames")?;
    viewfx::write_frame(&args.out, &frame)
        .with_context(|| format!("write image '{}'", args.out.display()))?;
    session.finish().context("finish session")?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_steps() -> anyhow::Result<()> {
    let registry = viewfx::StepRegistry::with_builtin_steps();
    for name in registry.names() {
        println!("{name}");
    }
    Ok(())
}
