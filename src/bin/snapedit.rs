use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "snapedit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an image, replay an edit script and export the flattened result.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Source image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Render surface width in pixels.
    #[arg(long)]
    width: u32,

    /// Render surface height in pixels.
    #[arg(long)]
    height: u32,

    /// Output file for the exported artifact.
    #[arg(long)]
    out: PathBuf,

    /// JSON array of edit steps to replay before saving.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Font file to register for overlay text (repeatable; the first is the fallback).
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Editor configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final editor state as JSON on stdout.
    #[arg(long)]
    dump_state: bool,
}

/// One step of an edit script.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptStep {
    /// `{"pointer": {"phase": "down", "position": {"x": 1, "y": 2}}}`
    Pointer { pointer: snapedit::PointerEvent },
    /// `{"wait_ms": 40}`: advance the script clock and run any due redraw.
    Wait { wait_ms: u64 },
    /// `{"op": "set_brightness", "value": 120}` and the other edit commands.
    Edit(snapedit::EditCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
    }
}

fn read_script(path: &Path) -> anyhow::Result<Vec<ScriptStep>> {
    let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
    let steps: Vec<ScriptStep> = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse script '{}'", path.display()))?;
    Ok(steps)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(p) => snapedit::EditorConfig::from_json_file(p)?,
        None => snapedit::EditorConfig::default(),
    }
    .with_env_overrides();

    let file = snapedit::ImageFile::from_path(&args.in_path)?;
    let viewport = snapedit::Viewport::new(args.width, args.height);
    let mut session = snapedit::EditorSession::open(&file, viewport, config)
        .with_context(|| format!("open '{}'", args.in_path.display()))?;

    for font in &args.fonts {
        let bytes =
            std::fs::read(font).with_context(|| format!("read font '{}'", font.display()))?;
        let family = session.register_font(bytes)?;
        eprintln!("font: {family} ({})", font.display());
    }

    let mut now = Instant::now();
    let steps = match &args.script {
        Some(p) => read_script(p)?,
        None => Vec::new(),
    };
    for (i, step) in steps.into_iter().enumerate() {
        match step {
            ScriptStep::Pointer { pointer } => {
                session.pointer(pointer, now);
            }
            ScriptStep::Wait { wait_ms } => {
                now += Duration::from_millis(wait_ms);
                session
                    .poll_redraw(now)
                    .with_context(|| format!("redraw after step {i}"))?;
            }
            ScriptStep::Edit(cmd) => {
                let outcome = session.apply(cmd, now);
                if !outcome.is_change() {
                    eprintln!("step {i}: no change");
                }
            }
        }
    }

    let mut sink = snapedit::FileSink::new(&args.out);
    let artifact = session.save()?;
    let (media_type, len) = (artifact.media_type.clone(), artifact.bytes.len());
    snapedit::ArtifactSink::deliver(&mut sink, artifact)?;

    if args.dump_state {
        let json = serde_json::to_string_pretty(&session.snapshot())?;
        println!("{json}");
    }

    eprintln!("wrote {} ({media_type}, {len} bytes)", args.out.display());
    Ok(())
}
