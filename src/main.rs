use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use thyro_scinti::console::ConsoleSink;
use thyro_scinti::render::{PngSink, RenderStyle};
use thyro_scinti::{generate, Pathology, Scene, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "thyro-scinti", version, about = "Simulated thyroid scintigraphy emissions")]
struct Cli {
    #[command(flatten)]
    sim: SimArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the final frame, or every frame, as PNG.
    Render(RenderArgs),
    /// Animate the emissions in the terminal.
    Play(PlayArgs),
    /// Write the scene (points and organ outline) as JSON.
    Export(ExportArgs),
}

/// Overrides applied on top of the config file.
#[derive(Args, Debug)]
struct SimArgs {
    /// JSON config file; missing fields use defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// normal, hot-nodule, cold-nodule, diffuse-goiter, patchy-autoimmune.
    #[arg(long, global = true)]
    pathology: Option<String>,

    /// Canvas size in pixels.
    #[arg(long, global = true)]
    size: Option<u32>,

    /// Base emission count (multiplied internally).
    #[arg(long, global = true)]
    count: Option<usize>,

    /// Animation steps.
    #[arg(long, global = true)]
    steps: Option<usize>,

    /// Seed for point sampling.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Seed for the patchy uptake layout.
    #[arg(long, global = true)]
    patch_seed: Option<u64>,

    /// Draw the final frame only.
    #[arg(long, global = true, default_value_t = false)]
    no_animate: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Write one PNG per animation frame.
    #[arg(long, default_value_t = false)]
    frames: bool,
}

#[derive(Args, Debug)]
struct PlayArgs {
    #[arg(long, default_value_t = 72)]
    cols: usize,

    #[arg(long, default_value_t = 28)]
    rows: usize,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,
}

impl SimArgs {
    fn resolve(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_path(path)
                .with_context(|| format!("load config '{}'", path.display()))?,
            None => SimulationConfig::default(),
        };
        if let Some(label) = &self.pathology {
            config.pathology = Pathology::from_label(label);
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(count) = self.count {
            config.base_count = count;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(seed) = self.seed {
            config.sample_seed = seed;
        }
        if let Some(seed) = self.patch_seed {
            config.patch_seed = seed;
        }
        if self.no_animate {
            config.animate = false;
        }
        Ok(config.clamped())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.sim.resolve()?;
    let scene = generate(&config).context("generate emissions")?;

    match cli.cmd {
        Command::Render(args) => cmd_render(&config, &scene, args),
        Command::Play(args) => cmd_play(&config, &scene, args),
        Command::Export(args) => cmd_export(&scene, args),
    }
}

fn cmd_render(config: &SimulationConfig, scene: &Scene, args: RenderArgs) -> anyhow::Result<()> {
    let mut sink = PngSink::new(scene, RenderStyle::from_config(config), &args.out, args.frames)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    // files are written as fast as they render
    let mut sequencer = config.sequencer();
    sequencer.delay = std::time::Duration::ZERO;
    sequencer.play(&scene.points, &mut sink)?;
    for path in sink.written() {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_play(config: &SimulationConfig, scene: &Scene, args: PlayArgs) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut sink = ConsoleSink::new(scene, stdout.lock(), args.cols, args.rows);
    config.sequencer().play(&scene.points, &mut sink)?;
    Ok(())
}

fn cmd_export(scene: &Scene, args: ExportArgs) -> anyhow::Result<()> {
    if let Some(parent) = args.out.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let json = serde_json::json!({
        "pathology": scene.pathology,
        "label": scene.pathology.label(),
        "canvas_size": scene.canvas_size,
        "outline": scene.outline(),
        "points": scene.points,
    });
    fs::write(&args.out, serde_json::to_string_pretty(&json)?)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
