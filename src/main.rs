mod app;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use signal_graph::{ExecutionMode, GraphView, HighlightStyle, Surface, Viewport};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::app::LaunchOptions;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SurfaceArg {
    Corpus,
    Insight,
    Dashboard,
}

impl From<SurfaceArg> for Surface {
    fn from(value: SurfaceArg) -> Self {
        match value {
            SurfaceArg::Corpus => Surface::CorpusMap,
            SurfaceArg::Insight => Surface::InsightGraph,
            SurfaceArg::Dashboard => Surface::DashboardGraph,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Snapshot JSON; a generated briefing is shown when omitted.
    snapshot: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "insight")]
    surface: SurfaceArg,

    /// JSON object overriding individual simulation constants.
    #[arg(long)]
    tuning: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Run a batch layout and print the render frame as JSON.
    #[arg(long)]
    headless: bool,

    #[arg(long, default_value_t = 1200.0)]
    width: f32,

    #[arg(long, default_value_t = 800.0)]
    height: f32,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn launch_options(args: &Args) -> anyhow::Result<LaunchOptions> {
    let tuning = args
        .tuning
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read tuning overrides {}", path.display()))
        })
        .transpose()?;

    let options = LaunchOptions {
        snapshot_path: args.snapshot.clone(),
        surface: args.surface.into(),
        tuning,
        seed: args.seed,
    };
    options
        .config_for(options.surface)
        .context("invalid simulation tuning")?;
    Ok(options)
}

fn run_headless(options: &LaunchOptions, width: f32, height: f32) -> anyhow::Result<()> {
    let snapshot = options
        .load_snapshot()
        .context("failed to load graph snapshot")?;

    let mut config = options.config_for(options.surface)?;
    config.mode = ExecutionMode::Batch;
    let mut view = GraphView::new(config, HighlightStyle::default())?;
    view.set_viewport(Viewport::new(width, height)?)?;
    view.load(&snapshot)?;

    let Some(frame) = view.frame() else {
        bail!("viewport {width}x{height} is empty, nothing was laid out");
    };
    info!(
        nodes = frame.nodes.len(),
        edges = frame.edges.len(),
        ticks = frame.tick,
        "headless layout finished"
    );
    println!("{}", frame.to_json_pretty()?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let options = launch_options(&args)?;

    if args.headless {
        return run_headless(&options, args.width, args.height);
    }

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "signal-graph",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::SignalGraphApp::new(cc, options)))),
    )
    .map_err(|error| anyhow::anyhow!("viewer failed: {error}"))
}
