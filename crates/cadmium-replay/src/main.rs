//! cadmium-replay - replay CADmium / Fusion360-ds JSON into solid bodies
//!
//! Reads a JSON file (given on the command line or picked in a dialog),
//! builds every part with the CAD kernel and optionally writes the bodies
//! to STL and the feature history to RON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use cadmium_cad::{CadKernel, MockKernel};
use cadmium_core::{
    CadmiumDocument, LengthUnit, ReplayConfig, ReplayReport, Replayer, save_history, write_stl,
};
use clap::Parser;

mod dialogs;

#[derive(Parser, Debug)]
#[command(name = "cadmium-replay", version)]
#[command(about = "Replay CADmium / Fusion360-ds JSON parts into solid bodies", long_about = None)]
struct Cli {
    /// JSON file to replay (opens a file dialog when omitted)
    input: Option<PathBuf>,

    /// Unit of the JSON coordinates: m, cm, mm or in (overrides the config file)
    #[arg(short, long)]
    units: Option<LengthUnit>,

    /// RON file with replay settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write all bodies to this STL file
    #[arg(long)]
    stl: Option<PathBuf>,

    /// Unit written to the STL file
    #[arg(long, default_value = "mm")]
    stl_units: LengthUnit,

    /// Save the feature history to this RON file
    #[arg(long)]
    history: Option<PathBuf>,

    /// Replay against the recording mock kernel instead of building geometry
    #[arg(long)]
    dry_run: bool,

    /// Never open dialogs
    #[arg(long)]
    no_dialog: bool,

    /// Print the report as JSON instead of the summary text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadmium_replay=info,cadmium_core=info,cadmium_cad=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let use_dialogs = dialogs::available() && !cli.no_dialog;

    let (input, from_dialog) = match &cli.input {
        Some(path) => (path.clone(), false),
        None if use_dialogs => match dialogs::pick_json() {
            Some(path) => (path, true),
            None => {
                tracing::info!("No file selected");
                return ExitCode::SUCCESS;
            }
        },
        None => {
            eprintln!("No input file given");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &input) {
        Ok(report) => {
            let summary = report.summary();
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{text}"),
                    Err(e) => tracing::error!("Could not serialize report: {}", e),
                }
            } else {
                println!("{summary}");
            }
            if from_dialog {
                dialogs::info(&summary);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let message = format!("Failed:\n{e:?}");
            eprintln!("{message}");
            if from_dialog {
                dialogs::error(&message);
            }
            ExitCode::FAILURE
        }
    }
}

/// Load settings and the document, replay it and write the requested outputs
fn run(cli: &Cli, input: &Path) -> Result<ReplayReport> {
    let config = load_config(cli)?;
    let doc = CadmiumDocument::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let kernel: Box<dyn CadKernel> = if cli.dry_run {
        Box::new(MockKernel::new())
    } else {
        cadmium_cad::default_kernel()
    };
    tracing::info!(
        "Replaying {} parts from {} ({} kernel, {})",
        doc.part_count(),
        input.display(),
        kernel.name(),
        config.units.name()
    );

    let tolerance = config.tessellation_tolerance;
    let mut replayer = Replayer::new(kernel.as_ref(), config);
    let report = replayer.replay(&doc)?;
    let mut history = replayer.into_history();

    if let Some(path) = &cli.stl {
        let stats = write_stl(kernel.as_ref(), &mut history, path, tolerance, cli.stl_units)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        for name in &stats.skipped {
            tracing::warn!("Body {} has no mesh and was left out of the STL", name);
        }
    }

    if let Some(path) = &cli.history {
        save_history(&history, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(
            "Saved feature history ({} features, {} sketches) to {}",
            history.len(),
            history.sketches().len(),
            path.display()
        );
    }

    Ok(report)
}

/// Config file values with command-line overrides applied
fn load_config(cli: &Cli) -> Result<ReplayConfig> {
    let mut config = match &cli.config {
        Some(path) => ReplayConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ReplayConfig::default(),
    };
    if let Some(units) = cli.units {
        config.units = units;
    }
    Ok(config)
}
