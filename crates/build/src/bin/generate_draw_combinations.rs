//! Draw combinations generator
//!
//! Writes the Metal source that precompiles the draw shaders once per feature combination, each
//! combination in its own namespace.
//!
//! # Usage
//! ```bash
//! generate_draw_combinations out/generated/draw_combinations.metal
//! generate_draw_combinations out/all_combinations.metal --manifest shaders/metal/draw_combinations.yaml --all
//! ```

use clap::Parser;
use pls_shader_build::{generate_draw_combinations, load_feature_universe};
use std::path::PathBuf;
use std::process;
use tracing::{debug, error, info};

/// Command-line arguments for the draw combinations generator
#[derive(Parser)]
#[command(version, about = "Generate the precompiled draw shader combinations")]
struct Args {
    /// Output file path
    output: PathBuf,

    /// YAML feature manifest (defaults to the built-in Metal features)
    #[arg(long, short)]
    manifest: Option<PathBuf>,

    /// Emit every valid combination instead of the minimal startup set
    #[arg(long)]
    all: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).with_target(false).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install logger: {e}");
    }

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> pls_shader_build::Result<()> {
    let universe = load_feature_universe(args.manifest.as_deref())?;
    debug!(features = universe.features().len(), width = universe.width(), "resolved feature universe");

    let variants = generate_draw_combinations(&universe, args.all, &args.output)?;
    info!("Wrote {} variants to {}", variants.len(), args.output.display());
    Ok(())
}
