//! GLSL minifier
//!
//! Minifies a batch of shader files with identifiers renamed consistently across all of them, and
//! writes three artifacts per input into the output directory.
//!
//! # Usage
//! ```bash
//! minify -o out/generated/shaders common.glsl draw_path.vert draw_path.frag
//! ```

use clap::Parser;
use pls_shader_build::{MinifyOptions, UnknownCharPolicy, batch::ShaderBatch};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

/// Command-line arguments for the minifier
#[derive(Parser)]
#[command(version, about = "Minify GLSL shaders and export them as C++ headers")]
struct Args {
    /// Shader files to minify as one batch
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory
    #[arg(long, short)]
    outdir: PathBuf,

    /// Don't rename identifiers or strip whitespace and comments
    #[arg(long, short = 'H')]
    human_readable: bool,

    /// Fail on characters the lexer does not recognize instead of copying them through
    #[arg(long)]
    strict: bool,

    /// Also write the rename table as JSON to this path
    #[arg(long)]
    rename_map: Option<PathBuf>,

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

    let options = MinifyOptions {
        human_readable: args.human_readable,
        unknown_chars: if args.strict { UnknownCharPolicy::Reject } else { UnknownCharPolicy::PassThrough },
        ..MinifyOptions::default()
    };

    if let Err(e) = run(&args, options) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args, options: MinifyOptions) -> pls_shader_build::Result<()> {
    let mut batch = ShaderBatch::new(options);
    for file in &args.files {
        batch.add_file(file)?;
    }

    let minified = batch.finish()?;
    let written = minified.write_to(&args.outdir)?;
    info!("Wrote {} files for {} shaders ({} identifiers)", written.len(), minified.artifacts().len(), minified.names().len());

    if let Some(path) = &args.rename_map {
        minified.write_rename_map(path)?;
        info!("Rename map written to {}", path.display());
    }

    Ok(())
}
