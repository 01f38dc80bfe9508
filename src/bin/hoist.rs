//! hoist CLI - build a container image and extract the compiled artifact
//!
//! Usage:
//!   hoist                          Run the pipeline with builtin defaults
//!   hoist --image app:cross ...    Override individual parameters
//!
//! Parameters resolve as: CLI flag > Hoist.toml > builtin default, so a bare
//! invocation reproduces the original build script exactly.

use anyhow::{Context, Result};
use clap::Parser;
use hoist::config::Overrides;
use hoist::{BuildConfig, Engine, Manifest, output, pipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hoist")]
#[command(about = "Build a container image and extract the compiled artifact")]
#[command(version)]
struct Cli {
    /// Image tag to build
    #[arg(long, env = "HOIST_IMAGE")]
    image: Option<String>,

    /// Name for the throwaway container
    #[arg(long, env = "HOIST_CONTAINER")]
    container: Option<String>,

    /// Build-definition file
    #[arg(short = 'f', long, env = "HOIST_BUILD_FILE")]
    build_file: Option<PathBuf>,

    /// Artifact path inside the container
    #[arg(long, env = "HOIST_ARTIFACT")]
    artifact: Option<String>,

    /// Destination path on the host
    #[arg(short = 'o', long, env = "HOIST_DEST")]
    dest: Option<PathBuf>,

    /// Container engine binary (skips PATH discovery)
    #[arg(long, env = "HOIST_ENGINE")]
    engine: Option<PathBuf>,

    /// Working directory (build context)
    #[arg(short = 'C', long)]
    workdir: Option<PathBuf>,

    /// Echo each engine command line before running it
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let workdir = match cli.workdir {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to resolve working directory")?,
    };

    let mut config = BuildConfig::default();
    if let Some(manifest) = Manifest::load_from_dir(&workdir)? {
        output::info(&format!(
            "using {}",
            workdir.join(hoist::config::MANIFEST_NAME).display()
        ));
        config = config.with_manifest(manifest);
    }

    config = config.with_overrides(Overrides {
        image: cli.image,
        container: cli.container,
        build_file: cli.build_file,
        artifact: cli.artifact,
        dest: cli.dest,
    });

    let engine = match cli.engine {
        Some(bin) => Engine::with_binary(bin),
        None => Engine::detect()?,
    }
    .verbose(cli.verbose);

    if let Err(err) = pipeline::run(&engine, &config, &workdir) {
        output::error(&format!("{:#}", err));
        std::process::exit(1);
    }

    Ok(())
}
