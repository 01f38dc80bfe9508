//! Container engine wrapper
//!
//! Locates the local container engine binary and exposes the four
//! operations the pipeline needs: build, create, cp, rm. Each operation is
//! one engine subcommand; the engine's CLI is the only interface used, so
//! docker and podman are interchangeable here.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cmd::Cmd;

/// Engine binaries probed in order by [`Engine::detect`].
const ENGINE_CANDIDATES: &[&str] = &["docker", "podman"];

/// Handle to the local container engine.
#[derive(Debug, Clone)]
pub struct Engine {
    bin: PathBuf,
    verbose: bool,
}

impl Engine {
    /// Locate a container engine on PATH, preferring docker.
    pub fn detect() -> Result<Self> {
        for candidate in ENGINE_CANDIDATES {
            if let Ok(bin) = which::which(candidate) {
                return Ok(Self {
                    bin,
                    verbose: false,
                });
            }
        }
        anyhow::bail!(
            "no container engine found on PATH (looked for {})",
            ENGINE_CANDIDATES.join(", ")
        )
    }

    /// Use an explicit engine binary instead of probing PATH.
    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            verbose: false,
        }
    }

    /// Echo each engine command line before running it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Path of the engine binary in use.
    pub fn binary(&self) -> &Path {
        &self.bin
    }

    fn cmd(&self, args: Vec<String>) -> Cmd {
        Cmd::new(&self.bin).args(args).verbose(self.verbose)
    }

    /// Build an image from a build-definition file.
    ///
    /// The engine's own build output streams to the terminal; builds are long
    /// and their progress is the interesting part.
    pub fn build_image(&self, image: &str, build_file: &Path, context_dir: &Path) -> Result<()> {
        self.cmd(build_args(image, build_file, context_dir))
            .run()
            .context("image build failed")
    }

    /// Create a stopped container from an image.
    ///
    /// The container's default process is never started; the container only
    /// exists so its filesystem can be read.
    pub fn create_container(&self, container: &str, image: &str) -> Result<()> {
        self.cmd(create_args(container, image))
            .run_quiet()
            .map(|_| ())
            .with_context(|| format!("failed to create container {}", container))
    }

    /// Copy a file out of a container's filesystem to the host.
    pub fn copy_from(&self, container: &str, artifact: &str, dest: &Path) -> Result<()> {
        self.cmd(cp_args(container, artifact, dest))
            .run_quiet()
            .map(|_| ())
            .with_context(|| format!("failed to copy {}:{}", container, artifact))
    }

    /// Remove a container and its writable layer.
    pub fn remove_container(&self, container: &str) -> Result<()> {
        self.cmd(rm_args(container))
            .run_quiet()
            .map(|_| ())
            .with_context(|| format!("failed to remove container {}", container))
    }
}

fn build_args(image: &str, build_file: &Path, context_dir: &Path) -> Vec<String> {
    vec![
        "build".to_string(),
        "-t".to_string(),
        image.to_string(),
        "-f".to_string(),
        build_file.display().to_string(),
        context_dir.display().to_string(),
    ]
}

fn create_args(container: &str, image: &str) -> Vec<String> {
    vec![
        "create".to_string(),
        "--name".to_string(),
        container.to_string(),
        image.to_string(),
    ]
}

fn cp_args(container: &str, artifact: &str, dest: &Path) -> Vec<String> {
    vec![
        "cp".to_string(),
        format!("{}:{}", container, artifact),
        dest.display().to_string(),
    ]
}

fn rm_args(container: &str) -> Vec<String> {
    vec!["rm".to_string(), container.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let args = build_args(
            "get-system-info:build",
            Path::new("Dockerfile.build"),
            Path::new("."),
        );
        assert_eq!(
            args,
            vec!["build", "-t", "get-system-info:build", "-f", "Dockerfile.build", "."]
        );
    }

    #[test]
    fn test_create_args() {
        let args = create_args("get-system-info-extract", "get-system-info:build");
        assert_eq!(
            args,
            vec!["create", "--name", "get-system-info-extract", "get-system-info:build"]
        );
    }

    #[test]
    fn test_cp_args_joins_container_and_path() {
        let args = cp_args(
            "get-system-info-extract",
            "/app/target/release/get-system-info",
            Path::new("./get-system-info"),
        );
        assert_eq!(
            args,
            vec![
                "cp",
                "get-system-info-extract:/app/target/release/get-system-info",
                "./get-system-info"
            ]
        );
    }

    #[test]
    fn test_rm_args() {
        assert_eq!(rm_args("extract"), vec!["rm", "extract"]);
    }

    #[test]
    fn test_with_binary_keeps_path() {
        let engine = Engine::with_binary("/usr/bin/podman");
        assert_eq!(engine.binary(), Path::new("/usr/bin/podman"));
    }
}
