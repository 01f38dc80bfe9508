//! Containerized cross-build runner
//!
//! hoist drives a local container engine (docker or podman) through a
//! four-step pipeline: build an image from a build-definition file, create a
//! stopped container from it, copy the single compiled artifact out of the
//! container filesystem, and remove the container. The container is never
//! started; it exists only as a disposable filesystem to extract one file
//! from.
//!
//! Parameters default to compiled-in constants so `hoist` runs with no
//! arguments; an optional `Hoist.toml` manifest and CLI flags override them.
//!
//! Failure semantics are deliberately simple: the first failing step aborts
//! the run. A failed copy leaves the container in place for inspection.

pub mod cmd;
pub mod config;
pub mod engine;
pub mod output;
pub mod pipeline;

pub use config::{BuildConfig, Manifest};
pub use engine::Engine;
