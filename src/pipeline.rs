//! The build/extract pipeline
//!
//! Four strictly sequential steps: build the image, create a stopped
//! container from it, copy the artifact out, remove the container. The first
//! failing step aborts the run; later steps do not run. In particular there
//! is no teardown on a failed copy: the stopped container is left in place
//! so its filesystem can be inspected.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::BuildConfig;
use crate::engine::Engine;
use crate::output;

const TOTAL_STEPS: usize = 4;

/// Run the full pipeline in the given working directory.
///
/// `workdir` is both the image build context and the base for a relative
/// destination path.
pub fn run(engine: &Engine, config: &BuildConfig, workdir: &Path) -> Result<()> {
    config.validate()?;

    output::action(&format!(
        "Extracting {} from {}",
        config.artifact, config.image
    ));
    output::detail(&format!("engine: {}", engine.binary().display()));

    output::step(1, TOTAL_STEPS, &format!("Building image {}", config.image));
    let build_file = workdir.join(&config.build_file);
    engine.build_image(&config.image, &build_file, workdir)?;

    output::step(
        2,
        TOTAL_STEPS,
        &format!("Creating container {}", config.container),
    );
    let pb = output::spinner("creating container");
    let created = engine.create_container(&config.container, &config.image);
    output::spinner_done(pb);
    created?;

    output::step(
        3,
        TOTAL_STEPS,
        &format!("Copying {} to {}", config.artifact, config.dest.display()),
    );
    let dest = workdir.join(&config.dest);
    let pb = output::spinner("copying artifact");
    let copied = engine.copy_from(&config.container, &config.artifact, &dest);
    output::spinner_done(pb);
    if let Err(err) = copied {
        // The container survives a failed copy so the image's filesystem can
        // be examined. Say so instead of leaving a silent leftover.
        output::warning(&format!(
            "container {} was left in place for inspection; remove it with `{} rm {}`",
            config.container,
            engine.binary().display(),
            config.container
        ));
        return Err(err);
    }

    output::step(
        4,
        TOTAL_STEPS,
        &format!("Removing container {}", config.container),
    );
    let pb = output::spinner("removing container");
    let removed = engine.remove_container(&config.container);
    output::spinner_done(pb);
    removed?;

    let size = std::fs::metadata(&dest)
        .with_context(|| format!("extracted artifact missing at {}", dest.display()))?
        .len();
    output::success(&format!(
        "Extracted {} ({} bytes)",
        config.dest.display(),
        size
    ));

    Ok(())
}
