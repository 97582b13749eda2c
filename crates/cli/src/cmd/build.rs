//! Implementation of the `prebuild build` and `prebuild rebuild` commands.

use std::time::Instant;

use anyhow::{Context, Result};

use prebuild_lib::build::Builder;
use prebuild_lib::paths::PathManager;
use prebuild_lib::{Settings, Target};

use crate::output::{format_duration, print_info, print_stat, print_success};

/// Compile `target` and move the result to its canonical name.
///
/// With `rebuild`, the toolchain's `clean` step runs first.
pub fn cmd_build(settings: &Settings, target: &Target, rebuild: bool) -> Result<()> {
  let start = Instant::now();
  let command = if rebuild { "rebuild" } else { "build" };
  print_info(&format!("Starting {} of {}", command, target));

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let path = rt.block_on(async {
    Builder::new(settings).build(target, rebuild).await?;
    let path = PathManager::new(settings).move_artifact(target).await?;
    Ok::<_, anyhow::Error>(path)
  })?;

  print_success(&format!(
    "Finished {} of {} in {}",
    command,
    target,
    format_duration(start.elapsed())
  ));
  print_stat("Artifact", &path.display().to_string());

  Ok(())
}
