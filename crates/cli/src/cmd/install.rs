//! Implementation of the `prebuild install` command.
//!
//! Builds the artifact from source and, when that does not work out,
//! downloads a prebuilt one.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use prebuild_lib::{InstallOptions, Installer, Settings, Target};

use crate::output::{format_bytes, format_duration, print_info, print_stat, print_success, print_warning};

/// Execute the install command.
///
/// # Arguments
///
/// * `settings` - Paths, hosts and toolchain resolved at startup
/// * `target` - The target to install an artifact for
/// * `flags` - `--no-build` / `--no-download` as given on the command line;
///   merged with the matching environment flags
/// * `verbose` - Also list the errors recovered from before a failure
pub fn cmd_install(settings: &Settings, target: &Target, flags: InstallOptions, verbose: bool) -> Result<()> {
  let start = Instant::now();
  let options = InstallOptions::from_env().merge(flags);
  debug!(
    root = %settings.package_root.display(),
    no_build = options.no_build,
    no_download = options.no_download,
    "install options resolved"
  );
  print_info(&format!("Starting install of {}", target));

  let installer = Installer::new(settings, options);
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

  match rt.block_on(installer.install(target)) {
    Ok(installed) => {
      print_success(&format!(
        "Installed {} ({}) in {}",
        target,
        installed.strategy,
        format_duration(start.elapsed())
      ));
      print_stat("Artifact", &installed.path.display().to_string());
      if let Ok(metadata) = std::fs::metadata(&installed.path) {
        print_stat("Size", &format_bytes(metadata.len()));
      }
      Ok(())
    }
    Err(failure) => {
      if verbose {
        for recovered in failure.trail.iter() {
          print_warning(&format!("Recovered from: {}", recovered));
        }
      }
      Err(failure.into())
    }
  }
}
