//! Local compilation through the external native-build toolchain.
//!
//! A build is a short sequence of toolchain invocations (`clean`, `configure`,
//! `build`) run in the package root. The toolchain is a black box: only its
//! exit status is interpreted.

pub mod toolchain;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Settings;
use crate::consts::LEGACY_TARGET_FLAG;
use crate::platform::Os;
use crate::types::Target;

pub use toolchain::{Toolchain, needs_legacy_target_syntax};

/// Errors raised by the build phase.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The toolchain could not be started at all.
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// A toolchain step exited unsuccessfully.
  #[error("{program} {step} failed with exit code {code:?}")]
  CmdFailed {
    program: String,
    step: BuildStep,
    code: Option<i32>,
  },
}

/// One toolchain sub-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
  Clean,
  Configure,
  Build,
}

impl BuildStep {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Clean => "clean",
      Self::Configure => "configure",
      Self::Build => "build",
    }
  }
}

impl fmt::Display for BuildStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Ordered toolchain steps plus the parallelism for the compile step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommandSet {
  pub steps: Vec<BuildStep>,
  pub jobs: usize,
}

impl BuildCommandSet {
  /// `clean` only runs on a rebuild.
  pub fn new(rebuild: bool, jobs: usize) -> Self {
    let steps = if rebuild {
      vec![BuildStep::Clean, BuildStep::Configure, BuildStep::Build]
    } else {
      vec![BuildStep::Configure, BuildStep::Build]
    };
    Self { steps, jobs }
  }

  /// Arguments for a single step. `target_arg` is only used by `build`.
  pub fn args(&self, step: BuildStep, target_arg: &str) -> Vec<String> {
    match step {
      BuildStep::Clean | BuildStep::Configure => vec![step.to_string()],
      BuildStep::Build => vec![
        step.to_string(),
        "-j".to_string(),
        self.jobs.to_string(),
        target_arg.to_string(),
      ],
    }
  }
}

/// Half the CPUs, rounded, and never less than one.
pub fn job_count(cpus: usize) -> usize {
  cpus.div_ceil(2).max(1)
}

fn available_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(1)
}

/// Runs the toolchain for a target.
#[derive(Debug, Clone)]
pub struct Builder {
  toolchain: Toolchain,
  package_root: PathBuf,
  os: Option<Os>,
  jobs: usize,
}

impl Builder {
  pub fn new(settings: &Settings) -> Self {
    Self {
      toolchain: Toolchain::new(settings.toolchain.clone()),
      package_root: settings.package_root.clone(),
      os: Os::current(),
      jobs: job_count(available_cpus()),
    }
  }

  /// Pretend to run on `os`. Only affects target argument formatting.
  pub fn with_os(mut self, os: Os) -> Self {
    self.os = Some(os);
    self
  }

  pub fn jobs(&self) -> usize {
    self.jobs
  }

  /// Compile `target`, running `clean` first when `rebuild` is set.
  ///
  /// Stops at the first step that fails; later steps are not attempted.
  pub async fn build(&self, target: &Target, rebuild: bool) -> Result<(), BuildError> {
    let commands = BuildCommandSet::new(rebuild, self.jobs);
    let target_arg = self.target_arg(target).await;

    info!(target = %target, rebuild, jobs = commands.jobs, "building from source");

    for step in &commands.steps {
      self.run(*step, commands.args(*step, &target_arg)).await?;
    }

    info!(target = %target, "build finished");
    Ok(())
  }

  async fn target_arg(&self, target: &Target) -> String {
    let Some(os) = self.os.filter(Os::is_windows) else {
      return target.to_string();
    };

    let version = self.toolchain.version().await;
    if needs_legacy_target_syntax(os, version.as_ref()) {
      format!("{}{}", LEGACY_TARGET_FLAG, target)
    } else {
      target.to_string()
    }
  }

  async fn run(&self, step: BuildStep, args: Vec<String>) -> Result<(), BuildError> {
    let program = &self.toolchain.program;
    debug!(program = %program, args = ?args, cwd = ?self.package_root, "running toolchain");

    let output = Command::new(program)
      .args(&args)
      .current_dir(&self.package_root)
      .output()
      .await
      .map_err(|source| BuildError::Spawn {
        program: program.clone(),
        source,
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "toolchain stderr");
      }
      if !stdout.is_empty() {
        debug!(stdout = %stdout, "toolchain stdout");
      }

      return Err(BuildError::CmdFailed {
        program: program.clone(),
        step,
        code: output.status.code(),
      });
    }

    Ok(())
  }
}
