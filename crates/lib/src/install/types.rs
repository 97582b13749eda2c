//! Types for the install state machine.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::build::BuildError;
use crate::download::DownloadError;
use crate::paths::PathError;

/// Errors an install can run into, across all phases.
#[derive(Debug, Error)]
pub enum InstallError {
  /// Compiling locally failed. Recovered by downloading.
  #[error("build failed: {0}")]
  Build(#[from] BuildError),

  /// The compiled artifact could not be renamed. Recovered by downloading.
  #[error("failed to move built artifact: {0}")]
  Move(#[source] PathError),

  #[error(transparent)]
  Download(#[from] DownloadError),

  #[error("failed to save downloaded artifact: {0}")]
  Save(#[source] PathError),

  /// The build did not produce an artifact and downloads are switched off.
  #[error("downloading is disabled")]
  DownloadDisabled,
}

/// How the artifact ended up on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  Built,
  Downloaded,
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Strategy::Built => f.write_str("built from source"),
      Strategy::Downloaded => f.write_str("downloaded"),
    }
  }
}

/// A successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
  pub strategy: Strategy,
  /// Canonical location of the artifact.
  pub path: PathBuf,
}

/// Errors recovered from on the way to the final outcome, oldest first.
#[derive(Debug, Default)]
pub struct ErrorTrail(Vec<InstallError>);

impl ErrorTrail {
  pub fn record(&mut self, error: InstallError) {
    self.0.push(error);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &InstallError> {
    self.0.iter()
  }
}

/// A failed install: the error that ended it plus everything recovered from before.
#[derive(Debug)]
pub struct InstallFailure {
  pub error: InstallError,
  pub trail: ErrorTrail,
}

impl fmt::Display for InstallFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.error, f)
  }
}

impl std::error::Error for InstallFailure {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    std::error::Error::source(&self.error)
  }
}
