//! Artifact placement inside the package tree.
//!
//! All paths are resolved against the package root. Directories outside of it
//! are never created or written to.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;
use crate::naming::Naming;
use crate::types::{ArtifactBlob, Target};

/// Errors raised while preparing directories or placing artifacts.
#[derive(Debug, Error)]
pub enum PathError {
  /// The path exists but is not readable and writable.
  #[error("do not have access to '{path}': {source}")]
  PermissionDenied {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The path would resolve outside the package root.
  #[error("refusing to use '{0}': path must stay inside the package root")]
  OutsidePackage(PathBuf),

  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to move '{from}' to '{to}': {source}")]
  Move {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// What [`PathManager::ensure_dir`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
  /// The directory was already there with read and write access.
  Existing,
  /// The directory did not exist and was created.
  Created,
}

/// Ensures output directories exist and puts artifacts at their canonical names.
#[derive(Debug, Clone)]
pub struct PathManager {
  package_root: PathBuf,
  build_dir: PathBuf,
  naming: Naming,
}

impl PathManager {
  pub fn new(settings: &Settings) -> Self {
    Self {
      package_root: settings.package_root.clone(),
      build_dir: settings.build_dir.clone(),
      naming: settings.naming.clone(),
    }
  }

  /// Absolute path of the canonical artifact for `target`.
  pub fn artifact_path(&self, target: &Target) -> PathBuf {
    self.build_path().join(self.naming.bin_file_name(target))
  }

  fn build_path(&self) -> PathBuf {
    self.package_root.join(&self.build_dir)
  }

  /// Resolve `relative` against the package root.
  ///
  /// Absolute paths and `..` components are rejected.
  pub fn resolve(&self, relative: &Path) -> Result<PathBuf, PathError> {
    let escapes = relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
      return Err(PathError::OutsidePackage(relative.to_path_buf()));
    }
    Ok(self.package_root.join(relative))
  }

  /// Make sure `relative` exists under the package root with read and write access.
  ///
  /// A missing directory is created recursively. A directory that exists
  /// without the required access is an error.
  pub async fn ensure_dir(&self, relative: &Path) -> Result<DirStatus, PathError> {
    let path = self.resolve(relative)?;

    match check_access(&path) {
      Ok(()) => {
        debug!(path = ?path, "directory accessible");
        Ok(DirStatus::Existing)
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = ?path, "creating directory");
        tokio::fs::create_dir_all(&path)
          .await
          .map_err(|source| PathError::CreateDir {
            path: path.clone(),
            source,
          })?;
        Ok(DirStatus::Created)
      }
      Err(source) => Err(PathError::PermissionDenied { path, source }),
    }
  }

  /// Rename the toolchain's output for `target` to its canonical name.
  pub async fn move_artifact(&self, target: &Target) -> Result<PathBuf, PathError> {
    let from = self.build_path().join(self.naming.build_output_name(target));
    let to = self.artifact_path(target);

    tokio::fs::rename(&from, &to).await.map_err(|source| PathError::Move {
      from: from.clone(),
      to: to.clone(),
      source,
    })?;

    info!(path = ?to, "moved built artifact");
    Ok(to)
  }

  /// Write a downloaded artifact to its canonical name, replacing any existing file.
  pub async fn save(&self, target: &Target, blob: ArtifactBlob) -> Result<PathBuf, PathError> {
    self.ensure_dir(&self.build_dir).await?;

    let path = self.artifact_path(target);
    let size = blob.len();
    tokio::fs::write(&path, blob.into_bytes())
      .await
      .map_err(|source| PathError::Write {
        path: path.clone(),
        source,
      })?;

    info!(path = ?path, size, "saved downloaded artifact");
    Ok(path)
  }
}

#[cfg(unix)]
fn check_access(path: &Path) -> io::Result<()> {
  use rustix::fs::{Access, access};

  access(path, Access::READ_OK | Access::WRITE_OK).map_err(io::Error::from)
}

#[cfg(windows)]
fn check_access(path: &Path) -> io::Result<()> {
  let metadata = std::fs::metadata(path)?;
  if metadata.permissions().readonly() {
    return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
  }
  Ok(())
}
