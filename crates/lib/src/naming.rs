//! Target-to-filename convention.
//!
//! Three names exist per target:
//! - the file the toolchain writes (`<target>.node`)
//! - the canonical installed file (`<name>-<version>-<target>.node`)
//! - the compressed package on the distribution host (canonical name + `.gz`)

use crate::consts::{ARTIFACT_EXTENSION, PACKAGE_EXTENSION};
use crate::types::Target;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
  pub name: String,
  pub version: String,
}

impl Naming {
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
    }
  }

  /// Canonical file name of the installed artifact.
  pub fn bin_file_name(&self, target: &Target) -> String {
    format!("{}-{}-{}.{}", self.name, self.version, target, ARTIFACT_EXTENSION)
  }

  /// File name of the compressed package on the distribution host.
  pub fn package_file_name(&self, target: &Target) -> String {
    format!("{}.{}", self.bin_file_name(target), PACKAGE_EXTENSION)
  }

  /// Fixed name the toolchain gives a freshly built artifact.
  pub fn build_output_name(&self, target: &Target) -> String {
    format!("{}.{}", target, ARTIFACT_EXTENSION)
  }
}
