//! Values that flow between the install phases.

use std::fmt;

use crate::platform::Platform;

/// Names the platform/architecture/ABI combination an artifact is needed for.
///
/// Opaque to this crate: it is only ever embedded into file names and passed
/// to the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  /// The target for the running platform, e.g. `linux-x64`.
  pub fn current() -> Option<Self> {
    Platform::current().map(|p| Self(p.triple()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Target {
  fn from(id: &str) -> Self {
    Self::new(id)
  }
}

/// A fully decompressed artifact, produced once per successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBlob {
  data: Vec<u8>,
}

impl ArtifactBlob {
  pub fn new(data: Vec<u8>) -> Self {
    Self { data }
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.data
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.data
  }
}
