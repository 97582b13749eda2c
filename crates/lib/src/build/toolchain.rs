//! Native-build toolchain probing.

use semver::Version;
use tokio::process::Command;
use tracing::debug;

use crate::consts::LEGACY_TARGET_SYNTAX_BELOW;
use crate::platform::Os;

/// The external program that compiles the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  pub program: String,
}

impl Toolchain {
  pub fn new(program: impl Into<String>) -> Self {
    Self { program: program.into() }
  }

  /// Ask the toolchain for its version.
  ///
  /// Returns `None` when the program cannot be run or prints something that
  /// is not a version.
  pub async fn version(&self) -> Option<Version> {
    let output = Command::new(&self.program).arg("--version").output().await.ok()?;
    if !output.status.success() {
      debug!(program = %self.program, code = ?output.status.code(), "toolchain version probe failed");
      return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = parse_version(&stdout);
    debug!(program = %self.program, version = ?version, "detected toolchain version");
    version
  }
}

/// Parse `v3.6.2`, `3.6.2` or `3.6.2\n` into a version.
pub fn parse_version(raw: &str) -> Option<Version> {
  let trimmed = raw.trim();
  let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
  Version::parse(trimmed).ok()
}

/// Whether the build target must be passed behind the legacy flag token.
///
/// Older toolchains on Windows took the target through a `/t:` switch instead
/// of as a bare argument. An unknown version counts as `0.0.0`.
pub fn needs_legacy_target_syntax(os: Os, version: Option<&Version>) -> bool {
  if !os.is_windows() {
    return false;
  }

  match version {
    Some(version) => *version < LEGACY_TARGET_SYNTAX_BELOW,
    None => true,
  }
}
