//! Install configuration.
//!
//! Everything here is read once when the process starts and then handed to
//! each component by reference. Nothing mutates it afterwards.

use std::path::PathBuf;

use crate::consts::{
  DEFAULT_ARTIFACT_NAME, DEFAULT_BUILD_DIR, DEFAULT_DOWNLOAD_HOST, DEFAULT_REMOTE_PATH, DEFAULT_TOOLCHAIN,
  ENV_ARTIFACT_NAME, ENV_ARTIFACT_VERSION, ENV_DOWNLOAD_HOST, ENV_NO_BUILD, ENV_NO_DOWNLOAD, ENV_PACKAGE_ROOT,
  ENV_PROXY_HOST, ENV_TOOLCHAIN,
};
use crate::naming::Naming;

/// Which install phases are allowed to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
  /// Skip the build phase and go straight to downloading.
  pub no_build: bool,
  /// Forbid the download phase.
  pub no_download: bool,
}

impl InstallOptions {
  /// Read the phase flags from the environment.
  pub fn from_env() -> Self {
    Self {
      no_build: env_flag(ENV_NO_BUILD),
      no_download: env_flag(ENV_NO_DOWNLOAD),
    }
  }

  /// Combine with flags given on the command line. A flag set in either place wins.
  pub fn merge(self, other: InstallOptions) -> Self {
    Self {
      no_build: self.no_build || other.no_build,
      no_download: self.no_download || other.no_download,
    }
  }
}

/// Where artifacts live and where they come from.
#[derive(Debug, Clone)]
pub struct Settings {
  /// Root of the host package; every path written is relative to it.
  pub package_root: PathBuf,

  /// Build output directory, relative to `package_root`.
  pub build_dir: PathBuf,

  /// Base URL of the remote distribution host, including the trailing slash.
  pub download_host: String,

  /// Path under `download_host` where packages are published.
  pub remote_path: String,

  /// Forward proxy for downloads, if any.
  pub proxy_host: Option<String>,

  /// Native-build toolchain program.
  pub toolchain: String,

  pub naming: Naming,
}

impl Settings {
  /// Defaults rooted at `package_root`.
  pub fn new(package_root: impl Into<PathBuf>) -> Self {
    Self {
      package_root: package_root.into(),
      build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
      download_host: DEFAULT_DOWNLOAD_HOST.to_string(),
      remote_path: DEFAULT_REMOTE_PATH.to_string(),
      proxy_host: None,
      toolchain: DEFAULT_TOOLCHAIN.to_string(),
      naming: Naming::new(DEFAULT_ARTIFACT_NAME, env!("CARGO_PKG_VERSION")),
    }
  }

  /// Defaults overridden by any `PREBUILD_*` variables that are set.
  ///
  /// The package root falls back to `default_root` when `PREBUILD_PACKAGE_ROOT`
  /// is unset.
  pub fn from_env(default_root: impl Into<PathBuf>) -> Self {
    let root = env_value(ENV_PACKAGE_ROOT).map(PathBuf::from).unwrap_or_else(|| default_root.into());
    let root = dunce::canonicalize(&root).unwrap_or(root);

    let mut settings = Self::new(root);
    if let Some(host) = env_value(ENV_DOWNLOAD_HOST) {
      settings.download_host = host;
    }
    settings.proxy_host = env_value(ENV_PROXY_HOST);
    if let Some(toolchain) = env_value(ENV_TOOLCHAIN) {
      settings.toolchain = toolchain;
    }
    if let Some(name) = env_value(ENV_ARTIFACT_NAME) {
      settings.naming.name = name;
    }
    if let Some(version) = env_value(ENV_ARTIFACT_VERSION) {
      settings.naming.version = version;
    }
    settings
  }

  /// Absolute build output directory.
  pub fn build_path(&self) -> PathBuf {
    self.package_root.join(&self.build_dir)
  }
}

/// Non-empty value of an environment variable.
fn env_value(key: &str) -> Option<String> {
  std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// An environment flag counts as set whenever it holds any non-empty value.
fn env_flag(key: &str) -> bool {
  env_value(key).is_some()
}
