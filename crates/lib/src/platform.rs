//! Host platform detection, expressed in the names artifacts are published under.

use std::fmt;

/// Operating systems an artifact can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Map a `std::env::consts::OS` value.
  pub fn from_std_name(name: &str) -> Option<Self> {
    Some(match name {
      "linux" => Self::Linux,
      "macos" => Self::MacOs,
      "windows" => Self::Windows,
      _ => return None,
    })
  }

  pub fn current() -> Option<Self> {
    Self::from_std_name(std::env::consts::OS)
  }

  /// Name used in published target identifiers.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "win32",
    }
  }

  pub fn is_windows(&self) -> bool {
    matches!(self, Self::Windows)
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// CPU architectures an artifact can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  Ia32,
  X64,
  Arm,
  Arm64,
}

impl Arch {
  /// Map a `std::env::consts::ARCH` value.
  pub fn from_std_name(name: &str) -> Option<Self> {
    Some(match name {
      "x86" => Self::Ia32,
      "x86_64" => Self::X64,
      "arm" => Self::Arm,
      "aarch64" => Self::Arm64,
      _ => return None,
    })
  }

  pub fn current() -> Option<Self> {
    Self::from_std_name(std::env::consts::ARCH)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Ia32 => "ia32",
      Self::X64 => "x64",
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// An OS/architecture pair, rendered as `<os>-<arch>` (e.g. `darwin-arm64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// `None` when either half is not one we publish artifacts for.
  pub fn current() -> Option<Self> {
    Some(Self::new(Os::current()?, Arch::current()?))
  }

  pub fn triple(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.os, self.arch)
  }
}
