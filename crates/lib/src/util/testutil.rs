//! Test utilities for prebuild-lib.
//!
//! Helpers for producing gzip payloads and standing in for the native-build
//! toolchain with a small shell script.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Gzip `data` the way the distribution host serves packages.
pub fn gzip(data: &[u8]) -> Vec<u8> {
  let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
  encoder.write_all(data).unwrap();
  encoder.finish().unwrap()
}

/// Deterministic, poorly compressible test content.
pub fn sample_bytes(len: usize) -> Vec<u8> {
  let mut state: u32 = 0x2545_f491;
  (0..len)
    .map(|_| {
      state ^= state << 13;
      state ^= state >> 17;
      state ^= state << 5;
      (state & 0xff) as u8
    })
    .collect()
}

/// A scripted toolchain and the file it appends its arguments to.
pub struct FakeToolchain {
  pub program: String,
  pub log: PathBuf,
}

/// Write a toolchain script into `dir`.
///
/// Each invocation appends its arguments as one line to the log. The `build`
/// step writes `build/Release/<target>.node` relative to the working
/// directory. When `fail_step` is given, that step exits with status 3.
#[cfg(unix)]
pub fn fake_toolchain(dir: &Path, fail_step: Option<&str>) -> FakeToolchain {
  use std::os::unix::fs::PermissionsExt;

  let bin_dir = dir.join("bin");
  std::fs::create_dir_all(&bin_dir).unwrap();
  let log = dir.join("calls.log");
  let script = bin_dir.join("toolchain");

  let content = format!(
    r#"#!/bin/sh
echo "$*" >> "{log}"
if [ "$1" = "{fail}" ]; then
  exit 3
fi
if [ "$1" = "build" ]; then
  mkdir -p build/Release && printf 'compiled' > "build/Release/$4.node"
fi
exit 0
"#,
    log = log.display(),
    fail = fail_step.unwrap_or("__never__"),
  );
  std::fs::write(&script, content).unwrap();
  std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

  FakeToolchain {
    program: script.to_string_lossy().to_string(),
    log,
  }
}
