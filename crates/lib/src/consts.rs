//! Fixed names and defaults shared across the crate.

use semver::Version;

pub const APP_NAME: &str = "prebuild";

/// Environment variable overriding the remote distribution host.
pub const ENV_DOWNLOAD_HOST: &str = "PREBUILD_DOWNLOAD_HOST";
/// Environment variable naming a forward proxy for downloads.
pub const ENV_PROXY_HOST: &str = "PREBUILD_PROXY_HOST";
/// Environment flag forcing the build phase to be skipped.
pub const ENV_NO_BUILD: &str = "PREBUILD_NO_BUILD";
/// Environment flag forbidding the download phase.
pub const ENV_NO_DOWNLOAD: &str = "PREBUILD_NO_DOWNLOAD";
/// Environment variable overriding the package root.
pub const ENV_PACKAGE_ROOT: &str = "PREBUILD_PACKAGE_ROOT";
/// Environment variable overriding the native-build toolchain program.
pub const ENV_TOOLCHAIN: &str = "PREBUILD_TOOLCHAIN";
/// Environment variable overriding the artifact base name.
pub const ENV_ARTIFACT_NAME: &str = "PREBUILD_ARTIFACT_NAME";
/// Environment variable overriding the artifact version.
pub const ENV_ARTIFACT_VERSION: &str = "PREBUILD_ARTIFACT_VERSION";

pub const DEFAULT_DOWNLOAD_HOST: &str = "https://downloads.example.com/";
pub const DEFAULT_REMOTE_PATH: &str = "builds/";
pub const DEFAULT_BUILD_DIR: &str = "build/Release";
pub const DEFAULT_TOOLCHAIN: &str = "node-gyp";
pub const DEFAULT_ARTIFACT_NAME: &str = "native";

/// Extension of the compiled module, both as produced by the toolchain and once renamed.
pub const ARTIFACT_EXTENSION: &str = "node";
/// Extension appended to the package name on the distribution host.
pub const PACKAGE_EXTENSION: &str = "gz";

/// Toolchain versions below this take the build target behind [`LEGACY_TARGET_FLAG`] on Windows.
pub const LEGACY_TARGET_SYNTAX_BELOW: Version = Version::new(3, 7, 0);
pub const LEGACY_TARGET_FLAG: &str = "/t:";
