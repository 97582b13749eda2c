//! prebuild-lib: acquire a platform-specific native artifact.
//!
//! The artifact is either compiled locally with an external toolchain or
//! downloaded as a gzip package from a distribution host:
//! - [`install::Installer`]: build first, fall back to downloading
//! - [`build::Builder`]: drives the toolchain's clean/configure/build steps
//! - [`download::Downloader`]: proxy-aware fetch and streaming gunzip
//! - [`paths::PathManager`]: keeps every write inside the package root

pub mod build;
pub mod config;
pub mod consts;
pub mod download;
pub mod install;
pub mod naming;
pub mod paths;
pub mod platform;
pub mod types;
pub mod util;

pub use config::{InstallOptions, Settings};
pub use install::{InstallError, InstallFailure, Installed, Installer, Strategy};
pub use types::{ArtifactBlob, Target};
