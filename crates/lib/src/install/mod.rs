//! Install orchestration: build locally, fall back to downloading.
//!
//! The flow is an explicit state machine:
//!
//! ```text
//! Start ──no_build──────────────────────────┐
//!   │                                       ▼
//!   └─► BuildAttempt ──fail──► (trail) ──► Download ──fail──► Done(err)
//!          │ ok                  ▲            │ ok
//!          ▼                     │            ▼
//!         Move ─────fail─────────┘           Save ──► Done(ok | err)
//!          │ ok
//!          ▼
//!        Done(ok)
//! ```
//!
//! Build and move failures are recorded in the [`ErrorTrail`] and recovered
//! from. Download and save failures end the install.

mod types;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::build::{BuildError, Builder};
use crate::config::{InstallOptions, Settings};
use crate::download::{DownloadError, Downloader};
use crate::paths::{PathError, PathManager};
use crate::types::{ArtifactBlob, Target};

pub use types::*;

/// Produces an artifact by compiling it.
#[allow(async_fn_in_trait)]
pub trait ArtifactBuilder {
  async fn build(&self, target: &Target, rebuild: bool) -> Result<(), BuildError>;
}

/// Produces an artifact by fetching it.
#[allow(async_fn_in_trait)]
pub trait ArtifactSource {
  async fn download(&self, target: &Target) -> Result<ArtifactBlob, DownloadError>;
}

/// Persists artifacts at their canonical location.
#[allow(async_fn_in_trait)]
pub trait ArtifactStore {
  async fn move_artifact(&self, target: &Target) -> Result<PathBuf, PathError>;
  async fn save(&self, target: &Target, blob: ArtifactBlob) -> Result<PathBuf, PathError>;
}

impl ArtifactBuilder for Builder {
  async fn build(&self, target: &Target, rebuild: bool) -> Result<(), BuildError> {
    Builder::build(self, target, rebuild).await
  }
}

impl ArtifactSource for Downloader {
  async fn download(&self, target: &Target) -> Result<ArtifactBlob, DownloadError> {
    Downloader::download(self, target).await
  }
}

impl ArtifactStore for PathManager {
  async fn move_artifact(&self, target: &Target) -> Result<PathBuf, PathError> {
    PathManager::move_artifact(self, target).await
  }

  async fn save(&self, target: &Target, blob: ArtifactBlob) -> Result<PathBuf, PathError> {
    PathManager::save(self, target, blob).await
  }
}

/// Where an install currently is.
#[derive(Debug)]
enum InstallState {
  Start,
  BuildAttempt,
  Move,
  Download,
  Save(ArtifactBlob),
  Done(Result<Installed, InstallError>),
}

/// Runs one install for one target.
pub struct Installer<B = Builder, D = Downloader, S = PathManager> {
  builder: B,
  source: D,
  store: S,
  options: InstallOptions,
}

impl Installer {
  /// An installer wired to the real toolchain, distribution host and filesystem.
  pub fn new(settings: &Settings, options: InstallOptions) -> Self {
    Self::with_phases(
      Builder::new(settings),
      Downloader::new(settings),
      PathManager::new(settings),
      options,
    )
  }
}

impl<B, D, S> Installer<B, D, S>
where
  B: ArtifactBuilder,
  D: ArtifactSource,
  S: ArtifactStore,
{
  pub fn with_phases(builder: B, source: D, store: S, options: InstallOptions) -> Self {
    Self {
      builder,
      source,
      store,
      options,
    }
  }

  /// Get an artifact for `target` onto disk.
  ///
  /// Succeeds when either the build and move or the download and save both
  /// complete. On failure the most recent error is surfaced together with the
  /// trail of errors recovered from earlier.
  pub async fn install(&self, target: &Target) -> Result<Installed, InstallFailure> {
    let mut trail = ErrorTrail::default();
    let mut state = InstallState::Start;

    loop {
      state = match state {
        InstallState::Done(Ok(installed)) => {
          info!(target = %target, strategy = %installed.strategy, path = ?installed.path, "install complete");
          return Ok(installed);
        }
        InstallState::Done(Err(error)) => return Err(InstallFailure { error, trail }),
        state => {
          debug!(target = %target, state = state_name(&state), "install step");
          self.step(state, target, &mut trail).await
        }
      };
    }
  }

  async fn step(&self, state: InstallState, target: &Target, trail: &mut ErrorTrail) -> InstallState {
    match state {
      InstallState::Start => self.start(),
      InstallState::BuildAttempt => self.attempt_build(target, trail).await,
      InstallState::Move => self.move_built(target, trail).await,
      InstallState::Download => self.download(target).await,
      InstallState::Save(blob) => self.save(target, blob).await,
      done @ InstallState::Done(_) => done,
    }
  }

  fn start(&self) -> InstallState {
    if self.options.no_build {
      info!("building is disabled, downloading instead");
      InstallState::Download
    } else {
      InstallState::BuildAttempt
    }
  }

  async fn attempt_build(&self, target: &Target, trail: &mut ErrorTrail) -> InstallState {
    match self.builder.build(target, true).await {
      Ok(()) => InstallState::Move,
      Err(e) => {
        record(trail, InstallError::Build(e));
        InstallState::Download
      }
    }
  }

  async fn move_built(&self, target: &Target, trail: &mut ErrorTrail) -> InstallState {
    match self.store.move_artifact(target).await {
      Ok(path) => InstallState::Done(Ok(Installed {
        strategy: Strategy::Built,
        path,
      })),
      Err(e) => {
        record(trail, InstallError::Move(e));
        InstallState::Download
      }
    }
  }

  async fn download(&self, target: &Target) -> InstallState {
    // Disabled downloads only bite once a build has been attempted.
    if self.options.no_download && !self.options.no_build {
      return InstallState::Done(Err(InstallError::DownloadDisabled));
    }
    if !self.options.no_build {
      info!(target = %target, "falling back to download");
    }

    match self.source.download(target).await {
      Ok(blob) => InstallState::Save(blob),
      Err(e) => InstallState::Done(Err(InstallError::Download(e))),
    }
  }

  async fn save(&self, target: &Target, blob: ArtifactBlob) -> InstallState {
    match self.store.save(target, blob).await {
      Ok(path) => InstallState::Done(Ok(Installed {
        strategy: Strategy::Downloaded,
        path,
      })),
      Err(e) => InstallState::Done(Err(InstallError::Save(e))),
    }
  }
}

fn record(trail: &mut ErrorTrail, error: InstallError) {
  warn!(error = %error, "install phase failed");
  trail.record(error);
}

fn state_name(state: &InstallState) -> &'static str {
  match state {
    InstallState::Start => "start",
    InstallState::BuildAttempt => "build",
    InstallState::Move => "move",
    InstallState::Download => "download",
    InstallState::Save(_) => "save",
    InstallState::Done(_) => "done",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use crate::build::BuildStep;
  use crate::naming::Naming;
  use crate::util::testutil::{gzip, sample_bytes};
  use tracing_test::traced_test;

  /// Builder stand-in that counts calls and remembers the rebuild flag.
  #[derive(Default)]
  struct SpyBuilder {
    fail: bool,
    calls: AtomicUsize,
    rebuilds: AtomicUsize,
  }

  impl SpyBuilder {
    fn failing() -> Self {
      Self {
        fail: true,
        ..Default::default()
      }
    }
  }

  impl ArtifactBuilder for SpyBuilder {
    async fn build(&self, _target: &Target, rebuild: bool) -> Result<(), BuildError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if rebuild {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
      }
      if self.fail {
        return Err(BuildError::CmdFailed {
          program: "spy".to_string(),
          step: BuildStep::Configure,
          code: Some(1),
        });
      }
      Ok(())
    }
  }

  /// Download stand-in serving a fixed payload, or 404 when there is none.
  #[derive(Default)]
  struct SpySource {
    payload: Option<Vec<u8>>,
    calls: AtomicUsize,
  }

  impl SpySource {
    fn serving(payload: &[u8]) -> Self {
      Self {
        payload: Some(payload.to_vec()),
        ..Default::default()
      }
    }
  }

  impl ArtifactSource for SpySource {
    async fn download(&self, _target: &Target) -> Result<ArtifactBlob, DownloadError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match &self.payload {
        Some(payload) => Ok(ArtifactBlob::new(payload.clone())),
        None => Err(DownloadError::NotFound {
          url: "http://host/missing.gz".to_string(),
        }),
      }
    }
  }

  #[derive(Default)]
  struct SpyStore {
    fail_move: bool,
    fail_save: bool,
    moves: AtomicUsize,
    saved_len: AtomicUsize,
  }

  fn io_error(path: &str) -> PathError {
    PathError::Write {
      path: PathBuf::from(path),
      source: io::Error::from(io::ErrorKind::NotFound),
    }
  }

  impl ArtifactStore for SpyStore {
    async fn move_artifact(&self, _target: &Target) -> Result<PathBuf, PathError> {
      self.moves.fetch_add(1, Ordering::SeqCst);
      if self.fail_move {
        return Err(PathError::Move {
          from: PathBuf::from("build/Release/t.node"),
          to: PathBuf::from("build/Release/native-t.node"),
          source: io::Error::from(io::ErrorKind::NotFound),
        });
      }
      Ok(PathBuf::from("built"))
    }

    async fn save(&self, _target: &Target, blob: ArtifactBlob) -> Result<PathBuf, PathError> {
      if self.fail_save {
        return Err(io_error("saved"));
      }
      self.saved_len.store(blob.len(), Ordering::SeqCst);
      Ok(PathBuf::from("saved"))
    }
  }

  fn options(no_build: bool, no_download: bool) -> InstallOptions {
    InstallOptions { no_build, no_download }
  }

  fn target() -> Target {
    Target::from("linux-x64-108")
  }

  #[tokio::test]
  async fn successful_build_never_downloads() {
    let installer = Installer::with_phases(
      SpyBuilder::default(),
      SpySource::serving(b"unused"),
      SpyStore::default(),
      options(false, false),
    );

    let installed = installer.install(&target()).await.unwrap();

    assert_eq!(installed.strategy, Strategy::Built);
    assert_eq!(installed.path, PathBuf::from("built"));
    assert_eq!(installer.builder.rebuilds.load(Ordering::SeqCst), 1);
    assert_eq!(installer.source.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn failed_build_falls_back_to_download() {
    let installer = Installer::with_phases(
      SpyBuilder::failing(),
      SpySource::serving(b"prebuilt"),
      SpyStore::default(),
      options(false, false),
    );

    let installed = installer.install(&target()).await.unwrap();

    assert_eq!(installed.strategy, Strategy::Downloaded);
    assert_eq!(installer.store.moves.load(Ordering::SeqCst), 0);
    assert_eq!(installer.source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(installer.store.saved_len.load(Ordering::SeqCst), 8);
  }

  #[tokio::test]
  async fn failed_move_falls_back_to_download() {
    let installer = Installer::with_phases(
      SpyBuilder::default(),
      SpySource::serving(b"prebuilt"),
      SpyStore {
        fail_move: true,
        ..Default::default()
      },
      options(false, false),
    );

    let installed = installer.install(&target()).await.unwrap();

    assert_eq!(installed.strategy, Strategy::Downloaded);
    assert_eq!(installer.source.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn failed_build_with_downloads_disabled_is_configuration_error() {
    let installer = Installer::with_phases(
      SpyBuilder::failing(),
      SpySource::serving(b"unused"),
      SpyStore::default(),
      options(false, true),
    );

    let failure = installer.install(&target()).await.unwrap_err();

    assert!(matches!(failure.error, InstallError::DownloadDisabled));
    assert_eq!(failure.trail.len(), 1);
    assert!(matches!(failure.trail.iter().next(), Some(InstallError::Build(_))));
    assert_eq!(installer.source.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  #[traced_test]
  async fn disabled_download_is_not_announced_as_fallback() {
    let installer = Installer::with_phases(
      SpyBuilder::failing(),
      SpySource::serving(b"unused"),
      SpyStore::default(),
      options(false, true),
    );

    installer.install(&target()).await.unwrap_err();

    assert!(logs_contain("install phase failed"));
    assert!(!logs_contain("falling back to download"));
  }

  #[tokio::test]
  #[traced_test]
  async fn failed_build_announces_fallback() {
    let installer = Installer::with_phases(
      SpyBuilder::failing(),
      SpySource::serving(b"prebuilt"),
      SpyStore::default(),
      InstallOptions::default(),
    );

    installer.install(&target()).await.unwrap();

    assert!(logs_contain("install phase failed"));
    assert!(logs_contain("falling back to download"));
  }

  #[tokio::test]
  async fn no_build_goes_straight_to_download() {
    let installer = Installer::with_phases(
      SpyBuilder::default(),
      SpySource::serving(b"prebuilt"),
      SpyStore::default(),
      options(true, false),
    );

    let installed = installer.install(&target()).await.unwrap();

    assert_eq!(installed.strategy, Strategy::Downloaded);
    assert_eq!(installer.builder.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn both_phases_disabled_still_downloads() {
    let installer = Installer::with_phases(
      SpyBuilder::default(),
      SpySource::serving(b"prebuilt"),
      SpyStore::default(),
      options(true, true),
    );

    let installed = installer.install(&target()).await.unwrap();

    assert_eq!(installed.strategy, Strategy::Downloaded);
    assert_eq!(installer.builder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(installer.source.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn download_failure_surfaces_after_recorded_build_failure() {
    let installer = Installer::with_phases(
      SpyBuilder::failing(),
      SpySource::default(),
      SpyStore::default(),
      options(false, false),
    );

    let failure = installer.install(&target()).await.unwrap_err();

    assert!(matches!(
      failure.error,
      InstallError::Download(DownloadError::NotFound { .. })
    ));
    assert!(failure.to_string().contains("no prebuilt artifacts"));
    assert_eq!(failure.trail.len(), 1);
  }

  #[tokio::test]
  async fn move_failure_is_recorded_before_download_failure() {
    let installer = Installer::with_phases(
      SpyBuilder::default(),
      SpySource::default(),
      SpyStore {
        fail_move: true,
        ..Default::default()
      },
      options(false, false),
    );

    let failure = installer.install(&target()).await.unwrap_err();

    let recorded: Vec<_> = failure.trail.iter().collect();
    assert_eq!(recorded.len(), 1);
    assert!(matches!(recorded[0], InstallError::Move(_)));
    assert!(matches!(failure.error, InstallError::Download(_)));
  }

  #[tokio::test]
  async fn save_failure_fails_install() {
    let installer = Installer::with_phases(
      SpyBuilder::default(),
      SpySource::serving(b"prebuilt"),
      SpyStore {
        fail_save: true,
        ..Default::default()
      },
      options(true, false),
    );

    let failure = installer.install(&target()).await.unwrap_err();

    assert!(matches!(failure.error, InstallError::Save(_)));
    assert!(failure.trail.is_empty());
  }

  #[tokio::test]
  async fn download_only_install_writes_decompressed_artifact() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let original = sample_bytes(50_000);
    let mut server = mockito::Server::new_async().await;
    server
      .mock("GET", "/builds/native-1.0.0-linux-x64-108.node.gz")
      .with_status(200)
      .with_body(gzip(&original))
      .create_async()
      .await;

    let mut settings = Settings::new(temp_dir.path());
    settings.download_host = format!("{}/", server.url());
    settings.naming = Naming::new("native", "1.0.0");

    let installer = Installer::new(&settings, options(true, false));
    let installed = installer.install(&target()).await.unwrap();

    assert_eq!(installed.strategy, Strategy::Downloaded);
    assert_eq!(
      installed.path,
      temp_dir.path().join("build/Release/native-1.0.0-linux-x64-108.node")
    );
    let written = std::fs::read(&installed.path).unwrap();
    assert_eq!(written.len(), original.len());
    assert_eq!(written, original);
  }

  #[tokio::test]
  #[serial_test::serial]
  #[cfg(unix)]
  async fn local_build_install_moves_artifact() {
    use crate::util::testutil::fake_toolchain;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let toolchain = fake_toolchain(temp_dir.path(), None);
    let mut settings = Settings::new(temp_dir.path());
    settings.toolchain = toolchain.program;
    settings.naming = Naming::new("native", "1.0.0");
    // Unreachable so a download attempt would fail loudly.
    settings.download_host = "http://127.0.0.1:1/".to_string();

    let installed = Installer::new(&settings, options(false, false))
      .install(&target())
      .await
      .unwrap();

    assert_eq!(installed.strategy, Strategy::Built);
    assert_eq!(std::fs::read(&installed.path).unwrap(), b"compiled");
  }
}
