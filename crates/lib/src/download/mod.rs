//! Fetching prebuilt artifacts from the remote distribution host.
//!
//! One GET per attempt, no retries. A `200` body is gunzipped into an
//! [`ArtifactBlob`]; `404` means nothing was published for the target.

pub mod decompress;
pub mod transport;

use reqwest::{Response, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;
use crate::naming::Naming;
use crate::types::{ArtifactBlob, Target};

pub use decompress::{Completion, Decompressor, inflate};
pub use transport::{Scheme, TransportConfig};

/// Errors raised by the download phase. None of them are recoverable.
#[derive(Debug, Error)]
pub enum DownloadError {
  /// The host has no package for this target.
  #[error("no prebuilt artifacts for your OS/architecture ({url})")]
  NotFound { url: String },

  /// The host answered with something other than 200 or 404.
  #[error("failed to download {url}: status code {code}")]
  Status { url: String, code: u16 },

  /// The request or the response stream failed.
  #[error("failed to download {url}: {message}")]
  Transport { url: String, message: String },

  /// The body was not valid gzip.
  #[error("failed to unzip {url}: {message}")]
  Decompression { url: String, message: String },

  #[error("invalid download url '{url}': {message}")]
  InvalidUrl { url: String, message: String },
}

/// Downloads packages for a target.
#[derive(Debug, Clone)]
pub struct Downloader {
  download_host: String,
  remote_path: String,
  proxy_host: Option<String>,
  naming: Naming,
}

impl Downloader {
  pub fn new(settings: &Settings) -> Self {
    Self {
      download_host: settings.download_host.clone(),
      remote_path: settings.remote_path.clone(),
      proxy_host: settings.proxy_host.clone(),
      naming: settings.naming.clone(),
    }
  }

  /// The URL reported in messages for `target`.
  pub fn url_for(&self, target: &Target) -> String {
    format!(
      "{}{}{}",
      self.download_host,
      self.remote_path,
      self.naming.package_file_name(target)
    )
  }

  pub fn transport(&self, target: &Target) -> Result<TransportConfig, DownloadError> {
    TransportConfig::resolve(
      &self.download_host,
      &self.remote_path,
      &self.naming.package_file_name(target),
      self.proxy_host.as_deref(),
    )
  }

  /// Fetch and decompress the package for `target`.
  pub async fn download(&self, target: &Target) -> Result<ArtifactBlob, DownloadError> {
    let url = self.url_for(target);
    let transport = self.transport(target)?;
    let client = transport.client()?;

    info!(target = %target, url = %url, scheme = %transport.scheme, "downloading prebuilt artifact");

    let response = client
      .get(transport.url.clone())
      .send()
      .await
      .map_err(|e| DownloadError::Transport {
        url: url.clone(),
        message: e.to_string(),
      })?;

    let status = response.status();
    debug!(url = %url, status = status.as_u16(), "download response");

    match status {
      StatusCode::OK => {
        let blob = inflate(&url, response).await?;
        info!(url = %url, size = blob.len(), "download complete");
        Ok(blob)
      }
      StatusCode::NOT_FOUND => {
        drain(response).await;
        Err(DownloadError::NotFound { url })
      }
      other => {
        drain(response).await;
        Err(DownloadError::Status {
          url,
          code: other.as_u16(),
        })
      }
    }
  }
}

/// Read and discard whatever is left of a response body.
async fn drain(mut response: Response) {
  while let Ok(Some(_)) = response.chunk().await {}
}
