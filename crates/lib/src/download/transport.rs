//! Transport selection for a single download attempt.

use std::fmt;

use reqwest::{Client, Proxy, Url};
use tracing::{debug, warn};

use super::DownloadError;
use crate::consts::APP_NAME;

/// Which client flavour a download goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
  Http,
  Https,
}

impl Scheme {
  fn of(url: &str) -> Self {
    if url.starts_with("https:") { Self::Https } else { Self::Http }
  }
}

impl fmt::Display for Scheme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Http => f.write_str("http"),
      Self::Https => f.write_str("https"),
    }
  }
}

/// Resolved client selection, request URL and optional proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
  /// Scheme of the first hop: the proxy when there is one, else the download
  /// host. Direct HTTPS transports refuse plaintext URLs; through a proxy it
  /// is informational, the proxy URL itself decides how reqwest connects.
  pub scheme: Scheme,
  pub url: Url,
  pub proxy: Option<String>,
}

impl TransportConfig {
  /// Work out how to reach `remote_path + file_name` on `download_host`.
  ///
  /// Through a proxy, the download host is parsed as a base URL and its path
  /// replaced; the client flavour follows the proxy's scheme. Without one,
  /// the URL is the plain concatenation and the client flavour follows the
  /// download host, with a warning when that is not HTTPS.
  pub fn resolve(
    download_host: &str,
    remote_path: &str,
    file_name: &str,
    proxy_host: Option<&str>,
  ) -> Result<Self, DownloadError> {
    match proxy_host {
      Some(proxy) => {
        let mut url = parse(download_host)?;
        url.set_path(&format!("{}{}", remote_path, file_name));
        debug!(url = %url, proxy = %proxy, "downloading through proxy");

        Ok(Self {
          scheme: Scheme::of(proxy),
          url,
          proxy: Some(proxy.to_string()),
        })
      }
      None => {
        let url = parse(&format!("{}{}{}", download_host, remote_path, file_name))?;
        let scheme = Scheme::of(download_host);
        if scheme == Scheme::Http {
          warn!(host = %download_host, "falling back to http, please consider enabling SSL on the download host");
        }

        Ok(Self {
          scheme,
          url,
          proxy: None,
        })
      }
    }
  }

  /// Build an HTTP client for this transport.
  pub fn client(&self) -> Result<Client, DownloadError> {
    let builder = Client::builder().user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")));

    let builder = match &self.proxy {
      Some(proxy) => {
        let proxy = Proxy::all(proxy.as_str()).map_err(|e| DownloadError::Transport {
          url: self.url.to_string(),
          message: format!("invalid proxy '{}': {}", proxy, e),
        })?;
        builder.proxy(proxy)
      }
      None => builder.no_proxy().https_only(self.scheme == Scheme::Https),
    };

    builder.build().map_err(|e| DownloadError::Transport {
      url: self.url.to_string(),
      message: e.to_string(),
    })
  }
}

fn parse(url: &str) -> Result<Url, DownloadError> {
  Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
    url: url.to_string(),
    message: e.to_string(),
  })
}
