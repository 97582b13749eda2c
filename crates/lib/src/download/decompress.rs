//! Streaming gzip decompression of a download.
//!
//! Events from the response (`data`, transport error, end of stream) are fed
//! into a [`Decompressor`], which resolves its [`Completion`] exactly once.
//! Whatever arrives after that is ignored.

use std::fmt;
use std::io::{self, Write};

use flate2::write::MultiGzDecoder;
use reqwest::Response;
use tokio::sync::oneshot;
use tracing::debug;

use super::DownloadError;
use crate::types::ArtifactBlob;

type Outcome = Result<ArtifactBlob, DownloadError>;

/// Receives the single outcome of a [`Decompressor`].
pub type Completion = oneshot::Receiver<Outcome>;

/// Decompressed output, kept in arrival order.
#[derive(Debug, Default)]
struct Chunks {
  parts: Vec<Vec<u8>>,
  len: usize,
}

impl Chunks {
  fn concat(self) -> Vec<u8> {
    let mut out = Vec::with_capacity(self.len);
    for part in self.parts {
      out.extend_from_slice(&part);
    }
    out
  }
}

impl Write for Chunks {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    if !buf.is_empty() {
      self.parts.push(buf.to_vec());
      self.len += buf.len();
    }
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Turns a gzip byte stream into an [`ArtifactBlob`].
///
/// Every member of a multi-member stream is decoded, in order.
pub struct Decompressor {
  url: String,
  decoder: Option<MultiGzDecoder<Chunks>>,
  completion: Option<oneshot::Sender<Outcome>>,
}

impl Decompressor {
  /// `url` identifies the download in error messages.
  pub fn new(url: impl Into<String>) -> (Self, Completion) {
    let (tx, rx) = oneshot::channel();
    let decompressor = Self {
      url: url.into(),
      decoder: Some(MultiGzDecoder::new(Chunks::default())),
      completion: Some(tx),
    };
    (decompressor, rx)
  }

  pub fn is_resolved(&self) -> bool {
    self.completion.is_none()
  }

  /// Feed a chunk of the compressed response body.
  pub fn on_data(&mut self, chunk: &[u8]) {
    let Some(decoder) = self.decoder.as_mut() else {
      return;
    };

    if let Err(e) = decoder.write_all(chunk) {
      let url = self.url.clone();
      self.resolve(Err(DownloadError::Decompression {
        url,
        message: e.to_string(),
      }));
    }
  }

  /// The response itself failed, e.g. the connection dropped.
  pub fn on_response_error(&mut self, error: impl fmt::Display) {
    let url = self.url.clone();
    self.resolve(Err(DownloadError::Transport {
      url,
      message: error.to_string(),
    }));
  }

  /// The response body ended cleanly.
  pub fn on_end(&mut self) {
    let Some(decoder) = self.decoder.take() else {
      return;
    };

    let outcome = match decoder.finish() {
      Ok(chunks) => {
        let parts = chunks.parts.len();
        let data = chunks.concat();
        debug!(url = %self.url, size = data.len(), parts, "decompressed download");
        Ok(ArtifactBlob::new(data))
      }
      Err(e) => Err(DownloadError::Decompression {
        url: self.url.clone(),
        message: e.to_string(),
      }),
    };
    self.resolve(outcome);
  }

  fn resolve(&mut self, outcome: Outcome) {
    let Some(tx) = self.completion.take() else {
      return;
    };
    self.decoder = None;
    // The receiver may already be gone; nobody is left to tell.
    let _ = tx.send(outcome);
  }
}

/// Stream `response` through a [`Decompressor`].
///
/// The body is read to the end even after decompression has failed so the
/// connection is not left half-consumed.
pub async fn inflate(url: &str, mut response: Response) -> Result<ArtifactBlob, DownloadError> {
  let (mut decompressor, completion) = Decompressor::new(url);

  loop {
    match response.chunk().await {
      Ok(Some(chunk)) => decompressor.on_data(&chunk),
      Ok(None) => {
        decompressor.on_end();
        break;
      }
      Err(e) => {
        decompressor.on_response_error(e);
        break;
      }
    }
  }
  drop(decompressor);

  completion.await.unwrap_or_else(|_| {
    Err(DownloadError::Transport {
      url: url.to_string(),
      message: "response ended without a result".to_string(),
    })
  })
}
