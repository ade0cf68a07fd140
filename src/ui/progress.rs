//! Progress bars for product file downloads
//!
//! Uses `linya`, which draws to stderr and handles concurrent bars well

use linya::{Bar, Progress};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Thread-safe set of per-file bars
#[derive(Clone)]
pub struct DownloadProgress {
  progress: Arc<Mutex<Progress>>,
}

impl DownloadProgress {
  pub fn new() -> Self {
    Self {
      progress: Arc::new(Mutex::new(Progress::new())),
    }
  }

  /// Add a bar measured in bytes
  pub fn add_file(&self, size: u64, name: impl Into<String>) -> Bar {
    let mut progress = self.progress.lock().unwrap_or_else(|e| e.into_inner());
    progress.bar(size.max(1) as usize, name.into())
  }

  pub fn advance(&self, bar: &Bar, bytes: usize) {
    let mut progress = self.progress.lock().unwrap_or_else(|e| e.into_inner());
    progress.inc_and_draw(bar, bytes);
  }
}

impl Default for DownloadProgress {
  fn default() -> Self {
    Self::new()
  }
}

/// Writer that advances a bar by every byte written through it
pub struct ProgressWriter<W> {
  inner: W,
  tracker: Option<(DownloadProgress, Bar)>,
}

impl<W: Write> ProgressWriter<W> {
  pub fn new(inner: W, tracker: Option<(DownloadProgress, Bar)>) -> Self {
    Self { inner, tracker }
  }
}

impl<W: Write> Write for ProgressWriter<W> {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    let n = self.inner.write(buf)?;
    if let Some((progress, bar)) = &self.tracker {
      progress.advance(bar, n);
    }
    Ok(n)
  }

  fn flush(&mut self) -> io::Result<()> {
    self.inner.flush()
  }
}
