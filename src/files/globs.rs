//! Expand the upload glob against the sources directory

use crate::core::error::{ResourceError, ResourceResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Expands one glob pattern relative to a base directory
pub struct Globber {
  pattern: String,
  sources_dir: PathBuf,
}

impl Globber {
  pub fn new(pattern: impl Into<String>, sources_dir: impl Into<PathBuf>) -> Self {
    Self {
      pattern: pattern.into(),
      sources_dir: sources_dir.into(),
    }
  }

  /// Matched files as paths relative to the sources directory, in glob order
  ///
  /// An empty pattern matches nothing; a non-empty pattern must match at least one file.
  pub fn exact_globs(&self) -> ResourceResult<Vec<String>> {
    if self.pattern.is_empty() {
      return Ok(Vec::new());
    }

    let full = self.sources_dir.join(&self.pattern);
    let full = full.to_string_lossy();
    let mut matches = Vec::new();
    for entry in glob::glob(&full)? {
      let path = entry.map_err(|e| ResourceError::message(format!("reading glob match: {}", e)))?;
      if !path.is_file() {
        continue;
      }
      matches.push(relative(&path, &self.sources_dir));
    }

    if matches.is_empty() {
      return Err(ResourceError::invalid(format!(
        "no matches found for pattern: '{}'",
        self.pattern
      )));
    }

    debug!(pattern = %self.pattern, count = matches.len(), "expanded file glob");
    Ok(matches)
  }
}

fn relative(path: &Path, base: &Path) -> String {
  let rel = path.strip_prefix(base).unwrap_or(path);
  rel
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}
