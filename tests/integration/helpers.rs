//! Test helpers for integration tests

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A scratch directory standing in for a Concourse build dir
pub struct TestDir {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestDir {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Write a file relative to the directory, creating parents
  pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
    let path = self.path.join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
  }
}

/// A source block that passes validation
pub fn source() -> Value {
  json!({
    "api_token": "some-token",
    "product_slug": "my-product",
    "endpoint": "http://127.0.0.1:1",
  })
}

/// Run the binary with `args`, feeding `stdin`; does not check the exit status
pub fn run_resource(cwd: &Path, args: &[&str], stdin: &str) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_pivnet-resource");

  let mut child = Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .context("Failed to run pivnet-resource")?;

  child
    .stdin
    .take()
    .context("stdin not piped")?
    .write_all(stdin.as_bytes())?;

  child.wait_with_output().context("Failed to wait for pivnet-resource")
}

/// Run expecting failure and return stderr
pub fn run_failing(cwd: &Path, args: &[&str], stdin: &str) -> Result<String> {
  let output = run_resource(cwd, args, stdin)?;
  let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
  if output.status.success() {
    anyhow::bail!(
      "pivnet-resource {} unexpectedly succeeded\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      stderr
    );
  }
  assert!(output.stdout.is_empty(), "no response expected on failure");
  Ok(stderr)
}
