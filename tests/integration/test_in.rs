//! Integration tests for `in`

use crate::helpers::{TestDir, run_failing, run_resource};
use anyhow::Result;
use serde_json::json;

#[test]
fn test_in_requires_destination() -> Result<()> {
  let dir = TestDir::new()?;
  let output = run_resource(&dir.path, &["in"], "{}")?;
  assert!(!output.status.success());
  Ok(())
}

#[test]
fn test_in_requires_version() -> Result<()> {
  let dir = TestDir::new()?;
  let request = json!({
    "source": { "api_token": "some-token", "product_slug": "my-product" },
  });
  let dest = dir.path.join("dest");
  let stderr = run_failing(&dir.path, &["in", dest.to_str().unwrap_or_default()], &request.to_string())?;
  assert!(stderr.contains("invalid request JSON"), "stderr: {}", stderr);
  assert!(!dest.join("version").exists());
  Ok(())
}

#[test]
fn test_in_requires_api_token() -> Result<()> {
  let dir = TestDir::new()?;
  let request = json!({
    "source": { "product_slug": "my-product" },
    "version": { "product_version": "1.2.3#2024-01-02T03:04:05.000Z" },
  });
  let stderr = run_failing(&dir.path, &["in", "dest"], &request.to_string())?;
  assert!(stderr.contains("api_token must be provided"), "stderr: {}", stderr);
  Ok(())
}
