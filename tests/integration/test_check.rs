//! Integration tests for `check`

use crate::helpers::{TestDir, run_failing, run_resource, source};
use anyhow::Result;
use serde_json::json;

#[test]
fn test_check_rejects_empty_stdin() -> Result<()> {
  let dir = TestDir::new()?;
  let stderr = run_failing(&dir.path, &["check"], "")?;
  assert!(stderr.contains("no request received on stdin"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_check_rejects_malformed_json() -> Result<()> {
  let dir = TestDir::new()?;
  let stderr = run_failing(&dir.path, &["check"], "{not json")?;
  assert!(stderr.contains("invalid request JSON"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_check_requires_api_token() -> Result<()> {
  let dir = TestDir::new()?;
  let request = json!({ "source": { "product_slug": "my-product" } });
  let output = run_resource(&dir.path, &["check"], &request.to_string())?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("api_token must be provided"), "stderr: {}", stderr);
  assert!(stderr.contains("help:"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_check_requires_product_slug() -> Result<()> {
  let dir = TestDir::new()?;
  let mut request = json!({ "source": source() });
  request["source"]["product_slug"] = json!("");
  let stderr = run_failing(&dir.path, &["check"], &request.to_string())?;
  assert!(stderr.contains("product_slug must be provided"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_unknown_subcommand_is_rejected() -> Result<()> {
  let dir = TestDir::new()?;
  let output = run_resource(&dir.path, &["publish"], "")?;
  assert!(!output.status.success());
  Ok(())
}
