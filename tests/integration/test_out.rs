//! Integration tests for `out`

use crate::helpers::{TestDir, run_failing, source};
use anyhow::Result;
use serde_json::json;

#[test]
fn test_out_requires_metadata_or_version_file() -> Result<()> {
  let dir = TestDir::new()?;
  let request = json!({ "source": source(), "params": {} });
  let stderr = run_failing(&dir.path, &["out", "."], &request.to_string())?;
  assert!(
    stderr.contains("either metadata_file or version_file must be provided"),
    "stderr: {}",
    stderr
  );
  Ok(())
}

#[test]
fn test_out_glob_without_prefix() -> Result<()> {
  let dir = TestDir::new()?;
  let request = json!({
    "source": source(),
    "params": { "file_glob": "files/*", "metadata_file": "metadata.yml" },
  });
  let stderr = run_failing(&dir.path, &["out", "."], &request.to_string())?;
  assert!(stderr.contains("s3_filepath_prefix"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_out_upload_requires_s3_credentials() -> Result<()> {
  let dir = TestDir::new()?;
  let request = json!({
    "source": source(),
    "params": {
      "file_glob": "files/*",
      "s3_filepath_prefix": "my-prefix",
      "metadata_file": "metadata.yml",
    },
  });
  let stderr = run_failing(&dir.path, &["out", "."], &request.to_string())?;
  assert!(stderr.contains("access_key_id must be provided"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_out_missing_metadata_file() -> Result<()> {
  let dir = TestDir::new()?;
  let request = json!({
    "source": source(),
    "params": { "metadata_file": "metadata.yml" },
  });
  let sources = dir.path.to_str().unwrap_or_default();
  let stderr = run_failing(&dir.path, &["out", sources], &request.to_string())?;
  assert!(stderr.contains("file not found"), "stderr: {}", stderr);
  assert!(stderr.contains("metadata.yml"), "stderr: {}", stderr);
  Ok(())
}

#[test]
fn test_out_declared_file_not_matched_by_glob() -> Result<()> {
  let dir = TestDir::new()?;
  dir.write("files/a.zip", "contents")?;
  dir.write(
    "metadata.yml",
    r#"---
release:
  version: "1.2.3"
  release_type: Minor Release
  eula_slug: pivotal_software_eula
product_files:
- file: files/missing.txt
"#,
  )?;

  let mut source = source();
  source["access_key_id"] = json!("AKIA");
  source["secret_access_key"] = json!("secret");
  source["bucket"] = json!("pivnet-bucket");
  source["region"] = json!("us-east-1");
  let request = json!({
    "source": source,
    "params": {
      "file_glob": "files/*",
      "s3_filepath_prefix": "my-prefix",
      "metadata_file": "metadata.yml",
    },
  });

  let sources = dir.path.to_str().unwrap_or_default();
  let stderr = run_failing(&dir.path, &["out", sources], &request.to_string())?;
  assert!(
    stderr.contains("product files were provided in metadata that match no globs: files/missing.txt"),
    "stderr: {}",
    stderr
  );
  Ok(())
}
