//! Request configuration read from stdin
//!
//! Concourse hands every resource script a JSON object with a `source` block
//! (resource-wide settings) and, for `in`/`out`, a `params` block. The `version`
//! block is present for `check` (after the first run) and `in`.

use crate::core::error::{ResourceError, ResourceResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Duration;

/// Default Pivnet endpoint
pub const DEFAULT_ENDPOINT: &str = "https://network.pivotal.io";

/// Default S3 region for product file uploads
pub const DEFAULT_REGION: &str = "us-east-1";

/// Resource-wide settings shared by check, in and out
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Source {
  /// Pivnet API token
  #[serde(default)]
  pub api_token: String,

  /// Slug of the product being tracked
  #[serde(default)]
  pub product_slug: String,

  /// Pivnet endpoint (default: https://network.pivotal.io)
  #[serde(default = "default_endpoint")]
  pub endpoint: String,

  /// Only consider releases of this type (check)
  #[serde(default)]
  pub release_type: Option<String>,

  /// Only consider versions matching this regex (check)
  #[serde(default)]
  pub product_version: Option<String>,

  /// Ordering of discovered versions (check)
  #[serde(default)]
  pub sort_by: SortBy,

  /// Copy metadata from the previous release when creating one (out)
  #[serde(default)]
  pub copy_metadata: bool,

  /// Log at debug level
  #[serde(default)]
  pub verbose: bool,

  /// Accept invalid TLS certificates from the endpoint
  #[serde(default)]
  pub skip_ssl_validation: bool,

  /// S3 credentials and location for product file uploads (out)
  #[serde(default)]
  pub access_key_id: Option<String>,
  #[serde(default)]
  pub secret_access_key: Option<String>,
  #[serde(default)]
  pub session_token: Option<String>,
  #[serde(default)]
  pub bucket: Option<String>,
  #[serde(default = "default_region")]
  pub region: String,
  #[serde(default)]
  pub s3_endpoint: Option<String>,
}

fn default_endpoint() -> String {
  DEFAULT_ENDPOINT.to_string()
}

fn default_region() -> String {
  DEFAULT_REGION.to_string()
}

/// Version ordering for check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
  /// Keep the order the service returns (newest first)
  #[default]
  None,
  /// Order by semantic version
  Semver,
}

impl Source {
  /// Validate fields every command needs
  pub fn validate(&self) -> ResourceResult<()> {
    if self.api_token.trim().is_empty() {
      return Err(missing("api_token"));
    }
    if self.product_slug.trim().is_empty() {
      return Err(missing("product_slug"));
    }
    if self.endpoint.trim().is_empty() {
      return Err(missing("endpoint"));
    }
    Ok(())
  }

  /// Validate the S3 settings needed to upload product files
  pub fn validate_upload(&self) -> ResourceResult<()> {
    let required = [
      ("access_key_id", &self.access_key_id),
      ("secret_access_key", &self.secret_access_key),
      ("bucket", &self.bucket),
    ];
    for (field, value) in required {
      if value.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(missing(field));
      }
    }
    Ok(())
  }
}

/// Version as exchanged with Concourse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVersion {
  pub product_version: String,
}

/// One `name`/`value` entry of the metadata list shown by Concourse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPair {
  pub name: String,
  pub value: String,
}

impl MetadataPair {
  pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      value: value.into(),
    }
  }
}

/// Response printed by `in` and `out`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedResponse {
  pub version: ResourceVersion,
  pub metadata: Vec<MetadataPair>,
}

pub type InResponse = VersionedResponse;
pub type OutResponse = VersionedResponse;

/// Request for `check`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
  pub source: Source,
  #[serde(default)]
  pub version: Option<ResourceVersion>,
}

/// Request for `in`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InRequest {
  pub source: Source,
  pub version: ResourceVersion,
  #[serde(default)]
  pub params: InParams,
}

/// Params for `in`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InParams {
  /// Basename globs selecting product files; absent means all files
  #[serde(default)]
  pub globs: Option<Vec<String>>,

  /// Fetch release metadata only
  #[serde(default)]
  pub skip_download: bool,
}

/// Request for `out`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutRequest {
  pub source: Source,
  #[serde(default)]
  pub params: OutParams,
}

/// Params for `out`; file paths are relative to the sources directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutParams {
  /// Glob of local files to upload
  #[serde(default)]
  pub file_glob: String,

  /// Remote directory under `product_files/` for uploads
  #[serde(default)]
  pub s3_filepath_prefix: String,

  /// YAML or JSON release metadata
  #[serde(default)]
  pub metadata_file: String,

  /// Fallback files consulted when the metadata has no `release` block
  #[serde(default)]
  pub version_file: String,
  #[serde(default)]
  pub release_type_file: String,
  #[serde(default)]
  pub eula_slug_file: String,
  #[serde(default)]
  pub description_file: String,
  #[serde(default)]
  pub release_date_file: String,

  /// Interval between reference replication checks
  #[serde(default = "default_poll_frequency")]
  pub poll_frequency_seconds: u64,

  /// Deadline for each reference to finish replicating
  #[serde(default = "default_async_timeout")]
  pub async_timeout_seconds: u64,
}

fn default_poll_frequency() -> u64 {
  10
}

fn default_async_timeout() -> u64 {
  3600
}

impl Default for OutParams {
  fn default() -> Self {
    Self {
      file_glob: String::new(),
      s3_filepath_prefix: String::new(),
      metadata_file: String::new(),
      version_file: String::new(),
      release_type_file: String::new(),
      eula_slug_file: String::new(),
      description_file: String::new(),
      release_date_file: String::new(),
      poll_frequency_seconds: default_poll_frequency(),
      async_timeout_seconds: default_async_timeout(),
    }
  }
}

impl OutParams {
  /// Upload is skipped unless both the glob and the remote prefix are set
  pub fn skip_upload(&self) -> bool {
    self.file_glob.is_empty() || self.s3_filepath_prefix.is_empty()
  }

  pub fn poll_frequency(&self) -> Duration {
    Duration::from_secs(self.poll_frequency_seconds)
  }

  pub fn async_timeout(&self) -> Duration {
    Duration::from_secs(self.async_timeout_seconds)
  }

  /// Validate param combinations
  pub fn validate(&self) -> ResourceResult<()> {
    if !self.file_glob.is_empty() && self.s3_filepath_prefix.is_empty() {
      return Err(missing("s3_filepath_prefix (required with file_glob)"));
    }
    if self.file_glob.is_empty() && !self.s3_filepath_prefix.is_empty() {
      return Err(missing("file_glob (required with s3_filepath_prefix)"));
    }
    if self.metadata_file.is_empty() && self.version_file.is_empty() {
      return Err(ResourceError::with_help(
        "either metadata_file or version_file must be provided",
        "Point `metadata_file` at a YAML file with a `release` block, or set `version_file`.",
      ));
    }
    if self.poll_frequency_seconds == 0 {
      return Err(ResourceError::invalid("poll_frequency_seconds must be greater than zero"));
    }
    Ok(())
  }
}

fn missing(field: &str) -> ResourceError {
  ResourceError::Validation(ValidationError::MissingField {
    field: field.to_string(),
  })
}

/// Read and parse a request from a reader (stdin in production)
pub fn read_request<T, R>(mut reader: R) -> ResourceResult<T>
where
  T: for<'de> Deserialize<'de>,
  R: Read,
{
  let mut raw = String::new();
  reader.read_to_string(&mut raw)?;
  if raw.trim().is_empty() {
    return Err(ResourceError::invalid("no request received on stdin"));
  }
  serde_json::from_str(&raw).map_err(|e| ResourceError::invalid(format!("invalid request JSON: {}", e)))
}
