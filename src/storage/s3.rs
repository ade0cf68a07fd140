//! S3 content store using the rust-s3 crate
//!
//! Works against AWS S3 and S3-compatible services. A custom `s3_endpoint`
//! switches to path-style addressing.

use crate::core::config::Source;
use crate::core::error::{ResourceError, ResourceResult, ResultExt, TransportError};
use crate::release::ContentStore;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Settings needed to reach the bucket
#[derive(Debug, Clone)]
pub struct S3Config {
  pub bucket: String,
  pub region: String,
  pub endpoint: Option<String>,
  pub access_key_id: String,
  pub secret_access_key: String,
  pub session_token: Option<String>,
}

impl S3Config {
  /// Build from a source that passed `validate_upload`
  pub fn from_source(source: &Source) -> ResourceResult<Self> {
    source.validate_upload()?;
    Ok(Self {
      bucket: source.bucket.clone().unwrap_or_default(),
      region: source.region.clone(),
      endpoint: source.s3_endpoint.clone().filter(|e| !e.is_empty()),
      access_key_id: source.access_key_id.clone().unwrap_or_default(),
      secret_access_key: source.secret_access_key.clone().unwrap_or_default(),
      session_token: source.session_token.clone().filter(|t| !t.is_empty()),
    })
  }

  fn region(&self) -> ResourceResult<Region> {
    match &self.endpoint {
      Some(endpoint) => Ok(Region::Custom {
        region: self.region.clone(),
        endpoint: endpoint.clone(),
      }),
      None => self
        .region
        .parse()
        .map_err(|_| ResourceError::invalid(format!("invalid S3 region: {}", self.region))),
    }
  }
}

pub struct S3ContentStore {
  bucket: Box<Bucket>,
}

impl S3ContentStore {
  pub fn new(config: &S3Config) -> ResourceResult<Self> {
    let credentials = Credentials::new(
      Some(&config.access_key_id),
      Some(&config.secret_access_key),
      None,
      config.session_token.as_deref(),
      None,
    )
    .map_err(|e| ResourceError::invalid(format!("invalid S3 credentials: {}", e)))?;

    let bucket = Bucket::new(&config.bucket, config.region()?, credentials)
      .map_err(|e| ResourceError::message(format!("failed to create S3 bucket handle: {}", e)))?;
    let bucket = if config.endpoint.is_some() {
      bucket.with_path_style()
    } else {
      bucket
    };

    debug!(bucket = %config.bucket, region = %config.region, "S3 content store ready");
    Ok(Self { bucket })
  }
}

impl ContentStore for S3ContentStore {
  fn upload(&self, local_path: &Path, remote_path: &str) -> ResourceResult<String> {
    let content = fs::read(local_path).with_context(|| format!("reading {}", local_path.display()))?;

    info!(key = %remote_path, bytes = content.len(), "uploading to S3");
    let response = self.bucket.put_object(remote_path, &content)?;
    let status = response.status_code();
    if !(200..300).contains(&status) {
      return Err(
        TransportError::Status {
          method: "PUT".to_string(),
          url: format!("s3://{}/{}", self.bucket.name(), remote_path),
          expected: 200,
          actual: status,
          message: String::from_utf8_lossy(response.as_slice()).into_owned(),
        }
        .into(),
      );
    }

    Ok(remote_path.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn source() -> Source {
    Source {
      api_token: "t".to_string(),
      product_slug: "p".to_string(),
      access_key_id: Some("AKID".to_string()),
      secret_access_key: Some("secret".to_string()),
      bucket: Some("pivnet-bucket".to_string()),
      region: "eu-west-1".to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn test_config_from_source() {
    let config = S3Config::from_source(&source()).unwrap();
    assert_eq!(config.bucket, "pivnet-bucket");
    assert!(config.endpoint.is_none());
    assert!(config.session_token.is_none());
    assert_eq!(config.region().unwrap(), Region::EuWest1);
  }

  #[test]
  fn test_custom_endpoint_region() {
    let mut source = source();
    source.s3_endpoint = Some("http://localhost:9000".to_string());
    let config = S3Config::from_source(&source).unwrap();
    assert_eq!(
      config.region().unwrap(),
      Region::Custom {
        region: "eu-west-1".to_string(),
        endpoint: "http://localhost:9000".to_string(),
      }
    );
  }

  #[test]
  fn test_missing_bucket_is_rejected() {
    let mut source = source();
    source.bucket = None;
    assert!(S3Config::from_source(&source).unwrap_err().to_string().contains("bucket"));
  }

  #[test]
  fn test_store_builds_without_network() {
    let config = S3Config::from_source(&source()).unwrap();
    assert!(S3ContentStore::new(&config).is_ok());
  }
}
