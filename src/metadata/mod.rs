//! Release metadata documents
//!
//! `out` reads a metadata file describing the release to publish; `in` writes
//! one describing the release it fetched. Both use the same shape. JSON files
//! are accepted since JSON is a subset of YAML.

pub mod fetcher;

use crate::core::error::{ResourceError, ResourceResult, ResultExt, ValidationError};
use crate::pivnet::{ADMINS_ONLY, ALL_USERS, SELECTED_USER_GROUPS_ONLY};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

pub use fetcher::{MetadataFetcher, MetadataField};

/// Root metadata document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub release: Option<ReleaseMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub product_files: Vec<ProductFileMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub file_groups: Vec<FileGroupMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dependencies: Vec<DependencyMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dependency_specifiers: Vec<DependencySpecifierMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub upgrade_paths: Vec<UpgradePathMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub upgrade_path_specifiers: Vec<UpgradePathSpecifierMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub image_references: Vec<ImageReferenceMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub artifact_references: Vec<ArtifactReferenceMetadata>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub helm_chart_references: Vec<HelmChartReferenceMetadata>,
}

/// Release attributes; when present these take precedence over fallback files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseMetadata {
  pub version: String,
  pub release_type: String,
  pub eula_slug: String,
  pub description: String,
  pub release_notes_url: String,
  pub release_date: String,
  pub availability: String,
  pub controlled: bool,
  pub eccn: String,
  pub license_exception: String,
  pub end_of_support_date: String,
  pub end_of_guidance_date: String,
  pub end_of_availability_date: String,
  #[serde(deserialize_with = "string_list", skip_serializing_if = "Vec::is_empty")]
  pub user_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFileMetadata {
  /// Path relative to the sources directory, matched against the expanded globs
  pub file: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub description: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub upload_as: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file_type: Option<String>,

  // Populated by `in` from the service's view of the file
  #[serde(skip_serializing_if = "is_zero")]
  pub id: u64,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub aws_object_key: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub file_version: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub sha256: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub md5: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGroupMetadata {
  pub id: u64,
  pub name: String,
  pub product_files: Vec<FileGroupProductFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroupProductFile {
  pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyMetadata {
  #[serde(default)]
  pub release: DependentRelease,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependentRelease {
  pub id: u64,
  pub version: String,
  pub product: DependentProduct,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependentProduct {
  pub id: u64,
  pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencySpecifierMetadata {
  pub product_slug: String,
  pub specifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradePathMetadata {
  pub id: u64,
  /// Regular expression matched against whole release versions
  pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradePathSpecifierMetadata {
  pub specifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReferenceMetadata {
  pub id: u64,
  pub name: String,
  pub image_path: String,
  pub digest: String,
  pub description: String,
  pub docs_url: String,
  pub system_requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactReferenceMetadata {
  pub id: u64,
  pub name: String,
  pub artifact_path: String,
  pub digest: String,
  pub description: String,
  pub docs_url: String,
  pub system_requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelmChartReferenceMetadata {
  pub id: u64,
  pub name: String,
  pub version: String,
  pub description: String,
  pub docs_url: String,
  pub system_requirements: Vec<String>,
}

impl Metadata {
  /// Parse a metadata file; an empty file is an empty document
  pub fn load(path: &Path) -> ResourceResult<Self> {
    if !path.is_file() {
      return Err(ValidationError::FileNotFound {
        path: path.to_path_buf(),
      }
      .into());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading metadata file {}", path.display()))?;
    Self::parse(&raw).with_context(|| format!("parsing metadata file {}", path.display()))
  }

  pub fn parse(raw: &str) -> ResourceResult<Self> {
    if raw.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(raw)?)
  }

  /// Check the document before anything is sent to the service
  pub fn validate(&self) -> ResourceResult<()> {
    for (i, product_file) in self.product_files.iter().enumerate() {
      if product_file.file.trim().is_empty() {
        return Err(ResourceError::invalid(format!(
          "empty value for file in product_files[{}]",
          i
        )));
      }
    }

    if let Some(release) = &self.release {
      let allowed = [ADMINS_ONLY, ALL_USERS, SELECTED_USER_GROUPS_ONLY];
      if !release.availability.is_empty() && !allowed.contains(&release.availability.as_str()) {
        return Err(
          ValidationError::NotOneOf {
            field: "availability".to_string(),
            value: release.availability.clone(),
            allowed: allowed.iter().map(|a| a.to_string()).collect(),
          }
          .into(),
        );
      }
      if release.availability == SELECTED_USER_GROUPS_ONLY && release.user_group_ids.is_empty() {
        return Err(ResourceError::with_help(
          format!("user_group_ids must be provided when availability is '{}'", SELECTED_USER_GROUPS_ONLY),
          "List the numeric ids of the user groups under `release.user_group_ids`.",
        ));
      }
    }

    Ok(())
  }

  /// Declared product file whose `file` equals `path`
  pub fn product_file(&self, path: &str) -> Option<&ProductFileMetadata> {
    self.product_files.iter().find(|pf| pf.file == path)
  }

  pub fn to_yaml(&self) -> ResourceResult<String> {
    Ok(serde_yaml::to_string(self)?)
  }

  pub fn to_json(&self) -> ResourceResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }
}

fn is_zero(n: &u64) -> bool {
  *n == 0
}

/// Accept user group ids written either as strings or as bare integers
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Item {
    Int(i64),
    Str(String),
  }

  let items = Option::<Vec<Item>>::deserialize(deserializer)?.unwrap_or_default();
  Ok(
    items
      .into_iter()
      .map(|item| match item {
        Item::Int(n) => n.to_string(),
        Item::Str(s) => s,
      })
      .collect(),
  )
}
