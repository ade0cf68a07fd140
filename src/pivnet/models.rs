//! Wire types for the Pivnet v2 API

use serde::{Deserialize, Deserializer, Serialize};

/// Availability that needs no visibility change
pub const ADMINS_ONLY: &str = "Admins Only";

/// Availability that makes a release visible to every user
pub const ALL_USERS: &str = "All Users";

/// Availability that requires user groups to be attached
pub const SELECTED_USER_GROUPS_ONLY: &str = "Selected User Groups Only";

/// Default type for uploaded product files
pub const DEFAULT_FILE_TYPE: &str = "Software";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: u64,
  pub slug: String,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eula {
  pub id: u64,
  pub slug: String,
  #[serde(default)]
  pub name: String,
}

/// A release as returned by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
  #[serde(default, deserialize_with = "nullable")]
  pub id: u64,
  #[serde(default, deserialize_with = "nullable")]
  pub version: String,
  #[serde(default, deserialize_with = "nullable")]
  pub release_type: String,
  #[serde(default, deserialize_with = "nullable")]
  pub release_date: String,
  #[serde(default, deserialize_with = "nullable")]
  pub release_notes_url: String,
  #[serde(default, deserialize_with = "nullable")]
  pub availability: String,
  #[serde(default, deserialize_with = "nullable")]
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub eula: Option<Eula>,
  #[serde(default, deserialize_with = "nullable")]
  pub controlled: bool,
  #[serde(default, deserialize_with = "nullable")]
  pub eccn: String,
  #[serde(default, deserialize_with = "nullable")]
  pub license_exception: String,
  #[serde(default, deserialize_with = "nullable")]
  pub end_of_support_date: String,
  #[serde(default, deserialize_with = "nullable")]
  pub end_of_guidance_date: String,
  #[serde(default, deserialize_with = "nullable")]
  pub end_of_availability_date: String,
  /// Server-side timestamp of the last product file change, used as fingerprint
  #[serde(default, deserialize_with = "nullable")]
  pub software_files_updated_at: String,
}

/// Body of a create-release request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateReleaseConfig {
  #[serde(skip)]
  pub product_slug: String,
  pub version: String,
  pub release_type: String,
  pub eula_slug: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub description: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub release_notes_url: String,
  pub release_date: String,
  pub controlled: bool,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub eccn: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub license_exception: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub end_of_support_date: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub end_of_guidance_date: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub end_of_availability_date: String,
  #[serde(skip)]
  pub copy_metadata: bool,
}

/// Partial release update that only touches availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseAvailability {
  pub id: u64,
  pub availability: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFile {
  #[serde(default, deserialize_with = "nullable")]
  pub id: u64,
  #[serde(default, deserialize_with = "nullable")]
  pub name: String,
  #[serde(default, deserialize_with = "nullable")]
  pub aws_object_key: String,
  #[serde(default, deserialize_with = "nullable")]
  pub file_type: String,
  #[serde(default, deserialize_with = "nullable")]
  pub file_version: String,
  #[serde(default, deserialize_with = "nullable")]
  pub md5: String,
  #[serde(default, deserialize_with = "nullable")]
  pub sha256: String,
  #[serde(default, deserialize_with = "nullable")]
  pub description: String,
  #[serde(default, deserialize_with = "nullable")]
  pub size: u64,
}

/// Body of a create-product-file request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateProductFileConfig {
  #[serde(skip)]
  pub product_slug: String,
  pub name: String,
  pub aws_object_key: String,
  pub file_version: String,
  pub md5: String,
  #[serde(skip_serializing_if = "String::is_empty")]
  pub description: String,
  pub file_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroup {
  pub id: u64,
  #[serde(default)]
  pub name: String,
}

/// Replication state of an image or artifact reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationStatus {
  #[default]
  InProgress,
  Complete,
  FailedToReplicate,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
  #[serde(default)]
  pub id: u64,
  pub name: String,
  pub image_path: String,
  pub digest: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub docs_url: String,
  #[serde(default)]
  pub system_requirements: Vec<String>,
  #[serde(default)]
  pub replication_status: ReplicationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
  #[serde(default)]
  pub id: u64,
  pub name: String,
  pub artifact_path: String,
  pub digest: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub docs_url: String,
  #[serde(default)]
  pub system_requirements: Vec<String>,
  #[serde(default)]
  pub replication_status: ReplicationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmChartReference {
  #[serde(default)]
  pub id: u64,
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub docs_url: String,
  #[serde(default)]
  pub system_requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpecifier {
  #[serde(default)]
  pub id: u64,
  pub product_slug: String,
  pub specifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePathSpecifier {
  #[serde(default)]
  pub id: u64,
  pub specifier: String,
}

/// Treat an explicit `null` as the field's default
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response envelopes: the service wraps every payload in a named key
pub(crate) mod envelope {
  use super::*;

  #[derive(Deserialize)]
  pub struct Eulas {
    pub eulas: Vec<Eula>,
  }

  #[derive(Deserialize)]
  pub struct ReleaseTypes {
    pub release_types: Vec<String>,
  }

  #[derive(Serialize, Deserialize)]
  pub struct OneRelease<T> {
    pub release: T,
  }

  #[derive(Deserialize)]
  pub struct Releases {
    pub releases: Vec<Release>,
  }

  #[derive(Serialize, Deserialize)]
  pub struct OneProductFile<T> {
    pub product_file: T,
  }

  #[derive(Deserialize)]
  pub struct ProductFiles {
    pub product_files: Vec<ProductFile>,
  }

  #[derive(Serialize, Deserialize)]
  pub struct OneFileGroup<T> {
    pub file_group: T,
  }

  #[derive(Serialize, Deserialize)]
  pub struct OneImageReference<T> {
    pub image_reference: T,
  }

  #[derive(Deserialize)]
  pub struct ImageReferences {
    pub image_references: Vec<ImageReference>,
  }

  #[derive(Serialize, Deserialize)]
  pub struct OneArtifactReference<T> {
    pub artifact_reference: T,
  }

  #[derive(Deserialize)]
  pub struct ArtifactReferences {
    pub artifact_references: Vec<ArtifactReference>,
  }

  #[derive(Serialize, Deserialize)]
  pub struct OneHelmChartReference<T> {
    pub helm_chart_reference: T,
  }

  #[derive(Deserialize)]
  pub struct HelmChartReferences {
    pub helm_chart_references: Vec<HelmChartReference>,
  }

  #[derive(Serialize)]
  pub struct Id {
    pub id: u64,
  }

  #[derive(Serialize)]
  pub struct ReleaseId {
    pub release_id: u64,
  }

  #[derive(Serialize)]
  pub struct Dependency {
    pub dependency: ReleaseId,
  }

  #[derive(Serialize)]
  pub struct UpgradePath {
    pub upgrade_path: ReleaseId,
  }

  #[derive(Serialize)]
  pub struct UserGroup {
    pub user_group: Id,
  }

  #[derive(Serialize)]
  pub struct NewDependencySpecifier<'a> {
    pub dependency_specifier: SpecifierBody<'a>,
  }

  #[derive(Serialize)]
  pub struct SpecifierBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_slug: Option<&'a str>,
    pub specifier: &'a str,
  }

  #[derive(Serialize)]
  pub struct NewUpgradePathSpecifier<'a> {
    pub upgrade_path_specifier: SpecifierBody<'a>,
  }

  #[derive(Deserialize)]
  pub struct DependencySpecifierResponse {
    pub dependency_specifier: DependencySpecifier,
  }

  #[derive(Deserialize)]
  pub struct UpgradePathSpecifierResponse {
    pub upgrade_path_specifier: UpgradePathSpecifier,
  }
}
