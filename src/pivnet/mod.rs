//! Pivnet API access
//!
//! Every pipeline step talks to the service through the [`PivnetClient`] trait so
//! the publishing logic can be exercised against an in-memory fake. The
//! production implementation is [`http::HttpClient`], a blocking reqwest client
//! that makes exactly one attempt per call.

pub mod http;
pub mod models;

#[cfg(test)]
pub mod fake;

use crate::core::error::{ResourceError, ResourceResult};
use std::io::Write;

pub use models::*;

/// Typed operations against the Pivnet v2 API
///
/// Calls that attach one entity to another return `()`; the service answers
/// them with an empty body.
pub trait PivnetClient {
  // EULAs and release types
  fn eulas(&self) -> ResourceResult<Vec<Eula>>;
  fn accept_eula(&self, product_slug: &str, release_id: u64) -> ResourceResult<()>;
  fn release_types(&self) -> ResourceResult<Vec<String>>;

  // Releases
  fn releases(&self, product_slug: &str) -> ResourceResult<Vec<Release>>;
  fn release(&self, product_slug: &str, release_id: u64) -> ResourceResult<Release>;
  fn create_release(&self, config: &CreateReleaseConfig) -> ResourceResult<Release>;
  fn update_release_availability(&self, product_slug: &str, update: &ReleaseAvailability) -> ResourceResult<Release>;

  // Products and product files
  fn product(&self, product_slug: &str) -> ResourceResult<Product>;
  fn product_files_for_release(&self, product_slug: &str, release_id: u64) -> ResourceResult<Vec<ProductFile>>;
  fn download_product_file(
    &self,
    product_slug: &str,
    release_id: u64,
    product_file_id: u64,
    sink: &mut dyn Write,
  ) -> ResourceResult<u64>;
  fn create_product_file(&self, config: &CreateProductFileConfig) -> ResourceResult<ProductFile>;
  fn add_product_file(&self, product_id: u64, release_id: u64, product_file_id: u64) -> ResourceResult<()>;

  // File groups
  fn create_file_group(&self, product_slug: &str, name: &str) -> ResourceResult<FileGroup>;
  fn add_product_file_to_file_group(
    &self,
    product_slug: &str,
    file_group_id: u64,
    product_file_id: u64,
  ) -> ResourceResult<()>;
  fn add_file_group(&self, product_slug: &str, release_id: u64, file_group_id: u64) -> ResourceResult<()>;

  // Dependencies, upgrade paths and specifiers
  fn add_dependency(&self, product_slug: &str, release_id: u64, dependent_release_id: u64) -> ResourceResult<()>;
  fn add_upgrade_path(&self, product_slug: &str, release_id: u64, previous_release_id: u64) -> ResourceResult<()>;
  fn create_dependency_specifier(
    &self,
    product_slug: &str,
    release_id: u64,
    dependent_product_slug: &str,
    specifier: &str,
  ) -> ResourceResult<DependencySpecifier>;
  fn create_upgrade_path_specifier(
    &self,
    product_slug: &str,
    release_id: u64,
    specifier: &str,
  ) -> ResourceResult<UpgradePathSpecifier>;

  // User groups
  fn add_user_group(&self, product_slug: &str, release_id: u64, user_group_id: u64) -> ResourceResult<()>;

  // Image references
  fn image_references(&self, product_slug: &str) -> ResourceResult<Vec<ImageReference>>;
  fn image_reference(&self, product_slug: &str, id: u64) -> ResourceResult<ImageReference>;
  fn create_image_reference(&self, product_slug: &str, reference: &ImageReference) -> ResourceResult<ImageReference>;
  fn add_image_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()>;

  // Artifact references
  fn artifact_references(&self, product_slug: &str) -> ResourceResult<Vec<ArtifactReference>>;
  fn artifact_reference(&self, product_slug: &str, id: u64) -> ResourceResult<ArtifactReference>;
  fn create_artifact_reference(
    &self,
    product_slug: &str,
    reference: &ArtifactReference,
  ) -> ResourceResult<ArtifactReference>;
  fn add_artifact_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()>;

  // Helm chart references
  fn helm_chart_references(&self, product_slug: &str) -> ResourceResult<Vec<HelmChartReference>>;
  fn create_helm_chart_reference(
    &self,
    product_slug: &str,
    reference: &HelmChartReference,
  ) -> ResourceResult<HelmChartReference>;
  fn add_helm_chart_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()>;
}

/// Find a release of `product_slug` by exact version
pub fn release_for_version(client: &dyn PivnetClient, product_slug: &str, version: &str) -> ResourceResult<Release> {
  client
    .releases(product_slug)?
    .into_iter()
    .find(|r| r.version == version)
    .ok_or_else(|| {
      ResourceError::message(format!(
        "release not found for product: {}, version: {}",
        product_slug, version
      ))
    })
}
