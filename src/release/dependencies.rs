//! Attach dependencies and dependency specifiers to the release

use crate::core::error::{ResourceError, ResourceResult};
use crate::metadata::Metadata;
use crate::pivnet::{PivnetClient, Release, release_for_version};
use tracing::info;

pub struct DependenciesAdder<'a> {
  client: &'a dyn PivnetClient,
  metadata: &'a Metadata,
  product_slug: &'a str,
}

impl<'a> DependenciesAdder<'a> {
  pub fn new(client: &'a dyn PivnetClient, metadata: &'a Metadata, product_slug: &'a str) -> Self {
    Self {
      client,
      metadata,
      product_slug,
    }
  }

  /// Dependencies without a release id are looked up by product slug and version
  pub fn add(&self, release: &Release) -> ResourceResult<()> {
    for (i, dependency) in self.metadata.dependencies.iter().enumerate() {
      let declared = &dependency.release;
      let mut dependent_id = declared.id;
      if dependent_id == 0 {
        if declared.version.is_empty() || declared.product.slug.is_empty() {
          return Err(ResourceError::invalid(format!(
            "Either ReleaseID or release version and product slug must be provided for dependencies[{}]",
            i
          )));
        }
        info!(product = %declared.product.slug, version = %declared.version, "looking up dependent release");
        dependent_id = release_for_version(self.client, &declared.product.slug, &declared.version)?.id;
      }

      info!(dependent_release = dependent_id, release = release.id, "adding dependency");
      self.client.add_dependency(self.product_slug, release.id, dependent_id)?;
    }
    Ok(())
  }
}

pub struct DependencySpecifiersAdder<'a> {
  client: &'a dyn PivnetClient,
  metadata: &'a Metadata,
  product_slug: &'a str,
}

impl<'a> DependencySpecifiersAdder<'a> {
  pub fn new(client: &'a dyn PivnetClient, metadata: &'a Metadata, product_slug: &'a str) -> Self {
    Self {
      client,
      metadata,
      product_slug,
    }
  }

  pub fn add(&self, release: &Release) -> ResourceResult<()> {
    for specifier in &self.metadata.dependency_specifiers {
      info!(
        dependent_product = %specifier.product_slug,
        specifier = %specifier.specifier,
        "adding dependency specifier"
      );
      self.client.create_dependency_specifier(
        self.product_slug,
        release.id,
        &specifier.product_slug,
        &specifier.specifier,
      )?;
    }
    Ok(())
  }
}
