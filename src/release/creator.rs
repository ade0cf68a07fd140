//! Create the release on the service

use crate::core::config::{OutParams, Source};
use crate::core::error::{ResourceError, ResourceResult, ValidationError};
use crate::metadata::{Metadata, MetadataFetcher, MetadataField};
use crate::pivnet::{CreateReleaseConfig, PivnetClient, Release};
use std::path::Path;
use tracing::info;

pub struct ReleaseCreator<'a> {
  client: &'a dyn PivnetClient,
  metadata: &'a Metadata,
  fetcher: MetadataFetcher<'a>,
  source: &'a Source,
  params: &'a OutParams,
}

impl<'a> ReleaseCreator<'a> {
  pub fn new(
    client: &'a dyn PivnetClient,
    metadata: &'a Metadata,
    sources_dir: &'a Path,
    source: &'a Source,
    params: &'a OutParams,
  ) -> Self {
    Self {
      client,
      metadata,
      fetcher: MetadataFetcher::new(metadata, sources_dir),
      source,
      params,
    }
  }

  /// Validate the requested release and create it
  ///
  /// Fails without creating anything when the EULA or release type is unknown,
  /// the version is empty, or a release with that version already exists.
  pub fn create(&self) -> ResourceResult<Release> {
    let eula_slugs: Vec<String> = self.client.eulas()?.into_iter().map(|e| e.slug).collect();
    let release_types = self.client.release_types()?;

    let eula_slug = self.fetcher.fetch(MetadataField::EulaSlug, &self.params.eula_slug_file);
    one_of("eula_slug", &eula_slug, &eula_slugs)?;

    let release_type = self
      .fetcher
      .fetch(MetadataField::ReleaseType, &self.params.release_type_file);
    one_of("release_type", &release_type, &release_types)?;

    let version = self.fetcher.fetch(MetadataField::Version, &self.params.version_file);
    if version.is_empty() {
      return Err(
        ValidationError::MissingField {
          field: "version".to_string(),
        }
        .into(),
      );
    }

    let product_slug = &self.source.product_slug;
    if self.client.releases(product_slug)?.iter().any(|r| r.version == version) {
      return Err(ResourceError::Conflict { version });
    }

    let mut release_date = self
      .fetcher
      .fetch(MetadataField::ReleaseDate, &self.params.release_date_file);
    if release_date.is_empty() {
      release_date = chrono::Local::now().format("%Y-%m-%d").to_string();
    }

    let mut config = CreateReleaseConfig {
      product_slug: product_slug.clone(),
      version,
      release_type,
      eula_slug,
      description: self
        .fetcher
        .fetch(MetadataField::Description, &self.params.description_file),
      release_notes_url: self.fetcher.fetch(MetadataField::ReleaseNotesUrl, ""),
      release_date,
      copy_metadata: self.source.copy_metadata,
      ..Default::default()
    };

    if let Some(release) = &self.metadata.release {
      config.controlled = release.controlled;
      config.eccn = release.eccn.clone();
      config.license_exception = release.license_exception.clone();
      config.end_of_support_date = release.end_of_support_date.clone();
      config.end_of_guidance_date = release.end_of_guidance_date.clone();
      config.end_of_availability_date = release.end_of_availability_date.clone();
    }

    info!(
      product = %config.product_slug,
      version = %config.version,
      release_type = %config.release_type,
      "creating release"
    );
    self.client.create_release(&config)
  }
}

fn one_of(field: &str, value: &str, allowed: &[String]) -> ResourceResult<()> {
  if allowed.iter().any(|a| a == value) {
    return Ok(());
  }
  Err(
    ValidationError::NotOneOf {
      field: field.to_string(),
      value: value.to_string(),
      allowed: allowed.to_vec(),
    }
    .into(),
  )
}
