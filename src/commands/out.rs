//! `out` - publish a new release
//!
//! Runs the publishing pipeline in a fixed order and stops at the first error.
//! Everything that can be checked locally is checked before the release is
//! created; nothing already done is undone when a later step fails.

use crate::core::config::{OutRequest, OutResponse};
use crate::core::error::{ResourceError, ResourceResult, ValidationError};
use crate::files::Globber;
use crate::metadata::Metadata;
use crate::pivnet::PivnetClient;
use crate::release::{
  ArtifactReferencesAdder, Clock, ContentStore, DependenciesAdder, DependencySpecifiersAdder, FileGroupsAdder,
  HelmChartReferencesAdder, ImageReferencesAdder, ReleaseCreator, ReleaseFinalizer, ReleaseUploader,
  ReplicationPoller, UpgradePathSpecifiersAdder, UpgradePathsAdder, UserGroupsUpdater,
};
use std::path::Path;
use tracing::info;

/// Run the out command with `sources_dir` as the root for every relative path
pub fn run_out(
  client: &dyn PivnetClient,
  store: Option<&dyn ContentStore>,
  clock: &dyn Clock,
  request: &OutRequest,
  sources_dir: &Path,
) -> ResourceResult<OutResponse> {
  let source = &request.source;
  let params = &request.params;
  source.validate()?;
  params.validate()?;

  let metadata = if params.metadata_file.is_empty() {
    Metadata::default()
  } else {
    Metadata::load(&sources_dir.join(&params.metadata_file))?
  };
  metadata.validate()?;

  let exact_globs = Globber::new(params.file_glob.as_str(), sources_dir).exact_globs()?;
  check_declared_files(&metadata, &exact_globs)?;
  check_unique_basenames(&exact_globs)?;

  let product_slug = source.product_slug.as_str();

  let release = ReleaseCreator::new(client, &metadata, sources_dir, source, params).create()?;
  info!(id = release.id, version = %release.version, "created release");

  ReleaseUploader::new(client, store, &metadata, params, sources_dir, product_slug).upload(&release, &exact_globs)?;

  let poller = ReplicationPoller::new(clock, params.poll_frequency(), params.async_timeout());
  FileGroupsAdder::new(client, &metadata, product_slug).add(&release)?;
  ImageReferencesAdder::new(client, &metadata, product_slug, &poller).add(&release)?;
  ArtifactReferencesAdder::new(client, &metadata, product_slug, &poller).add(&release)?;
  HelmChartReferencesAdder::new(client, &metadata, product_slug).add(&release)?;
  UpgradePathsAdder::new(client, &metadata, product_slug).add(&release)?;
  DependenciesAdder::new(client, &metadata, product_slug).add(&release)?;
  UpgradePathSpecifiersAdder::new(client, &metadata, product_slug).add(&release)?;
  DependencySpecifiersAdder::new(client, &metadata, product_slug).add(&release)?;

  let release = UserGroupsUpdater::new(client, &metadata, sources_dir, product_slug).update(release)?;

  let response = ReleaseFinalizer::new(client, product_slug).finalize(&release.version)?;
  info!(version = %response.version.product_version, "published release");
  Ok(response)
}

/// Every declared product file must be among the files that will be uploaded
fn check_declared_files(metadata: &Metadata, exact_globs: &[String]) -> ResourceResult<()> {
  let unmatched: Vec<String> = metadata
    .product_files
    .iter()
    .filter(|pf| !exact_globs.contains(&pf.file))
    .map(|pf| pf.file.clone())
    .collect();

  if unmatched.is_empty() {
    Ok(())
  } else {
    Err(ValidationError::UnmatchedProductFiles { files: unmatched }.into())
  }
}

/// Uploads are keyed by basename, so two matched files must not share one
fn check_unique_basenames(exact_globs: &[String]) -> ResourceResult<()> {
  let mut seen: Vec<&str> = Vec::new();
  let mut duplicates: Vec<&str> = Vec::new();
  for path in exact_globs {
    let basename = path.rsplit('/').next().unwrap_or(path);
    if seen.contains(&basename) {
      if !duplicates.contains(&basename) {
        duplicates.push(basename);
      }
    } else {
      seen.push(basename);
    }
  }

  if duplicates.is_empty() {
    return Ok(());
  }
  Err(ResourceError::invalid(format!(
    "multiple matched files share a basename: {}",
    duplicates.join(", ")
  )))
}
