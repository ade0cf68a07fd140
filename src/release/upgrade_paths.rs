//! Attach upgrade paths and upgrade path specifiers to the release

use crate::core::error::{ResourceError, ResourceResult};
use crate::metadata::Metadata;
use crate::pivnet::{PivnetClient, Release};
use crate::versions;
use std::collections::HashSet;
use tracing::{debug, info};

pub struct UpgradePathsAdder<'a> {
  client: &'a dyn PivnetClient,
  metadata: &'a Metadata,
  product_slug: &'a str,
}

impl<'a> UpgradePathsAdder<'a> {
  pub fn new(client: &'a dyn PivnetClient, metadata: &'a Metadata, product_slug: &'a str) -> Self {
    Self {
      client,
      metadata,
      product_slug,
    }
  }

  /// Resolve every declared path to release ids, then attach each id once
  ///
  /// A declared version is a regex over the product's release versions and may
  /// match several releases. The release being published is never its own
  /// upgrade path.
  pub fn add(&self, release: &Release) -> ResourceResult<()> {
    if self.metadata.upgrade_paths.is_empty() {
      return Ok(());
    }

    let mut targets: Vec<u64> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut all_releases: Option<Vec<Release>> = None;

    for (i, path) in self.metadata.upgrade_paths.iter().enumerate() {
      if path.id != 0 {
        if seen.insert(path.id) {
          targets.push(path.id);
        }
        continue;
      }

      if path.version.is_empty() {
        return Err(ResourceError::invalid(format!(
          "Either id or version must be provided for upgrade_paths[{}]",
          i
        )));
      }

      if all_releases.is_none() {
        all_releases = Some(self.client.releases(self.product_slug)?);
      }
      let releases = all_releases.as_deref().unwrap_or_default();
      let pattern = versions::anchored(&path.version)?;
      let matched: Vec<&Release> = releases.iter().filter(|r| pattern.is_match(&r.version)).collect();
      if matched.is_empty() {
        return Err(ResourceError::invalid(format!(
          "no releases found matching version: '{}' for upgrade_paths[{}]",
          path.version, i
        )));
      }
      for r in matched {
        if seen.insert(r.id) {
          targets.push(r.id);
        }
      }
    }

    for id in targets {
      if id == release.id {
        debug!(release = id, "skipping upgrade path to the release itself");
        continue;
      }
      info!(previous_release = id, release = release.id, "adding upgrade path");
      self.client.add_upgrade_path(self.product_slug, release.id, id)?;
    }
    Ok(())
  }
}

pub struct UpgradePathSpecifiersAdder<'a> {
  client: &'a dyn PivnetClient,
  metadata: &'a Metadata,
  product_slug: &'a str,
}

impl<'a> UpgradePathSpecifiersAdder<'a> {
  pub fn new(client: &'a dyn PivnetClient, metadata: &'a Metadata, product_slug: &'a str) -> Self {
    Self {
      client,
      metadata,
      product_slug,
    }
  }

  pub fn add(&self, release: &Release) -> ResourceResult<()> {
    for specifier in &self.metadata.upgrade_path_specifiers {
      info!(specifier = %specifier.specifier, "adding upgrade path specifier");
      self
        .client
        .create_upgrade_path_specifier(self.product_slug, release.id, &specifier.specifier)?;
    }
    Ok(())
  }
}
