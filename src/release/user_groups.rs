//! Apply release availability and user group access

use crate::core::error::{ResourceError, ResourceResult};
use crate::metadata::{Metadata, MetadataFetcher, MetadataField};
use crate::pivnet::{ADMINS_ONLY, PivnetClient, Release, ReleaseAvailability, SELECTED_USER_GROUPS_ONLY};
use std::path::Path;
use tracing::info;

pub struct UserGroupsUpdater<'a> {
  client: &'a dyn PivnetClient,
  fetcher: MetadataFetcher<'a>,
  product_slug: &'a str,
}

impl<'a> UserGroupsUpdater<'a> {
  pub fn new(
    client: &'a dyn PivnetClient,
    metadata: &'a Metadata,
    sources_dir: &'a Path,
    product_slug: &'a str,
  ) -> Self {
    Self {
      client,
      fetcher: MetadataFetcher::new(metadata, sources_dir),
      product_slug,
    }
  }

  /// Returns the release as the service reports it after the change
  ///
  /// Releases are created admin-only, so that availability needs no call at all.
  pub fn update(&self, release: Release) -> ResourceResult<Release> {
    let availability = self.fetcher.fetch(MetadataField::Availability, "");
    if availability.is_empty() || availability == ADMINS_ONLY {
      return Ok(release);
    }

    info!(release = release.id, availability = %availability, "updating release availability");
    let updated = self.client.update_release_availability(
      self.product_slug,
      &ReleaseAvailability {
        id: release.id,
        availability: availability.clone(),
      },
    )?;

    if availability == SELECTED_USER_GROUPS_ONLY {
      let ids = self.fetcher.fetch(MetadataField::UserGroupIds, "");
      for raw in ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let user_group_id: u64 = raw
          .parse()
          .map_err(|e| ResourceError::invalid(format!("invalid user group id '{}': {}", raw, e)))?;
        info!(user_group = user_group_id, release = updated.id, "adding user group to release");
        self.client.add_user_group(self.product_slug, updated.id, user_group_id)?;
      }
    }

    Ok(updated)
  }
}
