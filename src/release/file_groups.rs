//! Attach file groups to the release

use crate::core::error::ResourceResult;
use crate::metadata::Metadata;
use crate::pivnet::{PivnetClient, Release};
use tracing::info;

pub struct FileGroupsAdder<'a> {
  client: &'a dyn PivnetClient,
  metadata: &'a Metadata,
  product_slug: &'a str,
}

impl<'a> FileGroupsAdder<'a> {
  pub fn new(client: &'a dyn PivnetClient, metadata: &'a Metadata, product_slug: &'a str) -> Self {
    Self {
      client,
      metadata,
      product_slug,
    }
  }

  /// Groups with id 0 are created and filled with their declared product files
  pub fn add(&self, release: &Release) -> ResourceResult<()> {
    for group in &self.metadata.file_groups {
      let mut id = group.id;
      if id == 0 {
        info!(name = %group.name, "creating file group");
        id = self.client.create_file_group(self.product_slug, &group.name)?.id;
        for product_file in &group.product_files {
          self
            .client
            .add_product_file_to_file_group(self.product_slug, id, product_file.id)?;
        }
      }

      info!(file_group = id, release = release.id, "adding file group to release");
      self.client.add_file_group(self.product_slug, release.id, id)?;
    }
    Ok(())
  }
}
