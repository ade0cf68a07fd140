//! Read the published release back and build the `out` response

use crate::core::config::{MetadataPair, OutResponse, ResourceVersion};
use crate::core::error::ResourceResult;
use crate::pivnet::{PivnetClient, Release, release_for_version};
use crate::versions;

pub struct ReleaseFinalizer<'a> {
  client: &'a dyn PivnetClient,
  product_slug: &'a str,
}

impl<'a> ReleaseFinalizer<'a> {
  pub fn new(client: &'a dyn PivnetClient, product_slug: &'a str) -> Self {
    Self { client, product_slug }
  }

  pub fn finalize(&self, version: &str) -> ResourceResult<OutResponse> {
    let release = release_for_version(self.client, self.product_slug, version)?;
    Ok(OutResponse {
      version: ResourceVersion {
        product_version: versions::combine(&release.version, &release.software_files_updated_at),
      },
      metadata: metadata_pairs(&release),
    })
  }
}

/// Release attributes shown alongside a version
pub fn metadata_pairs(release: &Release) -> Vec<MetadataPair> {
  let mut pairs = vec![
    MetadataPair::new("version", &release.version),
    MetadataPair::new("release_type", &release.release_type),
    MetadataPair::new("release_date", &release.release_date),
    MetadataPair::new("description", &release.description),
    MetadataPair::new("release_notes_url", &release.release_notes_url),
    MetadataPair::new("availability", &release.availability),
    MetadataPair::new("controlled", release.controlled.to_string()),
    MetadataPair::new("eccn", &release.eccn),
    MetadataPair::new("license_exception", &release.license_exception),
    MetadataPair::new("end_of_support_date", &release.end_of_support_date),
    MetadataPair::new("end_of_guidance_date", &release.end_of_guidance_date),
    MetadataPair::new("end_of_availability_date", &release.end_of_availability_date),
  ];
  if let Some(eula) = &release.eula {
    pairs.push(MetadataPair::new("eula_slug", &eula.slug));
  }
  pairs
}
