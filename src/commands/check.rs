//! `check` - discover new release versions
//!
//! Lists the product's releases, applies the source filters and reports every
//! version newer than the one Concourse already has, oldest first.

use crate::core::config::{CheckRequest, ResourceVersion, SortBy};
use crate::core::error::ResourceResult;
use crate::pivnet::{PivnetClient, Release};
use crate::versions;
use tracing::{debug, info, warn};

/// Run the check command
pub fn run_check(client: &dyn PivnetClient, request: &CheckRequest) -> ResourceResult<Vec<ResourceVersion>> {
  let source = &request.source;
  source.validate()?;

  let mut releases = client.releases(&source.product_slug)?;
  debug!(count = releases.len(), "fetched releases");

  if let Some(release_type) = source.release_type.as_deref().filter(|t| !t.is_empty()) {
    releases.retain(|r| r.release_type == release_type);
  }
  if let Some(pattern) = source.product_version.as_deref().filter(|p| !p.is_empty()) {
    let re = versions::anchored(pattern)?;
    releases.retain(|r| re.is_match(&r.version));
  }
  if source.sort_by == SortBy::Semver {
    releases = sort_semver_desc(releases);
  }

  // Newest first from here on
  let tokens: Vec<String> = releases
    .iter()
    .map(|r| versions::combine(&r.version, &r.software_files_updated_at))
    .collect();

  let Some(latest) = tokens.first() else {
    info!(product = %source.product_slug, "no releases found");
    return Ok(Vec::new());
  };

  let current = request.version.as_ref().map(|v| v.product_version.as_str());
  let newer = match current.and_then(|c| tokens.iter().position(|t| t == c)) {
    Some(index) => tokens[..=index].iter().rev().cloned().collect(),
    None => vec![latest.clone()],
  };

  info!(product = %source.product_slug, count = newer.len(), "versions found");
  Ok(
    newer
      .into_iter()
      .map(|product_version| ResourceVersion { product_version })
      .collect(),
  )
}

fn sort_semver_desc(releases: Vec<Release>) -> Vec<Release> {
  let mut parsed: Vec<(semver::Version, Release)> = releases
    .into_iter()
    .filter_map(|r| match versions::parse_lenient(&r.version) {
      Some(v) => Some((v, r)),
      None => {
        warn!(version = %r.version, "ignoring release with non-semver version");
        None
      }
    })
    .collect();
  parsed.sort_by(|a, b| b.0.cmp(&a.0));
  parsed.into_iter().map(|(_, r)| r).collect()
}
