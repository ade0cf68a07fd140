//! Resolve release attributes from metadata or fallback files

use super::{Metadata, ReleaseMetadata};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Release attributes that can be fetched by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
  Version,
  ReleaseType,
  EulaSlug,
  Description,
  ReleaseNotesUrl,
  ReleaseDate,
  Availability,
  Controlled,
  Eccn,
  LicenseException,
  EndOfSupportDate,
  EndOfGuidanceDate,
  EndOfAvailabilityDate,
  UserGroupIds,
}

impl MetadataField {
  pub const ALL: [MetadataField; 14] = [
    MetadataField::Version,
    MetadataField::ReleaseType,
    MetadataField::EulaSlug,
    MetadataField::Description,
    MetadataField::ReleaseNotesUrl,
    MetadataField::ReleaseDate,
    MetadataField::Availability,
    MetadataField::Controlled,
    MetadataField::Eccn,
    MetadataField::LicenseException,
    MetadataField::EndOfSupportDate,
    MetadataField::EndOfGuidanceDate,
    MetadataField::EndOfAvailabilityDate,
    MetadataField::UserGroupIds,
  ];

  /// Key as written in metadata files
  pub fn key(self) -> &'static str {
    match self {
      MetadataField::Version => "version",
      MetadataField::ReleaseType => "release_type",
      MetadataField::EulaSlug => "eula_slug",
      MetadataField::Description => "description",
      MetadataField::ReleaseNotesUrl => "release_notes_url",
      MetadataField::ReleaseDate => "release_date",
      MetadataField::Availability => "availability",
      MetadataField::Controlled => "controlled",
      MetadataField::Eccn => "eccn",
      MetadataField::LicenseException => "license_exception",
      MetadataField::EndOfSupportDate => "end_of_support_date",
      MetadataField::EndOfGuidanceDate => "end_of_guidance_date",
      MetadataField::EndOfAvailabilityDate => "end_of_availability_date",
      MetadataField::UserGroupIds => "user_group_ids",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|f| f.key() == key)
  }

  fn read(self, release: &ReleaseMetadata) -> String {
    match self {
      MetadataField::Version => release.version.clone(),
      MetadataField::ReleaseType => release.release_type.clone(),
      MetadataField::EulaSlug => release.eula_slug.clone(),
      MetadataField::Description => release.description.clone(),
      MetadataField::ReleaseNotesUrl => release.release_notes_url.clone(),
      MetadataField::ReleaseDate => release.release_date.clone(),
      MetadataField::Availability => release.availability.clone(),
      MetadataField::Controlled => release.controlled.to_string(),
      MetadataField::Eccn => release.eccn.clone(),
      MetadataField::LicenseException => release.license_exception.clone(),
      MetadataField::EndOfSupportDate => release.end_of_support_date.clone(),
      MetadataField::EndOfGuidanceDate => release.end_of_guidance_date.clone(),
      MetadataField::EndOfAvailabilityDate => release.end_of_availability_date.clone(),
      MetadataField::UserGroupIds => release.user_group_ids.join(","),
    }
  }
}

/// Looks a field up in the `release` block, or reads it from a file under the sources dir
pub struct MetadataFetcher<'a> {
  metadata: &'a Metadata,
  sources_dir: &'a Path,
}

impl<'a> MetadataFetcher<'a> {
  pub fn new(metadata: &'a Metadata, sources_dir: &'a Path) -> Self {
    Self { metadata, sources_dir }
  }

  /// Never fails: anything unresolvable comes back as an empty string
  pub fn fetch(&self, field: MetadataField, fallback_file: &str) -> String {
    if let Some(release) = &self.metadata.release {
      return field.read(release);
    }

    if fallback_file.is_empty() {
      debug!(field = field.key(), "no release metadata and no fallback file");
      return String::new();
    }

    let path = self.sources_dir.join(fallback_file);
    match fs::read_to_string(&path) {
      Ok(contents) => contents.trim().to_string(),
      Err(e) => {
        debug!(field = field.key(), path = %path.display(), error = %e, "fallback file unreadable");
        String::new()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_key_round_trip_covers_every_field() {
    for field in MetadataField::ALL {
      assert_eq!(MetadataField::from_key(field.key()), Some(field));
    }
    assert_eq!(MetadataField::from_key("nope"), None);
  }

  #[test]
  fn test_release_block_wins_over_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("version"), "9.9.9").unwrap();
    let metadata = Metadata {
      release: Some(ReleaseMetadata {
        version: "1.0.0".to_string(),
        controlled: true,
        user_group_ids: vec!["111".to_string(), "222".to_string()],
        ..Default::default()
      }),
      ..Default::default()
    };
    let fetcher = MetadataFetcher::new(&metadata, dir.path());
    assert_eq!(fetcher.fetch(MetadataField::Version, "version"), "1.0.0");
    assert_eq!(fetcher.fetch(MetadataField::Controlled, ""), "true");
    assert_eq!(fetcher.fetch(MetadataField::UserGroupIds, ""), "111,222");
    assert_eq!(fetcher.fetch(MetadataField::Eccn, "eccn"), "");
  }

  #[test]
  fn test_fallback_file_is_trimmed() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("release")).unwrap();
    fs::write(dir.path().join("release/version"), "  2.3.4\n").unwrap();
    let metadata = Metadata::default();
    let fetcher = MetadataFetcher::new(&metadata, dir.path());
    assert_eq!(fetcher.fetch(MetadataField::Version, "release/version"), "2.3.4");
  }

  #[test]
  fn test_missing_fallback_yields_empty() {
    let dir = TempDir::new().unwrap();
    let metadata = Metadata::default();
    let fetcher = MetadataFetcher::new(&metadata, dir.path());
    assert_eq!(fetcher.fetch(MetadataField::Description, ""), "");
    assert_eq!(fetcher.fetch(MetadataField::Description, "missing"), "");
  }
}
