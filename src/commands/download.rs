//! `in` - fetch a release's product files and metadata
//!
//! Writes into the destination directory:
//! - every selected product file, verified against its published checksum
//! - `version`: the release version
//! - `metadata.json` / `metadata.yaml`: the release and its product files

use crate::core::config::{InParams, InRequest, InResponse, ResourceVersion};
use crate::core::error::{ResourceError, ResourceResult, ResultExt};
use crate::files::{md5_file, sha256_file};
use crate::metadata::{Metadata, ProductFileMetadata, ReleaseMetadata};
use crate::pivnet::{PivnetClient, ProductFile, Release, release_for_version};
use crate::release::metadata_pairs;
use crate::ui::progress::{DownloadProgress, ProgressWriter};
use crate::versions;
use glob::Pattern;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Run the in command against `dest`
pub fn run_in(
  client: &(dyn PivnetClient + Sync),
  request: &InRequest,
  dest: &Path,
  show_progress: bool,
) -> ResourceResult<InResponse> {
  let source = &request.source;
  source.validate()?;
  let product_slug = source.product_slug.as_str();

  let (version, fingerprint) = versions::split(&request.version.product_version);
  let release = release_for_version(client, product_slug, &version)?;
  if !fingerprint.is_empty() && fingerprint != release.software_files_updated_at {
    return Err(ResourceError::with_help(
      format!(
        "provided fingerprint: '{}' does not match fingerprint of release: '{}'",
        fingerprint, release.software_files_updated_at
      ),
      "The release's files changed after this version was checked; run check again.",
    ));
  }

  info!(product = product_slug, version = %release.version, "accepting EULA");
  client.accept_eula(product_slug, release.id)?;

  let product_files = client.product_files_for_release(product_slug, release.id)?;
  fs::create_dir_all(dest).with_context(|| format!("creating {}", dest.display()))?;

  if request.params.skip_download {
    info!("skipping download of product files");
  } else {
    let selected = select_files(&product_files, &request.params)?;
    download_all(client, product_slug, release.id, &selected, dest, show_progress)?;
  }

  write_outputs(&release, &product_files, dest)?;

  Ok(InResponse {
    version: ResourceVersion {
      product_version: versions::combine(&release.version, &release.software_files_updated_at),
    },
    metadata: metadata_pairs(&release),
  })
}

/// Product files selected by `globs`, matched against the object key's basename
///
/// No globs selects everything; an empty list selects nothing.
fn select_files<'f>(product_files: &'f [ProductFile], params: &InParams) -> ResourceResult<Vec<&'f ProductFile>> {
  let Some(globs) = &params.globs else {
    return Ok(product_files.iter().collect());
  };

  let mut selected: Vec<&ProductFile> = Vec::new();
  for glob in globs {
    let pattern = Pattern::new(glob)?;
    let mut matched = false;
    for file in product_files {
      if pattern.matches(basename(file)) {
        matched = true;
        if !selected.iter().any(|s| s.id == file.id) {
          selected.push(file);
        }
      }
    }
    if !matched {
      return Err(ResourceError::invalid(format!("no product files match glob: '{}'", glob)));
    }
  }
  Ok(selected)
}

fn basename(file: &ProductFile) -> &str {
  let key = if file.aws_object_key.is_empty() {
    &file.name
  } else {
    &file.aws_object_key
  };
  key.rsplit('/').next().unwrap_or(key)
}

fn download_all(
  client: &(dyn PivnetClient + Sync),
  product_slug: &str,
  release_id: u64,
  files: &[&ProductFile],
  dest: &Path,
  show_progress: bool,
) -> ResourceResult<()> {
  let progress = show_progress.then(DownloadProgress::new);

  files
    .par_iter()
    .map(|file| {
      let name = basename(file);
      let path = dest.join(name);
      debug!(file = name, id = file.id, "downloading product file");

      let out = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
      let tracker = progress.as_ref().map(|p| (p.clone(), p.add_file(file.size, name)));
      let mut writer = ProgressWriter::new(BufWriter::new(out), tracker);
      client.download_product_file(product_slug, release_id, file.id, &mut writer)?;
      writer.flush().with_context(|| format!("writing {}", path.display()))?;
      drop(writer);

      verify(file, &path)
    })
    .collect::<ResourceResult<Vec<()>>>()?;

  info!(count = files.len(), "downloaded product files");
  Ok(())
}

/// Compare against SHA-256 when published, MD5 otherwise
fn verify(file: &ProductFile, path: &Path) -> ResourceResult<()> {
  let (kind, expected, actual) = if !file.sha256.is_empty() {
    ("SHA256", &file.sha256, sha256_file(path)?)
  } else if !file.md5.is_empty() {
    ("MD5", &file.md5, md5_file(path)?)
  } else {
    debug!(file = %path.display(), "no published checksum to verify");
    return Ok(());
  };

  if !expected.eq_ignore_ascii_case(&actual) {
    return Err(ResourceError::message(format!(
      "{} checksum mismatch for {}: expected {}, got {}",
      kind,
      path.display(),
      expected,
      actual
    )));
  }
  Ok(())
}

fn write_outputs(release: &Release, product_files: &[ProductFile], dest: &Path) -> ResourceResult<()> {
  let metadata = Metadata {
    release: Some(ReleaseMetadata {
      version: release.version.clone(),
      release_type: release.release_type.clone(),
      eula_slug: release.eula.as_ref().map(|e| e.slug.clone()).unwrap_or_default(),
      description: release.description.clone(),
      release_notes_url: release.release_notes_url.clone(),
      release_date: release.release_date.clone(),
      availability: release.availability.clone(),
      controlled: release.controlled,
      eccn: release.eccn.clone(),
      license_exception: release.license_exception.clone(),
      end_of_support_date: release.end_of_support_date.clone(),
      end_of_guidance_date: release.end_of_guidance_date.clone(),
      end_of_availability_date: release.end_of_availability_date.clone(),
      user_group_ids: Vec::new(),
    }),
    product_files: product_files
      .iter()
      .map(|pf| ProductFileMetadata {
        file: pf.name.clone(),
        description: pf.description.clone(),
        upload_as: None,
        file_type: Some(pf.file_type.clone()).filter(|t| !t.is_empty()),
        id: pf.id,
        aws_object_key: pf.aws_object_key.clone(),
        file_version: pf.file_version.clone(),
        sha256: pf.sha256.clone(),
        md5: pf.md5.clone(),
      })
      .collect(),
    ..Default::default()
  };

  fs::write(dest.join("version"), &release.version)?;
  fs::write(dest.join("metadata.json"), metadata.to_json()?)?;
  fs::write(dest.join("metadata.yaml"), metadata.to_yaml()?)?;
  Ok(())
}
