//! Upload product files and register them with the release

use crate::core::config::OutParams;
use crate::core::error::{ResourceError, ResourceResult};
use crate::files::md5_file;
use crate::metadata::Metadata;
use crate::pivnet::{CreateProductFileConfig, DEFAULT_FILE_TYPE, PivnetClient, Release};
use std::path::Path;
use tracing::info;

/// Object storage that receives product file contents
pub trait ContentStore {
  /// Upload `local_path` under `remote_path`, returning the stored object key
  fn upload(&self, local_path: &Path, remote_path: &str) -> ResourceResult<String>;
}

/// Object key for an uploaded file: `product_files/<prefix>/<basename>`
pub fn remote_path(prefix: &str, basename: &str) -> String {
  format!("product_files/{}/{}", prefix.trim_matches('/'), basename)
}

pub struct ReleaseUploader<'a> {
  client: &'a dyn PivnetClient,
  store: Option<&'a dyn ContentStore>,
  metadata: &'a Metadata,
  params: &'a OutParams,
  sources_dir: &'a Path,
  product_slug: &'a str,
}

impl<'a> ReleaseUploader<'a> {
  pub fn new(
    client: &'a dyn PivnetClient,
    store: Option<&'a dyn ContentStore>,
    metadata: &'a Metadata,
    params: &'a OutParams,
    sources_dir: &'a Path,
    product_slug: &'a str,
  ) -> Self {
    Self {
      client,
      store,
      metadata,
      params,
      sources_dir,
      product_slug,
    }
  }

  /// Upload every matched file in order; the first failure stops the run
  ///
  /// The product id is looked up once before the first upload, so an unknown
  /// slug fails before anything reaches the content store.
  pub fn upload(&self, release: &Release, exact_globs: &[String]) -> ResourceResult<()> {
    if self.params.skip_upload() {
      info!("file glob or s3 filepath prefix not provided - skipping upload");
      return Ok(());
    }
    if exact_globs.is_empty() {
      return Ok(());
    }

    let store = self
      .store
      .ok_or_else(|| ResourceError::message("no content store configured for upload"))?;
    let product = self.client.product(self.product_slug)?;

    for glob_path in exact_globs {
      let local = self.sources_dir.join(glob_path);
      let basename = local
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ResourceError::invalid(format!("not a file: {}", glob_path)))?;

      let md5 = md5_file(&local)?;
      info!(file = %glob_path, %md5, "uploading product file");
      let aws_object_key = store.upload(&local, &remote_path(&self.params.s3_filepath_prefix, &basename))?;

      let mut name = basename;
      let mut file_type = DEFAULT_FILE_TYPE.to_string();
      let mut description = String::new();
      if let Some(declared) = self.metadata.product_file(glob_path) {
        if let Some(upload_as) = declared.upload_as.as_deref().filter(|s| !s.is_empty()) {
          name = upload_as.to_string();
        }
        if let Some(declared_type) = declared.file_type.as_deref().filter(|s| !s.is_empty()) {
          file_type = declared_type.to_string();
        }
        description = declared.description.clone();
      }

      let product_file = self.client.create_product_file(&CreateProductFileConfig {
        product_slug: self.product_slug.to_string(),
        name,
        aws_object_key,
        file_version: release.version.clone(),
        md5,
        description,
        file_type,
      })?;

      info!(id = product_file.id, name = %product_file.name, release = release.id, "adding product file to release");
      self.client.add_product_file(product.id, release.id, product_file.id)?;
    }

    Ok(())
  }
}
