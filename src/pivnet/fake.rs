//! In-memory [`PivnetClient`] for unit tests
//!
//! Thread-safe so parallel downloads can share it.
//!
//! Records every call as a short string (`"<operation> <args...>"`) so tests can
//! assert on the exact sequence of service interactions.

use super::*;
use crate::core::error::TransportError;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::collections::{HashMap, HashSet, VecDeque};

pub struct FakePivnet {
  pub eulas: Vec<Eula>,
  pub release_types: Vec<String>,
  pub product: Product,
  releases: Mutex<HashMap<String, Vec<Release>>>,
  product_files: Mutex<HashMap<u64, Vec<ProductFile>>>,
  file_contents: Mutex<HashMap<u64, Vec<u8>>>,
  image_references: Mutex<Vec<ImageReference>>,
  artifact_references: Mutex<Vec<ArtifactReference>>,
  helm_chart_references: Mutex<Vec<HelmChartReference>>,
  statuses: Mutex<HashMap<u64, VecDeque<ReplicationStatus>>>,
  failing: Mutex<HashSet<String>>,
  calls: Mutex<Vec<String>>,
  next_id: AtomicU64,
}

impl FakePivnet {
  pub fn new(product_slug: &str) -> Self {
    Self {
      eulas: vec![Eula {
        id: 1,
        slug: "pivotal_software_eula".to_string(),
        name: "Pivotal Software EULA".to_string(),
      }],
      release_types: vec!["Major Release".to_string(), "Minor Release".to_string()],
      product: Product {
        id: 42,
        slug: product_slug.to_string(),
        name: product_slug.to_string(),
      },
      releases: Mutex::new(HashMap::new()),
      product_files: Mutex::new(HashMap::new()),
      file_contents: Mutex::new(HashMap::new()),
      image_references: Mutex::new(Vec::new()),
      artifact_references: Mutex::new(Vec::new()),
      helm_chart_references: Mutex::new(Vec::new()),
      statuses: Mutex::new(HashMap::new()),
      failing: Mutex::new(HashSet::new()),
      calls: Mutex::new(Vec::new()),
      next_id: AtomicU64::new(1000),
    }
  }

  pub fn with_release(self, product_slug: &str, release: Release) -> Self {
    self
      .releases
      .lock().unwrap()
      .entry(product_slug.to_string())
      .or_default()
      .push(release);
    self
  }

  pub fn with_product_file(self, release_id: u64, file: ProductFile, contents: &[u8]) -> Self {
    self.file_contents.lock().unwrap().insert(file.id, contents.to_vec());
    self.product_files.lock().unwrap().entry(release_id).or_default().push(file);
    self
  }

  pub fn with_image_reference(self, reference: ImageReference) -> Self {
    self.image_references.lock().unwrap().push(reference);
    self
  }

  pub fn with_artifact_reference(self, reference: ArtifactReference) -> Self {
    self.artifact_references.lock().unwrap().push(reference);
    self
  }

  pub fn with_helm_chart_reference(self, reference: HelmChartReference) -> Self {
    self.helm_chart_references.lock().unwrap().push(reference);
    self
  }

  /// Statuses returned by successive status checks for reference `id`; the last one repeats
  pub fn with_statuses(self, id: u64, statuses: &[ReplicationStatus]) -> Self {
    self.statuses.lock().unwrap().insert(id, statuses.iter().copied().collect());
    self
  }

  /// Make every call to `operation` fail with a 500
  pub fn failing(self, operation: &str) -> Self {
    self.failing.lock().unwrap().insert(operation.to_string());
    self
  }

  /// The id the next created entity will get
  pub fn peek_next_id(&self) -> u64 {
    self.next_id.load(Ordering::SeqCst)
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Calls whose operation name equals `operation`
  pub fn calls_to(&self, operation: &str) -> Vec<String> {
    self
      .calls
      .lock().unwrap()
      .iter()
      .filter(|c| c.split(' ').next() == Some(operation))
      .cloned()
      .collect()
  }

  fn record(&self, operation: &str, args: &[String]) -> ResourceResult<()> {
    let mut entry = operation.to_string();
    for arg in args {
      entry.push(' ');
      entry.push_str(arg);
    }
    self.calls.lock().unwrap().push(entry);

    if self.failing.lock().unwrap().contains(operation) {
      return Err(
        TransportError::Status {
          method: "FAKE".to_string(),
          url: operation.to_string(),
          expected: 200,
          actual: 500,
          message: format!("{} failed", operation),
        }
        .into(),
      );
    }
    Ok(())
  }

  fn next_id(&self) -> u64 {
    self.next_id.fetch_add(1, Ordering::SeqCst)
  }

  fn status_for(&self, id: u64) -> ReplicationStatus {
    let mut statuses = self.statuses.lock().unwrap();
    match statuses.get_mut(&id) {
      Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(ReplicationStatus::Complete),
      Some(queue) => queue.front().copied().unwrap_or(ReplicationStatus::Complete),
      None => ReplicationStatus::Complete,
    }
  }
}

impl PivnetClient for FakePivnet {
  fn eulas(&self) -> ResourceResult<Vec<Eula>> {
    self.record("eulas", &[])?;
    Ok(self.eulas.clone())
  }

  fn accept_eula(&self, product_slug: &str, release_id: u64) -> ResourceResult<()> {
    self.record("accept_eula", &[product_slug.to_string(), release_id.to_string()])
  }

  fn release_types(&self) -> ResourceResult<Vec<String>> {
    self.record("release_types", &[])?;
    Ok(self.release_types.clone())
  }

  fn releases(&self, product_slug: &str) -> ResourceResult<Vec<Release>> {
    self.record("releases", &[product_slug.to_string()])?;
    Ok(self.releases.lock().unwrap().get(product_slug).cloned().unwrap_or_default())
  }

  fn release(&self, product_slug: &str, release_id: u64) -> ResourceResult<Release> {
    self.record("release", &[product_slug.to_string(), release_id.to_string()])?;
    self
      .releases
      .lock().unwrap()
      .get(product_slug)
      .and_then(|rs| rs.iter().find(|r| r.id == release_id).cloned())
      .ok_or_else(|| ResourceError::message(format!("no release {}", release_id)))
  }

  fn create_release(&self, config: &CreateReleaseConfig) -> ResourceResult<Release> {
    self.record("create_release", &[config.product_slug.clone(), config.version.clone()])?;
    let release = Release {
      id: self.next_id(),
      version: config.version.clone(),
      release_type: config.release_type.clone(),
      release_date: config.release_date.clone(),
      release_notes_url: config.release_notes_url.clone(),
      availability: ADMINS_ONLY.to_string(),
      description: config.description.clone(),
      eula: self.eulas.iter().find(|e| e.slug == config.eula_slug).cloned(),
      controlled: config.controlled,
      eccn: config.eccn.clone(),
      license_exception: config.license_exception.clone(),
      end_of_support_date: config.end_of_support_date.clone(),
      end_of_guidance_date: config.end_of_guidance_date.clone(),
      end_of_availability_date: config.end_of_availability_date.clone(),
      software_files_updated_at: "2024-01-02T03:04:05.000Z".to_string(),
    };
    self
      .releases
      .lock().unwrap()
      .entry(config.product_slug.clone())
      .or_default()
      .push(release.clone());
    Ok(release)
  }

  fn update_release_availability(&self, product_slug: &str, update: &ReleaseAvailability) -> ResourceResult<Release> {
    self.record(
      "update_release_availability",
      &[product_slug.to_string(), update.id.to_string(), update.availability.clone()],
    )?;
    let mut releases = self.releases.lock().unwrap();
    let release = releases
      .get_mut(product_slug)
      .and_then(|rs| rs.iter_mut().find(|r| r.id == update.id))
      .ok_or_else(|| ResourceError::message(format!("no release {}", update.id)))?;
    release.availability = update.availability.clone();
    Ok(release.clone())
  }

  fn product(&self, product_slug: &str) -> ResourceResult<Product> {
    self.record("product", &[product_slug.to_string()])?;
    Ok(self.product.clone())
  }

  fn product_files_for_release(&self, product_slug: &str, release_id: u64) -> ResourceResult<Vec<ProductFile>> {
    self.record(
      "product_files_for_release",
      &[product_slug.to_string(), release_id.to_string()],
    )?;
    Ok(self.product_files.lock().unwrap().get(&release_id).cloned().unwrap_or_default())
  }

  fn download_product_file(
    &self,
    product_slug: &str,
    release_id: u64,
    product_file_id: u64,
    sink: &mut dyn Write,
  ) -> ResourceResult<u64> {
    self.record(
      "download_product_file",
      &[product_slug.to_string(), release_id.to_string(), product_file_id.to_string()],
    )?;
    let contents = self
      .file_contents
      .lock().unwrap()
      .get(&product_file_id)
      .cloned()
      .unwrap_or_default();
    sink.write_all(&contents)?;
    Ok(contents.len() as u64)
  }

  fn create_product_file(&self, config: &CreateProductFileConfig) -> ResourceResult<ProductFile> {
    self.record(
      "create_product_file",
      &[config.name.clone(), config.aws_object_key.clone(), config.file_type.clone()],
    )?;
    Ok(ProductFile {
      id: self.next_id(),
      name: config.name.clone(),
      aws_object_key: config.aws_object_key.clone(),
      file_type: config.file_type.clone(),
      file_version: config.file_version.clone(),
      md5: config.md5.clone(),
      sha256: String::new(),
      description: config.description.clone(),
      size: 0,
    })
  }

  fn add_product_file(&self, product_id: u64, release_id: u64, product_file_id: u64) -> ResourceResult<()> {
    self.record(
      "add_product_file",
      &[product_id.to_string(), release_id.to_string(), product_file_id.to_string()],
    )
  }

  fn create_file_group(&self, product_slug: &str, name: &str) -> ResourceResult<FileGroup> {
    self.record("create_file_group", &[product_slug.to_string(), name.to_string()])?;
    Ok(FileGroup {
      id: self.next_id(),
      name: name.to_string(),
    })
  }

  fn add_product_file_to_file_group(
    &self,
    product_slug: &str,
    file_group_id: u64,
    product_file_id: u64,
  ) -> ResourceResult<()> {
    self.record(
      "add_product_file_to_file_group",
      &[product_slug.to_string(), file_group_id.to_string(), product_file_id.to_string()],
    )
  }

  fn add_file_group(&self, product_slug: &str, release_id: u64, file_group_id: u64) -> ResourceResult<()> {
    self.record(
      "add_file_group",
      &[product_slug.to_string(), release_id.to_string(), file_group_id.to_string()],
    )
  }

  fn add_dependency(&self, product_slug: &str, release_id: u64, dependent_release_id: u64) -> ResourceResult<()> {
    self.record(
      "add_dependency",
      &[product_slug.to_string(), release_id.to_string(), dependent_release_id.to_string()],
    )
  }

  fn add_upgrade_path(&self, product_slug: &str, release_id: u64, previous_release_id: u64) -> ResourceResult<()> {
    self.record(
      "add_upgrade_path",
      &[product_slug.to_string(), release_id.to_string(), previous_release_id.to_string()],
    )
  }

  fn create_dependency_specifier(
    &self,
    product_slug: &str,
    release_id: u64,
    dependent_product_slug: &str,
    specifier: &str,
  ) -> ResourceResult<DependencySpecifier> {
    self.record(
      "create_dependency_specifier",
      &[
        product_slug.to_string(),
        release_id.to_string(),
        dependent_product_slug.to_string(),
        specifier.to_string(),
      ],
    )?;
    Ok(DependencySpecifier {
      id: self.next_id(),
      product_slug: dependent_product_slug.to_string(),
      specifier: specifier.to_string(),
    })
  }

  fn create_upgrade_path_specifier(
    &self,
    product_slug: &str,
    release_id: u64,
    specifier: &str,
  ) -> ResourceResult<UpgradePathSpecifier> {
    self.record(
      "create_upgrade_path_specifier",
      &[product_slug.to_string(), release_id.to_string(), specifier.to_string()],
    )?;
    Ok(UpgradePathSpecifier {
      id: self.next_id(),
      specifier: specifier.to_string(),
    })
  }

  fn add_user_group(&self, product_slug: &str, release_id: u64, user_group_id: u64) -> ResourceResult<()> {
    self.record(
      "add_user_group",
      &[product_slug.to_string(), release_id.to_string(), user_group_id.to_string()],
    )
  }

  fn image_references(&self, product_slug: &str) -> ResourceResult<Vec<ImageReference>> {
    self.record("image_references", &[product_slug.to_string()])?;
    Ok(self.image_references.lock().unwrap().clone())
  }

  fn image_reference(&self, product_slug: &str, id: u64) -> ResourceResult<ImageReference> {
    self.record("image_reference", &[product_slug.to_string(), id.to_string()])?;
    let mut reference = self
      .image_references
      .lock().unwrap()
      .iter()
      .find(|r| r.id == id)
      .cloned()
      .ok_or_else(|| ResourceError::message(format!("no image reference {}", id)))?;
    reference.replication_status = self.status_for(id);
    Ok(reference)
  }

  fn create_image_reference(&self, product_slug: &str, reference: &ImageReference) -> ResourceResult<ImageReference> {
    self.record("create_image_reference", &[product_slug.to_string(), reference.name.clone()])?;
    let created = ImageReference {
      id: self.next_id(),
      replication_status: ReplicationStatus::InProgress,
      ..reference.clone()
    };
    self.image_references.lock().unwrap().push(created.clone());
    Ok(created)
  }

  fn add_image_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()> {
    self.record(
      "add_image_reference",
      &[product_slug.to_string(), release_id.to_string(), id.to_string()],
    )
  }

  fn artifact_references(&self, product_slug: &str) -> ResourceResult<Vec<ArtifactReference>> {
    self.record("artifact_references", &[product_slug.to_string()])?;
    Ok(self.artifact_references.lock().unwrap().clone())
  }

  fn artifact_reference(&self, product_slug: &str, id: u64) -> ResourceResult<ArtifactReference> {
    self.record("artifact_reference", &[product_slug.to_string(), id.to_string()])?;
    let mut reference = self
      .artifact_references
      .lock().unwrap()
      .iter()
      .find(|r| r.id == id)
      .cloned()
      .ok_or_else(|| ResourceError::message(format!("no artifact reference {}", id)))?;
    reference.replication_status = self.status_for(id);
    Ok(reference)
  }

  fn create_artifact_reference(
    &self,
    product_slug: &str,
    reference: &ArtifactReference,
  ) -> ResourceResult<ArtifactReference> {
    self.record(
      "create_artifact_reference",
      &[product_slug.to_string(), reference.name.clone()],
    )?;
    let created = ArtifactReference {
      id: self.next_id(),
      replication_status: ReplicationStatus::InProgress,
      ..reference.clone()
    };
    self.artifact_references.lock().unwrap().push(created.clone());
    Ok(created)
  }

  fn add_artifact_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()> {
    self.record(
      "add_artifact_reference",
      &[product_slug.to_string(), release_id.to_string(), id.to_string()],
    )
  }

  fn helm_chart_references(&self, product_slug: &str) -> ResourceResult<Vec<HelmChartReference>> {
    self.record("helm_chart_references", &[product_slug.to_string()])?;
    Ok(self.helm_chart_references.lock().unwrap().clone())
  }

  fn create_helm_chart_reference(
    &self,
    product_slug: &str,
    reference: &HelmChartReference,
  ) -> ResourceResult<HelmChartReference> {
    self.record(
      "create_helm_chart_reference",
      &[product_slug.to_string(), reference.name.clone()],
    )?;
    let created = HelmChartReference {
      id: self.next_id(),
      ..reference.clone()
    };
    self.helm_chart_references.lock().unwrap().push(created.clone());
    Ok(created)
  }

  fn add_helm_chart_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()> {
    self.record(
      "add_helm_chart_reference",
      &[product_slug.to_string(), release_id.to_string(), id.to_string()],
    )
  }
}
