//! Attach image, artifact and helm chart references to the release
//!
//! Image and artifact references are product-level entities that the service
//! replicates asynchronously. Adding them to a release runs in three phases:
//! resolve (reuse an existing entity with the same name, path and digest, or
//! create one), wait for every resolved reference to finish replicating, then
//! attach. Helm chart references are not replicated and attach immediately.

use super::poller::ReplicationPoller;
use crate::core::error::ResourceResult;
use crate::metadata::{ArtifactReferenceMetadata, HelmChartReferenceMetadata, ImageReferenceMetadata, Metadata};
use crate::pivnet::{ArtifactReference, HelmChartReference, ImageReference, PivnetClient, Release, ReplicationStatus};
use std::collections::HashMap;
use tracing::info;

/// Natural key of a replicated reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceKey {
  pub name: String,
  pub path: String,
  pub digest: String,
}

/// Declared reference at `index` resolved to service id `id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
  pub index: usize,
  pub id: u64,
  pub name: String,
}

/// What differs between image and artifact references
pub trait ReferenceKind {
  type Declared;
  type Remote;

  /// Used in log lines and error messages
  const KIND: &'static str;

  fn declared(metadata: &Metadata) -> &[Self::Declared];
  fn declared_id(declared: &Self::Declared) -> u64;
  fn declared_name(declared: &Self::Declared) -> &str;
  fn declared_key(declared: &Self::Declared) -> ReferenceKey;
  fn remote_id(remote: &Self::Remote) -> u64;
  fn remote_key(remote: &Self::Remote) -> ReferenceKey;

  fn list(client: &dyn PivnetClient, product_slug: &str) -> ResourceResult<Vec<Self::Remote>>;
  fn create(client: &dyn PivnetClient, product_slug: &str, declared: &Self::Declared) -> ResourceResult<Self::Remote>;
  fn status(client: &dyn PivnetClient, product_slug: &str, id: u64) -> ResourceResult<ReplicationStatus>;
  fn attach(client: &dyn PivnetClient, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()>;
}

pub struct Images;

impl ReferenceKind for Images {
  type Declared = ImageReferenceMetadata;
  type Remote = ImageReference;

  const KIND: &'static str = "image";

  fn declared(metadata: &Metadata) -> &[ImageReferenceMetadata] {
    &metadata.image_references
  }

  fn declared_id(declared: &ImageReferenceMetadata) -> u64 {
    declared.id
  }

  fn declared_name(declared: &ImageReferenceMetadata) -> &str {
    &declared.name
  }

  fn declared_key(declared: &ImageReferenceMetadata) -> ReferenceKey {
    ReferenceKey {
      name: declared.name.clone(),
      path: declared.image_path.clone(),
      digest: declared.digest.clone(),
    }
  }

  fn remote_id(remote: &ImageReference) -> u64 {
    remote.id
  }

  fn remote_key(remote: &ImageReference) -> ReferenceKey {
    ReferenceKey {
      name: remote.name.clone(),
      path: remote.image_path.clone(),
      digest: remote.digest.clone(),
    }
  }

  fn list(client: &dyn PivnetClient, product_slug: &str) -> ResourceResult<Vec<ImageReference>> {
    client.image_references(product_slug)
  }

  fn create(
    client: &dyn PivnetClient,
    product_slug: &str,
    declared: &ImageReferenceMetadata,
  ) -> ResourceResult<ImageReference> {
    client.create_image_reference(
      product_slug,
      &ImageReference {
        id: 0,
        name: declared.name.clone(),
        image_path: declared.image_path.clone(),
        digest: declared.digest.clone(),
        description: declared.description.clone(),
        docs_url: declared.docs_url.clone(),
        system_requirements: declared.system_requirements.clone(),
        replication_status: ReplicationStatus::InProgress,
      },
    )
  }

  fn status(client: &dyn PivnetClient, product_slug: &str, id: u64) -> ResourceResult<ReplicationStatus> {
    Ok(client.image_reference(product_slug, id)?.replication_status)
  }

  fn attach(client: &dyn PivnetClient, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()> {
    client.add_image_reference(product_slug, release_id, id)
  }
}

pub struct Artifacts;

impl ReferenceKind for Artifacts {
  type Declared = ArtifactReferenceMetadata;
  type Remote = ArtifactReference;

  const KIND: &'static str = "artifact";

  fn declared(metadata: &Metadata) -> &[ArtifactReferenceMetadata] {
    &metadata.artifact_references
  }

  fn declared_id(declared: &ArtifactReferenceMetadata) -> u64 {
    declared.id
  }

  fn declared_name(declared: &ArtifactReferenceMetadata) -> &str {
    &declared.name
  }

  fn declared_key(declared: &ArtifactReferenceMetadata) -> ReferenceKey {
    ReferenceKey {
      name: declared.name.clone(),
      path: declared.artifact_path.clone(),
      digest: declared.digest.clone(),
    }
  }

  fn remote_id(remote: &ArtifactReference) -> u64 {
    remote.id
  }

  fn remote_key(remote: &ArtifactReference) -> ReferenceKey {
    ReferenceKey {
      name: remote.name.clone(),
      path: remote.artifact_path.clone(),
      digest: remote.digest.clone(),
    }
  }

  fn list(client: &dyn PivnetClient, product_slug: &str) -> ResourceResult<Vec<ArtifactReference>> {
    client.artifact_references(product_slug)
  }

  fn create(
    client: &dyn PivnetClient,
    product_slug: &str,
    declared: &ArtifactReferenceMetadata,
  ) -> ResourceResult<ArtifactReference> {
    client.create_artifact_reference(
      product_slug,
      &ArtifactReference {
        id: 0,
        name: declared.name.clone(),
        artifact_path: declared.artifact_path.clone(),
        digest: declared.digest.clone(),
        description: declared.description.clone(),
        docs_url: declared.docs_url.clone(),
        system_requirements: declared.system_requirements.clone(),
        replication_status: ReplicationStatus::InProgress,
      },
    )
  }

  fn status(client: &dyn PivnetClient, product_slug: &str, id: u64) -> ResourceResult<ReplicationStatus> {
    Ok(client.artifact_reference(product_slug, id)?.replication_status)
  }

  fn attach(client: &dyn PivnetClient, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()> {
    client.add_artifact_reference(product_slug, release_id, id)
  }
}

/// Adds the declared references of one replicated kind
pub struct ReplicatedReferencesAdder<'a, K: ReferenceKind> {
  client: &'a dyn PivnetClient,
  metadata: &'a Metadata,
  product_slug: &'a str,
  poller: &'a ReplicationPoller<'a>,
  kind: std::marker::PhantomData<K>,
}

pub type ImageReferencesAdder<'a> = ReplicatedReferencesAdder<'a, Images>;
pub type ArtifactReferencesAdder<'a> = ReplicatedReferencesAdder<'a, Artifacts>;

impl<'a, K: ReferenceKind> ReplicatedReferencesAdder<'a, K> {
  pub fn new(
    client: &'a dyn PivnetClient,
    metadata: &'a Metadata,
    product_slug: &'a str,
    poller: &'a ReplicationPoller<'a>,
  ) -> Self {
    Self {
      client,
      metadata,
      product_slug,
      poller,
      kind: std::marker::PhantomData,
    }
  }

  pub fn add(&self, release: &Release) -> ResourceResult<()> {
    let resolved = self.resolve()?;
    self.wait(&resolved)?;
    self.attach(release, &resolved)
  }

  /// Map every declared reference to a service id, creating what does not exist yet
  pub fn resolve(&self) -> ResourceResult<Vec<ResolvedReference>> {
    let declared = K::declared(self.metadata);
    if declared.is_empty() {
      return Ok(Vec::new());
    }

    let mut existing: Option<HashMap<ReferenceKey, u64>> = None;
    let mut resolved = Vec::with_capacity(declared.len());

    for (index, reference) in declared.iter().enumerate() {
      let name = K::declared_name(reference).to_string();
      let mut id = K::declared_id(reference);

      if id == 0 {
        if existing.is_none() {
          let remote = K::list(self.client, self.product_slug)?;
          existing = Some(remote.iter().map(|r| (K::remote_key(r), K::remote_id(r))).collect());
        }
        let key = K::declared_key(reference);
        match existing.as_ref().and_then(|m| m.get(&key)) {
          Some(found) => {
            info!(kind = K::KIND, name = %name, id = found, "reusing existing reference");
            id = *found;
          }
          None => {
            info!(kind = K::KIND, name = %name, "creating reference");
            id = K::remote_id(&K::create(self.client, self.product_slug, reference)?);
            if let Some(map) = existing.as_mut() {
              map.insert(key, id);
            }
          }
        }
      }

      resolved.push(ResolvedReference { index, id, name });
    }

    Ok(resolved)
  }

  /// Block until each reference has replicated, in declaration order
  pub fn wait(&self, resolved: &[ResolvedReference]) -> ResourceResult<()> {
    for reference in resolved {
      self.poller.wait(K::KIND, &reference.name, || {
        K::status(self.client, self.product_slug, reference.id)
      })?;
    }
    Ok(())
  }

  pub fn attach(&self, release: &Release, resolved: &[ResolvedReference]) -> ResourceResult<()> {
    for reference in resolved {
      info!(kind = K::KIND, id = reference.id, release = release.id, "adding reference to release");
      K::attach(self.client, self.product_slug, release.id, reference.id)?;
    }
    Ok(())
  }
}

pub struct HelmChartReferencesAdder<'a> {
  client: &'a dyn PivnetClient,
  metadata: &'a Metadata,
  product_slug: &'a str,
}

impl<'a> HelmChartReferencesAdder<'a> {
  pub fn new(client: &'a dyn PivnetClient, metadata: &'a Metadata, product_slug: &'a str) -> Self {
    Self {
      client,
      metadata,
      product_slug,
    }
  }

  /// Charts are keyed by name and version
  pub fn add(&self, release: &Release) -> ResourceResult<()> {
    let declared = &self.metadata.helm_chart_references;
    if declared.is_empty() {
      return Ok(());
    }

    let mut existing: Option<HashMap<(String, String), u64>> = None;
    for chart in declared {
      let mut id = chart.id;
      if id == 0 {
        if existing.is_none() {
          let remote = self.client.helm_chart_references(self.product_slug)?;
          existing = Some(
            remote
              .into_iter()
              .map(|r| ((r.name, r.version), r.id))
              .collect(),
          );
        }
        let key = (chart.name.clone(), chart.version.clone());
        match existing.as_ref().and_then(|m| m.get(&key)) {
          Some(found) => id = *found,
          None => {
            info!(name = %chart.name, version = %chart.version, "creating helm chart reference");
            id = self.client.create_helm_chart_reference(self.product_slug, &helm_chart(chart))?.id;
            if let Some(map) = existing.as_mut() {
              map.insert(key, id);
            }
          }
        }
      }

      info!(id, release = release.id, "adding helm chart reference to release");
      self.client.add_helm_chart_reference(self.product_slug, release.id, id)?;
    }
    Ok(())
  }
}

fn helm_chart(declared: &HelmChartReferenceMetadata) -> HelmChartReference {
  HelmChartReference {
    id: 0,
    name: declared.name.clone(),
    version: declared.version.clone(),
    description: declared.description.clone(),
    docs_url: declared.docs_url.clone(),
    system_requirements: declared.system_requirements.clone(),
  }
}
