//! Blocking HTTP implementation of [`PivnetClient`]

use super::models::envelope;
use super::*;
use crate::core::config::Source;
use crate::core::error::TransportError;
use reqwest::Method;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

const API_PREFIX: &str = "/api/v2";

/// Pivnet client backed by `reqwest::blocking`
pub struct HttpClient {
  client: Client,
  base_url: String,
  token: String,
}

impl HttpClient {
  /// Build a client for the endpoint and token in `source`
  pub fn new(source: &Source) -> ResourceResult<Self> {
    let client = Client::builder()
      .user_agent(concat!("pivnet-resource/", env!("CARGO_PKG_VERSION")))
      .danger_accept_invalid_certs(source.skip_ssl_validation)
      .timeout(Option::<Duration>::None)
      .build()
      .map_err(|e| ResourceError::message(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self {
      client,
      base_url: format!("{}{}", source.endpoint.trim_end_matches('/'), API_PREFIX),
      token: source.api_token.clone(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Send one request and insist on `expected` status
  fn call(&self, method: Method, path: &str, body: Option<Value>, expected: u16) -> ResourceResult<Response> {
    let url = self.url(path);
    tracing::debug!(method = %method, url = %url, "pivnet request");

    let mut request = self
      .client
      .request(method.clone(), &url)
      .bearer_auth(&self.token)
      .header(ACCEPT, "application/json");
    if let Some(body) = body {
      request = request.header(CONTENT_TYPE, "application/json").json(&body);
    }

    let response = request.send().map_err(|e| TransportError::Request {
      url: url.clone(),
      reason: e.to_string(),
    })?;

    let actual = response.status().as_u16();
    if actual != expected {
      let raw = response.text().unwrap_or_default();
      return Err(
        TransportError::Status {
          method: method.to_string(),
          url,
          expected,
          actual,
          message: error_message(&raw),
        }
        .into(),
      );
    }

    Ok(response)
  }

  fn decode<T: DeserializeOwned>(&self, response: Response, path: &str) -> ResourceResult<T> {
    response
      .json::<T>()
      .map_err(|e| ResourceError::message(format!("Failed to decode response from {}: {}", path, e)))
  }

  fn get<T: DeserializeOwned>(&self, path: &str) -> ResourceResult<T> {
    let response = self.call(Method::GET, path, None, 200)?;
    self.decode(response, path)
  }

  fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> ResourceResult<T> {
    let response = self.call(Method::POST, path, Some(body), 201)?;
    self.decode(response, path)
  }

  fn patch_no_content(&self, path: &str, body: Value) -> ResourceResult<()> {
    self.call(Method::PATCH, path, Some(body), 204)?;
    Ok(())
  }
}

/// Pull the service's `message` out of an error body, falling back to the raw text
fn error_message(raw: &str) -> String {
  serde_json::from_str::<Value>(raw)
    .ok()
    .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
    .unwrap_or_else(|| raw.trim().chars().take(512).collect())
}

fn id_body(key: &str, id: u64) -> Value {
  let mut body = serde_json::Map::new();
  body.insert(key.to_string(), json!({ "id": id }));
  Value::Object(body)
}

impl PivnetClient for HttpClient {
  fn eulas(&self) -> ResourceResult<Vec<Eula>> {
    Ok(self.get::<envelope::Eulas>("/eulas")?.eulas)
  }

  fn accept_eula(&self, product_slug: &str, release_id: u64) -> ResourceResult<()> {
    let path = format!(
      "/products/{}/releases/{}/pivnet_resource_eula_acceptance",
      product_slug, release_id
    );
    self.call(Method::POST, &path, Some(json!({})), 200)?;
    Ok(())
  }

  fn release_types(&self) -> ResourceResult<Vec<String>> {
    Ok(self.get::<envelope::ReleaseTypes>("/releases/release_types")?.release_types)
  }

  fn releases(&self, product_slug: &str) -> ResourceResult<Vec<Release>> {
    Ok(
      self
        .get::<envelope::Releases>(&format!("/products/{}/releases", product_slug))?
        .releases,
    )
  }

  fn release(&self, product_slug: &str, release_id: u64) -> ResourceResult<Release> {
    self.get(&format!("/products/{}/releases/{}", product_slug, release_id))
  }

  fn create_release(&self, config: &CreateReleaseConfig) -> ResourceResult<Release> {
    let body = json!({
      "release": serde_json::to_value(config)?,
      "copy_metadata": config.copy_metadata,
    });
    let created: envelope::OneRelease<Release> =
      self.post(&format!("/products/{}/releases", config.product_slug), body)?;
    Ok(created.release)
  }

  fn update_release_availability(&self, product_slug: &str, update: &ReleaseAvailability) -> ResourceResult<Release> {
    let path = format!("/products/{}/releases/{}", product_slug, update.id);
    let body = serde_json::to_value(envelope::OneRelease { release: update })?;
    let response = self.call(Method::PATCH, &path, Some(body), 200)?;
    let updated: envelope::OneRelease<Release> = self.decode(response, &path)?;
    Ok(updated.release)
  }

  fn product(&self, product_slug: &str) -> ResourceResult<Product> {
    self.get(&format!("/products/{}", product_slug))
  }

  fn product_files_for_release(&self, product_slug: &str, release_id: u64) -> ResourceResult<Vec<ProductFile>> {
    let path = format!("/products/{}/releases/{}/product_files", product_slug, release_id);
    Ok(self.get::<envelope::ProductFiles>(&path)?.product_files)
  }

  fn download_product_file(
    &self,
    product_slug: &str,
    release_id: u64,
    product_file_id: u64,
    sink: &mut dyn Write,
  ) -> ResourceResult<u64> {
    // The service answers with a redirect to the object store; reqwest follows it
    // and drops the Authorization header when the host changes.
    let path = format!(
      "/products/{}/releases/{}/product_files/{}/download",
      product_slug, release_id, product_file_id
    );
    let mut response = self.call(Method::POST, &path, None, 200)?;
    let written = response
      .copy_to(sink)
      .map_err(|e| ResourceError::message(format!("Failed to download product file {}: {}", product_file_id, e)))?;
    Ok(written)
  }

  fn create_product_file(&self, config: &CreateProductFileConfig) -> ResourceResult<ProductFile> {
    let body = serde_json::to_value(envelope::OneProductFile { product_file: config })?;
    let created: envelope::OneProductFile<ProductFile> =
      self.post(&format!("/products/{}/product_files", config.product_slug), body)?;
    Ok(created.product_file)
  }

  fn add_product_file(&self, product_id: u64, release_id: u64, product_file_id: u64) -> ResourceResult<()> {
    self.patch_no_content(
      &format!("/products/{}/releases/{}/add_product_file", product_id, release_id),
      id_body("product_file", product_file_id),
    )
  }

  fn create_file_group(&self, product_slug: &str, name: &str) -> ResourceResult<FileGroup> {
    self.post(
      &format!("/products/{}/file_groups", product_slug),
      json!({ "file_group": { "name": name } }),
    )
  }

  fn add_product_file_to_file_group(
    &self,
    product_slug: &str,
    file_group_id: u64,
    product_file_id: u64,
  ) -> ResourceResult<()> {
    self.patch_no_content(
      &format!("/products/{}/file_groups/{}/add_product_file", product_slug, file_group_id),
      id_body("product_file", product_file_id),
    )
  }

  fn add_file_group(&self, product_slug: &str, release_id: u64, file_group_id: u64) -> ResourceResult<()> {
    self.patch_no_content(
      &format!("/products/{}/releases/{}/add_file_group", product_slug, release_id),
      id_body("file_group", file_group_id),
    )
  }

  fn add_dependency(&self, product_slug: &str, release_id: u64, dependent_release_id: u64) -> ResourceResult<()> {
    let body = serde_json::to_value(envelope::Dependency {
      dependency: envelope::ReleaseId {
        release_id: dependent_release_id,
      },
    })?;
    self.patch_no_content(
      &format!("/products/{}/releases/{}/add_dependency", product_slug, release_id),
      body,
    )
  }

  fn add_upgrade_path(&self, product_slug: &str, release_id: u64, previous_release_id: u64) -> ResourceResult<()> {
    let body = serde_json::to_value(envelope::UpgradePath {
      upgrade_path: envelope::ReleaseId {
        release_id: previous_release_id,
      },
    })?;
    self.patch_no_content(
      &format!("/products/{}/releases/{}/add_upgrade_path", product_slug, release_id),
      body,
    )
  }

  fn create_dependency_specifier(
    &self,
    product_slug: &str,
    release_id: u64,
    dependent_product_slug: &str,
    specifier: &str,
  ) -> ResourceResult<DependencySpecifier> {
    let body = serde_json::to_value(envelope::NewDependencySpecifier {
      dependency_specifier: envelope::SpecifierBody {
        product_slug: Some(dependent_product_slug),
        specifier,
      },
    })?;
    let created: envelope::DependencySpecifierResponse = self.post(
      &format!("/products/{}/releases/{}/dependency_specifiers", product_slug, release_id),
      body,
    )?;
    Ok(created.dependency_specifier)
  }

  fn create_upgrade_path_specifier(
    &self,
    product_slug: &str,
    release_id: u64,
    specifier: &str,
  ) -> ResourceResult<UpgradePathSpecifier> {
    let body = serde_json::to_value(envelope::NewUpgradePathSpecifier {
      upgrade_path_specifier: envelope::SpecifierBody {
        product_slug: None,
        specifier,
      },
    })?;
    let created: envelope::UpgradePathSpecifierResponse = self.post(
      &format!("/products/{}/releases/{}/upgrade_path_specifiers", product_slug, release_id),
      body,
    )?;
    Ok(created.upgrade_path_specifier)
  }

  fn add_user_group(&self, product_slug: &str, release_id: u64, user_group_id: u64) -> ResourceResult<()> {
    let body = serde_json::to_value(envelope::UserGroup {
      user_group: envelope::Id { id: user_group_id },
    })?;
    self.patch_no_content(
      &format!("/products/{}/releases/{}/add_user_group", product_slug, release_id),
      body,
    )
  }

  fn image_references(&self, product_slug: &str) -> ResourceResult<Vec<ImageReference>> {
    let path = format!("/products/{}/image_references", product_slug);
    Ok(self.get::<envelope::ImageReferences>(&path)?.image_references)
  }

  fn image_reference(&self, product_slug: &str, id: u64) -> ResourceResult<ImageReference> {
    let path = format!("/products/{}/image_references/{}", product_slug, id);
    Ok(self.get::<envelope::OneImageReference<ImageReference>>(&path)?.image_reference)
  }

  fn create_image_reference(&self, product_slug: &str, reference: &ImageReference) -> ResourceResult<ImageReference> {
    let body = json!({
      "image_reference": {
        "name": reference.name,
        "image_path": reference.image_path,
        "digest": reference.digest,
        "description": reference.description,
        "docs_url": reference.docs_url,
        "system_requirements": reference.system_requirements,
      }
    });
    let created: envelope::OneImageReference<ImageReference> =
      self.post(&format!("/products/{}/image_references", product_slug), body)?;
    Ok(created.image_reference)
  }

  fn add_image_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()> {
    self.patch_no_content(
      &format!("/products/{}/releases/{}/add_image_reference", product_slug, release_id),
      id_body("image_reference", id),
    )
  }

  fn artifact_references(&self, product_slug: &str) -> ResourceResult<Vec<ArtifactReference>> {
    let path = format!("/products/{}/artifact_references", product_slug);
    Ok(self.get::<envelope::ArtifactReferences>(&path)?.artifact_references)
  }

  fn artifact_reference(&self, product_slug: &str, id: u64) -> ResourceResult<ArtifactReference> {
    let path = format!("/products/{}/artifact_references/{}", product_slug, id);
    Ok(
      self
        .get::<envelope::OneArtifactReference<ArtifactReference>>(&path)?
        .artifact_reference,
    )
  }

  fn create_artifact_reference(
    &self,
    product_slug: &str,
    reference: &ArtifactReference,
  ) -> ResourceResult<ArtifactReference> {
    let body = json!({
      "artifact_reference": {
        "name": reference.name,
        "artifact_path": reference.artifact_path,
        "digest": reference.digest,
        "description": reference.description,
        "docs_url": reference.docs_url,
        "system_requirements": reference.system_requirements,
      }
    });
    let created: envelope::OneArtifactReference<ArtifactReference> =
      self.post(&format!("/products/{}/artifact_references", product_slug), body)?;
    Ok(created.artifact_reference)
  }

  fn add_artifact_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()> {
    self.patch_no_content(
      &format!("/products/{}/releases/{}/add_artifact_reference", product_slug, release_id),
      id_body("artifact_reference", id),
    )
  }

  fn helm_chart_references(&self, product_slug: &str) -> ResourceResult<Vec<HelmChartReference>> {
    let path = format!("/products/{}/helm_chart_references", product_slug);
    Ok(self.get::<envelope::HelmChartReferences>(&path)?.helm_chart_references)
  }

  fn create_helm_chart_reference(
    &self,
    product_slug: &str,
    reference: &HelmChartReference,
  ) -> ResourceResult<HelmChartReference> {
    let body = json!({
      "helm_chart_reference": {
        "name": reference.name,
        "version": reference.version,
        "description": reference.description,
        "docs_url": reference.docs_url,
        "system_requirements": reference.system_requirements,
      }
    });
    let created: envelope::OneHelmChartReference<HelmChartReference> =
      self.post(&format!("/products/{}/helm_chart_references", product_slug), body)?;
    Ok(created.helm_chart_reference)
  }

  fn add_helm_chart_reference(&self, product_slug: &str, release_id: u64, id: u64) -> ResourceResult<()> {
    self.patch_no_content(
      &format!("/products/{}/releases/{}/add_helm_chart_reference", product_slug, release_id),
      id_body("helm_chart_reference", id),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_message_prefers_service_message() {
    assert_eq!(
      error_message(r#"{"status": 422, "message": "Version has already been taken"}"#),
      "Version has already been taken"
    );
    assert_eq!(error_message("  gateway timeout \n"), "gateway timeout");
  }

  #[test]
  fn test_base_url_strips_trailing_slash() {
    let source = Source {
      api_token: "t".to_string(),
      product_slug: "p".to_string(),
      endpoint: "https://network.example.com/".to_string(),
      ..Default::default()
    };
    let client = HttpClient::new(&source).unwrap();
    assert_eq!(
      client.url("/products/p/releases"),
      "https://network.example.com/api/v2/products/p/releases"
    );
  }

  #[test]
  fn test_id_body_shape() {
    assert_eq!(id_body("file_group", 9), json!({"file_group": {"id": 9}}));
  }
}
