use crate::catapi::api_types::ApiImage;
use crate::config::ApiConfig;
use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Anything that can hand out a batch of image descriptors.
///
/// The Cat API client implements this; tests substitute a scripted source.
pub trait ImageSource: Send + Sync {
  /// Fetch up to `limit` images.
  fn search(&self, limit: u32) -> BoxFuture<'_, Result<Vec<ApiImage>>>;
}

/// The Cat API client wrapper
#[derive(Clone)]
pub struct CatApiClient {
  http: reqwest::Client,
  base_url: Url,
  image_size: String,
}

impl CatApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("catgrid/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let base_url = parse_base_url(&config.base_url)?;

    Ok(Self {
      http,
      base_url,
      image_size: config.image_size.clone(),
    })
  }

  /// Build the search endpoint URL for a batch of `limit` images
  fn search_url(&self, limit: u32) -> Result<Url> {
    let mut url = self
      .base_url
      .join("v1/images/search")
      .map_err(|e| eyre!("Invalid search URL: {}", e))?;

    url
      .query_pairs_mut()
      .append_pair("limit", &limit.to_string())
      .append_pair("size", &self.image_size);

    Ok(url)
  }

  /// Search for images
  pub async fn search_images(&self, limit: u32) -> Result<Vec<ApiImage>> {
    let url = self.search_url(limit)?;
    debug!(%url, "requesting image batch");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach The Cat API: {}", e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("The Cat API returned {}", status));
    }

    let images: Vec<ApiImage> = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse image list: {}", e))?;

    debug!(count = images.len(), "received image batch");
    Ok(images)
  }

  /// Host the client talks to, for display
  pub fn host(&self) -> &str {
    self.base_url.host_str().unwrap_or("")
  }
}

impl ImageSource for CatApiClient {
  fn search(&self, limit: u32) -> BoxFuture<'_, Result<Vec<ApiImage>>> {
    Box::pin(self.search_images(limit))
  }
}

/// Parse the configured base URL, making sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut url = Url::parse(raw).map_err(|e| eyre!("Invalid API base URL '{}': {}", raw, e))?;
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client_for(base_url: &str) -> CatApiClient {
    CatApiClient::new(&ApiConfig {
      base_url: base_url.to_string(),
      image_size: "small".to_string(),
      timeout_secs: 5,
    })
    .unwrap()
  }

  #[test]
  fn test_search_url() {
    let client = client_for("https://api.thecatapi.com");
    let url = client.search_url(100).unwrap();

    assert_eq!(
      url.as_str(),
      "https://api.thecatapi.com/v1/images/search?limit=100&size=small"
    );
  }

  #[test]
  fn test_search_url_keeps_base_path() {
    let client = client_for("http://localhost:8080/proxy");
    let url = client.search_url(10).unwrap();

    assert_eq!(
      url.as_str(),
      "http://localhost:8080/proxy/v1/images/search?limit=10&size=small"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    let result = CatApiClient::new(&ApiConfig {
      base_url: "not a url".to_string(),
      image_size: "small".to_string(),
      timeout_secs: 5,
    });

    assert!(result.is_err());
  }

  #[test]
  fn test_host() {
    assert_eq!(client_for("https://api.thecatapi.com").host(), "api.thecatapi.com");
  }
}
