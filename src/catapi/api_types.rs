//! Serde-deserializable types matching The Cat API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

/// One entry of the `/v1/images/search` response array.
///
/// Extra fields the API sends (breeds, categories) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiImage {
  pub id: String,
  pub url: String,
  #[serde(default)]
  pub width: u32,
  #[serde(default)]
  pub height: u32,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_search_response() {
    let body = r#"[
      {"id": "abc", "url": "https://cdn2.thecatapi.com/images/abc.jpg", "width": 800, "height": 600},
      {"id": "def", "url": "https://cdn2.thecatapi.com/images/def.png", "width": 1024, "height": 768,
       "breeds": [{"name": "Bengal"}]}
    ]"#;

    let images: Vec<ApiImage> = serde_json::from_str(body).unwrap();

    assert_eq!(images.len(), 2);
    assert_eq!(images[0].id, "abc");
    assert_eq!(images[0].width, 800);
    assert_eq!(images[1].height, 768);
  }

  #[test]
  fn test_missing_dimensions_default_to_zero() {
    let images: Vec<ApiImage> =
      serde_json::from_str(r#"[{"id": "x", "url": "https://example.com/x.gif"}]"#).unwrap();

    assert_eq!(images[0].width, 0);
    assert_eq!(images[0].height, 0);
  }
}
