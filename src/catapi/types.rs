use super::api_types::ApiImage;

/// A cached image record as stored locally and shown in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedItem {
  /// Remote image id, unique within the store
  pub remote_id: String,
  pub image_url: String,
  pub title: String,
  pub description: String,
}

impl CachedItem {
  /// Build a record from a fetched image and its absolute position.
  ///
  /// `ordinal` is zero-based; titles count from one.
  pub fn from_api(image: ApiImage, ordinal: u64) -> Self {
    Self {
      title: format!("Cat Image {}", ordinal + 1),
      description: format!(
        "A beautiful cat image with dimensions {}x{}",
        image.width, image.height
      ),
      remote_id: image.id,
      image_url: image.url,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_api_first_item() {
    let image = ApiImage {
      id: "a".to_string(),
      url: "u1".to_string(),
      width: 800,
      height: 600,
    };

    let item = CachedItem::from_api(image, 0);

    assert_eq!(
      item,
      CachedItem {
        remote_id: "a".to_string(),
        image_url: "u1".to_string(),
        title: "Cat Image 1".to_string(),
        description: "A beautiful cat image with dimensions 800x600".to_string(),
      }
    );
  }
}
