use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A downloadable rendition of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
  pub resolution: String,
  pub size: String,
}

/// One looked-up video.
///
/// `id` is only present when the record came from the remote history service.
/// `searched_at` is only stamped by local history backings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  #[serde(default)]
  pub url: String,
  pub title: String,
  #[serde(default)]
  pub duration: String,
  #[serde(default)]
  pub resolutions: Vec<Resolution>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub searched_at: Option<DateTime<Utc>>,
}

impl VideoRecord {
  /// Whether both records describe the same video: by `id` when both carry one, else by `url`.
  pub fn same_video(&self, other: &VideoRecord) -> bool {
    match (self.id, other.id) {
      (Some(a), Some(b)) => a == b,
      _ => self.url == other.url,
    }
  }

  pub fn offers(&self, resolution: &str) -> bool {
    self.resolutions.iter().any(|r| r.resolution == resolution)
  }
}

/// Counts returned by the remote clear endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClearSummary {
  #[serde(default)]
  pub videos_deleted: u64,
  #[serde(default)]
  pub files_deleted: u64,
}
