use chrono::{DateTime, Utc};

use crate::constants::constants;

/// Characters that are illegal in filenames on at least one common platform.
const ILLEGAL_FILENAME_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Replace each filesystem-illegal character with `_`, one for one.
pub fn sanitize_filename(name: &str) -> String {
  name.chars().map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c }).collect()
}

/// Build the local filename for a downloaded video: `{title}_{resolution}.mp4`.
/// A missing or blank title falls back to `video`.
pub fn download_filename(title: Option<&str>, resolution: &str) -> String {
  let title = title.map(str::trim).filter(|t| !t.is_empty()).unwrap_or(&constants().fallback_title);
  format!("{}_{}.{}", sanitize_filename(title), resolution, constants().video_extension)
}

/// Human-friendly recency of a history entry relative to `now`.
pub fn format_searched_at(searched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let diff = now.signed_duration_since(searched_at);
  let mins = diff.num_minutes();
  let hours = diff.num_hours();
  let days = diff.num_days();

  if mins < 1 {
    "just now".to_string()
  } else if mins < 60 {
    format!("{} min ago", mins)
  } else if hours < 24 {
    format!("{}h ago", hours)
  } else {
    format!("{}d ago", days)
  }
}
