//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so nothing is read at runtime.
//! Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub default_api_url: String,

  // History
  pub history_cap: usize,
  pub history_storage_key: String,

  // Downloads
  pub video_extension: String,
  pub fallback_title: String,

  // User-facing fallbacks
  pub search_error_fallback: String,
  pub download_error_message: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; a malformed file fails the tests in this module.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.history_cap, 20);
    assert_eq!(c.history_storage_key, "videoHistory");
    assert_eq!(c.video_extension, "mp4");
    assert_eq!(c.fallback_title, "video");
  }

  #[test]
  fn fallback_messages_are_not_blank() {
    assert!(!constants().search_error_fallback.trim().is_empty());
    assert!(!constants().download_error_message.trim().is_empty());
  }
}
