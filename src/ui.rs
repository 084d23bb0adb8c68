//! Plain-text rendering of session and history state for the terminal.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::model::{ClearSummary, VideoRecord};
use crate::session::SessionState;
use crate::utils::format_searched_at;

/// Widest title column in the history listing.
const TITLE_WIDTH: usize = 48;

/// Truncate `s` to at most `max_width` terminal columns, appending "…" if truncated.
/// Double-width (CJK) characters count as two columns.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.width() <= max_width {
    return s.to_string();
  }
  let budget = max_width.saturating_sub(1);
  let mut used = 0;
  let mut out = String::new();
  for c in s.chars() {
    let w = c.width().unwrap_or(0);
    if used + w > budget {
      break;
    }
    used += w;
    out.push(c);
  }
  out.push('…');
  out
}

/// Pad `s` with spaces up to `width` columns.
fn pad(s: &str, width: usize) -> String {
  let w = s.width();
  if w >= width { s.to_string() } else { format!("{}{}", s, " ".repeat(width - w)) }
}

pub fn render_video(video: &VideoRecord) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "{}", video.title);
  let _ = writeln!(out, "  duration: {}", video.duration);
  let _ = writeln!(out, "  url:      {}", video.url);
  if let Some(id) = video.id {
    let _ = writeln!(out, "  id:       {}", id);
  }
  if video.resolutions.is_empty() {
    let _ = writeln!(out, "  no downloadable resolutions");
  } else {
    let _ = writeln!(out, "  resolutions:");
    for r in &video.resolutions {
      let _ = writeln!(out, "    {:<8} {}", r.resolution, r.size);
    }
  }
  out
}

pub fn render_history(records: &[VideoRecord], now: DateTime<Utc>) -> String {
  if records.is_empty() {
    return "No videos in history yet. Videos you look up will show up here.\n".to_string();
  }
  let mut out = String::new();
  for (i, r) in records.iter().enumerate() {
    let title = pad(&truncate_str(&r.title, TITLE_WIDTH), TITLE_WIDTH);
    let when = r.searched_at.map(|t| format_searched_at(t, now)).unwrap_or_default();
    let id = r.id.map(|id| format!("#{}", id)).unwrap_or_default();
    let _ = writeln!(
      out,
      "{:>3}  {}  {:>9}  {:>2} res  {:<10} {}",
      i,
      title,
      r.duration,
      r.resolutions.len(),
      when,
      id
    );
  }
  out.trim_end().to_string() + "\n"
}

pub fn render_clear_summary(summary: Option<ClearSummary>) -> String {
  match summary {
    Some(s) => format!("History cleared: {} videos and {} files deleted.\n", s.videos_deleted, s.files_deleted),
    None => "History cleared.\n".to_string(),
  }
}

pub fn render_saved(path: &Path) -> String {
  format!("Saved {}\n", path.display())
}

/// What the session is busy with, else its last error. `None` when idle and healthy.
pub fn render_status(state: &SessionState) -> Option<String> {
  if state.is_searching {
    Some("Searching…".to_string())
  } else if state.is_downloading {
    Some("Downloading…".to_string())
  } else {
    state.last_error.clone()
  }
}
