use reqwest::Url;

/// Hosts that serve YouTube watch pages.
const WATCH_HOSTS: [&str; 4] = ["youtube.com", "www.youtube.com", "m.youtube.com", "music.youtube.com"];

/// Best-effort check that `input` points at a single YouTube video.
///
/// Accepts `youtube.com/watch?v=…`, `/shorts/…`, `/live/…`, `/embed/…` and `youtu.be/…` links.
/// The metadata service has the final say, so this only decides whether to log a warning.
pub fn is_video_url(input: &str) -> bool {
  let Ok(url) = Url::parse(input.trim()) else { return false };
  if !matches!(url.scheme(), "http" | "https") {
    return false;
  }
  let Some(host) = url.host_str() else { return false };

  if host == "youtu.be" || host == "www.youtu.be" {
    return url.path_segments().and_then(|mut s| s.next()).is_some_and(|id| !id.is_empty());
  }

  if !WATCH_HOSTS.contains(&host) {
    return false;
  }

  let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());
  match segments.next() {
    Some("watch") => url.query_pairs().any(|(k, v)| k == "v" && !v.is_empty()),
    Some("shorts" | "live" | "embed") => segments.next().is_some(),
    _ => false,
  }
}
