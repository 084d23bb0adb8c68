//! The currently displayed video and its search → resolution → download lifecycle.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, VideoService};
use crate::constants::constants;
use crate::history::{HistoryError, HistoryStore};
use crate::model::{ClearSummary, VideoRecord};
use crate::utils::download_filename;
use crate::youtube::is_video_url;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("{0}")]
  Validation(String),

  /// A metadata or download failure, already phrased for the user.
  #[error("{0}")]
  Service(String),

  #[error("failed to save {}: {source}", .path.display())]
  Materialize { path: PathBuf, source: std::io::Error },

  #[error(transparent)]
  History(#[from] HistoryError),
}

/// Transient view state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
  pub current_video: Option<VideoRecord>,
  pub is_searching: bool,
  pub is_downloading: bool,
  pub last_error: Option<String>,
}

/// Stamp identifying one `search` call. Only the ticket of the latest call is applied.
#[derive(Debug)]
pub struct SearchTicket {
  generation: u64,
  url: String,
}

impl SearchTicket {
  pub fn url(&self) -> &str {
    &self.url
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
  Applied,
  /// A newer search started before this one resolved; its result was dropped.
  Superseded,
}

pub struct VideoSession {
  service: Arc<dyn VideoService>,
  download_dir: PathBuf,
  state: SessionState,
  generation: u64,
}

impl VideoSession {
  pub fn new(service: Arc<dyn VideoService>, download_dir: PathBuf) -> Self {
    Self { service, download_dir, state: SessionState::default(), generation: 0 }
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub fn current_video(&self) -> Option<&VideoRecord> {
    self.state.current_video.as_ref()
  }

  fn fail(&mut self, err: SessionError) -> SessionError {
    self.state.last_error = Some(err.to_string());
    err
  }

  /// Look up `url`, make it the current video and record it in history.
  pub async fn search(&mut self, url: &str, history: &mut HistoryStore) -> Result<SearchOutcome, SessionError> {
    let ticket = self.begin_search(url)?;
    let result = self.service.fetch_info(ticket.url()).await;
    self.finish_search(ticket, result, history).await
  }

  /// Validate input and reset state for a new search. The returned ticket must be handed back to
  /// `finish_search` together with the metadata result.
  pub fn begin_search(&mut self, url: &str) -> Result<SearchTicket, SessionError> {
    let url = url.trim();
    if url.is_empty() {
      return Err(self.fail(SessionError::Validation("Enter a video URL.".to_string())));
    }
    if !is_video_url(url) {
      warn!(url, "session: input does not look like a YouTube video URL, letting the server decide");
    }

    self.generation += 1;
    self.state.is_searching = true;
    self.state.last_error = None;
    self.state.current_video = None;
    debug!(url, generation = self.generation, "session: search started");
    Ok(SearchTicket { generation: self.generation, url: url.to_string() })
  }

  /// Apply a metadata result, unless a newer search has started since `ticket` was issued.
  pub async fn finish_search(
    &mut self,
    ticket: SearchTicket,
    result: Result<VideoRecord, ApiError>,
    history: &mut HistoryStore,
  ) -> Result<SearchOutcome, SessionError> {
    if ticket.generation != self.generation {
      debug!(url = %ticket.url, generation = ticket.generation, latest = self.generation, "session: dropping stale result");
      return Ok(SearchOutcome::Superseded);
    }
    self.state.is_searching = false;

    match result {
      Ok(mut record) => {
        if record.url.is_empty() {
          record.url = ticket.url;
        }
        info!(title = %record.title, resolutions = record.resolutions.len(), "session: video found");
        self.state.current_video = Some(record.clone());
        history.record_search(record).await;
        Ok(SearchOutcome::Applied)
      }
      Err(e) => {
        warn!(err = %e, "session: metadata lookup failed");
        let message = e.detail().map(str::to_string).unwrap_or_else(|| constants().search_error_fallback.clone());
        Err(self.fail(SessionError::Service(message)))
      }
    }
  }

  /// Download `resolution` of the current video into the download dir. Returns the saved path.
  pub async fn download(
    &mut self,
    url: &str,
    resolution: &str,
    history: &mut HistoryStore,
  ) -> Result<PathBuf, SessionError> {
    let url = url.trim();
    let title = match self.validate_download(resolution) {
      Ok(title) => title,
      Err(e) => return Err(self.fail(e)),
    };

    self.state.is_downloading = true;
    let result = self.fetch_and_save(url, resolution, Some(title.as_str())).await;
    self.state.is_downloading = false;

    match result {
      Ok(path) => {
        info!(path = %path.display(), "session: download saved");
        if history.is_remote_backed() {
          history.load().await;
        }
        Ok(path)
      }
      Err(e) => {
        warn!(err = %e, "session: download failed");
        Err(self.fail(e))
      }
    }
  }

  fn validate_download(&self, resolution: &str) -> Result<String, SessionError> {
    let Some(video) = &self.state.current_video else {
      return Err(SessionError::Validation("No video selected.".to_string()));
    };
    if resolution.trim().is_empty() {
      return Err(SessionError::Validation("No resolution selected.".to_string()));
    }
    if !video.offers(resolution) {
      return Err(SessionError::Validation(format!("Resolution {} is not available for this video.", resolution)));
    }
    Ok(video.title.clone())
  }

  async fn fetch_and_save(&self, url: &str, resolution: &str, title: Option<&str>) -> Result<PathBuf, SessionError> {
    let payload = self.service.download(url, resolution).await.map_err(|e| {
      let base = &constants().download_error_message;
      SessionError::Service(match e.detail() {
        Some(detail) => format!("{}: {}", base, detail),
        None => format!("{}.", base),
      })
    })?;

    let path = self.download_dir.join(download_filename(title, resolution));
    tokio::fs::create_dir_all(&self.download_dir)
      .await
      .map_err(|source| SessionError::Materialize { path: self.download_dir.clone(), source })?;
    tokio::fs::write(&path, &payload).await.map_err(|source| SessionError::Materialize { path: path.clone(), source })?;
    debug!(bytes = payload.len(), "session: payload written");
    Ok(path)
  }

  /// Switch the view to a history entry. No network.
  pub fn select_from_history(&mut self, record: VideoRecord) {
    self.state.current_video = Some(record);
  }

  /// Delete a history entry; the current video is dropped if it is the deleted one.
  pub async fn remove_from_history(&mut self, id: i64, history: &mut HistoryStore) -> Result<(), SessionError> {
    history.remove(id).await?;
    if self.state.current_video.as_ref().is_some_and(|v| v.id == Some(id)) {
      self.state.current_video = None;
    }
    Ok(())
  }

  /// Wipe the history. The caller is responsible for having asked the user.
  pub async fn clear_history(&mut self, history: &mut HistoryStore) -> Result<Option<ClearSummary>, SessionError> {
    let summary = history.clear().await?;
    self.state.current_video = None;
    Ok(summary)
  }
}
