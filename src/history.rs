//! Ordered, de-duplicated history of looked-up videos.
//!
//! One store, three backings:
//! - `Local`: the collection lives only in a local blob, capped and ordered most-recent-first here.
//! - `Mirrored`: the remote service is authoritative, the local blob is a cache used at startup
//!   and whenever the remote cannot be reached.
//! - `Remote`: the remote service is authoritative and nothing is stored locally.
//!
//! Remote-backed collections keep the order the server lists them in (oldest first for the
//! stock server); only the local backing reorders.
//!
//! Remote-backed mutations are confirm-first: the remote call has to succeed before local state
//! changes, and local state is then re-read in full from the remote.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, HistoryService};
use crate::constants::constants;
use crate::model::{ClearSummary, VideoRecord};
use crate::storage::BlobStore;

#[derive(Debug, Error)]
pub enum HistoryError {
  #[error("{0} is not supported by local-only history")]
  Unsupported(&'static str),

  #[error("history service error: {0}")]
  Remote(#[from] ApiError),

  #[error("history storage error: {0:#}")]
  Storage(#[from] anyhow::Error),
}

pub enum Backing {
  Local(Box<dyn BlobStore>),
  Mirrored { cache: Box<dyn BlobStore>, remote: Arc<dyn HistoryService> },
  Remote(Arc<dyn HistoryService>),
}

impl Backing {
  fn cache(&self) -> Option<&dyn BlobStore> {
    match self {
      Backing::Local(store) | Backing::Mirrored { cache: store, .. } => Some(store.as_ref()),
      Backing::Remote(_) => None,
    }
  }

  fn remote(&self) -> Option<&Arc<dyn HistoryService>> {
    match self {
      Backing::Mirrored { remote, .. } | Backing::Remote(remote) => Some(remote),
      Backing::Local(_) => None,
    }
  }
}

pub struct HistoryStore {
  records: Vec<VideoRecord>,
  backing: Backing,
  cap: usize,
}

impl HistoryStore {
  /// Create the store. Backings with a local blob parse it synchronously so history is
  /// available before the first remote round trip.
  pub fn open(backing: Backing) -> Self {
    let mut store = Self { records: Vec::new(), backing, cap: constants().history_cap };
    if let Some(cache) = store.backing.cache() {
      store.records = read_cache(cache);
    }
    store
  }

  pub fn records(&self) -> &[VideoRecord] {
    &self.records
  }

  pub fn get(&self, index: usize) -> Option<&VideoRecord> {
    self.records.get(index)
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Whether a remote service is authoritative, i.e. mutations elsewhere require a reload.
  pub fn is_remote_backed(&self) -> bool {
    self.backing.remote().is_some()
  }

  /// Replace the in-memory collection with the backing medium's current contents.
  ///
  /// Never fails: history is best-effort, so errors degrade to an empty collection
  /// (or, for the mirrored backing, to the cached copy) and are only logged.
  pub async fn load(&mut self) {
    match &self.backing {
      Backing::Local(store) => {
        self.records = read_cache(store.as_ref());
      }
      Backing::Remote(remote) => {
        self.records = fetch_remote(remote.as_ref()).await.unwrap_or_default();
      }
      Backing::Mirrored { cache, remote } => match fetch_remote(remote.as_ref()).await {
        Some(records) => {
          self.records = records;
          self.persist();
        }
        None => {
          self.records = read_cache(cache.as_ref());
          debug!(count = self.records.len(), "history: using cached copy");
        }
      },
    }
  }

  /// Record a successful lookup.
  ///
  /// Locally the record moves to (or is inserted at) the front with a fresh timestamp and the
  /// collection is capped. The remote service upserts on lookup by itself, so remote backings
  /// only reload afterwards.
  pub async fn record_search(&mut self, record: VideoRecord) {
    match self.backing {
      Backing::Local(_) => {
        self.upsert_front(record);
        self.persist();
      }
      Backing::Mirrored { .. } => {
        self.upsert_front(record);
        self.persist();
        self.load().await;
      }
      Backing::Remote(_) => self.load().await,
    }
  }

  fn upsert_front(&mut self, mut record: VideoRecord) {
    record.searched_at = Some(Utc::now());
    if let Some(pos) = self.records.iter().position(|r| r.same_video(&record)) {
      let existing = self.records.remove(pos);
      // Keep the server id if the fresh payload lacks one.
      record.id = record.id.or(existing.id);
    }
    self.records.insert(0, record);
    self.records.truncate(self.cap);
  }

  /// Delete one record, and its downloaded files, by id. Reloads on success; on failure
  /// local state is left untouched.
  pub async fn remove(&mut self, id: i64) -> Result<(), HistoryError> {
    let Some(remote) = self.backing.remote() else {
      return Err(HistoryError::Unsupported("deleting a single entry"));
    };
    remote.delete(id).await?;
    info!(id, "history: removed entry");

    if let Backing::Mirrored { .. } = self.backing {
      self.records.retain(|r| r.id != Some(id));
      self.write_cache();
    }
    self.load().await;
    Ok(())
  }

  /// Delete the entire history. Callers must have the user's confirmation.
  ///
  /// Returns the server's deletion counts when the backing medium reports them.
  pub async fn clear(&mut self) -> Result<Option<ClearSummary>, HistoryError> {
    let summary = match &self.backing {
      Backing::Local(store) => {
        store.write("[]")?;
        None
      }
      Backing::Mirrored { cache, remote } => {
        let summary = remote.clear().await?;
        // The server copy is already gone, so a failed cache write is only logged.
        if let Err(e) = cache.write("[]") {
          warn!(err = %format!("{:#}", e), "history: failed to empty cache after clear");
        }
        Some(summary)
      }
      Backing::Remote(remote) => Some(remote.clear().await?),
    };

    let dropped = self.records.len();
    self.records.clear();
    info!(dropped, summary = ?summary, "history: cleared");

    if self.is_remote_backed() {
      self.load().await;
    }
    Ok(summary)
  }

  /// Write the collection to the local blob. Skipped while empty so that an empty startup
  /// never clobbers a store that simply has not been read yet; `clear` writes its own empty value.
  pub fn persist(&self) {
    if self.records.is_empty() {
      return;
    }
    self.write_cache();
  }

  fn write_cache(&self) {
    let Some(cache) = self.backing.cache() else { return };
    match serde_json::to_string(&self.records) {
      Ok(json) => {
        if let Err(e) = cache.write(&json) {
          warn!(err = %format!("{:#}", e), "history: failed to persist");
        }
      }
      Err(e) => warn!(err = %e, "history: failed to serialize"),
    }
  }
}

fn read_cache(store: &dyn BlobStore) -> Vec<VideoRecord> {
  match store.read() {
    Ok(Some(content)) => match serde_json::from_str::<Vec<VideoRecord>>(&content) {
      Ok(records) => dedup(records),
      Err(e) => {
        warn!(err = %e, "history: stored history is unreadable, starting empty");
        Vec::new()
      }
    },
    Ok(None) => Vec::new(),
    Err(e) => {
      warn!(err = %format!("{:#}", e), "history: failed to read stored history");
      Vec::new()
    }
  }
}

/// `None` on any failure except "not found", which means there is no history yet.
async fn fetch_remote(remote: &dyn HistoryService) -> Option<Vec<VideoRecord>> {
  match remote.list().await {
    Ok(records) => Some(dedup(records)),
    Err(e) if e.is_not_found() => {
      debug!("history: remote history is empty");
      Some(Vec::new())
    }
    Err(e) => {
      warn!(err = %e, "history: failed to load remote history");
      None
    }
  }
}

/// Drop later duplicates, keeping the first occurrence. Order is otherwise preserved.
fn dedup(records: Vec<VideoRecord>) -> Vec<VideoRecord> {
  let mut out: Vec<VideoRecord> = Vec::with_capacity(records.len());
  for record in records {
    if !out.iter().any(|r| r.same_video(&record)) {
      out.push(record);
    }
  }
  out
}
