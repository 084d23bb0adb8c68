//! HTTP client for the metadata/download service and the remote history service.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{ClearSummary, VideoRecord};

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found{}", detail_suffix(.detail))]
  NotFound { detail: Option<String> },

  #[error("server returned {status}{}", detail_suffix(.detail))]
  Status { status: StatusCode, detail: Option<String> },

  #[error("invalid API URL: {0}")]
  InvalidUrl(String),

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
  detail.as_ref().map(|d| format!(": {}", d)).unwrap_or_default()
}

impl ApiError {
  /// The server-supplied `detail` message, if the error body carried one.
  pub fn detail(&self) -> Option<&str> {
    match self {
      ApiError::NotFound { detail } | ApiError::Status { detail, .. } => detail.as_deref(),
      _ => None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, ApiError::NotFound { .. })
  }
}

/// Video metadata lookup and binary download.
#[async_trait]
pub trait VideoService: Send + Sync {
  async fn fetch_info(&self, video_url: &str) -> Result<VideoRecord, ApiError>;
  async fn download(&self, video_url: &str, resolution: &str) -> Result<Vec<u8>, ApiError>;
}

/// Server-side history of looked-up videos.
#[async_trait]
pub trait HistoryService: Send + Sync {
  async fn list(&self) -> Result<Vec<VideoRecord>, ApiError>;
  /// Deletes one record together with its downloaded files on the server.
  async fn delete(&self, id: i64) -> Result<(), ApiError>;
  /// Deletes every record and every downloaded file on the server.
  async fn clear(&self) -> Result<ClearSummary, ApiError>;
}

/// Which path the server exposes for wiping history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClearEndpoint {
  #[default]
  Clear,
  ClearAll,
}

impl ClearEndpoint {
  pub fn path(self) -> &'static str {
    match self {
      ClearEndpoint::Clear => "/history/clear",
      ClearEndpoint::ClearAll => "/history/clear-all",
    }
  }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  detail: Option<serde_json::Value>,
}

/// Extract FastAPI's `{"detail": ...}` from an error body. String details are used verbatim,
/// structured ones (validation errors) are rendered as JSON.
fn parse_detail(body: &str) -> Option<String> {
  let parsed: ErrorBody = serde_json::from_str(body).ok()?;
  match parsed.detail? {
    serde_json::Value::Null => None,
    serde_json::Value::String(s) if s.trim().is_empty() => None,
    serde_json::Value::String(s) => Some(s),
    other => Some(other.to_string()),
  }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
  http: Client,
  base_url: String,
  clear_endpoint: ClearEndpoint,
}

impl ApiClient {
  pub fn new(base_url: &str, clear_endpoint: ClearEndpoint) -> Self {
    Self { http: Client::new(), base_url: base_url.trim_end_matches('/').to_string(), clear_endpoint }
  }

  fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
    let raw = format!("{}{}", self.base_url, path);
    let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if !params.is_empty() {
      url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
  }

  /// Turn a non-2xx response into an `ApiError`, keeping the server's detail message.
  async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = parse_detail(&body);
    debug!(%status, detail = ?detail, "api: request failed");
    if status == StatusCode::NOT_FOUND {
      Err(ApiError::NotFound { detail })
    } else {
      Err(ApiError::Status { status, detail })
    }
  }
}

#[async_trait]
impl VideoService for ApiClient {
  async fn fetch_info(&self, video_url: &str) -> Result<VideoRecord, ApiError> {
    let url = self.url("/yt/video-info", &[("video_url", video_url)])?;
    debug!(%url, "api: fetching video info");
    let response = Self::check(self.http.get(url).send().await?).await?;
    Ok(response.json().await?)
  }

  async fn download(&self, video_url: &str, resolution: &str) -> Result<Vec<u8>, ApiError> {
    let url = self.url("/yt/download_video", &[("video_url", video_url), ("resolution", resolution)])?;
    debug!(%url, "api: downloading video");
    let response = Self::check(self.http.get(url).send().await?).await?;
    Ok(response.bytes().await?.to_vec())
  }
}

#[async_trait]
impl HistoryService for ApiClient {
  async fn list(&self) -> Result<Vec<VideoRecord>, ApiError> {
    let url = self.url("/history/videos", &[])?;
    let response = Self::check(self.http.get(url).send().await?).await?;
    Ok(response.json().await?)
  }

  async fn delete(&self, id: i64) -> Result<(), ApiError> {
    let url = self.url(&format!("/history/video/{}", id), &[])?;
    Self::check(self.http.delete(url).send().await?).await?;
    Ok(())
  }

  async fn clear(&self) -> Result<ClearSummary, ApiError> {
    let url = self.url(self.clear_endpoint.path(), &[])?;
    let response = Self::check(self.http.delete(url).send().await?).await?;
    Ok(response.json().await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{StatusCode as AxumStatus, header},
    response::IntoResponse,
    routing::{delete, get},
  };
  use serde_json::json;
  use std::collections::HashMap;

  // --- parse_detail ---

  #[test]
  fn parse_detail_string() {
    assert_eq!(parse_detail(r#"{"detail":"Check the URL!"}"#).as_deref(), Some("Check the URL!"));
  }

  #[test]
  fn parse_detail_structured() {
    let detail = parse_detail(r#"{"detail":[{"loc":["query","video_url"],"msg":"field required"}]}"#).unwrap();
    assert!(detail.contains("field required"));
  }

  #[test]
  fn parse_detail_missing_or_blank() {
    assert_eq!(parse_detail(r#"{"error":"x"}"#), None);
    assert_eq!(parse_detail(r#"{"detail":null}"#), None);
    assert_eq!(parse_detail(r#"{"detail":"  "}"#), None);
    assert_eq!(parse_detail("<html>Bad Gateway</html>"), None);
    assert_eq!(parse_detail(""), None);
  }

  // --- ClearEndpoint ---

  #[test]
  fn clear_endpoint_paths() {
    assert_eq!(ClearEndpoint::Clear.path(), "/history/clear");
    assert_eq!(ClearEndpoint::ClearAll.path(), "/history/clear-all");
  }

  #[test]
  fn api_error_display_includes_detail() {
    let e = ApiError::Status { status: StatusCode::INTERNAL_SERVER_ERROR, detail: Some("boom".to_string()) };
    assert_eq!(e.to_string(), "server returned 500 Internal Server Error: boom");
    assert_eq!(e.detail(), Some("boom"));
    assert_eq!(ApiError::NotFound { detail: None }.to_string(), "not found");
  }

  // --- ApiClient against a stub server ---

  async fn video_info(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("video_url").map(String::as_str) {
      Some("https://youtu.be/abc") => (
        AxumStatus::OK,
        Json(json!({
          "id": 7,
          "title": "Test",
          "duration": "3:00",
          "url": "https://youtu.be/abc",
          "resolutions": [{"resolution": "720p", "size": "50MB"}]
        })),
      ),
      _ => (AxumStatus::from_u16(505).unwrap(), Json(json!({"detail": "Error: Check the URL!"}))),
    }
  }

  async fn download_video(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
    if params.get("resolution").map(String::as_str) == Some("720p") {
      ([(header::CONTENT_TYPE, "video/mp4")], vec![0u8, 1, 2, 3]).into_response()
    } else {
      (AxumStatus::INTERNAL_SERVER_ERROR, "plain failure").into_response()
    }
  }

  async fn delete_video(Path(id): Path<i64>) -> impl IntoResponse {
    if id == 1 {
      (AxumStatus::OK, Json(json!({"message": "deleted"})))
    } else {
      (AxumStatus::NOT_FOUND, Json(json!({"detail": "video not found"})))
    }
  }

  async fn clear_all() -> impl IntoResponse {
    Json(json!({"videos_deleted": 2, "files_deleted": 1}))
  }

  async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
  }

  fn stub_router(history: serde_json::Value) -> Router {
    let api = Router::new()
      .route("/yt/video-info", get(video_info))
      .route("/yt/download_video", get(download_video))
      .route("/history/videos", get(move || async move { Json(history) }))
      .route("/history/video/{id}", delete(delete_video))
      .route("/history/clear-all", delete(clear_all));
    Router::new().nest("/api", api)
  }

  #[tokio::test]
  async fn fetch_info_decodes_record() {
    let base = spawn_stub(stub_router(json!([]))).await;
    let client = ApiClient::new(&base, ClearEndpoint::Clear);
    let record = client.fetch_info("https://youtu.be/abc").await.unwrap();
    assert_eq!(record.id, Some(7));
    assert_eq!(record.title, "Test");
    assert!(record.offers("720p"));
  }

  #[tokio::test]
  async fn fetch_info_surfaces_detail() {
    let base = spawn_stub(stub_router(json!([]))).await;
    let client = ApiClient::new(&base, ClearEndpoint::Clear);
    let err = client.fetch_info("https://example.com/nope").await.unwrap_err();
    assert_eq!(err.detail(), Some("Error: Check the URL!"));
    assert!(!err.is_not_found());
  }

  #[tokio::test]
  async fn download_returns_payload_bytes() {
    let base = spawn_stub(stub_router(json!([]))).await;
    let client = ApiClient::new(&format!("{}/", base), ClearEndpoint::Clear);
    let bytes = client.download("https://youtu.be/abc", "720p").await.unwrap();
    assert_eq!(bytes, vec![0, 1, 2, 3]);
  }

  #[tokio::test]
  async fn download_failure_without_detail() {
    let base = spawn_stub(stub_router(json!([]))).await;
    let client = ApiClient::new(&base, ClearEndpoint::Clear);
    let err = client.download("https://youtu.be/abc", "144p").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status, detail: None } if status == StatusCode::INTERNAL_SERVER_ERROR));
  }

  #[tokio::test]
  async fn list_and_delete_and_clear() {
    let history = json!([
      {"id": 1, "title": "One", "duration": "00:01:00", "url": "https://youtu.be/one", "resolutions": []},
    ]);
    let base = spawn_stub(stub_router(history)).await;
    let client = ApiClient::new(&base, ClearEndpoint::ClearAll);

    let records = client.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, Some(1));

    client.delete(1).await.unwrap();
    let err = client.delete(99).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.detail(), Some("video not found"));

    let summary = client.clear().await.unwrap();
    assert_eq!(summary, ClearSummary { videos_deleted: 2, files_deleted: 1 });
  }

  #[tokio::test]
  async fn unknown_route_is_not_found() {
    let base = spawn_stub(stub_router(json!([]))).await;
    let client = ApiClient::new(&base, ClearEndpoint::Clear);
    let err = client.clear().await.unwrap_err();
    assert!(err.is_not_found());
  }

  #[test]
  fn invalid_base_url_is_reported() {
    let client = ApiClient::new("not a url", ClearEndpoint::Clear);
    assert!(matches!(client.url("/history/videos", &[]), Err(ApiError::InvalidUrl(_))));
  }
}
