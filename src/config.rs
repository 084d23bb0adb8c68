use clap::ValueEnum;
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::ClearEndpoint;
use crate::constants::constants;

const APP_NAME: &str = "yd";

/// Where the search history lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
  /// Local file only, capped at the most recent entries.
  #[default]
  Local,
  /// Server history, cached in a local file.
  Mirrored,
  /// Server history only.
  Remote,
}

/// User preferences from `prefs.toml`. Every key is optional.
#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Config {
  pub api_url: Option<String>,
  pub history_mode: Option<HistoryMode>,
  pub download_dir: Option<PathBuf>,
  pub clear_endpoint: Option<ClearEndpoint>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }
}

/// Command-line values that take precedence over `prefs.toml`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
  pub api_url: Option<String>,
  pub history_mode: Option<HistoryMode>,
  pub download_dir: Option<PathBuf>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub api_url: String,
  pub history_mode: HistoryMode,
  pub download_dir: PathBuf,
  pub clear_endpoint: ClearEndpoint,
  pub data_dir: PathBuf,
}

impl Settings {
  pub fn resolve(config: Config, overrides: Overrides) -> Self {
    let api_url = overrides
      .api_url
      .or(config.api_url)
      .map(|u| u.trim().to_string())
      .filter(|u| !u.is_empty())
      .unwrap_or_else(|| constants().default_api_url.clone());
    let download_dir = overrides.download_dir.or(config.download_dir).unwrap_or_else(default_download_dir);

    Self {
      api_url,
      history_mode: overrides.history_mode.or(config.history_mode).unwrap_or_default(),
      download_dir,
      clear_endpoint: config.clear_endpoint.unwrap_or_default(),
      data_dir: data_dir(),
    }
  }
}

fn default_download_dir() -> PathBuf {
  UserDirs::new().and_then(|dirs| dirs.download_dir().map(|p| p.to_path_buf())).unwrap_or_else(|| PathBuf::from("."))
}

/// Directory for the history cache and log files.
pub fn data_dir() -> PathBuf {
  ProjectDirs::from("", "", APP_NAME).map(|p| p.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from(".yd"))
}
