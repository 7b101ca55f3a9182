use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::notice::types::Department;

/// Development default of the notice service
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Custom title for header (defaults to "Notice Board")
  pub title: Option<String>,
  /// Department the list view starts filtered to
  pub default_department: Option<Department>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_url")]
  pub url: String,
  /// Admin username offered by `login` when none is given
  pub username: Option<String>,
  #[serde(default = "default_timeout")]
  pub timeout_secs: u64,
}

fn default_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
  30
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_url(),
      username: None,
      timeout_secs: default_timeout(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./noticeboard.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/noticeboard/config.yaml
  ///
  /// Without a file the defaults are used. `NOTICEBOARD_API_URL` overrides
  /// the API url either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => {
        debug!("no config file found, using defaults");
        Config::default()
      }
    };

    if let Ok(url) = std::env::var("NOTICEBOARD_API_URL") {
      config.api.url = url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("noticeboard.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("noticeboard").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("Notice Board")
  }

  /// Get the admin password from environment variables.
  ///
  /// Checks NOTICEBOARD_PASSWORD.
  pub fn get_password() -> Option<String> {
    std::env::var("NOTICEBOARD_PASSWORD").ok()
  }
}
