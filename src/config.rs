use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::notes::GuestId;

const DEFAULT_SERVER_URL: &str = "http://localhost:8080";
const SAVED_GUEST_FILE: &str = "guest.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub server: ServerConfig,
  /// Guest whose notes are shown. When unset, the guest saved by an earlier
  /// launch is used, and failing that a new guest is registered.
  pub guest_id: Option<GuestId>,
  #[serde(default)]
  pub start_view: StartView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_server_url")]
  pub url: String,
  /// Per-request timeout for the note store
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      url: default_server_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_server_url() -> String {
  DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  10
}

/// Which calendar view the app opens with
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StartView {
  #[default]
  Month,
  Week,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./calnotes.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/calnotes/config.yaml
  ///
  /// Falls back to defaults when no file exists. Environment overrides are
  /// applied last.
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

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => {
        info!("no config file found, using defaults");
        Self::default()
      }
    };

    config
      .with_env_overrides()?
      .with_saved_guest(saved_guest_path().as_deref())
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("calnotes.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("calnotes").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config = Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    info!(path = %path.display(), "loaded config");
    Ok(config)
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Apply CALNOTES_SERVER_URL and CALNOTES_GUEST_ID.
  fn with_env_overrides(self) -> Result<Self> {
    self.apply_overrides(
      std::env::var("CALNOTES_SERVER_URL").ok(),
      std::env::var("CALNOTES_GUEST_ID").ok(),
    )
  }

  /// Fill in a guest registered on an earlier launch. An explicit id from
  /// the file or environment wins.
  fn with_saved_guest(mut self, path: Option<&Path>) -> Result<Self> {
    if self.guest_id.is_some() {
      return Ok(self);
    }
    if let Some(path) = path {
      self.guest_id = read_saved_guest(path)?;
      if let Some(id) = self.guest_id {
        info!(guest_id = id, path = %path.display(), "using saved guest");
      }
    }
    Ok(self)
  }

  fn apply_overrides(mut self, server_url: Option<String>, guest_id: Option<String>) -> Result<Self> {
    if let Some(url) = server_url {
      self.server.url = url;
    }
    if let Some(raw) = guest_id {
      let id = raw
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid CALNOTES_GUEST_ID '{}': {}", raw, e))?;
      self.guest_id = Some(id);
    }
    Ok(self)
  }
}

/// Guest registered by calnotes itself, stored under the data directory
#[derive(Debug, Serialize, Deserialize)]
struct SavedGuest {
  guest_id: GuestId,
}

pub fn saved_guest_path() -> Option<PathBuf> {
  dirs::data_dir().map(|dir| dir.join("calnotes").join(SAVED_GUEST_FILE))
}

/// The saved guest id, or `None` when nothing was saved yet
fn read_saved_guest(path: &Path) -> Result<Option<GuestId>> {
  if !path.exists() {
    return Ok(None);
  }
  let contents = std::fs::read_to_string(path)
    .map_err(|e| eyre!("Failed to read saved guest {}: {}", path.display(), e))?;
  let saved: SavedGuest = serde_yaml::from_str(&contents)
    .map_err(|e| eyre!("Failed to parse saved guest {}: {}", path.display(), e))?;
  Ok(Some(saved.guest_id))
}

fn write_saved_guest(path: &Path, guest_id: GuestId) -> Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create {}: {}", parent.display(), e))?;
  }
  let contents = serde_yaml::to_string(&SavedGuest { guest_id })
    .map_err(|e| eyre!("Failed to serialize saved guest: {}", e))?;
  std::fs::write(path, contents)
    .map_err(|e| eyre!("Failed to write saved guest {}: {}", path.display(), e))
}

/// Remember a newly registered guest for later launches. Returns where it
/// was written.
pub fn save_guest(guest_id: GuestId) -> Result<PathBuf> {
  let path = saved_guest_path().ok_or_else(|| eyre!("Could not determine data directory"))?;
  write_saved_guest(&path, guest_id)?;
  info!(guest_id, path = %path.display(), "saved guest");
  Ok(path)
}
