//! Shared trajview configuration types.
//!
//! The CLI reads `trajview.toml` into [`ViewerConfig`] and hands the
//! `[playback]` section to the replay engine. Every field has a serde default,
//! so a missing or partial file is always a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "trajview.toml";

/// Default pause between two auto-played messages.
pub const DEFAULT_MESSAGE_DELAY_MS: u64 = 1200;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level configuration (persisted as `trajview.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ViewerConfig {
    #[serde(default)]
    pub playback: PlaybackSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaybackSettings {
    /// Pause between auto-played messages, in milliseconds.
    #[serde(default = "default_message_delay_ms", alias = "message_delay")]
    pub message_delay_ms: u64,
    /// How parallel tool calls of one message are presented.
    #[serde(default)]
    pub tool_presentation: ToolPresentation,
    /// Start playing as soon as a trajectory finishes loading.
    #[serde(default = "default_false")]
    pub autoplay: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            message_delay_ms: DEFAULT_MESSAGE_DELAY_MS,
            tool_presentation: ToolPresentation::default(),
            autoplay: false,
        }
    }
}

impl PlaybackSettings {
    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }
}

/// Whether the tool calls of one step are grouped into a single block or
/// shown one block per call. Only affects what the projector receives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolPresentation {
    #[default]
    Joint,
    Individual,
    /// Unknown values are normalized by [`apply_fallbacks`].
    #[serde(other)]
    Unknown,
}

impl ToolPresentation {
    pub fn display(&self) -> &'static str {
        match self {
            Self::Joint => "joint",
            Self::Individual => "individual",
            Self::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for ToolPresentation {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "joint" => Ok(Self::Joint),
            "individual" => Ok(Self::Individual),
            other => Err(format!(
                "unknown tool presentation '{other}' (expected joint or individual)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    /// Base URL of a trajview server.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Local directory of `<model>_<task>.json` files.
    #[serde(default = "default_traj_dir")]
    pub traj_dir: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            traj_dir: default_traj_dir(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_false() -> bool {
    false
}
fn default_message_delay_ms() -> u64 {
    DEFAULT_MESSAGE_DELAY_MS
}
fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_traj_dir() -> String {
    "trajs".to_string()
}

/// Normalize values that deserialize but cannot be used as-is.
/// Returns true when any field was updated.
pub fn apply_fallbacks(config: &mut ViewerConfig) -> bool {
    let mut changed = false;

    if config.playback.message_delay_ms == 0 {
        config.playback.message_delay_ms = DEFAULT_MESSAGE_DELAY_MS;
        changed = true;
    }

    if config.playback.tool_presentation == ToolPresentation::Unknown {
        config.playback.tool_presentation = ToolPresentation::Joint;
        changed = true;
    }

    if config.store.server_url.trim().is_empty() {
        config.store.server_url = default_server_url();
        changed = true;
    }

    changed
}

/// Read a config file. A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<ViewerConfig, ConfigError> {
    if !path.exists() {
        return Ok(ViewerConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: ViewerConfig =
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    apply_fallbacks(&mut config);
    Ok(config)
}

pub fn save_to(path: &Path, config: &ViewerConfig) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
