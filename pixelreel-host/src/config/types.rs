//! Host configuration types

use std::path::{Path, PathBuf};

use pixelreel_core::config::PlaybackSettings;
use serde::Deserialize;

/// Complete host configuration (`pixelreel.toml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub storage: StorageConfig,
    pub playback: PlaybackSettings,
    pub control: ControlConfig,
    pub update: UpdateConfig,
    pub display: DisplayConfig,
}

/// Where content and persisted state live on the host
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory standing in for the removable volume
    pub root: PathBuf,
    /// Directory holding the persisted key-value records
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("sdcard"),
            state_dir: PathBuf::from("state"),
        }
    }
}

/// Control server settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Socket address the control server binds to
    pub listen: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            listen: String::from("127.0.0.1:7070"),
        }
    }
}

/// Remote update request polling
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateConfig {
    /// Marker file whose presence signals a pending update
    ///
    /// Relative paths are resolved below the storage root.
    pub marker: PathBuf,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            marker: PathBuf::from("update.request"),
        }
    }
}

impl UpdateConfig {
    pub fn marker_path(&self, storage_root: &Path) -> PathBuf {
        if self.marker.is_absolute() {
            self.marker.clone()
        } else {
            storage_root.join(&self.marker)
        }
    }
}

/// Framebuffer output
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// PNG written on every flushed frame
    pub snapshot: Option<PathBuf>,
}
