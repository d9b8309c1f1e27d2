//! Configuration file loading
//!
//! A missing file falls back to defaults with a warning. A file that
//! exists but does not parse is an error.

use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use log::{info, warn};

use super::types::HostConfig;

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read
    Io(io::Error),
    /// TOML parsing failed
    Parse(toml::de::Error),
    /// Parsed, but a value is out of range
    Invalid(&'static str),
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid config: {}", e),
            ConfigError::Invalid(what) => write!(f, "invalid config: {}", what),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from `path`
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found, using defaults", path.display());
            return Ok(HostConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    let config = parse_config(&text)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Parse and validate TOML configuration text
pub fn parse_config(text: &str) -> Result<HostConfig, ConfigError> {
    let config: HostConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &HostConfig) -> Result<(), ConfigError> {
    let playback = &config.playback;
    if playback.refresh_interval_ms == 0 {
        return Err(ConfigError::Invalid("playback.refresh_interval_ms must be non-zero"));
    }
    if playback.update_poll_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "playback.update_poll_interval_ms must be non-zero",
        ));
    }
    if playback.panel_width == 0 || playback.panel_height == 0 {
        return Err(ConfigError::Invalid("playback panel size must be non-zero"));
    }
    if !playback.content_root.starts_with('/') {
        return Err(ConfigError::Invalid("playback.content_root must be absolute"));
    }
    if config.control.listen.is_empty() {
        return Err(ConfigError::Invalid("control.listen is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelreel_core::config::PlaybackSettings;
    use std::path::PathBuf;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_config("").unwrap(), HostConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
            [storage]
            root = "/srv/card"

            [playback]
            max_play_time_ms = 5000
            default_brightness = 40

            [display]
            snapshot = "frame.png"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.root, PathBuf::from("/srv/card"));
        assert_eq!(config.storage.state_dir, PathBuf::from("state"));
        assert_eq!(config.playback.max_play_time_ms, 5000);
        assert_eq!(config.playback.default_brightness, 40);
        assert_eq!(
            config.playback.refresh_interval_ms,
            PlaybackSettings::default().refresh_interval_ms
        );
        assert_eq!(config.playback.content_root.as_str(), "/gifs");
        assert_eq!(config.display.snapshot, Some(PathBuf::from("frame.png")));
        assert_eq!(config.control.listen, "127.0.0.1:7070");
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(matches!(
            parse_config("[panel]\nwidth = 32\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            parse_config("[playback]\nrefresh_interval_ms = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_shipped_config_is_default() {
        let shipped = include_str!("../../pixelreel.toml");
        assert_eq!(parse_config(shipped).unwrap(), HostConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixelreel.toml");
        fs::write(&path, "[storage\nroot = 1").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_marker_resolved_below_root() {
        let config = HostConfig::default();
        assert_eq!(
            config.update.marker_path(Path::new("/srv/card")),
            PathBuf::from("/srv/card/update.request")
        );
    }
}
