//! Configuration type definitions
//!
//! Names and paths are fixed-capacity strings; anything that does not fit
//! is rejected where it enters the system.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum category or file name length
pub const MAX_NAME_LEN: usize = 32;

/// Maximum path length (root + category + file)
pub const MAX_PATH_LEN: usize = 128;

/// Maximum categories in the catalog
pub const MAX_CATEGORIES: usize = 16;

/// Maximum animation files per category
pub const MAX_FILES_PER_CATEGORY: usize = 32;

/// Root directory of the animation library
pub const CONTENT_ROOT: &str = "/gifs";

/// Animation shown when category playback is off
pub const DEFAULT_ANIMATION: &str = "/gifs/current.gif";

/// Longest time one animation may play while cycling a category
pub const MAX_PLAY_TIME_MS: u32 = 8000;

/// Interval between playback passes
pub const REFRESH_INTERVAL_MS: u32 = 1000;

/// Interval between update-request polls
pub const UPDATE_POLL_INTERVAL_MS: u32 = 5000;

/// Brightness used until a persisted value is restored
pub const DEFAULT_BRIGHTNESS: u8 = 10;

/// Panel size in pixels
pub const PANEL_WIDTH: u16 = 64;
pub const PANEL_HEIGHT: u16 = 64;

/// Largest accepted upload
pub const MAX_UPLOAD_SIZE: u32 = 2 * 1024 * 1024;

/// Pause between test pattern colors
pub const TEST_PATTERN_STEP_MS: u32 = 1000;

/// File extension of animation files (compared case-insensitively)
pub const ANIMATION_EXTENSION: &str = "gif";

/// Category or file name
pub type Name = String<MAX_NAME_LEN>;

/// Absolute storage path
pub type StoragePath = String<MAX_PATH_LEN>;

/// Copy `s` into a [`Name`], or `None` if it is too long
pub fn to_name(s: &str) -> Option<Name> {
    let mut name = Name::new();
    name.push_str(s).ok()?;
    Some(name)
}

/// Join path components with `/`, or `None` if the result is too long
pub fn join_path(parts: &[&str]) -> Option<StoragePath> {
    let mut path = StoragePath::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 && !path.ends_with('/') {
            path.push('/').ok()?;
        }
        path.push_str(part).ok()?;
    }
    Some(path)
}

/// True if `name` has the animation extension, in any letter case
pub fn is_animation_file(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && ext.eq_ignore_ascii_case(ANIMATION_EXTENSION),
        None => false,
    }
}

/// Playback settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PlaybackSettings {
    /// Directory holding one subdirectory per category
    pub content_root: StoragePath,
    /// Animation shown when category playback is off
    pub default_animation: StoragePath,
    /// Per-animation time budget while cycling a category
    pub max_play_time_ms: u32,
    /// Interval between playback passes
    pub refresh_interval_ms: u32,
    /// Interval between update-request polls
    pub update_poll_interval_ms: u32,
    /// Brightness used when nothing is persisted
    pub default_brightness: u8,
    /// Panel width in pixels
    pub panel_width: u16,
    /// Panel height in pixels
    pub panel_height: u16,
    /// Largest accepted upload in bytes
    pub max_upload_size: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        let mut content_root = StoragePath::new();
        let _ = content_root.push_str(CONTENT_ROOT);
        let mut default_animation = StoragePath::new();
        let _ = default_animation.push_str(DEFAULT_ANIMATION);

        Self {
            content_root,
            default_animation,
            max_play_time_ms: MAX_PLAY_TIME_MS,
            refresh_interval_ms: REFRESH_INTERVAL_MS,
            update_poll_interval_ms: UPDATE_POLL_INTERVAL_MS,
            default_brightness: DEFAULT_BRIGHTNESS,
            panel_width: PANEL_WIDTH,
            panel_height: PANEL_HEIGHT,
            max_upload_size: MAX_UPLOAD_SIZE,
        }
    }
}

impl PlaybackSettings {
    /// Directory of one category
    pub fn category_dir(&self, category: &str) -> Option<StoragePath> {
        join_path(&[self.content_root.as_str(), category])
    }

    /// Path of one file inside a category
    pub fn file_path(&self, category: &str, file: &str) -> Option<StoragePath> {
        join_path(&[self.content_root.as_str(), category, file])
    }
}
