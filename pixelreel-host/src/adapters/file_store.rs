//! Key-value store kept as one file per key
//!
//! Values are written to a temporary file and renamed into place, so a
//! crash mid-write leaves the previous value intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::warn;
use pixelreel_core::traits::{KeyValueStore, StoreError, StoreKey};

/// Store rooted in a host directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store, creating its directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: StoreKey) -> PathBuf {
        let name = match key {
            StoreKey::PlaybackState => "playback.bin",
            StoreKey::Brightness => "brightness.bin",
        };
        self.dir.join(name)
    }
}

impl KeyValueStore for FileStore {
    fn read(&mut self, key: StoreKey, buffer: &mut [u8]) -> Result<usize, StoreError> {
        let data = fs::read(self.path(key)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound,
            _ => {
                warn!("Cannot read {:?}: {}", key, e);
                StoreError::Io
            }
        })?;

        let target = buffer.get_mut(..data.len()).ok_or(StoreError::BufferTooSmall)?;
        target.copy_from_slice(&data);
        Ok(data.len())
    }

    fn write(&mut self, key: StoreKey, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, data)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|e| {
                warn!("Cannot write {:?}: {}", key, e);
                StoreError::Io
            })
    }
}
