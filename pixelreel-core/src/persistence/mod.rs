//! Persistence of playback state and brightness
//!
//! Playback fields and brightness are stored under separate keys of the
//! same key-value store. Every read and write takes the store mutex, so
//! the two writers never interleave inside one key and never overwrite
//! each other's key.
//!
//! Records are postcard-encoded and start with a format byte.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::{Name, PlaybackSettings};
use crate::traits::{KeyValueStore, StoreError, StoreKey};

/// Current record format
pub const RECORD_FORMAT: u8 = 1;

/// Largest encoded record
pub const MAX_RECORD_SIZE: usize = 64;

/// Store shared between the playback and brightness writers
pub type SharedStore<M, K> = Mutex<M, RefCell<K>>;

/// Errors from saving or loading a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PersistError {
    /// Record could not be encoded or decoded
    Encoding,
    /// Record has an unknown format byte
    UnknownFormat(u8),
    /// Store failed
    Store(StoreError),
}

impl From<StoreError> for PersistError {
    fn from(e: StoreError) -> Self {
        PersistError::Store(e)
    }
}

impl From<postcard::Error> for PersistError {
    fn from(_: postcard::Error) -> Self {
        PersistError::Encoding
    }
}

/// Playback fields as written to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackRecord {
    pub format: u8,
    pub power_on: bool,
    /// Empty when no category is selected
    pub last_selected_category: Name,
    pub category_playback: bool,
}

impl Default for PlaybackRecord {
    fn default() -> Self {
        Self {
            format: RECORD_FORMAT,
            power_on: true,
            last_selected_category: Name::new(),
            category_playback: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct BrightnessRecord {
    format: u8,
    level: u8,
}

/// Everything restored at start-up
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackStateFields {
    pub power_on: bool,
    pub last_selected_category: Option<Name>,
    pub category_playback: bool,
    pub brightness: u8,
}

/// Reads and writes persisted records through the shared store
pub struct PersistenceBridge<'a, M: RawMutex, K: KeyValueStore> {
    store: &'a SharedStore<M, K>,
}

impl<M: RawMutex, K: KeyValueStore> Clone for PersistenceBridge<'_, M, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, K: KeyValueStore> Copy for PersistenceBridge<'_, M, K> {}

impl<'a, M: RawMutex, K: KeyValueStore> PersistenceBridge<'a, M, K> {
    pub fn new(store: &'a SharedStore<M, K>) -> Self {
        Self { store }
    }

    fn write(&self, key: StoreKey, bytes: &[u8]) -> Result<(), PersistError> {
        self.store
            .lock(|cell| cell.borrow_mut().write(key, bytes))
            .map_err(PersistError::from)
    }

    fn read<'b>(&self, key: StoreKey, buf: &'b mut [u8]) -> Result<&'b [u8], PersistError> {
        let len = self.store.lock(|cell| cell.borrow_mut().read(key, buf))?;
        Ok(&buf[..len])
    }

    /// Write the playback fields
    pub fn save(&self, record: &PlaybackRecord) -> Result<(), PersistError> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let bytes = postcard::to_slice(record, &mut buf)?;
        self.write(StoreKey::PlaybackState, bytes)
    }

    /// Write the brightness level
    pub fn save_brightness(&self, level: u8) -> Result<(), PersistError> {
        let record = BrightnessRecord {
            format: RECORD_FORMAT,
            level,
        };
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let bytes = postcard::to_slice(&record, &mut buf)?;
        self.write(StoreKey::Brightness, bytes)
    }

    fn load_playback(&self) -> Result<PlaybackRecord, PersistError> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let record: PlaybackRecord = postcard::from_bytes(self.read(StoreKey::PlaybackState, &mut buf)?)?;
        if record.format != RECORD_FORMAT {
            return Err(PersistError::UnknownFormat(record.format));
        }
        Ok(record)
    }

    fn load_brightness(&self) -> Result<u8, PersistError> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let record: BrightnessRecord = postcard::from_bytes(self.read(StoreKey::Brightness, &mut buf)?)?;
        if record.format != RECORD_FORMAT {
            return Err(PersistError::UnknownFormat(record.format));
        }
        Ok(record.level)
    }

    /// Read every persisted field, falling back to defaults
    ///
    /// Missing records are normal on first boot; unreadable ones are logged.
    pub fn load(&self, settings: &PlaybackSettings) -> PlaybackStateFields {
        let playback = match self.load_playback() {
            Ok(record) => record,
            Err(PersistError::Store(StoreError::NotFound)) => {
                debug!("No persisted playback state, using defaults");
                PlaybackRecord::default()
            }
            Err(e) => {
                warn!("Persisted playback state unreadable: {:?}", e);
                PlaybackRecord::default()
            }
        };

        let brightness = match self.load_brightness() {
            Ok(level) => level,
            Err(PersistError::Store(StoreError::NotFound)) => settings.default_brightness,
            Err(e) => {
                warn!("Persisted brightness unreadable: {:?}", e);
                settings.default_brightness
            }
        };

        let last_selected_category = if playback.last_selected_category.is_empty() {
            None
        } else {
            Some(playback.last_selected_category)
        };

        PlaybackStateFields {
            power_on: playback.power_on,
            last_selected_category,
            category_playback: playback.category_playback,
            brightness,
        }
    }
}
