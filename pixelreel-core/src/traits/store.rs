//! Persistent key-value store abstraction
//!
//! Each key owns an independent region. Writing one key never touches the
//! bytes of another.

/// Storage keys for persisted data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StoreKey {
    /// Power, last selected category and category playback (postcard)
    PlaybackState = 0,
    /// Panel brightness (postcard)
    Brightness = 1,
}

impl StoreKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StoreKey::PlaybackState),
            1 => Some(StoreKey::Brightness),
            _ => None,
        }
    }
}

/// Errors from store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Underlying medium failed
    Io,
    /// Key never written
    NotFound,
    /// Buffer too small for the data
    BufferTooSmall,
    /// Data corrupted or invalid
    Corrupted,
}

/// Key-value store for persisted settings
pub trait KeyValueStore {
    /// Read a value by key into the provided buffer
    ///
    /// Returns the number of bytes read.
    fn read(&mut self, key: StoreKey, buffer: &mut [u8]) -> Result<usize, StoreError>;

    /// Replace the value stored under `key`
    fn write(&mut self, key: StoreKey, data: &[u8]) -> Result<(), StoreError>;
}
