//! Panel brightness
//!
//! Brightness is owned by the display side, not by the playback state. It
//! has its own lock and its own store key, and reaches the render task
//! through a [`BrightnessSignal`] holding the latest unapplied level.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::persistence::{PersistError, PersistenceBridge};
use crate::playback::BrightnessSignal;
use crate::traits::KeyValueStore;

/// Current brightness level, shared between control surface and start-up
pub struct Brightness<'a, M: RawMutex, K: KeyValueStore> {
    level: Mutex<M, Cell<u8>>,
    bridge: PersistenceBridge<'a, M, K>,
    panel: &'a BrightnessSignal<M>,
}

impl<'a, M: RawMutex, K: KeyValueStore> Brightness<'a, M, K> {
    pub fn new(bridge: PersistenceBridge<'a, M, K>, panel: &'a BrightnessSignal<M>, level: u8) -> Self {
        Self {
            level: Mutex::new(Cell::new(level)),
            bridge,
            panel,
        }
    }

    pub fn get(&self) -> u8 {
        self.level.lock(|l| l.get())
    }

    /// Change the brightness, persist it, and forward it to the driver
    ///
    /// The driver is updated even when persisting fails.
    pub fn set(&self, level: u8) -> Result<(), PersistError> {
        self.level.lock(|l| l.set(level));
        self.panel.signal(level);
        debug!("Brightness set to {}", level);

        self.bridge.save_brightness(level).map_err(|e| {
            warn!("Failed to persist brightness: {:?}", e);
            e
        })
    }

    /// Apply a restored level without writing it back
    pub fn apply(&self, level: u8) {
        self.level.lock(|l| l.set(level));
        self.panel.signal(level);
    }
}
