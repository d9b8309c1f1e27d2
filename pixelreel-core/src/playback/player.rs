//! Shared playback handle
//!
//! `Player` owns the playback state behind one exclusive-access region.
//! Every mutator and reader takes the lock exactly once, and changes to the
//! persisted fields are written through before the lock is released.
//! Storage is never touched while the lock is held.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use super::command::{send_command, CommandSender, DriverCommand};
use super::state::{CategoryInfo, PlaybackState, StatusSnapshot};
use crate::brightness::Brightness;
use crate::catalog::{list_category, scan, CatalogError, CategoryChange, Direction, ScanError};
use crate::config::{Name, PlaybackSettings, StoragePath, MAX_CATEGORIES};
use crate::persistence::{PersistenceBridge, PlaybackStateFields};
use crate::traits::{KeyValueStore, Storage};

/// What the driver should play next
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackTarget {
    pub path: StoragePath,
    /// Whether the play-time budget applies
    pub cycling: bool,
}

/// Source of playback decisions for the driver
pub trait PlaybackSource {
    fn is_power_on(&self) -> bool;

    /// Resolve the next animation to play, advancing the category cursor
    /// when cycling; `None` when there is nothing to play
    fn next_target(&self) -> Option<PlaybackTarget>;
}

/// Playback state shared by the render task and the control surface
pub struct Player<'a, M: RawMutex, K: KeyValueStore> {
    state: Mutex<M, RefCell<PlaybackState>>,
    bridge: PersistenceBridge<'a, M, K>,
    commands: CommandSender<'a, M>,
    settings: PlaybackSettings,
}

impl<'a, M: RawMutex, K: KeyValueStore> Player<'a, M, K> {
    pub fn new(
        bridge: PersistenceBridge<'a, M, K>,
        commands: CommandSender<'a, M>,
        settings: PlaybackSettings,
    ) -> Self {
        Self {
            state: Mutex::new(RefCell::new(PlaybackState::new())),
            bridge,
            commands,
            settings,
        }
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    fn read<R>(&self, f: impl FnOnce(&PlaybackState) -> R) -> R {
        self.state.lock(|cell| f(&cell.borrow()))
    }

    fn read_mut<R>(&self, f: impl FnOnce(&mut PlaybackState) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Run `f` on the state and persist the playback fields if they changed
    fn mutate<R>(&self, f: impl FnOnce(&mut PlaybackState) -> R) -> R {
        self.state.lock(|cell| {
            let mut state = cell.borrow_mut();
            let before = state.record();
            let result = f(&mut state);
            let after = state.record();
            if after != before {
                if let Err(e) = self.bridge.save(&after) {
                    warn!("Failed to persist playback state: {:?}", e);
                }
            }
            result
        })
    }

    /// Select a category by name, ignoring case
    pub fn select_category(&self, name: &str) -> bool {
        self.mutate(|state| state.select_category(name))
    }

    /// Step through the selected category
    pub fn advance(&self, direction: Direction) -> Name {
        self.read_mut(|state| state.advance(direction))
    }

    pub fn set_category_playback(&self, enabled: bool) {
        self.mutate(|state| state.set_category_playback(enabled));
        info!("Category playback {}", if enabled { "on" } else { "off" });
    }

    /// Switch the panel on or off
    ///
    /// The driver blanks the panel and drops its open file on power off,
    /// and re-opens the display and plays at once on power on.
    pub fn set_power_on(&self, on: bool) {
        self.mutate(|state| state.set_power_on(on));
        let command = if on {
            DriverCommand::PowerOn
        } else {
            DriverCommand::PowerOff
        };
        send_command(&self.commands, command);
        info!("Power {}", if on { "on" } else { "off" });
    }

    /// Ask the driver to run the color test pattern
    pub fn test_pattern(&self) {
        send_command(&self.commands, DriverCommand::TestPattern);
    }

    pub fn list_categories(&self) -> Vec<Name, MAX_CATEGORIES> {
        self.read(|state| state.catalog().iter().map(|c| c.name_owned()).collect())
    }

    /// Files of one category; `None` if there is no such category
    pub fn category_info(&self, name: &str) -> Option<CategoryInfo> {
        self.read(|state| state.category_info(name))
    }

    pub fn status(&self) -> StatusSnapshot {
        self.read(|state| state.snapshot())
    }

    /// Rebuild the catalog from storage
    ///
    /// The scan runs without the lock; the old catalog stays in use until
    /// the new one is swapped in. On failure nothing changes.
    pub fn rescan<S: Storage>(&self, storage: &mut S) -> Result<usize, ScanError> {
        let catalog = scan(storage, &self.settings.content_root)?;
        let count = catalog.len();
        self.mutate(|state| state.replace_catalog(catalog));
        Ok(count)
    }

    /// Re-list one existing category in place
    pub fn refresh_category<S: Storage>(
        &self,
        storage: &mut S,
        name: &str,
    ) -> Result<CategoryChange, CatalogError> {
        let exact = self
            .read(|state| state.catalog().find(name).map(|c| c.name_owned()))
            .ok_or_else(|| {
                warn!("Cannot refresh unknown category {}", name);
                CatalogError::NotFound
            })?;
        self.relist(storage, &exact)
    }

    /// List a category directory and apply the result, inserting or
    /// dropping the category as needed
    pub(crate) fn relist<S: Storage>(
        &self,
        storage: &mut S,
        name: &str,
    ) -> Result<CategoryChange, CatalogError> {
        let files = match list_category(storage, &self.settings.content_root, name) {
            Ok(files) => files,
            Err(crate::traits::StorageError::NotFound) => Default::default(),
            Err(e) => return Err(CatalogError::Storage(e)),
        };
        let change = self.mutate(|state| state.apply_listing(name, files))?;
        debug!("Category {} refreshed: {:?}", name, change);
        Ok(change)
    }

    /// Apply persisted fields in order: brightness, category, category
    /// playback, power
    ///
    /// Nothing is written back; the values came from the store.
    pub fn restore(&self, fields: &PlaybackStateFields, brightness: &Brightness<'a, M, K>) {
        brightness.apply(fields.brightness);

        self.read_mut(|state| {
            if let Some(category) = &fields.last_selected_category {
                if !state.select_category(category) {
                    warn!("Persisted category {} no longer exists", category.as_str());
                }
            }
            state.set_category_playback(fields.category_playback);
            state.set_power_on(fields.power_on);
        });

        if !fields.power_on {
            send_command(&self.commands, DriverCommand::PowerOff);
        }
        info!(
            "Restored state: power {}, category playback {}",
            fields.power_on, fields.category_playback
        );
    }
}

impl<M: RawMutex, K: KeyValueStore> PlaybackSource for Player<'_, M, K> {
    fn is_power_on(&self) -> bool {
        self.read(|state| state.power_on())
    }

    fn next_target(&self) -> Option<PlaybackTarget> {
        self.read_mut(|state| {
            if !state.category_playback() {
                return Some(PlaybackTarget {
                    path: self.settings.default_animation.clone(),
                    cycling: false,
                });
            }

            let category = state.selected_category()?.name_owned();
            let file = state.advance(Direction::Forward);
            if file.is_empty() {
                return None;
            }
            match self.settings.file_path(&category, &file) {
                Some(path) => Some(PlaybackTarget {
                    path,
                    cycling: true,
                }),
                None => {
                    warn!("Path too long: {}/{}", category.as_str(), file.as_str());
                    None
                }
            }
        })
    }
}
