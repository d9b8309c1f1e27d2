//! Playback state and navigation
//!
//! `PlaybackState` is the single record of what is selected and playing.
//! It is plain data with no locking; [`Player`](super::Player) wraps it in
//! a mutex and adds persistence.

use heapless::Vec;

use crate::catalog::{Catalog, CatalogError, Category, CategoryChange, Direction, FileList};
use crate::config::{Name, MAX_CATEGORIES};
use crate::persistence::{PlaybackRecord, RECORD_FORMAT};

/// File list of one category, as reported to a controller
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CategoryInfo {
    pub name: Name,
    pub files: FileList,
}

impl CategoryInfo {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Name and size of one category
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CategorySummary {
    pub name: Name,
    pub file_count: usize,
}

/// Point-in-time copy of the playback state
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    pub category: Option<Name>,
    pub file: Name,
    pub category_playback: bool,
    pub power_on: bool,
    pub category_count: usize,
    pub categories: Vec<CategorySummary, MAX_CATEGORIES>,
}

/// Selected category, current file, and the playback flags
#[derive(Debug, Clone)]
pub struct PlaybackState {
    catalog: Catalog,
    selected: Option<usize>,
    current_file: Name,
    category_playback: bool,
    power_on: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    /// Empty catalog, nothing selected, powered on, category playback off
    pub fn new() -> Self {
        Self {
            catalog: Catalog::new(),
            selected: None,
            current_file: Name::new(),
            category_playback: false,
            power_on: true,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.selected.and_then(|idx| self.catalog.get(idx))
    }

    pub fn current_file(&self) -> &str {
        &self.current_file
    }

    pub fn category_playback(&self) -> bool {
        self.category_playback
    }

    pub fn power_on(&self) -> bool {
        self.power_on
    }

    /// Select a category by name, ignoring case
    ///
    /// The category restarts from its first file and then advances once, so
    /// selecting the same category twice lands on the same file. On a miss
    /// nothing changes and `false` is returned.
    pub fn select_category(&mut self, name: &str) -> bool {
        let Some(idx) = self.catalog.position(name) else {
            warn!("Category not found: {}", name);
            return false;
        };

        if let Some(category) = self.catalog.get_mut(idx) {
            category.rewind();
        }
        self.selected = Some(idx);
        let file = self.advance(Direction::Forward);
        debug!("Selected category {} at {}", name, file.as_str());
        true
    }

    /// Step the selected category and make the new file current
    ///
    /// Returns an empty name when nothing is selected.
    pub fn advance(&mut self, direction: Direction) -> Name {
        match self.selected.and_then(|idx| self.catalog.get_mut(idx)) {
            Some(category) => {
                self.current_file = category.step(direction).clone();
                self.current_file.clone()
            }
            None => Name::new(),
        }
    }

    pub fn set_category_playback(&mut self, enabled: bool) {
        self.category_playback = enabled;
    }

    pub fn set_power_on(&mut self, on: bool) {
        self.power_on = on;
    }

    /// Swap in a freshly scanned catalog
    ///
    /// The selection survives when the category still exists; the cursor is
    /// moved to the current file if that file is still there.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        let previous = self.selected_category().map(|c| c.name_owned());
        self.catalog = catalog;
        self.selected = None;

        let Some(previous) = previous else {
            self.current_file.clear();
            return;
        };
        self.reselect(&previous);
    }

    fn reselect(&mut self, name: &Name) {
        let Some(idx) = self.catalog.position(name) else {
            warn!("Selected category {} disappeared", name.as_str());
            self.current_file.clear();
            return;
        };
        self.selected = Some(idx);

        let current = self.current_file.clone();
        let Some(category) = self.catalog.get_mut(idx) else {
            return;
        };
        match category.files().iter().position(|f| *f == current) {
            Some(pos) => {
                category.rewind();
                for _ in 0..pos {
                    category.step(Direction::Forward);
                }
            }
            None => self.current_file.clear(),
        }
    }

    /// Apply a fresh listing of one category and keep the selection valid
    pub fn apply_listing(
        &mut self,
        name: &str,
        files: FileList,
    ) -> Result<CategoryChange, CatalogError> {
        let change = self.catalog.apply_listing(name, files)?;
        match (change, self.selected) {
            (CategoryChange::Removed(idx), Some(sel)) if sel == idx => {
                warn!("Selected category {} is now empty", name);
                self.selected = None;
                self.current_file.clear();
            }
            (CategoryChange::Removed(idx), Some(sel)) if sel > idx => {
                self.selected = Some(sel - 1);
            }
            (CategoryChange::Updated(idx), Some(sel)) if sel == idx => {
                let keep = self
                    .catalog
                    .get(idx)
                    .is_some_and(|c| c.contains(&self.current_file));
                if !keep {
                    self.current_file.clear();
                }
            }
            _ => {}
        }
        Ok(change)
    }

    /// Files of one category, or `None` if it does not exist
    pub fn category_info(&self, name: &str) -> Option<CategoryInfo> {
        self.catalog.find(name).map(|c| CategoryInfo {
            name: c.name_owned(),
            files: c.files().iter().cloned().collect(),
        })
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            category: self.selected_category().map(|c| c.name_owned()),
            file: self.current_file.clone(),
            category_playback: self.category_playback,
            power_on: self.power_on,
            category_count: self.catalog.len(),
            categories: self
                .catalog
                .iter()
                .map(|c| CategorySummary {
                    name: c.name_owned(),
                    file_count: c.file_count(),
                })
                .collect(),
        }
    }

    /// Fields written by the persistence bridge
    pub fn record(&self) -> PlaybackRecord {
        PlaybackRecord {
            format: RECORD_FORMAT,
            power_on: self.power_on,
            last_selected_category: self
                .selected_category()
                .map(|c| c.name_owned())
                .unwrap_or_default(),
            category_playback: self.category_playback,
        }
    }
}
