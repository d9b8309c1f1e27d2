//! Category catalog
//!
//! The catalog maps category names to the ordered animation files found in
//! the matching subdirectory of the content root. A category is only kept
//! while it has at least one file, and its cursor always points at one of
//! those files.

mod scan;

pub use scan::{list_category, scan, ScanError};

use heapless::Vec;

use crate::config::{Name, MAX_CATEGORIES, MAX_FILES_PER_CATEGORY};
use crate::traits::Storage;

/// File list of one category
pub type FileList = Vec<Name, MAX_FILES_PER_CATEGORY>;

/// Navigation direction within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Backward,
}

/// Errors from catalog updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// No category with that name
    NotFound,
    /// Catalog already holds the maximum number of categories
    Full,
    /// Name does not fit the fixed name capacity
    InvalidName,
    /// Listing the category directory failed
    Storage(crate::traits::StorageError),
}

/// What a category refresh did to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CategoryChange {
    /// Existing category got a new file list
    Updated(usize),
    /// New category appended at this index
    Inserted(usize),
    /// Category at this index lost its last file and was dropped
    Removed(usize),
    /// Unknown category with no files, nothing to do
    Unchanged,
}

/// A named group of animation files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: Name,
    files: FileList,
    cursor: usize,
}

impl Category {
    /// Create a category, or `None` if `files` is empty
    pub fn new(name: Name, files: FileList) -> Option<Self> {
        if files.is_empty() {
            return None;
        }
        Some(Self {
            name,
            files,
            cursor: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_owned(&self) -> Name {
        self.name.clone()
    }

    pub fn files(&self) -> &[Name] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Index of the current file
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// File under the cursor
    pub fn current(&self) -> &Name {
        &self.files[self.cursor]
    }

    /// Move the cursor one step, wrapping at both ends
    pub fn step(&mut self, direction: Direction) -> &Name {
        let len = self.files.len();
        self.cursor = match direction {
            Direction::Forward => (self.cursor + 1) % len,
            Direction::Backward => (self.cursor + len - 1) % len,
        };
        &self.files[self.cursor]
    }

    /// Put the cursor back to the first file
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// True if `file` is one of this category's files
    pub fn contains(&self, file: &str) -> bool {
        self.files.iter().any(|f| f.as_str() == file)
    }

    /// Swap in a new non-empty file list
    ///
    /// The cursor follows the file it pointed at when that file is still
    /// present, otherwise it is clamped to the new list.
    fn replace_files(&mut self, files: FileList) {
        let previous = self.files[self.cursor].clone();
        self.files = files;
        self.cursor = match self.files.iter().position(|f| *f == previous) {
            Some(idx) => idx,
            None => self.cursor.min(self.files.len() - 1),
        };
    }
}

/// Ordered set of categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category, MAX_CATEGORIES>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Category> {
        self.categories.get_mut(index)
    }

    /// Index of a category, matching the name case-insensitively
    pub fn position(&self, name: &str) -> Option<usize> {
        self.categories
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Look up a category case-insensitively
    pub fn find(&self, name: &str) -> Option<&Category> {
        self.position(name).and_then(|idx| self.categories.get(idx))
    }

    /// Category names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name())
    }

    /// Append a category
    pub fn push(&mut self, category: Category) -> Result<usize, CatalogError> {
        self.categories
            .push(category)
            .map_err(|_| CatalogError::Full)?;
        Ok(self.categories.len() - 1)
    }

    /// Apply a fresh listing of one category directory
    ///
    /// An empty listing drops the category; a listing for an unknown name
    /// adds it.
    pub fn apply_listing(
        &mut self,
        name: &str,
        files: FileList,
    ) -> Result<CategoryChange, CatalogError> {
        match (self.position(name), files.is_empty()) {
            (Some(idx), true) => {
                self.categories.remove(idx);
                Ok(CategoryChange::Removed(idx))
            }
            (Some(idx), false) => {
                self.categories[idx].replace_files(files);
                Ok(CategoryChange::Updated(idx))
            }
            (None, true) => Ok(CategoryChange::Unchanged),
            (None, false) => {
                let name = crate::config::to_name(name).ok_or(CatalogError::InvalidName)?;
                let category = Category {
                    name,
                    files,
                    cursor: 0,
                };
                self.push(category).map(CategoryChange::Inserted)
            }
        }
    }

    /// Re-list one existing category from storage
    pub fn refresh_one<S: Storage>(
        &mut self,
        storage: &mut S,
        root: &str,
        name: &str,
    ) -> Result<CategoryChange, CatalogError> {
        let idx = self.position(name).ok_or(CatalogError::NotFound)?;
        let exact = self.categories[idx].name.clone();
        let files = list_category(storage, root, &exact).map_err(CatalogError::Storage)?;
        self.apply_listing(&exact, files)
    }
}
