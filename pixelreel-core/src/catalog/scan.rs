//! Building the catalog from storage

use heapless::Vec;

use super::{Catalog, Category, FileList};
use crate::config::{is_animation_file, join_path, to_name, Name, MAX_CATEGORIES};
use crate::traits::{Storage, StorageError};

/// Errors from a full catalog scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanError {
    /// The content root could not be opened
    RootUnavailable,
}

/// List the animation files of one category directory
///
/// Hidden files, subdirectories and files without the animation extension
/// are ignored. The result is sorted by name.
pub fn list_category<S: Storage>(
    storage: &mut S,
    root: &str,
    category: &str,
) -> Result<FileList, StorageError> {
    let dir = join_path(&[root, category]).ok_or(StorageError::NotFound)?;
    let mut files = FileList::new();

    storage.list_dir(&dir, &mut |entry| {
        if entry.is_dir || entry.is_hidden() || !is_animation_file(entry.name) {
            return;
        }
        let Some(name) = to_name(entry.name) else {
            warn!("Skipping {}/{}: name too long", category, entry.name);
            return;
        };
        if files.push(name).is_err() {
            warn!("Category {} is full, skipping {}", category, entry.name);
        }
    })?;

    files.sort_unstable();
    Ok(files)
}

/// Scan the content root and build a new catalog
///
/// Every non-hidden subdirectory with at least one animation file becomes a
/// category. A category that cannot be listed is skipped. The caller swaps
/// the result in, so the previous catalog stays usable during the scan.
///
/// Directories are read in batches of [`MAX_CATEGORIES`], so empty or
/// unreadable ones do not take the place of categories later in the root.
pub fn scan<S: Storage>(storage: &mut S, root: &str) -> Result<Catalog, ScanError> {
    let mut catalog = Catalog::new();
    let mut skip = 0;

    loop {
        let (batch, next) = next_batch(storage, root, skip)?;
        for dir in &batch {
            let files = match list_category(storage, root, dir) {
                Ok(files) => files,
                Err(e) => {
                    warn!("Cannot list category {}: {:?}", dir.as_str(), e);
                    continue;
                }
            };

            let count = files.len();
            let Some(category) = Category::new(dir.clone(), files) else {
                debug!("Category {} has no animations, dropped", dir.as_str());
                continue;
            };
            if catalog.push(category).is_err() {
                warn!("Too many categories, skipping {} and the rest", dir.as_str());
                return Ok(finish(catalog, root));
            }
            debug!("Category {}: {} files", dir.as_str(), count);
        }

        match next {
            Some(n) => skip = n,
            None => return Ok(finish(catalog, root)),
        }
    }
}

fn finish(catalog: Catalog, root: &str) -> Catalog {
    info!("Scan of {} found {} categories", root, catalog.len());
    catalog
}

/// Collect up to [`MAX_CATEGORIES`] directory names, starting at the
/// `skip`-th directory of the root
///
/// Also returns the index to resume from when directories remain.
fn next_batch<S: Storage>(
    storage: &mut S,
    root: &str,
    skip: usize,
) -> Result<(Vec<Name, MAX_CATEGORIES>, Option<usize>), ScanError> {
    let mut batch: Vec<Name, MAX_CATEGORIES> = Vec::new();
    let mut index = 0;
    let mut resume = None;

    storage
        .list_dir(root, &mut |entry| {
            if !entry.is_dir || entry.is_hidden() {
                return;
            }
            let i = index;
            index += 1;
            if i < skip || resume.is_some() {
                return;
            }
            if batch.is_full() {
                resume = Some(i);
                return;
            }
            match to_name(entry.name) {
                // batch has room, checked above
                Some(name) => {
                    let _ = batch.push(name);
                }
                None => warn!("Skipping category {}: name too long", entry.name),
            }
        })
        .map_err(|e| {
            warn!("Cannot open content root {}: {:?}", root, e);
            ScanError::RootUnavailable
        })?;

    Ok((batch, resume))
}
