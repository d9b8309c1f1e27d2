//! Uploading and deleting animation files
//!
//! Uploads are only accepted at the exact panel resolution; nothing is
//! resized or transcoded. A partially written file is removed before the
//! error is returned.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::catalog::CatalogError;
use crate::config::{is_animation_file, PlaybackSettings, MAX_CATEGORIES, MAX_NAME_LEN};
use crate::playback::Player;
use crate::traits::{AnimationFile, KeyValueStore, OpenMode, Storage, StorageError};

/// Errors from upload and delete requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadError {
    /// Category or file name is not acceptable
    InvalidName,
    /// Upload exceeds the size limit
    TooLarge,
    /// Not a GIF, or not at panel resolution
    InvalidImage,
    /// File or category does not exist
    NotFound,
    /// Storage or catalog capacity reached
    Full,
    /// Storage failed
    Io(StorageError),
}

impl From<StorageError> for UploadError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => UploadError::NotFound,
            StorageError::Full => UploadError::Full,
            other => UploadError::Io(other),
        }
    }
}

impl From<CatalogError> for UploadError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound => UploadError::NotFound,
            CatalogError::Full => UploadError::Full,
            CatalogError::InvalidName => UploadError::InvalidName,
            CatalogError::Storage(e) => UploadError::Io(e),
        }
    }
}

/// Logical screen size read from a GIF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GifHeader {
    pub width: u16,
    pub height: u16,
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
}

/// Check an uploaded file name: a plain `.gif` name that fits a catalog entry
pub fn validate_filename(name: &str) -> Result<(), UploadError> {
    if is_plain_name(name) && is_animation_file(name) {
        Ok(())
    } else {
        Err(UploadError::InvalidName)
    }
}

/// Check a category name: one visible path component
pub fn validate_category_name(name: &str) -> Result<(), UploadError> {
    if is_plain_name(name) {
        Ok(())
    } else {
        Err(UploadError::InvalidName)
    }
}

/// Read the signature and logical screen size of a GIF
pub fn inspect_gif(bytes: &[u8]) -> Result<GifHeader, UploadError> {
    if bytes.len() < 10 || !(bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")) {
        return Err(UploadError::InvalidImage);
    }
    Ok(GifHeader {
        width: u16::from_le_bytes([bytes[6], bytes[7]]),
        height: u16::from_le_bytes([bytes[8], bytes[9]]),
    })
}

/// Check size, format and resolution of an upload
pub fn validate_upload(settings: &PlaybackSettings, bytes: &[u8]) -> Result<GifHeader, UploadError> {
    if bytes.len() > settings.max_upload_size as usize {
        return Err(UploadError::TooLarge);
    }
    let header = inspect_gif(bytes)?;
    if header.width != settings.panel_width || header.height != settings.panel_height {
        warn!(
            "Rejecting {}x{} upload, panel is {}x{}",
            header.width, header.height, settings.panel_width, settings.panel_height
        );
        return Err(UploadError::InvalidImage);
    }
    Ok(header)
}

fn ensure_dir<S: Storage>(storage: &mut S, path: &str) -> Result<(), UploadError> {
    if !storage.exists(path) {
        storage.create_dir(path)?;
    }
    Ok(())
}

/// Write `bytes` to `path`, removing the file again on a short write
pub fn write_file<S: Storage>(storage: &mut S, path: &str, bytes: &[u8]) -> Result<(), UploadError> {
    let mut file = storage.open_file(path, OpenMode::Write)?;
    let result = file.write(bytes);
    file.close();

    let error = match result {
        Ok(n) if n == bytes.len() => return Ok(()),
        Ok(n) => {
            warn!("Short write to {}: {} of {} bytes", path, n, bytes.len());
            StorageError::ShortWrite
        }
        Err(e) => e,
    };
    if let Err(e) = storage.remove(path) {
        warn!("Cannot remove partial file {}: {:?}", path, e);
    }
    Err(UploadError::Io(error))
}

impl<M: RawMutex, K: KeyValueStore> Player<'_, M, K> {
    fn category_name_for(&self, category: &str) -> Result<crate::config::Name, UploadError> {
        validate_category_name(category)?;
        match self.category_info(category) {
            Some(info) => Ok(info.name),
            None => crate::config::to_name(category).ok_or(UploadError::InvalidName),
        }
    }

    /// Store an uploaded animation in a category and refresh that category
    ///
    /// The category directory is created when missing, so an upload can
    /// start a new category. Nothing is written when the catalog has no room
    /// for a new category, and a new file is removed again if the category
    /// cannot be relisted.
    pub fn save_uploaded_file<S: Storage>(
        &self,
        storage: &mut S,
        category: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), UploadError> {
        validate_filename(filename)?;
        let category = self.category_name_for(category)?;
        validate_upload(self.settings(), bytes)?;
        if self.category_info(&category).is_none() && self.status().category_count >= MAX_CATEGORIES {
            warn!("No room for category {}", category.as_str());
            return Err(UploadError::Full);
        }

        let settings = self.settings();
        let dir = settings
            .category_dir(&category)
            .ok_or(UploadError::InvalidName)?;
        let path = settings
            .file_path(&category, filename)
            .ok_or(UploadError::InvalidName)?;

        ensure_dir(storage, &settings.content_root)?;
        ensure_dir(storage, &dir)?;
        let replacing = storage.exists(&path);
        write_file(storage, &path, bytes)?;
        info!("Saved {} ({} bytes)", path.as_str(), bytes.len());

        if let Err(e) = self.relist(storage, &category) {
            if !replacing {
                if let Err(re) = storage.remove(&path) {
                    warn!("Cannot remove {}: {:?}", path.as_str(), re);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Replace the animation played when category playback is off
    pub fn save_default_animation<S: Storage>(
        &self,
        storage: &mut S,
        bytes: &[u8],
    ) -> Result<(), UploadError> {
        let settings = self.settings();
        validate_upload(settings, bytes)?;
        ensure_dir(storage, &settings.content_root)?;
        write_file(storage, &settings.default_animation, bytes)?;
        info!("Saved default animation ({} bytes)", bytes.len());
        Ok(())
    }

    /// Delete one file from a category and refresh that category
    ///
    /// A category that loses its last file is dropped from the catalog.
    pub fn delete_uploaded_file<S: Storage>(
        &self,
        storage: &mut S,
        category: &str,
        filename: &str,
    ) -> Result<(), UploadError> {
        validate_filename(filename)?;
        let category = self.category_name_for(category)?;
        let path = self
            .settings()
            .file_path(&category, filename)
            .ok_or(UploadError::InvalidName)?;

        storage.remove(&path).map_err(|e| {
            warn!("Cannot delete {}: {:?}", path.as_str(), e);
            UploadError::from(e)
        })?;
        info!("Deleted {}", path.as_str());

        self.relist(storage, &category)?;
        Ok(())
    }
}
