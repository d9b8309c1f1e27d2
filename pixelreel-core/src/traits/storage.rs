//! Removable storage abstraction
//!
//! Paths are absolute, `/`-separated, rooted at the content volume
//! (for example `/gifs/nature/a.gif`).

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Path does not exist
    NotFound,
    /// Path exists but is not a directory
    NotADirectory,
    /// Read or write failed on the medium
    Io,
    /// Fewer bytes written than requested
    ShortWrite,
    /// Medium is full
    Full,
}

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenMode {
    /// Read from the start
    Read,
    /// Create or truncate, then write
    Write,
}

/// One entry returned by a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry<'a> {
    pub name: &'a str,
    pub is_dir: bool,
}

impl DirEntry<'_> {
    /// Names starting with `.` are hidden
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// An open file handle
///
/// Handles are owned by exactly one user at a time and must be closed by
/// that user, on every exit path.
pub trait AnimationFile {
    /// Total size in bytes
    fn size(&self) -> u32;

    /// Read into `buf` from the current position
    ///
    /// Returns the number of bytes read, 0 at end of file.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Move to an absolute position, returning the new position
    fn seek(&mut self, position: u32) -> Result<u32, StorageError>;

    /// Write `data` at the current position
    ///
    /// Returns the number of bytes written, which may be short.
    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError>;

    /// Release the handle
    fn close(&mut self);
}

/// Storage volume holding the animation library
pub trait Storage {
    type File: AnimationFile;

    /// Visit every entry of a directory
    ///
    /// Fails with `NotFound` when the directory cannot be opened.
    fn list_dir(
        &mut self,
        path: &str,
        visit: &mut dyn FnMut(DirEntry<'_>),
    ) -> Result<(), StorageError>;

    /// Open a file
    fn open_file(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, StorageError>;

    /// Check if a path exists
    fn exists(&mut self, path: &str) -> bool;

    /// Create a directory (parent must exist)
    fn create_dir(&mut self, path: &str) -> Result<(), StorageError>;

    /// Remove a file
    fn remove(&mut self, path: &str) -> Result<(), StorageError>;
}
