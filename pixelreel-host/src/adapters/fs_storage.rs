//! Host directory as the removable content volume
//!
//! Virtual paths such as `/gifs/nature/a.gif` are resolved below a base
//! directory on the host filesystem.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use log::warn;
use pixelreel_core::traits::{AnimationFile, DirEntry, OpenMode, Storage, StorageError};

fn storage_error(e: io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        ErrorKind::NotADirectory => StorageError::NotADirectory,
        ErrorKind::StorageFull => StorageError::Full,
        ErrorKind::WriteZero => StorageError::ShortWrite,
        _ => StorageError::Io,
    }
}

/// Storage volume backed by a host directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    base: PathBuf,
}

impl FsStorage {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Map a virtual path onto the host filesystem
    pub fn resolve(&self, path: &str) -> PathBuf {
        let mut resolved = self.base.clone();
        for part in path.split('/').filter(|p| !p.is_empty() && *p != "." && *p != "..") {
            resolved.push(part);
        }
        resolved
    }
}

/// Open file on the host volume
#[derive(Debug)]
pub struct FsFile {
    file: Option<File>,
    size: u32,
}

impl FsFile {
    fn handle(&mut self) -> Result<&mut File, StorageError> {
        self.file.as_mut().ok_or(StorageError::Io)
    }
}

impl AnimationFile for FsFile {
    fn size(&self) -> u32 {
        self.size
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.handle()?.read(buf).map_err(storage_error)
    }

    fn seek(&mut self, position: u32) -> Result<u32, StorageError> {
        let pos = self
            .handle()?
            .seek(SeekFrom::Start(u64::from(position)))
            .map_err(storage_error)?;
        Ok(pos as u32)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError> {
        let file = self.handle()?;
        let mut written = 0;
        while written < data.len() {
            match file.write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(storage_error(e)),
            }
        }
        self.size = self.size.saturating_add(written as u32);
        Ok(written)
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.sync_all() {
                warn!("Sync on close failed: {}", e);
            }
        }
    }
}

impl Storage for FsStorage {
    type File = FsFile;

    fn list_dir(
        &mut self,
        path: &str,
        visit: &mut dyn FnMut(DirEntry<'_>),
    ) -> Result<(), StorageError> {
        let dir = self.resolve(path);
        if dir.is_file() {
            return Err(StorageError::NotADirectory);
        }

        for entry in fs::read_dir(&dir).map_err(storage_error)? {
            let entry = entry.map_err(storage_error)?;
            let file_type = entry.file_type().map_err(storage_error)?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!("Skipping non UTF-8 entry in {}", dir.display());
                continue;
            };
            visit(DirEntry {
                name,
                is_dir: file_type.is_dir(),
            });
        }
        Ok(())
    }

    fn open_file(&mut self, path: &str, mode: OpenMode) -> Result<FsFile, StorageError> {
        let host_path = self.resolve(path);
        let file = match mode {
            OpenMode::Read => File::open(&host_path),
            OpenMode::Write => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&host_path),
        }
        .map_err(storage_error)?;

        let size = file.metadata().map_err(storage_error)?.len();
        Ok(FsFile {
            file: Some(file),
            size: u32::try_from(size).unwrap_or(u32::MAX),
        })
    }

    fn exists(&mut self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn create_dir(&mut self, path: &str) -> Result<(), StorageError> {
        fs::create_dir(self.resolve(path)).map_err(storage_error)
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        fs::remove_file(self.resolve(path)).map_err(storage_error)
    }
}
