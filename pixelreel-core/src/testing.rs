//! Test doubles for storage, store, decoder, display and clock

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use crate::catalog::{Catalog, Category, FileList};
use crate::compositor::{Disposal, FrameRow};
use crate::config::{to_name, Name};
use crate::traits::{
    AnimationFile, CanvasInfo, Clock, DecodeError, DirEntry, DisplayError, FrameStatus,
    GifDecoder, KeyValueStore, MatrixDisplay, OpenMode, RowSink, Storage, StorageError,
    StoreError, StoreKey,
};

pub fn file_list(names: &[&str]) -> FileList {
    let mut files = FileList::new();
    for n in names {
        files.push(to_name(n).unwrap()).unwrap();
    }
    files
}

pub fn catalog_of(entries: &[(&str, &[&str])]) -> Catalog {
    let mut catalog = Catalog::new();
    for (name, files) in entries {
        catalog
            .push(Category::new(to_name(name).unwrap(), file_list(files)).unwrap())
            .unwrap();
    }
    catalog
}

pub fn name(s: &str) -> Name {
    to_name(s).unwrap()
}

fn parent(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((dir, _)) => dir,
        None => "",
    }
}

#[derive(Default)]
struct MemTree {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    failing: BTreeSet<String>,
    opens: usize,
    closes: usize,
    write_limit: Option<usize>,
}

/// In-memory storage volume
#[derive(Clone, Default)]
pub struct MemStorage {
    tree: Rc<RefCell<MemTree>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&mut self, path: &str) {
        let mut tree = self.tree.borrow_mut();
        let mut p = path;
        while !p.is_empty() && p != "/" {
            tree.dirs.insert(p.to_string());
            p = parent(p);
        }
        tree.dirs.insert("/".to_string());
    }

    pub fn add_file(&mut self, path: &str, data: &[u8]) {
        self.add_dir(parent(path));
        self.tree
            .borrow_mut()
            .files
            .insert(path.to_string(), data.to_vec());
    }

    /// Make listing `path` fail with an I/O error
    pub fn fail_listing(&mut self, path: &str) {
        self.tree.borrow_mut().failing.insert(path.to_string());
    }

    /// Cap every written file at `n` bytes
    pub fn limit_writes(&mut self, n: usize) {
        self.tree.borrow_mut().write_limit = Some(n);
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.tree.borrow().files.get(path).cloned()
    }

    pub fn opens(&self) -> usize {
        self.tree.borrow().opens
    }

    pub fn open_handles(&self) -> usize {
        let tree = self.tree.borrow();
        tree.opens - tree.closes
    }
}

pub struct MemFile {
    tree: Rc<RefCell<MemTree>>,
    path: String,
    data: Vec<u8>,
    pos: usize,
    closed: bool,
}

impl AnimationFile for MemFile {
    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let n = buf.len().min(self.data.len().saturating_sub(self.pos));
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, position: u32) -> Result<u32, StorageError> {
        self.pos = (position as usize).min(self.data.len());
        Ok(self.pos as u32)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError> {
        let mut tree = self.tree.borrow_mut();
        let n = match tree.write_limit {
            Some(limit) => data.len().min(limit.saturating_sub(self.data.len())),
            None => data.len(),
        };
        self.data.extend_from_slice(&data[..n]);
        tree.files.insert(self.path.clone(), self.data.clone());
        Ok(n)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.tree.borrow_mut().closes += 1;
        }
    }
}

impl Storage for MemStorage {
    type File = MemFile;

    fn list_dir(
        &mut self,
        path: &str,
        visit: &mut dyn FnMut(DirEntry<'_>),
    ) -> Result<(), StorageError> {
        let tree = self.tree.borrow();
        if tree.failing.contains(path) {
            return Err(StorageError::Io);
        }
        if !tree.dirs.contains(path) {
            return Err(if tree.files.contains_key(path) {
                StorageError::NotADirectory
            } else {
                StorageError::NotFound
            });
        }

        let mut entries: Vec<(String, bool)> = Vec::new();
        for d in tree.dirs.iter().filter(|d| d.as_str() != "/" && parent(d) == path) {
            entries.push((d.rsplit('/').next().unwrap_or("").to_string(), true));
        }
        for f in tree.files.keys().filter(|f| parent(f) == path) {
            entries.push((f.rsplit('/').next().unwrap_or("").to_string(), false));
        }
        entries.sort();
        for (name, is_dir) in &entries {
            visit(DirEntry {
                name: name.as_str(),
                is_dir: *is_dir,
            });
        }
        Ok(())
    }

    fn open_file(&mut self, path: &str, mode: OpenMode) -> Result<MemFile, StorageError> {
        let mut tree = self.tree.borrow_mut();
        let data = match mode {
            OpenMode::Read => tree.files.get(path).cloned().ok_or(StorageError::NotFound)?,
            OpenMode::Write => {
                if !tree.dirs.contains(parent(path)) {
                    return Err(StorageError::NotFound);
                }
                tree.files.insert(path.to_string(), Vec::new());
                Vec::new()
            }
        };
        tree.opens += 1;
        Ok(MemFile {
            tree: self.tree.clone(),
            path: path.to_string(),
            data,
            pos: 0,
            closed: false,
        })
    }

    fn exists(&mut self, path: &str) -> bool {
        let tree = self.tree.borrow();
        tree.files.contains_key(path) || tree.dirs.contains(path)
    }

    fn create_dir(&mut self, path: &str) -> Result<(), StorageError> {
        let mut tree = self.tree.borrow_mut();
        if !tree.dirs.contains(parent(path)) {
            return Err(StorageError::NotFound);
        }
        tree.dirs.insert(path.to_string());
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        self.tree
            .borrow_mut()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

/// In-memory key-value store
#[derive(Default)]
pub struct MemStore {
    pub values: BTreeMap<u8, Vec<u8>>,
    pub writes: BTreeMap<u8, usize>,
    pub fail_writes: bool,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes_to(&self, key: StoreKey) -> usize {
        self.writes.get(&key.as_u8()).copied().unwrap_or(0)
    }
}

impl KeyValueStore for MemStore {
    fn read(&mut self, key: StoreKey, buffer: &mut [u8]) -> Result<usize, StoreError> {
        let value = self.values.get(&key.as_u8()).ok_or(StoreError::NotFound)?;
        if value.len() > buffer.len() {
            return Err(StoreError::BufferTooSmall);
        }
        buffer[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    fn write(&mut self, key: StoreKey, data: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io);
        }
        self.values.insert(key.as_u8(), data.to_vec());
        *self.writes.entry(key.as_u8()).or_default() += 1;
        Ok(())
    }
}

/// One scripted animation frame: rows of palette indices
#[derive(Clone)]
pub struct ScriptFrame {
    pub rows: Vec<(u16, Vec<u8>)>,
    pub delay_ms: u32,
    pub transparent: Option<u8>,
    pub disposal: Disposal,
}

impl ScriptFrame {
    /// Frame that paints row 0 with `index`
    pub fn solid(index: u8, width: usize, delay_ms: u32) -> Self {
        Self {
            rows: std::vec![(0, std::vec![index; width])],
            delay_ms,
            transparent: None,
            disposal: Disposal::Unspecified,
        }
    }
}

/// Decoder that plays back a fixed list of frames
#[derive(Default)]
pub struct ScriptedDecoder {
    pub frames: Vec<ScriptFrame>,
    pub palette: Vec<u16>,
    pub loop_forever: bool,
    pub open_error: Option<DecodeError>,
    pub frame_error_at: Option<usize>,
    pub opens: usize,
    pub closes: usize,
    pub frames_played: usize,
    next: usize,
    open: bool,
}

impl ScriptedDecoder {
    pub fn new(frames: Vec<ScriptFrame>) -> Self {
        Self {
            frames,
            palette: (0..16u16).map(|i| i * 0x1111).collect(),
            ..Self::default()
        }
    }
}

impl GifDecoder for ScriptedDecoder {
    fn open<F: AnimationFile>(&mut self, file: &mut F) -> Result<CanvasInfo, DecodeError> {
        self.opens += 1;
        if let Some(e) = self.open_error {
            return Err(e);
        }
        let mut magic = [0u8; 3];
        file.read(&mut magic)?;
        self.next = 0;
        self.open = true;
        Ok(CanvasInfo {
            width: 64,
            height: 64,
        })
    }

    fn play_frame<F: AnimationFile>(
        &mut self,
        _file: &mut F,
        sink: &mut dyn RowSink,
    ) -> Result<FrameStatus, DecodeError> {
        if !self.open {
            return Err(DecodeError::NotOpen);
        }
        if self.frame_error_at == Some(self.frames_played) {
            return Err(DecodeError::Corrupt);
        }
        if self.next >= self.frames.len() {
            if !self.loop_forever || self.frames.is_empty() {
                return Ok(FrameStatus::Finished);
            }
            self.next = 0;
        }

        let frame = self.frames[self.next].clone();
        self.next += 1;
        self.frames_played += 1;
        for (y, pixels) in frame.rows {
            let mut pixels = pixels;
            let width = pixels.len() as u16;
            let mut row = FrameRow {
                pixels: &mut pixels,
                palette: &self.palette,
                x: 0,
                y,
                width,
                disposal: frame.disposal,
                transparent_index: frame.transparent.unwrap_or(0),
                has_transparency: frame.transparent.is_some(),
                background_index: 0,
            };
            sink.draw_row(&mut row);
        }
        Ok(FrameStatus::Drawn {
            delay_ms: frame.delay_ms,
        })
    }

    fn close(&mut self) {
        if self.open {
            self.closes += 1;
        }
        self.open = false;
    }
}

/// Display that records what was drawn
pub struct RecordingDisplay {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u16>,
    pub runs: Vec<(u16, u16, usize)>,
    pub fills: Vec<u16>,
    pub clears: usize,
    pub begins: usize,
    pub flushes: usize,
    pub brightness: Option<u8>,
    pub out_of_bounds: usize,
    pub fail_begin: bool,
}

impl RecordingDisplay {
    pub fn new(width: u16, height: u16) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: u16, height: u16, color: u16) -> Self {
        Self {
            width,
            height,
            pixels: std::vec![color; usize::from(width) * usize::from(height)],
            runs: Vec::new(),
            fills: Vec::new(),
            clears: 0,
            begins: 0,
            flushes: 0,
            brightness: None,
            out_of_bounds: 0,
            fail_begin: false,
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> u16 {
        self.pixels[usize::from(y) * usize::from(self.width) + usize::from(x)]
    }
}

impl MatrixDisplay for RecordingDisplay {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn draw_pixel(&mut self, x: u16, y: u16, color: u16) {
        if x >= self.width || y >= self.height {
            self.out_of_bounds += 1;
            return;
        }
        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.pixels[idx] = color;
    }

    fn draw_run(&mut self, x: u16, y: u16, colors: &[u16]) {
        self.runs.push((x, y, colors.len()));
        for (i, &c) in colors.iter().enumerate() {
            self.draw_pixel(x + i as u16, y, c);
        }
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.pixels.iter_mut().for_each(|p| *p = 0);
    }

    fn begin(&mut self) -> Result<(), DisplayError> {
        self.begins += 1;
        if self.fail_begin {
            return Err(DisplayError::NotResponding);
        }
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = Some(level);
    }

    fn flush(&mut self) {
        self.flushes += 1;
        // Whole-panel fills show up as a uniform frame; remember their color
        if let Some(&first) = self.pixels.first() {
            if self.pixels.iter().all(|&p| p == first) {
                self.fills.push(first);
            }
        }
    }
}

/// Clock that only moves when waited on
#[derive(Default)]
pub struct ManualClock {
    pub now: u64,
    pub waits: Vec<u32>,
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn wait_ms(&mut self, ms: u32) -> impl core::future::Future<Output = ()> {
        self.now += u64::from(ms);
        self.waits.push(ms);
        core::future::ready(())
    }
}
