//! Hardware and storage abstraction traits
//!
//! These traits define the interface between the playback logic
//! and platform-specific implementations.

pub mod clock;
pub mod decoder;
pub mod display;
pub mod storage;
pub mod store;

pub use clock::Clock;
pub use decoder::{CanvasInfo, DecodeError, FrameStatus, GifDecoder, RowSink};
pub use display::{rgb565, DisplayError, MatrixDisplay, MatrixDisplayExt};
pub use storage::{AnimationFile, DirEntry, OpenMode, Storage, StorageError};
pub use store::{KeyValueStore, StoreError, StoreKey};
