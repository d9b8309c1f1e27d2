//! GIF decode engine abstraction
//!
//! The engine reads from a file handle owned by the caller and streams
//! decoded rows into a [`RowSink`]. It never opens or closes files itself.

use crate::compositor::FrameRow;
use crate::traits::storage::{AnimationFile, StorageError};

/// Errors from the decode engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Not a GIF, or the header is damaged
    InvalidFormat,
    /// Frame data is truncated or corrupt
    Corrupt,
    /// Reading the file failed
    Storage(StorageError),
    /// Animation is larger than the engine can buffer
    TooLarge,
    /// `play_frame` called without a successful `open`
    NotOpen,
}

impl From<StorageError> for DecodeError {
    fn from(e: StorageError) -> Self {
        DecodeError::Storage(e)
    }
}

/// Logical screen of an opened animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanvasInfo {
    pub width: u16,
    pub height: u16,
}

/// Result of advancing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameStatus {
    /// A frame was drawn; wait `delay_ms` before the next one
    Drawn { delay_ms: u32 },
    /// No frames remain
    Finished,
}

/// Receiver of decoded rows
pub trait RowSink {
    /// Render one decoded row
    ///
    /// The sink may rewrite `row.pixels` in place.
    fn draw_row(&mut self, row: &mut FrameRow<'_>);
}

/// GIF decode engine
pub trait GifDecoder {
    /// Read the header of the animation in `file`
    fn open<F: AnimationFile>(&mut self, file: &mut F) -> Result<CanvasInfo, DecodeError>;

    /// Decode the next frame, sending each row to `sink`
    fn play_frame<F: AnimationFile>(
        &mut self,
        file: &mut F,
        sink: &mut dyn RowSink,
    ) -> Result<FrameStatus, DecodeError>;

    /// Drop any per-animation state
    fn close(&mut self);
}
