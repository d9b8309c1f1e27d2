//! Playback state, navigation and the render driver
//!
//! - [`PlaybackState`]: selected category, current file and flags
//! - [`Player`]: the state behind a mutex, shared with the control surface
//! - [`PlaybackDriver`]: the render task's decode-and-draw loop
//! - [`DriverState`]: driver state machine
//! - [`DriverCommand`]: control-to-render messages
//! - [`BrightnessSignal`]: latest brightness for the panel

mod command;
mod driver;
mod machine;
mod player;
mod state;

pub use command::{
    BrightnessSignal, CommandChannel, CommandReceiver, CommandSender, DriverCommand,
    COMMAND_QUEUE_DEPTH,
};
pub use driver::{PlaybackDriver, TEST_PATTERN};
pub use machine::{DriverEvent, DriverState};
pub use player::{PlaybackSource, PlaybackTarget, Player};
pub use state::{CategoryInfo, CategorySummary, PlaybackState, StatusSnapshot};
