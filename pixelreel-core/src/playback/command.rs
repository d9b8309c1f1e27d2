//! Commands from the control surface to the playback driver
//!
//! Discrete requests go through a bounded queue. Brightness travels through
//! a [`Signal`]: a newer level replaces one the driver has not applied yet.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::signal::Signal;

/// Queue depth of the driver command channel
pub const COMMAND_QUEUE_DEPTH: usize = 4;

/// Requests the render task acts on between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverCommand {
    /// Blank the panel and stop decoding
    PowerOff,
    /// Re-open the display and play immediately
    PowerOn,
    /// Cycle solid colors across the whole panel
    TestPattern,
}

pub type CommandChannel<M> = Channel<M, DriverCommand, COMMAND_QUEUE_DEPTH>;
pub type CommandSender<'a, M> = Sender<'a, M, DriverCommand, COMMAND_QUEUE_DEPTH>;
pub type CommandReceiver<'a, M> = Receiver<'a, M, DriverCommand, COMMAND_QUEUE_DEPTH>;

/// Latest brightness level not yet applied to the panel
pub type BrightnessSignal<M> = Signal<M, u8>;

/// Queue a command without waiting; a full queue drops it with a warning
pub(crate) fn send_command<M: RawMutex>(commands: &CommandSender<'_, M>, command: DriverCommand) {
    if commands.try_send(command).is_err() {
        warn!("Driver command queue full, dropped {:?}", command);
    }
}
