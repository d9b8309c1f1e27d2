//! Shared runtime types and the control-to-render channels

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use pixelreel_core::brightness::Brightness;
use pixelreel_core::playback::{BrightnessSignal, CommandChannel, PlaybackDriver, Player};

use crate::adapters::{EmbassyClock, FileStore, FrameBufferDisplay, FsStorage, GifCrateDecoder};

/// Commands from the control surface to the render task
pub static COMMANDS: CommandChannel<CriticalSectionRawMutex> = CommandChannel::new();

/// Brightness level waiting to reach the panel
pub static PANEL_BRIGHTNESS: BrightnessSignal<CriticalSectionRawMutex> = BrightnessSignal::new();

pub type HostPlayer = Player<'static, CriticalSectionRawMutex, FileStore>;

pub type HostBrightness = Brightness<'static, CriticalSectionRawMutex, FileStore>;

pub type HostDriver = PlaybackDriver<
    'static,
    HostPlayer,
    FsStorage,
    GifCrateDecoder,
    FrameBufferDisplay,
    EmbassyClock,
    CriticalSectionRawMutex,
>;
