//! pixelreel - LED matrix GIF player
//!
//! Host runtime: plays animations from a content directory onto a
//! software framebuffer, driven by an embassy executor. A TCP control
//! server selects categories, switches power, sets brightness and takes
//! uploads.
//!
//! Usage: `pixelreel [CONFIG]` (default `pixelreel.toml`)

use core::cell::RefCell;
use std::fmt;
use std::io;
use std::net::TcpListener;
use std::path::{Path, PathBuf};

use embassy_executor::{SpawnError, Spawner};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use log::{error, info, warn};
use static_cell::StaticCell;

use pixelreel_core::brightness::Brightness;
use pixelreel_core::persistence::{PersistenceBridge, SharedStore};
use pixelreel_core::playback::{PlaybackDriver, Player};
use pixelreel_core::traits::{DisplayError, MatrixDisplay};

use crate::adapters::{EmbassyClock, FileStore, FrameBufferDisplay, FsStorage, GifCrateDecoder};
use crate::channels::{HostBrightness, HostPlayer, COMMANDS, PANEL_BRIGHTNESS};
use crate::config::{load_config, ConfigError};
use crate::control::{spawn_control_server, ControlHandler};

mod adapters;
mod channels;
mod config;
mod control;
mod tasks;

/// Configuration file used when none is given
const DEFAULT_CONFIG_PATH: &str = "pixelreel.toml";

// Shared state, borrowed by the render task and the control thread
static STORE: StaticCell<SharedStore<CriticalSectionRawMutex, FileStore>> = StaticCell::new();
static PLAYER: StaticCell<HostPlayer> = StaticCell::new();
static BRIGHTNESS: StaticCell<HostBrightness> = StaticCell::new();

/// Reasons the player cannot start
#[derive(Debug)]
enum StartupError {
    Config(ConfigError),
    /// State directory unusable
    Store(io::Error),
    Display(DisplayError),
    Spawn(SpawnError),
    /// Control server could not bind or start
    Control(io::Error),
}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        StartupError::Config(e)
    }
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Config(e) => write!(f, "{}", e),
            StartupError::Store(e) => write!(f, "state directory: {}", e),
            StartupError::Display(e) => write!(f, "display: {:?}", e),
            StartupError::Spawn(e) => write!(f, "task spawn: {:?}", e),
            StartupError::Control(e) => write!(f, "control server: {}", e),
        }
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("pixelreel starting...");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if let Err(e) = start(spawner, &config_path) {
        error!("Startup failed: {}", e);
        std::process::exit(1);
    }
    info!("Startup complete");
}

fn start(spawner: Spawner, config_path: &Path) -> Result<(), StartupError> {
    let config = load_config(config_path)?;
    let settings = config.playback.clone();

    let file_store = FileStore::open(&config.storage.state_dir).map_err(StartupError::Store)?;
    let store = &*STORE.init(Mutex::new(RefCell::new(file_store)));

    let player: &'static HostPlayer = PLAYER.init(Player::new(
        PersistenceBridge::new(store),
        COMMANDS.sender(),
        settings.clone(),
    ));

    // The catalog must exist before the persisted category can be selected
    let mut storage = FsStorage::new(&config.storage.root);
    match player.rescan(&mut storage) {
        Ok(count) => info!("Found {} categories", count),
        Err(e) => warn!("Content scan failed: {:?}", e),
    }

    let bridge = PersistenceBridge::new(store);
    let fields = bridge.load(&settings);
    let brightness: &'static HostBrightness =
        BRIGHTNESS.init(Brightness::new(bridge, &PANEL_BRIGHTNESS, fields.brightness));
    player.restore(&fields, brightness);

    let mut display = FrameBufferDisplay::new(
        settings.panel_width,
        settings.panel_height,
        config.display.snapshot.clone(),
    );
    display.begin().map_err(StartupError::Display)?;
    display.set_brightness(brightness.get());

    let driver = PlaybackDriver::new(
        player,
        storage.clone(),
        GifCrateDecoder::new(settings.max_upload_size),
        display,
        EmbassyClock,
        COMMANDS.receiver(),
        &PANEL_BRIGHTNESS,
        &settings,
    );

    spawner
        .spawn(tasks::refresh_task(
            driver,
            COMMANDS.receiver(),
            &PANEL_BRIGHTNESS,
            settings.refresh_interval_ms,
        ))
        .map_err(StartupError::Spawn)?;
    spawner
        .spawn(tasks::update_poll_task(
            config.update.marker_path(&config.storage.root),
            settings.update_poll_interval_ms,
        ))
        .map_err(StartupError::Spawn)?;

    let listener = TcpListener::bind(&config.control.listen).map_err(StartupError::Control)?;
    spawn_control_server(listener, ControlHandler::new(player, brightness, storage))
        .map_err(StartupError::Control)?;

    Ok(())
}
