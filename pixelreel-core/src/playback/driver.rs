//! Playback driver
//!
//! Runs one decode-and-render pass per tick. The driver owns storage, the
//! decoder, the display and the compositor; it learns what to play from a
//! [`PlaybackSource`] and reacts to [`DriverCommand`]s and brightness
//! changes between frames.
//!
//! An opened animation file never outlives the pass that opened it.

use embassy_sync::blocking_mutex::raw::RawMutex;

use super::command::{BrightnessSignal, CommandReceiver, DriverCommand};
use super::machine::{DriverEvent, DriverState};
use super::player::{PlaybackSource, PlaybackTarget};
use crate::compositor::{Compositor, RenderTarget};
use crate::config::{PlaybackSettings, TEST_PATTERN_STEP_MS};
use crate::traits::{
    rgb565, AnimationFile, Clock, FrameStatus, GifDecoder, MatrixDisplay, MatrixDisplayExt,
    OpenMode, Storage,
};

/// Colors shown by the test pattern, in order
pub const TEST_PATTERN: [u16; 5] = [
    rgb565(0xFF, 0, 0),
    rgb565(0, 0xFF, 0),
    rgb565(0, 0, 0xFF),
    rgb565(0xFF, 0xFF, 0xFF),
    rgb565(0, 0, 0),
];

/// Render-task side of playback
pub struct PlaybackDriver<'a, P, S, G, D, C, M>
where
    P: PlaybackSource,
    S: Storage,
    G: GifDecoder,
    D: MatrixDisplay,
    C: Clock,
    M: RawMutex,
{
    source: &'a P,
    storage: S,
    decoder: G,
    display: D,
    clock: C,
    compositor: Compositor,
    commands: CommandReceiver<'a, M>,
    brightness: &'a BrightnessSignal<M>,
    state: DriverState,
    max_play_time_ms: u32,
    deferred: Option<DriverCommand>,
}

impl<'a, P, S, G, D, C, M> PlaybackDriver<'a, P, S, G, D, C, M>
where
    P: PlaybackSource,
    S: Storage,
    G: GifDecoder,
    D: MatrixDisplay,
    C: Clock,
    M: RawMutex,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: &'a P,
        storage: S,
        decoder: G,
        display: D,
        clock: C,
        commands: CommandReceiver<'a, M>,
        brightness: &'a BrightnessSignal<M>,
        settings: &PlaybackSettings,
    ) -> Self {
        let compositor = Compositor::new(display.width(), display.height());
        Self {
            source,
            storage,
            decoder,
            display,
            clock,
            compositor,
            commands,
            brightness,
            state: DriverState::Idle,
            max_play_time_ms: settings.max_play_time_ms,
            deferred: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn decoder(&self) -> &G {
        &self.decoder
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// One refresh tick
    ///
    /// Drains queued commands, then either keeps the panel blank (power
    /// off) or plays the next target once.
    pub async fn tick(&mut self) {
        self.apply_brightness();
        while let Ok(command) = self.commands.try_receive() {
            self.handle_command(command).await;
        }

        if !self.source.is_power_on() {
            self.halt();
            return;
        }
        if self.state.is_stopped() && !self.wake() {
            return;
        }

        self.render_pass().await;

        if let Some(command) = self.deferred.take() {
            self.handle_command(command).await;
        }
    }

    /// Act on one command
    ///
    /// Returns `true` when playback should start at once instead of
    /// waiting for the next tick.
    pub async fn handle_command(&mut self, command: DriverCommand) -> bool {
        debug!("Driver command {:?}", command);
        match command {
            DriverCommand::PowerOff => {
                self.halt();
                false
            }
            DriverCommand::PowerOn => !self.state.is_stopped() || self.wake(),
            DriverCommand::TestPattern => {
                if self.state.is_stopped() {
                    warn!("Test pattern ignored while powered off");
                } else {
                    self.run_test_pattern().await;
                }
                false
            }
        }
    }

    /// Push a pending brightness change to the panel
    pub fn apply_brightness(&mut self) {
        if let Some(level) = self.brightness.try_take() {
            self.set_panel_brightness(level);
        }
    }

    /// Apply a level already taken from the brightness signal
    pub fn set_panel_brightness(&mut self, level: u8) {
        debug!("Panel brightness {}", level);
        self.display.set_brightness(level);
    }

    /// Blank the panel once and stop decoding
    fn halt(&mut self) {
        if !self.state.is_stopped() {
            info!("Power off, blanking panel");
            self.display.clear();
            self.display.flush();
        }
        self.state = self.state.transition(DriverEvent::PowerOff);
    }

    /// Re-open the display after a power-off
    fn wake(&mut self) -> bool {
        if let Err(e) = self.display.begin() {
            warn!("Display did not come back: {:?}", e);
            return false;
        }
        info!("Power on");
        self.state = self.state.transition(DriverEvent::PowerOn);
        true
    }

    async fn render_pass(&mut self) {
        let Some(target) = self.source.next_target() else {
            trace!("Nothing to play");
            return;
        };

        let mut file = match self.storage.open_file(&target.path, OpenMode::Read) {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot open {}: {:?}", target.path.as_str(), e);
                return;
            }
        };

        self.state = self.state.transition(DriverEvent::RenderStarted);
        let event = self.play(&mut file, &target).await;
        self.decoder.close();
        file.close();
        self.state = self.state.transition(event);
        trace!("Pass over {}: {:?}", target.path.as_str(), event);
    }

    async fn play(&mut self, file: &mut S::File, target: &PlaybackTarget) -> DriverEvent {
        if let Err(e) = self.decoder.open(file) {
            warn!("Cannot decode {}: {:?}", target.path.as_str(), e);
            return DriverEvent::RenderFailed;
        }

        let started = self.clock.now_ms();
        loop {
            let status = {
                let mut sink = RenderTarget {
                    compositor: &mut self.compositor,
                    display: &mut self.display,
                };
                self.decoder.play_frame(file, &mut sink)
            };

            match status {
                Ok(FrameStatus::Finished) => return DriverEvent::AnimationFinished,
                Ok(FrameStatus::Drawn { delay_ms }) => {
                    self.display.flush();
                    self.clock.wait_ms(delay_ms).await;
                }
                Err(e) => {
                    warn!("Decode of {} failed: {:?}", target.path.as_str(), e);
                    return DriverEvent::RenderFailed;
                }
            }

            if let Some(event) = self.poll_commands() {
                return event;
            }

            let elapsed = self.clock.now_ms().saturating_sub(started);
            if target.cycling && elapsed > u64::from(self.max_play_time_ms) {
                debug!("Play time budget used up after {} ms", elapsed);
                return DriverEvent::BudgetExceeded;
            }
        }
    }

    /// Check for commands between frames
    fn poll_commands(&mut self) -> Option<DriverEvent> {
        self.apply_brightness();
        while let Ok(command) = self.commands.try_receive() {
            match command {
                DriverCommand::PowerOn => {}
                DriverCommand::PowerOff => {
                    self.halt();
                    return Some(DriverEvent::PowerOff);
                }
                DriverCommand::TestPattern => {
                    self.deferred = Some(command);
                    return Some(DriverEvent::Interrupted);
                }
            }
        }

        // Catches a power-off whose command was dropped
        if !self.source.is_power_on() {
            self.halt();
            return Some(DriverEvent::PowerOff);
        }
        None
    }

    async fn run_test_pattern(&mut self) {
        info!("Running test pattern");
        for (i, &color) in TEST_PATTERN.iter().enumerate() {
            if i > 0 {
                self.clock.wait_ms(TEST_PATTERN_STEP_MS).await;
            }
            self.display.fill(color);
            self.display.flush();
        }
    }
}
