//! Playback driver state machine
//!
//! What the driver does on a tick is a function of the current state and
//! the event that ends each step.

/// Driver states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    /// Waiting for the next tick
    Idle,
    /// An animation file is open and frames are being drawn
    Rendering,
    /// Power is off; the panel is blank and nothing is decoded
    Stopped,
}

/// Events that move the driver between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverEvent {
    /// A target was resolved and its file opened
    RenderStarted,
    /// The decoder reported the end of the animation
    AnimationFinished,
    /// The play-time budget ran out
    BudgetExceeded,
    /// Opening or decoding the file failed
    RenderFailed,
    /// A queued command cut the animation short
    Interrupted,
    /// Power went off
    PowerOff,
    /// Power came back on and the display was re-opened
    PowerOn,
}

impl DriverState {
    /// True while a file handle may be open
    pub fn is_rendering(&self) -> bool {
        matches!(self, DriverState::Rendering)
    }

    /// True when the panel has been blanked by a power-off
    pub fn is_stopped(&self) -> bool {
        matches!(self, DriverState::Stopped)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: DriverEvent) -> Self {
        use DriverEvent::*;
        use DriverState::*;

        match (self, event) {
            // Power off wins from anywhere
            (_, PowerOff) => Stopped,

            (Stopped, PowerOn) => Idle,

            (Idle, RenderStarted) => Rendering,

            (Rendering, AnimationFinished) => Idle,
            (Rendering, BudgetExceeded) => Idle,
            (Rendering, RenderFailed) => Idle,
            (Rendering, Interrupted) => Idle,

            _ => self,
        }
    }
}
