//! Board-agnostic playback core for the LED matrix GIF player
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or storage implementations:
//!
//! - Hardware and storage abstraction traits (storage, display, decoder, clock)
//! - Category catalog built from the content directory
//! - Playback state, navigation and the shared player handle
//! - Playback driver state machine and render pass
//! - Frame compositor (palette rows to panel pixels)
//! - Persistence of playback state and brightness
//! - Panel brightness control
//! - Upload validation, uploads and deletes

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod brightness;
pub mod catalog;
pub mod compositor;
pub mod config;
pub mod persistence;
pub mod playback;
pub mod traits;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;
