//! Configuration types
//!
//! Playback settings and the fixed capacity limits of the catalog.

pub mod types;

pub use types::*;
