//! pixelreel control protocol
//!
//! This crate defines the framed protocol between a remote controller (phone
//! app, CLI, test harness) and the matrix player. Every request gets exactly
//! one reply frame.
//!
//! # Protocol Overview
//!
//! All messages use a simple binary frame format:
//! ```text
//! ┌───────┬────────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH     │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 2B (LE)    │ 1B   │ 0–2048B     │ 1B       │
//! └───────┴────────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! Structured payloads are encoded with postcard. Uploads are split into
//! a begin frame, any number of raw chunk frames and a commit frame.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod codes;
pub mod frame;
pub mod messages;

pub use codes::ErrorCode;
pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{
    CategoryListing, CategorySummary, ControlReply, ControlRequest, StatusReport, UploadBegin,
    UploadTarget, MAX_CATEGORIES, MAX_CHUNK_SIZE, MAX_FILES, MAX_NAME_LEN,
};
