//! Embassy async tasks

pub mod refresh;
pub mod update_poll;

pub use refresh::refresh_task;
pub use update_poll::update_poll_task;
