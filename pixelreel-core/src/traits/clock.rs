//! Time source for the playback driver

use core::future::Future;

/// Monotonic clock with an async delay
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Wait for `ms` milliseconds
    fn wait_ms(&mut self, ms: u32) -> impl Future<Output = ()>;
}
