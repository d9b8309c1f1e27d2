//! Clock backed by the embassy time driver

use embassy_time::{Duration, Instant, Timer};
use pixelreel_core::traits::Clock;

/// Monotonic clock using `embassy_time`
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    fn wait_ms(&mut self, ms: u32) -> impl core::future::Future<Output = ()> {
        Timer::after(Duration::from_millis(u64::from(ms)))
    }
}
