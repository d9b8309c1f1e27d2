//! Refresh task
//!
//! Runs one playback pass per interval. Commands and brightness changes
//! that arrive while the task is idle are handled at once; power on starts
//! playback without waiting for the next tick.

use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Ticker};
use log::info;
use pixelreel_core::playback::{BrightnessSignal, CommandReceiver};

use crate::channels::HostDriver;

#[embassy_executor::task]
pub async fn refresh_task(
    mut driver: HostDriver,
    commands: CommandReceiver<'static, CriticalSectionRawMutex>,
    brightness: &'static BrightnessSignal<CriticalSectionRawMutex>,
    interval_ms: u32,
) {
    info!("Refresh task started ({} ms)", interval_ms);

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(interval_ms)));
    driver.tick().await;
    ticker.reset();

    loop {
        let play_now = match select3(ticker.next(), commands.receive(), brightness.wait()).await {
            Either3::First(()) => true,
            Either3::Second(command) => driver.handle_command(command).await,
            Either3::Third(level) => {
                driver.set_panel_brightness(level);
                false
            }
        };

        if play_now {
            driver.tick().await;
            // A pass can run for several seconds; the interval counts from its end
            ticker.reset();
        }
    }
}
