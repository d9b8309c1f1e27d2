//! Update request polling
//!
//! Looks for a marker file on the content volume. A present marker is
//! logged and consumed. Playback state is never touched from here.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use embassy_time::{Duration, Ticker};
use log::{debug, info, warn};

/// Check for and consume a pending update request
///
/// Returns `true` if a request was found.
pub fn poll_update_request(marker: &Path) -> bool {
    match fs::remove_file(marker) {
        Ok(()) => {
            info!("Update request received ({})", marker.display());
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Cannot consume update marker {}: {}", marker.display(), e);
            false
        }
    }
}

#[embassy_executor::task]
pub async fn update_poll_task(marker: PathBuf, interval_ms: u32) {
    debug!("Update poll task started ({})", marker.display());

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(interval_ms)));
    loop {
        ticker.next().await;
        poll_update_request(&marker);
    }
}
