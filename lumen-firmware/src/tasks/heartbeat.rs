//! Heartbeat task
//!
//! Blinks the status indicator in its current color.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::shared::Indicator;

#[embassy_executor::task]
pub async fn heartbeat_task(indicator: &'static Indicator, period_ms: u32) {
    info!("Heartbeat task started ({} ms)", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms.into()));

    loop {
        ticker.next().await;
        indicator.toggle();
    }
}
