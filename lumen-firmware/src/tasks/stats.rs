//! Dashboard refresh task

use defmt::*;
use embassy_time::{Duration, Ticker};
use lumen_core::stats::StatsRenderer;

use crate::net::NetEngine;
use crate::shared::{Console, Indicator, LOG};

#[embassy_executor::task]
pub async fn stats_task(
    mut renderer: StatsRenderer,
    engine: NetEngine,
    console: &'static Console,
    indicator: &'static Indicator,
    period_ms: u32,
) {
    info!("Stats task started");

    let mut ticker = Ticker::every(Duration::from_millis(period_ms.into()));

    loop {
        let cells = renderer
            .poll_locked(&engine, console, indicator, &LOG)
            .await;
        if cells > 0 {
            trace!("Dashboard redrew {} cells", cells);
        }
        ticker.next().await;
    }
}
