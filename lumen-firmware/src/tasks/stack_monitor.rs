//! Stack high-water sampling task

use defmt::*;
use embassy_time::{Duration, Ticker};
use lumen_core::tasks::StackMonitor;

use crate::board::PaintedStack;
use crate::shared::TASKS;

#[embassy_executor::task]
pub async fn stack_monitor_task(period_ms: u32) {
    info!("Stack monitor task started");

    let mut monitor = StackMonitor::new(&TASKS, PaintedStack);
    let mut ticker = Ticker::every(Duration::from_millis(period_ms.into()));

    loop {
        ticker.next().await;
        monitor.sample();
    }
}
