//! UDP echo/command task
//!
//! Runs the echo service until its endpoint fails, then ends. The rest of
//! the system keeps running without it.

use defmt::*;
use lumen_core::echo::EchoService;

use crate::net::NetUdp;
use crate::shared::{Console, Indicator, LOG};

#[embassy_executor::task]
pub async fn udp_echo_task(
    endpoint: NetUdp,
    port: u16,
    console: &'static Console,
    indicator: &'static Indicator,
) {
    info!("UDP echo task started on port {}", port);

    let exit = EchoService::new(endpoint, port, console, indicator, &LOG)
        .run()
        .await;

    error!(
        "UDP echo stopped: {} failed, code {}",
        exit.operation(),
        exit.error().code()
    );
}
