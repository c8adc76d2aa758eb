//! Network runner tasks

use embassy_net_wiznet::chip::W5500;
use embassy_net_wiznet::{Device, Runner};
use embassy_rp::gpio::{Input, Output};
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Async, Spi};
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;

use crate::net::CountingDriver;

pub type W5500Spi = ExclusiveDevice<Spi<'static, SPI0, Async>, Output<'static>, Delay>;

/// W5500 chip driver
#[embassy_executor::task]
pub async fn ethernet_task(
    runner: Runner<'static, W5500, W5500Spi, Input<'static>, Output<'static>>,
) -> ! {
    runner.run().await
}

/// embassy-net stack over the counting driver
#[embassy_executor::task]
pub async fn net_task(
    mut runner: embassy_net::Runner<'static, CountingDriver<Device<'static>>>,
) -> ! {
    runner.run().await
}
