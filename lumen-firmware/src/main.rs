//! Lumen - Network Demonstration Firmware
//!
//! Firmware for RP2040 boards with a W5500 Ethernet controller. Shows a
//! live network dashboard and an interactive shell on the serial console,
//! and runs a UDP echo service through which a remote peer can change the
//! color of the onboard RGB LED.
//!
//! Named after the unit of luminous flux.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{SpawnError, Spawner};
use embassy_net::StackResources;
use embassy_net_wiznet::State;
use embassy_rp::bind_interrupts;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Delay, Instant, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_io_async::Read;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use lumen_core::config::{parse_config, AppConfig};
use lumen_core::console::AnsiTerminal;
use lumen_core::indicator::{RgbLed, StatusIndicator};
use lumen_core::layout::SHELL_TOP;
use lumen_core::log::LogCategory;
use lumen_core::shell::{Shell, ShellContext, Terminal};
use lumen_core::stats::StatsRenderer;
use lumen_core::supervisor::{BootSequence, BootStep};
use lumen_core::tasks::{priority, TaskId};
use lumen_core::traits::{Console as _, PacketEngine};
use lumen_core::Color;

use crate::board::BoardDiagnostics;
use crate::net::{CountingDriver, NetEngine, NetProbe, NetUdp, ProbeBuffers, UdpBuffers};
use crate::shared::{Console, Indicator, LOG, NET_STATS, TASKS};

mod board;
mod net;
mod shared;
mod tasks;

/// Embedded board configuration
/// Edit lumen.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../lumen.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for everything tasks borrow (must live forever)
static TX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CONSOLE: StaticCell<Console> = StaticCell::new();
static INDICATOR: StaticCell<Indicator> = StaticCell::new();
static WIZNET_STATE: StaticCell<State<8, 8>> = StaticCell::new();
static RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
static UDP_BUFFERS: ConstStaticCell<UdpBuffers> = ConstStaticCell::new(UdpBuffers::new());
static PROBE_BUFFERS: ConstStaticCell<ProbeBuffers> = ConstStaticCell::new(ProbeBuffers::new());

/// Main entry point; becomes the shell once bring-up is done
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    board::stack::paint();
    info!("Lumen firmware starting...");

    let config = load_config();
    let mut boot = BootSequence::new();

    // Board: peripherals, LED, console UART, W5500
    let p = embassy_rp::init(Default::default());
    let mut watchdog = Watchdog::new(p.WATCHDOG);

    let led = RgbLed::new(
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_8, Level::Low),
        board::LED_ACTIVE_LOW,
    );
    let indicator: &'static Indicator = INDICATOR.init(StatusIndicator::new(led));

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = board::CONSOLE_BAUD;
    let uart = BufferedUart::new(
        p.UART0,
        p.PIN_0,
        p.PIN_1,
        Irqs,
        TX_BUF.init([0u8; 1024]),
        RX_BUF.init([0u8; 64]),
        uart_config,
    );
    let (tx, mut rx) = uart.split();
    let console: &'static Console = CONSOLE.init(Console::new(AnsiTerminal::new(tx)));
    info!("Console UART initialized");

    let mut uid = [0u8; 8];
    let mut flash = Flash::<_, Blocking, { board::FLASH_SIZE }>::new_blocking(p.FLASH);
    if flash.blocking_unique_id(&mut uid).is_err() {
        warn!("Flash unique ID unavailable, MAC falls back to zeros");
    }
    let mac = board::mac_address(&uid);

    let mut spi_config = SpiConfig::default();
    spi_config.frequency = board::SPI_FREQUENCY_HZ;
    let spi = Spi::new(
        p.SPI0,
        p.PIN_18,
        p.PIN_19,
        p.PIN_16,
        p.DMA_CH0,
        p.DMA_CH1,
        spi_config,
    );
    let spi = match ExclusiveDevice::new(spi, Output::new(p.PIN_17, Level::High), Delay) {
        Ok(device) => device,
        Err(e) => match e {},
    };
    let w5500_int = Input::new(p.PIN_21, Pull::Up);
    let w5500_reset = Output::new(p.PIN_20, Level::High);

    let wiznet = embassy_net_wiznet::new(
        mac,
        WIZNET_STATE.init(State::new()),
        spi,
        w5500_int,
        w5500_reset,
    )
    .await;
    let Ok((device, eth_runner)) = wiznet else {
        halt(indicator, "W5500 did not respond").await
    };
    info!("W5500 initialized, MAC {:02x}", mac);
    step(&mut boot, BootStep::Board);

    // Executor: network runners and the supervisor's own descriptor
    let (stack, net_runner) = embassy_net::new(
        CountingDriver::new(device, &NET_STATS),
        embassy_net::Config::default(),
        RESOURCES.init(StackResources::new()),
        board::stack_seed(&uid),
    );
    spawn("ethernet", || {
        tasks::ethernet_task(eth_runner).map(|t| spawner.spawn(t))
    });
    spawn("net", || {
        tasks::net_task(net_runner).map(|t| spawner.spawn(t))
    });
    if TASKS.mark_created(TaskId::Shell).is_err() {
        error!("Supervisor descriptor already created");
    }
    step(&mut boot, BootStep::Executor);

    spawn("heartbeat", || {
        tasks::heartbeat_task(indicator, config.tasks.heartbeat_ms).map(|t| spawner.spawn(t))
    });
    step(&mut boot, BootStep::Heartbeat);

    // Banner and static dashboard
    let mut renderer = StatsRenderer::new();
    {
        let mut con = console.lock().await;
        con.clear_screen();
        renderer.draw_layout(&mut *con);
    }
    LOG.record(
        LogCategory::Info,
        format_args!("lumen {} started", env!("CARGO_PKG_VERSION")),
    );
    step(&mut boot, BootStep::Banner);

    let engine = NetEngine::new(stack, &NET_STATS);
    engine.set_ipv4(config.network.address);
    info!("Default address {}", config.network.address);
    LOG.record(
        LogCategory::Info,
        format_args!("ip4 addr {}", config.network.address),
    );
    step(&mut boot, BootStep::Network);

    // Workers, highest priority first
    let udp = NetUdp::new(stack, UDP_BUFFERS.take());
    let port = config.network.udp_port;
    create(TaskId::UdpEcho, || {
        tasks::udp_echo_task(udp, port, console, indicator).map(|t| spawner.spawn(t))
    });
    let stats_ms = config.tasks.stats_ms;
    create(TaskId::Stats, || {
        tasks::stats_task(renderer, engine, console, indicator, stats_ms).map(|t| spawner.spawn(t))
    });
    let stack_ms = config.tasks.stack_ms;
    create(TaskId::StackMonitor, || {
        tasks::stack_monitor_task(stack_ms).map(|t| spawner.spawn(t))
    });
    step(&mut boot, BootStep::Workers);

    if let Err(e) = TASKS.set_priority(TaskId::Shell, priority::SHELL) {
        error!("Failed to lower supervisor priority: {:?}", e);
    }
    step(&mut boot, BootStep::LowerPriority);

    {
        let mut con = console.lock().await;
        con.set_scroll_region(SHELL_TOP, config.console.rows);
        con.move_to(SHELL_TOP, 1);
    }
    step(&mut boot, BootStep::ScrollRegion);

    let diagnostics = BoardDiagnostics::capture(&mut watchdog, Instant::now());
    let mut shell = Shell::new(
        ShellContext {
            engine: &engine,
            console,
            diagnostics: &diagnostics,
            tasks: &TASKS,
            log: &LOG,
            ping: config.ping,
        },
        NetProbe::new(stack, PROBE_BUFFERS.take()),
        Delay,
    );
    step(&mut boot, BootStep::Shell);
    info!("Bring-up complete, shell running");

    shell.prompt().await;
    let terminal = loop {
        let mut byte = [0u8; 1];
        match rx.read(&mut byte).await {
            Ok(1) => {
                if let Some(terminal) = shell.feed(byte[0]).await {
                    break terminal;
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Console read error: {:?}", e),
        }
    };

    // Let the last message drain before the UART interrupt goes away
    console.lock().await.flush();

    match terminal {
        Terminal::Hang => {
            warn!("Hanging with interrupts disabled");
            cortex_m::interrupt::disable();
            loop {
                cortex_m::asm::nop();
            }
        }
        Terminal::Reset => {
            warn!("Resetting through the watchdog");
            watchdog.trigger_reset();
            loop {
                cortex_m::asm::nop();
            }
        }
    }
}

/// Parse the embedded configuration
///
/// build.rs already validated lumen.toml, so falling back to the defaults
/// only happens if the two parsers disagree.
fn load_config() -> AppConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            LOG.record(
                LogCategory::Error,
                format_args!("config line {}: {:?}, using defaults", e.line, e.kind),
            );
            AppConfig::default()
        }
    }
}

/// Record a finished boot step
fn step(boot: &mut BootSequence, step: BootStep) {
    match boot.advance(step) {
        Ok(()) => debug!("Boot step {:?} done", step),
        Err(e) => error!("Boot sequence violated: {:?}", e),
    }
}

/// Spawn a task outside the registry
fn spawn(name: &str, spawn: impl FnOnce() -> Result<(), SpawnError>) {
    if spawn().is_err() {
        error!("Failed to spawn {} task", name);
        LOG.record(LogCategory::Error, format_args!("{} task not spawned", name));
    }
}

/// Spawn one of the registered tasks
fn create(id: TaskId, spawn: impl FnOnce() -> Result<(), SpawnError>) {
    match TASKS.create(id, spawn) {
        Ok(()) => info!("Created task {}", id.name()),
        Err(_) => {
            error!("Failed to create task {}", id.name());
            LOG.record(
                LogCategory::Error,
                format_args!("task {} not created", id.name()),
            );
        }
    }
}

/// Stop bring-up: show the alert color and idle
async fn halt(indicator: &Indicator, reason: &str) -> ! {
    error!("{}", reason);
    LOG.record(LogCategory::Error, format_args!("{}", reason));
    indicator.set(Color::ALERT);
    loop {
        Timer::after_secs(60).await;
    }
}
