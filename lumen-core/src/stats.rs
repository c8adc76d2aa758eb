//! Network statistics dashboard
//!
//! The renderer keeps the last snapshot it drew and only rewrites cells
//! whose value changed, so a quiet network costs nothing on the serial
//! line. Link transitions also drive the status indicator.

use core::fmt::Write;
use core::net::Ipv4Addr;

use heapless::String;
use lumen_protocol::Color;

use crate::console::SharedConsole;
use crate::indicator::{IndicatorOutput, StatusIndicator};
use crate::layout::*;
use crate::log::{LogBook, LogCategory};
use crate::traits::{Console, Layer, LayerCounters, PacketEngine};

/// One poll's worth of engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkSnapshot {
    pub link_up: bool,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    /// Indexed by [`Layer::index`]
    pub counters: [LayerCounters; 3],
}

impl NetworkSnapshot {
    pub fn capture<E: PacketEngine>(engine: &E) -> Self {
        let net = engine.ipv4();
        Self {
            link_up: engine.link_up(),
            address: net.address(),
            netmask: net.netmask(),
            counters: Layer::ALL.map(|layer| engine.counters(layer)),
        }
    }
}

/// Dashboard renderer
pub struct StatsRenderer {
    shown: Option<NetworkSnapshot>,
}

impl StatsRenderer {
    pub const fn new() -> Self {
        Self { shown: None }
    }

    /// Draw the static labels; the next poll redraws every value
    pub fn draw_layout<C: Console>(&mut self, console: &mut C) {
        console.put_field(TITLE_ROW, 1, "lumen network demo");
        console.put_field(LINK_ROW, 1, "link");
        console.put_field(ADDR_ROW, 1, "ip4 addr");
        console.put_at(ADDR_ROW, MASK_LABEL_COL, "mask");
        console.put_field(
            COUNTER_HEADER_ROW,
            COUNTER_COLS[0],
            "  accepted     dropped        sent",
        );
        for layer in Layer::ALL {
            console.put_field(counter_row(layer.index()), 1, layer.label());
        }
        console.put_field(ECHO_PEER_ROW, 1, "udp from");
        console.put_field(SEPARATOR_ROW, 1, SEPARATOR);
        self.shown = None;
    }

    /// Capture the engine state and redraw what changed
    ///
    /// Returns the number of cells written.
    pub fn poll<E, C, O>(
        &mut self,
        engine: &E,
        console: &mut C,
        indicator: &StatusIndicator<O>,
        log: &LogBook,
    ) -> usize
    where
        E: PacketEngine,
        C: Console,
        O: IndicatorOutput,
    {
        let now = NetworkSnapshot::capture(engine);
        let prev = self.shown;
        let mut cells = 0;

        if prev.map(|p| p.link_up) != Some(now.link_up) {
            let (label, color) = if now.link_up {
                ("up", Color::GOOD)
            } else {
                ("down", Color::ALERT)
            };
            console.put_field(LINK_ROW, VALUE_COL, label);
            indicator.set(color);
            log.record(LogCategory::Info, format_args!("link {}", label));
            cells += 1;
        }

        if prev.map(|p| p.address) != Some(now.address) {
            console.put_at(ADDR_ROW, VALUE_COL, &address_cell(now.address));
            cells += 1;
        }

        if prev.map(|p| p.netmask) != Some(now.netmask) {
            console.put_at(ADDR_ROW, MASK_COL, &address_cell(now.netmask));
            cells += 1;
        }

        for layer in Layer::ALL {
            let i = layer.index();
            let old = prev.map(|p| p.counters[i]);
            let new = now.counters[i];
            let values = [new.accepted, new.dropped, new.sent];
            let before = old.map(|c| [c.accepted, c.dropped, c.sent]);

            for (slot, value) in values.iter().enumerate() {
                if before.map(|b| b[slot]) == Some(*value) {
                    continue;
                }
                let mut cell: String<COUNTER_WIDTH> = String::new();
                let _ = write!(cell, "{:>width$}", value, width = COUNTER_WIDTH);
                console.put_at(counter_row(i), COUNTER_COLS[slot], &cell);
                cells += 1;
            }
        }

        self.shown = Some(now);
        cells
    }

    /// [`StatsRenderer::poll`] with the console lock held for the whole pass
    pub async fn poll_locked<E, C, O>(
        &mut self,
        engine: &E,
        console: &SharedConsole<C>,
        indicator: &StatusIndicator<O>,
        log: &LogBook,
    ) -> usize
    where
        E: PacketEngine,
        C: Console,
        O: IndicatorOutput,
    {
        let mut console = console.lock().await;
        self.poll(engine, &mut *console, indicator, log)
    }
}

impl Default for StatsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Address left aligned and padded so a shorter one erases a longer one
fn address_cell(addr: Ipv4Addr) -> String<ADDR_WIDTH> {
    let mut cell: String<ADDR_WIDTH> = String::new();
    let _ = write!(cell, "{}", addr);
    while cell.push(' ').is_ok() {}
    cell
}
