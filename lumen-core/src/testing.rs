//! Mock implementations of the board contracts for host tests

use core::cell::{Cell, RefCell};
use core::fmt;
use core::net::Ipv4Addr;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use lumen_protocol::Color;

use crate::addr::{Ipv4Net, Peer};
use crate::indicator::IndicatorOutput;
use crate::tasks::TaskId;
use crate::traits::{
    ClockInfo, Console, Diagnostics, EchoProbe, Layer, LayerCounters, MemoryUsage, NetError,
    PacketEngine, ProbeError, ProbeReply, ResetCause, StackProbe, UdpEndpoint,
};

/// Indicator output that records every driven color
pub struct RecordingOutput<'a>(pub &'a RefCell<Vec<Color>>);

impl IndicatorOutput for RecordingOutput<'_> {
    fn drive(&mut self, color: Color) {
        self.0.borrow_mut().push(color);
    }
}

/// Console that separates positioned writes from scrolling text
#[derive(Default)]
pub struct RecordingConsole {
    /// Plain output at the shell cursor
    pub text: String,
    /// Positioned writes as (row, col, text)
    pub fields: Vec<(u8, u8, String)>,
    pub scroll_region: Option<(u8, u8)>,
    pub clears: usize,
    cursor: Option<(u8, u8)>,
}

impl RecordingConsole {
    /// Text of the last write at `row`
    pub fn field(&self, row: u8, col: u8) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(r, c, _)| *r == row && *c == col)
            .map(|(_, _, text)| text.as_str())
    }

    pub fn take_fields(&mut self) -> Vec<(u8, u8, String)> {
        core::mem::take(&mut self.fields)
    }
}

impl fmt::Write for RecordingConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match self.cursor {
            Some((row, col)) => self.fields.push((row, col, s.into())),
            None => self.text.push_str(s),
        }
        Ok(())
    }
}

impl Console for RecordingConsole {
    fn move_to(&mut self, row: u8, col: u8) {
        self.cursor = Some((row, col));
    }

    fn clear_to_eol(&mut self) {}

    fn clear_screen(&mut self) {
        self.clears += 1;
    }

    fn set_scroll_region(&mut self, top: u8, bottom: u8) {
        self.scroll_region = Some((top, bottom));
    }

    fn save_cursor(&mut self) {}

    fn restore_cursor(&mut self) {
        self.cursor = None;
    }
}

/// Packet engine with directly settable state
pub struct MockEngine {
    pub link: Cell<bool>,
    pub net: Cell<Ipv4Net>,
    pub counters: RefCell<[LayerCounters; 3]>,
    pub trace: Cell<[bool; 3]>,
    pub loopback: Cell<bool>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            link: Cell::new(false),
            net: Cell::new(Ipv4Net::new(Ipv4Addr::new(192, 168, 1, 50), 24).unwrap()),
            counters: RefCell::new([LayerCounters::default(); 3]),
            trace: Cell::new([false; 3]),
            loopback: Cell::new(false),
        }
    }
}

impl PacketEngine for MockEngine {
    fn link_up(&self) -> bool {
        self.link.get()
    }

    fn ipv4(&self) -> Ipv4Net {
        self.net.get()
    }

    fn set_ipv4(&self, net: Ipv4Net) {
        self.net.set(net);
    }

    fn counters(&self, layer: Layer) -> LayerCounters {
        self.counters.borrow()[layer.index()]
    }

    fn set_trace(&self, layer: Layer, enabled: bool) {
        let mut trace = self.trace.get();
        trace[layer.index()] = enabled;
        self.trace.set(trace);
    }

    fn trace_enabled(&self, layer: Layer) -> bool {
        self.trace.get()[layer.index()]
    }

    fn set_loopback(&self, enabled: bool) {
        self.loopback.set(enabled);
    }

    fn loopback_enabled(&self) -> bool {
        self.loopback.get()
    }
}

/// What happened on a [`MockEndpoint`]
#[derive(Default)]
pub struct EndpointLog {
    pub bound: Option<u16>,
    pub sent: Vec<(Vec<u8>, Peer)>,
}

/// UDP endpoint fed from a script of inbound datagrams
///
/// Once the script runs dry, receive fails with [`NetError::Closed`].
pub struct MockEndpoint<'a> {
    pub inbound: VecDeque<Result<(Vec<u8>, Peer), NetError>>,
    pub bind_error: Option<NetError>,
    pub send_error: Option<NetError>,
    pub log: &'a RefCell<EndpointLog>,
}

impl<'a> MockEndpoint<'a> {
    pub fn new(log: &'a RefCell<EndpointLog>) -> Self {
        Self {
            inbound: VecDeque::new(),
            bind_error: None,
            send_error: None,
            log,
        }
    }

    pub fn push(&mut self, payload: &[u8], peer: Peer) {
        self.inbound.push_back(Ok((payload.to_vec(), peer)));
    }
}

impl UdpEndpoint for MockEndpoint<'_> {
    fn bind(&mut self, port: u16) -> Result<(), NetError> {
        if let Some(err) = self.bind_error {
            return Err(err);
        }
        self.log.borrow_mut().bound = Some(port);
        Ok(())
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, Peer), NetError> {
        let (payload, peer) = self.inbound.pop_front().unwrap_or(Err(NetError::Closed))?;
        if payload.len() > buf.len() {
            return Err(NetError::Truncated);
        }
        buf[..payload.len()].copy_from_slice(&payload);
        Ok((payload.len(), peer))
    }

    async fn send_to(&mut self, buf: &[u8], peer: Peer) -> Result<(), NetError> {
        if let Some(err) = self.send_error {
            return Err(err);
        }
        self.log.borrow_mut().sent.push((buf.to_vec(), peer));
        Ok(())
    }
}

/// Echo probe answering from a script; missing entries time out
#[derive(Default)]
pub struct MockProbe {
    pub script: VecDeque<Result<ProbeReply, ProbeError>>,
    /// (target, ident, seq, timeout_ms) of every probe sent
    pub sent: Vec<(Ipv4Addr, u16, u16, u32)>,
}

impl MockProbe {
    pub fn answering(replies: usize) -> Self {
        Self {
            script: (0..replies).map(|i| Ok(ProbeReply { rtt_ms: i as u32 + 1 })).collect(),
            sent: Vec::new(),
        }
    }
}

impl EchoProbe for MockProbe {
    async fn probe(
        &mut self,
        target: Ipv4Addr,
        ident: u16,
        seq: u16,
        timeout_ms: u32,
    ) -> Result<ProbeReply, ProbeError> {
        self.sent.push((target, ident, seq, timeout_ms));
        self.script.pop_front().unwrap_or(Err(ProbeError::Timeout))
    }
}

/// Delay that returns immediately and counts requested milliseconds
#[derive(Default)]
pub struct NoDelay {
    pub waited_ms: u64,
    pub calls: usize,
}

impl embedded_hal_async::delay::DelayNs for NoDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waited_ms += u64::from(ns) / 1_000_000;
        self.calls += 1;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waited_ms += u64::from(ms);
        self.calls += 1;
    }
}

pub struct MockDiagnostics;

impl Diagnostics for MockDiagnostics {
    fn reset_cause(&self) -> ResetCause {
        ResetCause::Watchdog
    }

    fn reset_count(&self) -> u32 {
        3
    }

    fn startup_ms(&self) -> u32 {
        412
    }

    fn memory(&self) -> MemoryUsage {
        MemoryUsage {
            flash_used: 61_234,
            flash_total: 2_097_152,
            ram_used: 40_211,
            ram_total: 270_336,
        }
    }

    fn clocks(&self) -> ClockInfo {
        ClockInfo {
            system_hz: 125_000_000,
            peripheral_hz: 125_000_000,
        }
    }
}

/// Stack probe reporting a fixed depth per task
pub struct FixedStack(pub u32);

impl StackProbe for FixedStack {
    fn high_water(&self, _task: TaskId) -> u32 {
        self.0
    }
}
