//! Counting link driver
//!
//! Wraps the W5500 driver between the chip and embassy-net. Every frame
//! crossing it is inspected to maintain the per-layer counters, optionally
//! traced, and with loopback on, transmitted frames are handed straight
//! back to the receive path instead of going to the wire.

use core::cell::RefCell;
use core::fmt;
use core::task::Context;

use defmt::*;
use embassy_net_driver::{Capabilities, Driver, HardwareAddress, LinkState, RxToken, TxToken};
use heapless::Vec;
use lumen_core::log::LogCategory;
use lumen_core::traits::Layer;
use lumen_protocol::frame::{inspect_inbound, inspect_outbound, Verdict};

use super::stats::EngineStats;
use crate::shared::LOG;

/// Largest Ethernet frame without FCS
pub const FRAME_LEN: usize = 1514;

type Frame = Vec<u8, FRAME_LEN>;

/// The one frame waiting to come back in loopback mode
struct LoopSlot {
    frame: RefCell<Option<Frame>>,
}

impl LoopSlot {
    const fn new() -> Self {
        Self {
            frame: RefCell::new(None),
        }
    }

    fn is_full(&self) -> bool {
        self.frame.borrow().is_some()
    }

    fn take(&self) -> Option<Frame> {
        self.frame.borrow_mut().take()
    }

    /// Park a frame; returns true when an unread frame was overwritten
    fn put(&self, frame: Frame) -> bool {
        self.frame.borrow_mut().replace(frame).is_some()
    }
}

/// Driver adapter that counts, traces and loops back frames
pub struct CountingDriver<D> {
    inner: D,
    stats: &'static EngineStats,
    looped: LoopSlot,
}

impl<D: Driver> CountingDriver<D> {
    pub fn new(inner: D, stats: &'static EngineStats) -> Self {
        Self {
            inner,
            stats,
            looped: LoopSlot::new(),
        }
    }
}

fn mac_of(address: HardwareAddress) -> [u8; 6] {
    match address {
        HardwareAddress::Ethernet(mac) => mac,
        _ => [0; 6],
    }
}

impl<D: Driver> Driver for CountingDriver<D> {
    type RxToken<'a>
        = CountingRx<'a, D::RxToken<'a>>
    where
        Self: 'a;
    type TxToken<'a>
        = CountingTx<'a, D::TxToken<'a>>
    where
        Self: 'a;

    fn receive(&mut self, cx: &mut Context) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        let tap = Tap {
            stats: self.stats,
            mac: mac_of(self.inner.hardware_address()),
        };
        let looped = &self.looped;

        if looped.is_full() {
            let tx = self.inner.transmit(cx)?;
            return Some((
                CountingRx {
                    source: RxSource::Looped(looped),
                    tap,
                },
                CountingTx { inner: tx, looped, tap },
            ));
        }

        let (rx, tx) = self.inner.receive(cx)?;
        Some((
            CountingRx {
                source: RxSource::Wire(rx),
                tap,
            },
            CountingTx { inner: tx, looped, tap },
        ))
    }

    fn transmit(&mut self, cx: &mut Context) -> Option<Self::TxToken<'_>> {
        let tap = Tap {
            stats: self.stats,
            mac: mac_of(self.inner.hardware_address()),
        };
        if self.stats.loopback_enabled() {
            // The looped frame has to be picked up by another poll
            cx.waker().wake_by_ref();
        }
        let tx = self.inner.transmit(cx)?;
        Some(CountingTx {
            inner: tx,
            looped: &self.looped,
            tap,
        })
    }

    fn link_state(&mut self, cx: &mut Context) -> LinkState {
        if self.stats.loopback_enabled() {
            return LinkState::Up;
        }
        self.inner.link_state(cx)
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    fn hardware_address(&self) -> HardwareAddress {
        self.inner.hardware_address()
    }
}

enum RxSource<'a, R> {
    Wire(R),
    Looped(&'a LoopSlot),
}

pub struct CountingRx<'a, R> {
    source: RxSource<'a, R>,
    tap: Tap,
}

impl<R: RxToken> RxToken for CountingRx<'_, R> {
    fn consume<T, F>(self, f: F) -> T
    where
        F: FnOnce(&mut [u8]) -> T,
    {
        let tap = self.tap;
        match self.source {
            RxSource::Wire(token) => token.consume(|frame| {
                tap.inbound(frame);
                f(frame)
            }),
            RxSource::Looped(slot) => {
                // Moved out first: handling it may transmit into the slot again
                let mut frame = slot.take().unwrap_or_default();
                tap.inbound(&frame);
                f(&mut frame)
            }
        }
    }
}

pub struct CountingTx<'a, T> {
    inner: T,
    looped: &'a LoopSlot,
    tap: Tap,
}

impl<T: TxToken> TxToken for CountingTx<'_, T> {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let tap = self.tap;
        if !tap.stats.loopback_enabled() {
            return self.inner.consume(len, |frame| {
                let result = f(frame);
                tap.outbound(frame);
                result
            });
        }

        let mut frame = Frame::new();
        let _ = frame.resize(len.min(FRAME_LEN), 0);
        let result = f(&mut frame);
        tap.outbound(&frame);
        if self.looped.put(frame) {
            tap.stats.layer(Layer::Link).count_dropped();
        }
        result
    }
}

/// Counting and tracing hooks shared by both token kinds
#[derive(Clone, Copy)]
struct Tap {
    stats: &'static EngineStats,
    mac: [u8; 6],
}

impl Tap {
    fn inbound(&self, frame: &[u8]) {
        let seen = inspect_inbound(frame, self.mac, self.stats.local().octets());

        self.count(Layer::Link, seen.link);
        if let Some(verdict) = seen.ipv4 {
            self.count(Layer::Ipv4, verdict);
        }
        if let Some(verdict) = seen.udp {
            self.count(Layer::Udp, verdict);
        }

        if self.stats.trace_enabled(Layer::Link) {
            match seen.ethernet {
                Some(eth) => self.trace(
                    Layer::Link,
                    format_args!(
                        "ether rx {} > {} type {:04x}",
                        Mac(eth.src),
                        Mac(eth.dst),
                        eth.ethertype
                    ),
                ),
                None => self.trace(Layer::Link, format_args!("ether rx runt, {} bytes", frame.len())),
            }
        }
        if let (Some(verdict), true) = (seen.ipv4, self.stats.trace_enabled(Layer::Ipv4)) {
            match seen.ipv4_header {
                Some(ip) => self.trace(
                    Layer::Ipv4,
                    format_args!(
                        "ip4 rx {} > {} proto {} len {}{}",
                        Dotted(ip.src),
                        Dotted(ip.dst),
                        ip.protocol,
                        ip.total_len,
                        Dropped(verdict)
                    ),
                ),
                None => self.trace(Layer::Ipv4, format_args!("ip4 rx bad header")),
            }
        }
        if let (Some(verdict), true) = (seen.udp, self.stats.trace_enabled(Layer::Udp)) {
            match seen.udp_header {
                Some(udp) => self.trace(
                    Layer::Udp,
                    format_args!(
                        "udp rx {} > {} len {}",
                        udp.src_port, udp.dst_port, udp.length
                    ),
                ),
                None => self.trace(Layer::Udp, format_args!("udp rx{}", Dropped(verdict))),
            }
        }
    }

    fn outbound(&self, frame: &[u8]) {
        let sent = inspect_outbound(frame);

        for (layer, counted) in [
            (Layer::Link, sent.link),
            (Layer::Ipv4, sent.ipv4),
            (Layer::Udp, sent.udp),
        ] {
            if counted {
                self.stats.layer(layer).count_sent();
            }
        }

        if let (Some(eth), true) = (sent.ethernet, self.stats.trace_enabled(Layer::Link)) {
            self.trace(
                Layer::Link,
                format_args!(
                    "ether tx {} > {} type {:04x}",
                    Mac(eth.src),
                    Mac(eth.dst),
                    eth.ethertype
                ),
            );
        }
        if let (Some(ip), true) = (sent.ipv4_header, self.stats.trace_enabled(Layer::Ipv4)) {
            self.trace(
                Layer::Ipv4,
                format_args!(
                    "ip4 tx {} > {} proto {} len {}",
                    Dotted(ip.src),
                    Dotted(ip.dst),
                    ip.protocol,
                    ip.total_len
                ),
            );
        }
        if let (Some(udp), true) = (sent.udp_header, self.stats.trace_enabled(Layer::Udp)) {
            self.trace(
                Layer::Udp,
                format_args!(
                    "udp tx {} > {} len {}",
                    udp.src_port, udp.dst_port, udp.length
                ),
            );
        }
    }

    fn count(&self, layer: Layer, verdict: Verdict) {
        let counters = self.stats.layer(layer);
        match verdict {
            Verdict::Accepted => counters.count_accepted(),
            Verdict::Dropped(_) => counters.count_dropped(),
        }
    }

    /// Trace lines go to the probe and to the debug log book
    fn trace(&self, layer: Layer, args: fmt::Arguments<'_>) {
        let mut line: heapless::String<96> = heapless::String::new();
        let _ = fmt::Write::write_fmt(&mut line, args);
        debug!("[{}] {}", layer.label(), line.as_str());
        LOG.record(LogCategory::Debug, format_args!("{}", line));
    }
}

struct Mac([u8; 6]);

impl fmt::Display for Mac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

struct Dotted([u8; 4]);

impl fmt::Display for Dotted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&core::net::Ipv4Addr::from(self.0), f)
    }
}

struct Dropped(Verdict);

impl fmt::Display for Dropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Verdict::Accepted => Ok(()),
            Verdict::Dropped(reason) => write!(f, " dropped ({:?})", reason),
        }
    }
}
