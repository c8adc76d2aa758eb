//! Packet counters and switches shared between the link driver and the shell

use core::net::Ipv4Addr;

use lumen_core::traits::{Layer, LayerCounters};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Counters for one layer
pub struct LayerStats {
    accepted: AtomicU32,
    dropped: AtomicU32,
    sent: AtomicU32,
    trace: AtomicBool,
}

impl LayerStats {
    const fn new() -> Self {
        Self {
            accepted: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            sent: AtomicU32::new(0),
            trace: AtomicBool::new(false),
        }
    }

    pub fn count_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LayerCounters {
        LayerCounters {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
        }
    }
}

/// Written by the link driver, read by everything else
pub struct EngineStats {
    layers: [LayerStats; 3],
    loopback: AtomicBool,
    /// Interface address the inbound filter compares against
    local: AtomicU32,
}

impl EngineStats {
    pub const fn new() -> Self {
        Self {
            layers: [LayerStats::new(), LayerStats::new(), LayerStats::new()],
            loopback: AtomicBool::new(false),
            local: AtomicU32::new(0),
        }
    }

    pub fn layer(&self, layer: Layer) -> &LayerStats {
        &self.layers[layer.index()]
    }

    pub fn trace_enabled(&self, layer: Layer) -> bool {
        self.layer(layer).trace.load(Ordering::Relaxed)
    }

    pub fn set_trace(&self, layer: Layer, enabled: bool) {
        self.layer(layer).trace.store(enabled, Ordering::Relaxed);
    }

    pub fn loopback_enabled(&self) -> bool {
        self.loopback.load(Ordering::Relaxed)
    }

    pub fn set_loopback(&self, enabled: bool) {
        self.loopback.store(enabled, Ordering::Relaxed);
    }

    pub fn local(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.local.load(Ordering::Relaxed))
    }

    pub fn set_local(&self, address: Ipv4Addr) {
        self.local.store(u32::from(address), Ordering::Relaxed);
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}
