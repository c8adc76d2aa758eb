//! [`PacketEngine`] over an embassy-net stack

use embassy_net::{ConfigV4, Ipv4Cidr, Stack, StaticConfigV4};
use lumen_core::addr::Ipv4Net;
use lumen_core::traits::{Layer, LayerCounters, PacketEngine};

use super::stats::EngineStats;

/// Handle to the interface; cheap to copy
#[derive(Clone, Copy)]
pub struct NetEngine {
    stack: Stack<'static>,
    stats: &'static EngineStats,
}

impl NetEngine {
    pub fn new(stack: Stack<'static>, stats: &'static EngineStats) -> Self {
        Self { stack, stats }
    }
}

impl PacketEngine for NetEngine {
    fn link_up(&self) -> bool {
        self.stack.is_link_up()
    }

    fn ipv4(&self) -> Ipv4Net {
        self.stack
            .config_v4()
            .and_then(|c| Ipv4Net::new(c.address.address(), c.address.prefix_len()).ok())
            .unwrap_or(Ipv4Net::UNSPECIFIED)
    }

    fn set_ipv4(&self, net: Ipv4Net) {
        self.stack.set_config_v4(ConfigV4::Static(StaticConfigV4 {
            address: Ipv4Cidr::new(net.address(), net.prefix_len()),
            gateway: None,
            dns_servers: Default::default(),
        }));
        self.stats.set_local(net.address());
    }

    fn counters(&self, layer: Layer) -> LayerCounters {
        self.stats.layer(layer).snapshot()
    }

    fn set_trace(&self, layer: Layer, enabled: bool) {
        self.stats.set_trace(layer, enabled);
    }

    fn trace_enabled(&self, layer: Layer) -> bool {
        self.stats.trace_enabled(layer)
    }

    fn set_loopback(&self, enabled: bool) {
        self.stats.set_loopback(enabled);
    }

    fn loopback_enabled(&self) -> bool {
        self.stats.loopback_enabled()
    }
}
