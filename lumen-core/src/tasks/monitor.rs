//! Stack high-water sampling

use crate::traits::StackProbe;

use super::{TaskId, TaskRegistry};

/// Refreshes every created task's high-water mark from a [`StackProbe`]
pub struct StackMonitor<'a, P> {
    registry: &'a TaskRegistry,
    probe: P,
}

impl<'a, P: StackProbe> StackMonitor<'a, P> {
    pub fn new(registry: &'a TaskRegistry, probe: P) -> Self {
        Self { registry, probe }
    }

    /// One sampling pass; returns how many tasks were refreshed
    pub fn sample(&mut self) -> usize {
        let mut refreshed = 0;
        for id in TaskId::ALL {
            if !self.registry.get(id).created {
                continue;
            }
            let bytes = self.probe.high_water(id);
            self.registry.record_high_water(id, bytes);
            refreshed += 1;
        }
        refreshed
    }
}
