//! Boot sequencing
//!
//! The supervisor brings the system up in a fixed order. Workers must not
//! start before the network has an address, and the shell must not draw
//! before the scroll region protects the dashboard. [`BootSequence`] turns
//! that order into a checked state machine.

/// Bring-up steps, in the only allowed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootStep {
    /// Clocks, pins, peripherals
    Board,
    /// Executor and time driver running
    Executor,
    /// Indicator heartbeat started
    Heartbeat,
    /// Banner and static dashboard drawn
    Banner,
    /// Default interface address applied
    Network,
    /// Stats, stack monitor and UDP service created
    Workers,
    /// Supervisor dropped to its shell priority
    LowerPriority,
    /// Shell scrolling region configured
    ScrollRegion,
    /// Shell input loop running
    Shell,
}

impl BootStep {
    pub const ALL: [BootStep; 9] = [
        BootStep::Board,
        BootStep::Executor,
        BootStep::Heartbeat,
        BootStep::Banner,
        BootStep::Network,
        BootStep::Workers,
        BootStep::LowerPriority,
        BootStep::ScrollRegion,
        BootStep::Shell,
    ];

    fn next(self) -> Option<BootStep> {
        let pos = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(pos + 1).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootError {
    /// Step attempted before its predecessors
    OutOfOrder { expected: BootStep, got: BootStep },
    /// All steps already done
    Complete,
}

/// Tracks progress through [`BootStep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootSequence {
    next: Option<BootStep>,
}

impl BootSequence {
    pub const fn new() -> Self {
        Self {
            next: Some(BootStep::Board),
        }
    }

    /// Mark `step` as done; it must be the next one due
    pub fn advance(&mut self, step: BootStep) -> Result<(), BootError> {
        match self.next {
            None => Err(BootError::Complete),
            Some(expected) if expected != step => Err(BootError::OutOfOrder {
                expected,
                got: step,
            }),
            Some(_) => {
                self.next = step.next();
                Ok(())
            }
        }
    }

    /// Whether `step` has been completed
    pub fn is_done(&self, step: BootStep) -> bool {
        match self.next {
            None => true,
            Some(next) => step < next,
        }
    }

    /// Next step due, `None` once the shell runs
    pub fn pending(&self) -> Option<BootStep> {
        self.next
    }
}

impl Default for BootSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut boot = BootSequence::new();
        for step in BootStep::ALL {
            assert!(!boot.is_done(step));
            boot.advance(step).unwrap();
            assert!(boot.is_done(step));
        }
        assert_eq!(boot.pending(), None);
        assert_eq!(boot.advance(BootStep::Shell), Err(BootError::Complete));
    }

    #[test]
    fn test_workers_before_network_rejected() {
        let mut boot = BootSequence::new();
        for step in &BootStep::ALL[..4] {
            boot.advance(*step).unwrap();
        }
        assert_eq!(
            boot.advance(BootStep::Workers),
            Err(BootError::OutOfOrder {
                expected: BootStep::Network,
                got: BootStep::Workers
            })
        );
        assert_eq!(boot.pending(), Some(BootStep::Network));
    }

    #[test]
    fn test_step_cannot_repeat() {
        let mut boot = BootSequence::new();
        boot.advance(BootStep::Board).unwrap();
        assert!(matches!(
            boot.advance(BootStep::Board),
            Err(BootError::OutOfOrder { .. })
        ));
    }
}
