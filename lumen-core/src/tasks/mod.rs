//! Fixed task set
//!
//! The application runs a fixed set of tasks created once at boot. Each
//! has a descriptor in the [`TaskRegistry`] with its name, priority,
//! creation flag and stack high-water mark.

pub mod monitor;
pub mod registry;

pub use monitor::StackMonitor;
pub use registry::{TaskDescriptor, TaskError, TaskRegistry};

/// The application's tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskId {
    /// Boot supervisor, later the shell input loop
    Shell,
    /// UDP echo/command service
    UdpEcho,
    /// Dashboard renderer
    Stats,
    /// Stack high-water sampler
    StackMonitor,
}

/// Number of tasks in the fixed set
pub const TASK_COUNT: usize = 4;

/// Priorities, higher runs first
pub mod priority {
    /// Supervisor during bring-up
    pub const BOOT: u8 = 7;
    pub const UDP_ECHO: u8 = 6;
    /// Supervisor after bring-up, while it runs the shell
    pub const SHELL: u8 = 4;
    pub const STATS: u8 = 2;
    pub const STACK_MONITOR: u8 = 1;
}

impl TaskId {
    pub const ALL: [TaskId; TASK_COUNT] = [
        TaskId::Shell,
        TaskId::UdpEcho,
        TaskId::Stats,
        TaskId::StackMonitor,
    ];

    pub const fn index(self) -> usize {
        match self {
            TaskId::Shell => 0,
            TaskId::UdpEcho => 1,
            TaskId::Stats => 2,
            TaskId::StackMonitor => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TaskId::Shell => "shell",
            TaskId::UdpEcho => "udp-echo",
            TaskId::Stats => "stats",
            TaskId::StackMonitor => "stack-mon",
        }
    }

    /// Priority assigned at creation
    pub const fn initial_priority(self) -> u8 {
        match self {
            TaskId::Shell => priority::BOOT,
            TaskId::UdpEcho => priority::UDP_ECHO,
            TaskId::Stats => priority::STATS,
            TaskId::StackMonitor => priority::STACK_MONITOR,
        }
    }
}
