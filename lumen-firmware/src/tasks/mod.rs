//! Embassy async tasks
//!
//! Worker tasks share state only through the statics in `crate::shared`
//! and the handles passed in at spawn time.

pub mod heartbeat;
pub mod net;
pub mod stack_monitor;
pub mod stats;
pub mod udp_echo;

pub use heartbeat::heartbeat_task;
pub use net::{ethernet_task, net_task, W5500Spi};
pub use stack_monitor::stack_monitor_task;
pub use stats::stats_task;
pub use udp_echo::udp_echo_task;
