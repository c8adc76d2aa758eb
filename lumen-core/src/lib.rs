//! Board-agnostic application logic for the Lumen network demo
//!
//! This crate contains everything that does not depend on a specific board,
//! network stack or executor:
//!
//! - Contracts for the packet engine, UDP endpoint, echo probe, console,
//!   stack probe and diagnostics (see [`traits`])
//! - Status indicator shared between tasks
//! - Statistics dashboard renderer
//! - UDP echo/command service state machine
//! - Serial command shell
//! - Task registry, stack monitor and boot sequencing
//! - Event log book and configuration parsing

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod addr;
pub mod config;
pub mod console;
pub mod echo;
pub mod indicator;
pub mod layout;
pub mod log;
pub mod shell;
pub mod stats;
pub mod supervisor;
pub mod tasks;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use lumen_protocol::Color;
