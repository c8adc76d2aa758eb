//! Leaf command handlers
//!
//! Handlers run with the console already locked and write their whole
//! output in one go. Argument errors are returned before any state change.

use core::fmt::Write;

use heapless::String;

use crate::addr::Ipv4Net;
use crate::log::{LogBook, LogCategory, LogEntry};
use crate::tasks::TaskRegistry;
use crate::traits::{Console, Diagnostics, Layer, PacketEngine};

use super::tree::{Command, Node, TraceTarget, COMMANDS};

/// An argument did not parse; nothing was changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidArgument;

/// Parse `on`/`off`
pub fn parse_switch(token: &str) -> Result<bool, InvalidArgument> {
    match token {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(InvalidArgument),
    }
}

pub fn help<C: Console>(con: &mut C) {
    let _ = writeln!(con, "commands:");
    for command in COMMANDS {
        let mut usage: String<48> = String::new();
        let _ = usage.push_str(command.usage);
        if let Some(alias) = command.alias {
            let _ = write!(usage, " ({})", alias);
        }
        let _ = writeln!(con, "  {:<40} {}", usage.as_str(), command.summary);
        print_children(con, command);
    }
}

/// List nested commands that take their own arguments
fn print_children<C: Console>(con: &mut C, command: &Command) {
    if let Node::Branch(children) = command.node {
        for child in children {
            let plain = matches!(child.node, Node::Leaf { args: 0, .. });
            if child.usage != command.usage && !plain {
                let _ = writeln!(con, "  {}", child.usage);
            }
        }
    }
}

pub fn stats<C, G, E>(
    con: &mut C,
    diagnostics: &G,
    tasks: &TaskRegistry,
    engine: &E,
    log: &LogBook,
) where
    C: Console,
    G: Diagnostics,
    E: PacketEngine,
{
    let memory = diagnostics.memory();
    let clocks = diagnostics.clocks();

    let _ = writeln!(con, "reset cause   {}", diagnostics.reset_cause().name());
    let _ = writeln!(con, "reset count   {}", diagnostics.reset_count());
    let _ = writeln!(con, "startup       {} ms", diagnostics.startup_ms());
    let _ = writeln!(con, "log entries   {}", log.total());
    let _ = writeln!(
        con,
        "flash         {} / {} bytes",
        memory.flash_used, memory.flash_total
    );
    let _ = writeln!(
        con,
        "ram           {} / {} bytes",
        memory.ram_used, memory.ram_total
    );
    let _ = writeln!(
        con,
        "clocks        sys {} Hz, peri {} Hz",
        clocks.system_hz, clocks.peripheral_hz
    );

    let _ = writeln!(con, "{:<12}{:>5}{:>8}", "task", "prio", "stack");
    for task in tasks.snapshot() {
        if task.created {
            let _ = writeln!(
                con,
                "{:<12}{:>5}{:>8}",
                task.name, task.priority, task.stack_high_water
            );
        } else {
            let _ = writeln!(con, "{:<12}{:>5}{:>8}", task.name, "-", "-");
        }
    }

    let _ = writeln!(
        con,
        "{:<8}{:>10}{:>10}{:>10}",
        "layer", "accepted", "dropped", "sent"
    );
    for layer in Layer::ALL {
        let c = engine.counters(layer);
        let _ = writeln!(
            con,
            "{:<8}{:>10}{:>10}{:>10}",
            layer.label(),
            c.accepted,
            c.dropped,
            c.sent
        );
    }
}

pub fn print_log<C: Console>(con: &mut C, category: LogCategory, entries: &[LogEntry]) {
    if entries.is_empty() {
        let _ = writeln!(con, "log {}: empty", category.name());
        return;
    }
    for entry in entries {
        let _ = writeln!(con, "{:>5} {}", entry.sequence, entry.text.as_str());
    }
}

pub fn set_ip4<E: PacketEngine, C: Console>(
    engine: &E,
    log: &LogBook,
    con: &mut C,
    arg: &str,
) -> Result<(), InvalidArgument> {
    let net: Ipv4Net = arg.parse().map_err(|_| InvalidArgument)?;
    engine.set_ipv4(net);
    log.record(LogCategory::Info, format_args!("ip4 addr set to {}", net));
    let _ = writeln!(con, "ip4 addr {} mask {}", net.address(), net.netmask());
    Ok(())
}

pub fn get_ip4<E: PacketEngine, C: Console>(engine: &E, con: &mut C) {
    let net = engine.ipv4();
    let _ = writeln!(con, "ip4 addr {} mask {}", net.address(), net.netmask());
}

pub fn set_trace<E: PacketEngine, C: Console>(
    engine: &E,
    con: &mut C,
    target: TraceTarget,
    arg: &str,
) -> Result<(), InvalidArgument> {
    let enabled = parse_switch(arg)?;
    match target {
        TraceTarget::All => {
            for layer in Layer::ALL {
                engine.set_trace(layer, enabled);
            }
        }
        TraceTarget::Layer(layer) => engine.set_trace(layer, enabled),
    }

    let _ = write!(con, "trace:");
    for layer in Layer::ALL {
        let state = if engine.trace_enabled(layer) { "on" } else { "off" };
        let _ = write!(con, " {}={}", layer.label(), state);
    }
    let _ = writeln!(con);
    Ok(())
}

pub fn set_loopback<E: PacketEngine, C: Console>(
    engine: &E,
    con: &mut C,
    arg: &str,
) -> Result<(), InvalidArgument> {
    let enabled = parse_switch(arg)?;
    engine.set_loopback(enabled);
    let _ = writeln!(con, "loopback {}", arg);
    Ok(())
}
