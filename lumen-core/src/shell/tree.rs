//! Static command tree and token resolution

use crate::log::LogCategory;
use crate::traits::Layer;

/// Most tokens a command line may have
pub const MAX_TOKENS: usize = 8;

/// What `set trace` applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TraceTarget {
    /// Every layer
    All,
    Layer(Layer),
}

/// Leaf actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Help,
    Hang,
    Reset,
    Stats,
    Log(LogCategory),
    SetIp4Addr,
    SetTrace(TraceTarget),
    SetLoopback,
    GetIp4Addr,
    Ping,
}

/// Node payload
#[derive(Debug)]
pub enum Node {
    /// Runs `action` with exactly `args` trailing arguments
    Leaf { action: Action, args: usize },
    /// Next token selects a child
    Branch(&'static [Command]),
}

/// One node of the command tree
#[derive(Debug)]
pub struct Command {
    pub name: &'static str,
    pub alias: Option<&'static str>,
    /// Full usage line, printed by `help` and on syntax errors
    pub usage: &'static str,
    pub summary: &'static str,
    pub node: Node,
}

impl Command {
    fn matches(&self, token: &str) -> bool {
        self.name == token || self.alias == Some(token)
    }
}

const fn leaf(
    name: &'static str,
    usage: &'static str,
    summary: &'static str,
    action: Action,
    args: usize,
) -> Command {
    Command {
        name,
        alias: None,
        usage,
        summary,
        node: Node::Leaf { action, args },
    }
}

const LOG_CATEGORIES: &[Command] = &[
    leaf("info", "log info", "", Action::Log(LogCategory::Info), 0),
    leaf("error", "log error", "", Action::Log(LogCategory::Error), 0),
    leaf("debug", "log debug", "", Action::Log(LogCategory::Debug), 0),
];

const TRACE_USAGE: &str = "set trace {net|layer2|layer3|layer4} {on|off}";

const TRACE_TARGETS: &[Command] = &[
    leaf("net", TRACE_USAGE, "", Action::SetTrace(TraceTarget::All), 1),
    leaf(
        "layer2",
        TRACE_USAGE,
        "",
        Action::SetTrace(TraceTarget::Layer(Layer::Link)),
        1,
    ),
    leaf(
        "layer3",
        TRACE_USAGE,
        "",
        Action::SetTrace(TraceTarget::Layer(Layer::Ipv4)),
        1,
    ),
    leaf(
        "layer4",
        TRACE_USAGE,
        "",
        Action::SetTrace(TraceTarget::Layer(Layer::Udp)),
        1,
    ),
];

const SET_IP4: &[Command] = &[leaf(
    "addr",
    "set ip4 addr <a.b.c.d>/<prefix>",
    "",
    Action::SetIp4Addr,
    1,
)];

const SET: &[Command] = &[
    Command {
        name: "ip4",
        alias: None,
        usage: "set ip4 addr <a.b.c.d>/<prefix>",
        summary: "",
        node: Node::Branch(SET_IP4),
    },
    Command {
        name: "trace",
        alias: None,
        usage: TRACE_USAGE,
        summary: "",
        node: Node::Branch(TRACE_TARGETS),
    },
    leaf(
        "loopback",
        "set loopback {on|off}",
        "",
        Action::SetLoopback,
        1,
    ),
];

const GET_IP4: &[Command] = &[leaf("addr", "get ip4 addr", "", Action::GetIp4Addr, 0)];

const GET: &[Command] = &[Command {
    name: "ip4",
    alias: None,
    usage: "get ip4 addr",
    summary: "",
    node: Node::Branch(GET_IP4),
}];

/// Top-level commands
pub static COMMANDS: &[Command] = &[
    Command {
        name: "help",
        alias: Some("h"),
        usage: "help",
        summary: "list commands",
        node: Node::Leaf {
            action: Action::Help,
            args: 0,
        },
    },
    leaf("hang", "hang", "stop the system with interrupts off", Action::Hang, 0),
    leaf("reset", "reset", "reset through the watchdog", Action::Reset, 0),
    Command {
        name: "stats",
        alias: Some("st"),
        usage: "stats",
        summary: "system diagnostics and task table",
        node: Node::Leaf {
            action: Action::Stats,
            args: 0,
        },
    },
    Command {
        name: "log",
        alias: None,
        usage: "log {info|error|debug}",
        summary: "dump a log book category",
        node: Node::Branch(LOG_CATEGORIES),
    },
    Command {
        name: "set",
        alias: None,
        usage: "set {ip4 addr|trace|loopback} ...",
        summary: "change address, tracing or loopback",
        node: Node::Branch(SET),
    },
    Command {
        name: "get",
        alias: None,
        usage: "get ip4 addr",
        summary: "show address and mask",
        node: Node::Branch(GET),
    },
    leaf("ping", "ping <a.b.c.d>", "send ICMP echo requests", Action::Ping, 1),
];

/// Why a line could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError<'t> {
    /// Nothing but whitespace
    Empty,
    /// Token not found at its level
    NotRecognized(&'t str),
    /// Missing subcommand or wrong number of arguments
    Syntax { usage: &'static str },
}

/// A resolved leaf and its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a, 't> {
    pub action: Action,
    pub args: &'a [&'t str],
    pub usage: &'static str,
}

/// Walk the tree along `tokens`
pub fn resolve<'a, 't>(tokens: &'a [&'t str]) -> Result<Resolved<'a, 't>, DispatchError<'t>> {
    if tokens.is_empty() {
        return Err(DispatchError::Empty);
    }

    let mut level = COMMANDS;
    let mut rest = tokens;

    loop {
        let Some((&token, tail)) = rest.split_first() else {
            return Err(DispatchError::Empty);
        };

        let command = level
            .iter()
            .find(|c| c.matches(token))
            .ok_or(DispatchError::NotRecognized(token))?;

        match command.node {
            Node::Leaf { action, args } => {
                if tail.len() != args {
                    return Err(DispatchError::Syntax {
                        usage: command.usage,
                    });
                }
                return Ok(Resolved {
                    action,
                    args: tail,
                    usage: command.usage,
                });
            }
            Node::Branch(children) => {
                if tail.is_empty() {
                    return Err(DispatchError::Syntax {
                        usage: command.usage,
                    });
                }
                level = children;
                rest = tail;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(resolve(&["help"]).unwrap().action, Action::Help);
        assert_eq!(resolve(&["h"]).unwrap().action, Action::Help);
        assert_eq!(resolve(&["st"]).unwrap().action, Action::Stats);
    }

    #[test]
    fn test_resolve_nested() {
        let r = resolve(&["set", "ip4", "addr", "10.0.0.5/24"]).unwrap();
        assert_eq!(r.action, Action::SetIp4Addr);
        assert_eq!(r.args, &["10.0.0.5/24"]);

        let r = resolve(&["set", "trace", "layer3", "on"]).unwrap();
        assert_eq!(r.action, Action::SetTrace(TraceTarget::Layer(Layer::Ipv4)));

        let r = resolve(&["log", "error"]).unwrap();
        assert_eq!(r.action, Action::Log(LogCategory::Error));
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(
            resolve(&["reboot"]),
            Err(DispatchError::NotRecognized("reboot"))
        );
        assert_eq!(
            resolve(&["set", "ip6", "addr"]),
            Err(DispatchError::NotRecognized("ip6"))
        );
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(resolve(&["HELP"]), Err(DispatchError::NotRecognized("HELP")));
    }

    #[test]
    fn test_missing_subcommand() {
        assert_eq!(
            resolve(&["set", "trace"]),
            Err(DispatchError::Syntax { usage: TRACE_USAGE })
        );
        assert_eq!(
            resolve(&["log"]),
            Err(DispatchError::Syntax {
                usage: "log {info|error|debug}"
            })
        );
    }

    #[test]
    fn test_argument_count() {
        assert_eq!(
            resolve(&["ping"]),
            Err(DispatchError::Syntax {
                usage: "ping <a.b.c.d>"
            })
        );
        assert_eq!(
            resolve(&["stats", "now"]),
            Err(DispatchError::Syntax { usage: "stats" })
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(resolve(&[]), Err(DispatchError::Empty));
    }
}
