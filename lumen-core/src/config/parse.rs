//! Minimal parser for `lumen.toml`
//!
//! Handles only the subset the configuration uses. It does NOT support the
//! full TOML grammar.
//!
//! Supported:
//! - `[section]` headers
//! - `key = value` with quoted strings and integers
//! - Comments (`# ...`), also after a value
//!
//! The build script validates the same file with a real TOML parser, so
//! anything this parser rejects at boot was already caught at compile time.

use crate::addr::Ipv4Net;
use crate::layout::{MIN_COLS, MIN_ROWS};

use super::types::AppConfig;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigErrorKind {
    /// Unknown or malformed section header
    InvalidSection,
    /// Line is not `key = value`
    InvalidLine,
    /// Key not known in its section
    UnknownKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
}

/// Parse error with the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigError {
    pub line: u16,
    pub kind: ConfigErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Network,
    Console,
    Tasks,
    Ping,
}

/// Parse configuration text on top of [`AppConfig::default`]
pub fn parse_config(input: &str) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();
    let mut section = Section::Root;

    for (index, line) in input.lines().enumerate() {
        let line_no = u16::try_from(index + 1).unwrap_or(u16::MAX);
        let fail = |kind| ConfigError {
            line: line_no,
            kind,
        };

        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])
                .ok_or(fail(ConfigErrorKind::InvalidSection))?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(fail(ConfigErrorKind::InvalidLine))?;
        apply_value(&mut config, section, key, value).map_err(fail)?;
    }

    validate(&config).map_err(|kind| ConfigError { line: 0, kind })?;
    Ok(config)
}

fn parse_section_header(header: &str) -> Option<Section> {
    match header.trim() {
        "network" => Some(Section::Network),
        "console" => Some(Section::Console),
        "tasks" => Some(Section::Tasks),
        "ping" => Some(Section::Ping),
        _ => None,
    }
}

/// Drop a trailing comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (pos, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..pos],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse a quoted string value
fn parse_string(value: &str) -> Result<&str, ConfigErrorKind> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ConfigErrorKind::InvalidValue)
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigErrorKind> {
    value.parse().map_err(|_| ConfigErrorKind::InvalidValue)
}

fn apply_value(
    config: &mut AppConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ConfigErrorKind> {
    match (section, key) {
        (Section::Network, "address") => {
            config.network.address = parse_string(value)?
                .parse::<Ipv4Net>()
                .map_err(|_| ConfigErrorKind::InvalidValue)?;
        }
        (Section::Network, "udp_port") => config.network.udp_port = parse_int(value)?,
        (Section::Console, "rows") => config.console.rows = parse_int(value)?,
        (Section::Console, "cols") => config.console.cols = parse_int(value)?,
        (Section::Tasks, "heartbeat_ms") => config.tasks.heartbeat_ms = parse_int(value)?,
        (Section::Tasks, "stats_ms") => config.tasks.stats_ms = parse_int(value)?,
        (Section::Tasks, "stack_ms") => config.tasks.stack_ms = parse_int(value)?,
        (Section::Ping, "count") => config.ping.count = parse_int(value)?,
        (Section::Ping, "timeout_ms") => config.ping.timeout_ms = parse_int(value)?,
        (Section::Ping, "interval_ms") => config.ping.interval_ms = parse_int(value)?,
        (Section::Root, _) => return Err(ConfigErrorKind::InvalidSection),
        _ => return Err(ConfigErrorKind::UnknownKey),
    }
    Ok(())
}

/// Cross-field checks after all lines are read
fn validate(config: &AppConfig) -> Result<(), ConfigErrorKind> {
    let periods = [
        config.tasks.heartbeat_ms,
        config.tasks.stats_ms,
        config.tasks.stack_ms,
        config.ping.timeout_ms,
    ];
    if config.network.udp_port == 0
        || config.console.rows < MIN_ROWS
        || config.console.cols < MIN_COLS
        || config.ping.count == 0
        || periods.contains(&0)
    {
        return Err(ConfigErrorKind::InvalidValue);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::net::Ipv4Addr;

    #[test]
    fn test_empty_input_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.network.udp_port, 7);
        assert_eq!(config.ping.count, 8);
        assert_eq!(config.ping.timeout_ms, 3000);
        assert_eq!(config.tasks.stats_ms, 250);
        assert_eq!(config.tasks.stack_ms, 50);
    }

    #[test]
    fn test_overrides() {
        let input = r#"
# demo board
[network]
address = "10.0.0.5/16"   # lab subnet
udp_port = 7007

[console]
rows = 40

[ping]
interval_ms = 250
"#;
        let config = parse_config(input).unwrap();
        assert_eq!(config.network.address.address(), Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(config.network.address.prefix_len(), 16);
        assert_eq!(config.network.udp_port, 7007);
        assert_eq!(config.console.rows, 40);
        assert_eq!(config.console.cols, 80);
        assert_eq!(config.ping.interval_ms, 250);
        assert_eq!(config.ping.count, 8);
    }

    #[test]
    fn test_rejects_unknown_section() {
        let err = parse_config("[motors]\nspeed = 3\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, ConfigErrorKind::InvalidSection);
    }

    #[test]
    fn test_rejects_unknown_key() {
        let err = parse_config("[ping]\ncolour = 3\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ConfigErrorKind::UnknownKey);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_port = parse_config("[network]\nudp_port = 70000\n").unwrap_err();
        assert_eq!(bad_port.kind, ConfigErrorKind::InvalidValue);

        let unquoted = parse_config("[network]\naddress = 10.0.0.5/24\n").unwrap_err();
        assert_eq!(unquoted.kind, ConfigErrorKind::InvalidValue);

        let bad_cidr = parse_config("[network]\naddress = \"10.0.0.5/40\"\n").unwrap_err();
        assert_eq!(bad_cidr.kind, ConfigErrorKind::InvalidValue);

        let missing_eq = parse_config("[tasks]\nstats_ms 250\n").unwrap_err();
        assert_eq!(missing_eq.kind, ConfigErrorKind::InvalidLine);
    }

    #[test]
    fn test_rejects_inconsistent_config() {
        let err = parse_config("[console]\nrows = 10\n").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::InvalidValue);

        let err = parse_config("[tasks]\nstack_ms = 0\n").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::InvalidValue);
    }

    #[test]
    fn test_console_must_hold_full_preview() {
        let err = parse_config("[console]\ncols = 79\n").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::InvalidValue);

        let config = parse_config("[console]\ncols = 80\n").unwrap();
        assert_eq!(config.console.cols, MIN_COLS);
    }

    #[test]
    fn test_strip_comment_respects_strings() {
        assert_eq!(strip_comment("a = \"x#y\" # note"), "a = \"x#y\" ");
        assert_eq!(strip_comment("# whole line"), "");
    }
}
