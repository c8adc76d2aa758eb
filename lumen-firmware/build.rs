//! Build script for lumen-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates lumen.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

/// Smallest terminal the dashboard plus a four-line shell fits into
const MIN_ROWS: i64 = 18;
/// The datagram preview is 80 characters wide
const MIN_COLS: i64 = 80;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate lumen.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=lumen.toml");

    let config_path = Path::new("lumen.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: lumen.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds lumen.toml as its board configuration.      ║\n\
            ║  Please create one in the lumen-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read lumen.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in lumen.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_network(&config, &mut errors);
    validate_console(&config, &mut errors);
    validate_periods(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in lumen.toml                      ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=lumen.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keys each section may contain
const SECTIONS: &[(&str, &[&str])] = &[
    ("network", &["address", "udp_port"]),
    ("console", &["rows", "cols"]),
    ("tasks", &["heartbeat_ms", "stats_ms", "stack_ms"]),
    ("ping", &["count", "timeout_ms", "interval_ms"]),
];

/// Only known sections and keys; the boot-time parser rejects anything else
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, section) in root {
        let Some((_, keys)) = SECTIONS.iter().find(|(s, _)| s == name) else {
            errors.push(format!("unknown section [{}]", name));
            continue;
        };
        let Some(table) = section.as_table() else {
            errors.push(format!("[{}] must be a table", name));
            continue;
        };
        for key in table.keys() {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", name, key));
            }
        }
    }
}

fn integer(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> Option<i64> {
    match config.get(section)?.get(key)? {
        toml::Value::Integer(v) => Some(*v),
        _ => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
    }
}

fn validate_network(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(address) = config.get("network").and_then(|n| n.get("address")) {
        match address.as_str() {
            Some(text) => {
                let valid = text.split_once('/').is_some_and(|(ip, prefix)| {
                    ip.parse::<Ipv4Addr>().is_ok()
                        && prefix.parse::<u8>().is_ok_and(|p| p <= 32)
                });
                if !valid {
                    errors.push(format!("[network] address '{}' is not a.b.c.d/prefix", text));
                }
            }
            None => errors.push("[network] address must be a string".to_string()),
        }
    }

    if let Some(port) = integer(config, "network", "udp_port", errors) {
        if !(1..=65535).contains(&port) {
            errors.push("[network] udp_port must be 1-65535".to_string());
        }
    }
}

fn validate_console(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(rows) = integer(config, "console", "rows", errors) {
        if !(MIN_ROWS..=255).contains(&rows) {
            errors.push(format!("[console] rows must be {}-255", MIN_ROWS));
        }
    }
    if let Some(cols) = integer(config, "console", "cols", errors) {
        if !(MIN_COLS..=255).contains(&cols) {
            errors.push(format!("[console] cols must be {}-255", MIN_COLS));
        }
    }
}

fn validate_periods(config: &toml::Value, errors: &mut Vec<String>) {
    for key in ["heartbeat_ms", "stats_ms", "stack_ms"] {
        if let Some(ms) = integer(config, "tasks", key, errors) {
            if !(1..=u32::MAX as i64).contains(&ms) {
                errors.push(format!("[tasks] {} must be a positive integer", key));
            }
        }
    }

    if let Some(count) = integer(config, "ping", "count", errors) {
        if !(1..=u16::MAX as i64).contains(&count) {
            errors.push("[ping] count must be at least 1".to_string());
        }
    }
    if let Some(ms) = integer(config, "ping", "timeout_ms", errors) {
        if !(1..=u32::MAX as i64).contains(&ms) {
            errors.push("[ping] timeout_ms must be a positive integer".to_string());
        }
    }
    if let Some(ms) = integer(config, "ping", "interval_ms", errors) {
        if !(0..=u32::MAX as i64).contains(&ms) {
            errors.push("[ping] interval_ms must not be negative".to_string());
        }
    }
}
