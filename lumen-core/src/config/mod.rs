//! Configuration types and parsing
//!
//! The board embeds `lumen.toml` and hands it to [`parse_config`] at boot.
//! Every key is optional; anything not mentioned keeps its default.

pub mod parse;
pub mod types;

pub use parse::{parse_config, ConfigError, ConfigErrorKind};
pub use types::*;
