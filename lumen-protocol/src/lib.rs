//! Lumen UDP echo/control protocol
//!
//! This crate defines everything that is visible on the wire or on the
//! console when a datagram is processed, independent of any network stack:
//!
//! - The indicator color palette and its text keywords
//! - Echo request classification, preview and reply sealing
//! - Ethernet/IPv4/UDP header inspection used for per-layer accounting
//! - ICMPv4 echo request/reply encoding for `ping`
//!
//! # Echo Protocol
//!
//! ```text
//! request:  ┌──────────────────────────┐
//!           │ PAYLOAD (L bytes)        │
//!           └──────────────────────────┘
//! reply:    ┌──────────────────────────┬────────┐
//!           │ PAYLOAD (L bytes)        │ MARKER │
//!           └──────────────────────────┴────────┘
//! ```
//!
//! Payloads of at most [`PREVIEW_LIMIT`] bytes are also compared against the
//! color keywords. The marker is one byte in `A..=Z`, advanced per reply.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod color;
pub mod echo;
pub mod frame;
pub mod icmp;

pub use color::Color;
pub use echo::{
    classify, preview, seal_reply, EchoError, Preview, Request, RollingMarker, PREVIEW_LIMIT,
};
pub use frame::{inspect_inbound, inspect_outbound, FrameError, Inbound, Outbound, Verdict};
pub use icmp::{encode_echo_request, parse_echo_reply, EchoId, IcmpError};
