//! Echo request handling rules
//!
//! Every datagram is echoed back with one marker byte appended. Short
//! datagrams may additionally carry a color keyword; long ones are echoed
//! verbatim and never interpreted.

use heapless::String;

use crate::color::Color;

/// Longest payload that is interpreted as a command, and the preview width
pub const PREVIEW_LIMIT: usize = 80;

/// Errors from building an echo reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EchoError {
    /// No room after the payload for the marker byte
    BufferTooSmall,
}

/// Marker byte appended to every reply
///
/// Cycles through `A..=Z`, one step per processed datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RollingMarker {
    next: u8,
}

impl RollingMarker {
    /// First marker value
    pub const FIRST: u8 = b'A';
    /// Last marker value before wrapping
    pub const LAST: u8 = b'Z';

    /// Create a marker positioned at `A`
    pub const fn new() -> Self {
        Self { next: Self::FIRST }
    }

    /// Return the current marker byte and advance by one letter
    pub fn take(&mut self) -> u8 {
        let marker = self.next;
        self.next = if marker >= Self::LAST {
            Self::FIRST
        } else {
            marker + 1
        };
        marker
    }
}

impl Default for RollingMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// How a received payload is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Short payload naming an indicator color
    Command(Color),
    /// Short payload that is not a keyword; echoed only
    Text,
    /// Payload longer than [`PREVIEW_LIMIT`]; echoed without interpretation
    Bulk,
}

impl Request {
    /// Color requested by this payload, if any
    pub fn color(&self) -> Option<Color> {
        match self {
            Request::Command(color) => Some(*color),
            Request::Text | Request::Bulk => None,
        }
    }
}

/// Classify a received payload
pub fn classify(payload: &[u8]) -> Request {
    if payload.len() > PREVIEW_LIMIT {
        return Request::Bulk;
    }

    match Color::from_keyword(payload) {
        Some(color) => Request::Command(color),
        None => Request::Text,
    }
}

/// Printable rendition of a payload for the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    text: String<PREVIEW_LIMIT>,
    truncated: bool,
}

impl Preview {
    /// Preview text, at most [`PREVIEW_LIMIT`] characters
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Whether the payload was longer than the preview
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Build the console preview of a payload
///
/// Only the first [`PREVIEW_LIMIT`] bytes are shown. Bytes outside printable
/// ASCII are replaced by `.` so they cannot move the terminal cursor.
/// The payload itself is never modified.
pub fn preview(payload: &[u8]) -> Preview {
    let shown = &payload[..payload.len().min(PREVIEW_LIMIT)];

    let mut text = String::new();
    for &byte in shown {
        let ch = if (0x20..0x7f).contains(&byte) {
            byte as char
        } else {
            '.'
        };
        // Cannot overflow: one char per byte, at most PREVIEW_LIMIT bytes
        let _ = text.push(ch);
    }

    Preview {
        text,
        truncated: payload.len() > PREVIEW_LIMIT,
    }
}

/// Append the marker after a payload of `len` bytes held in `buffer`
///
/// Returns the reply length (`len + 1`). The marker only advances when the
/// reply could be sealed.
pub fn seal_reply(
    buffer: &mut [u8],
    len: usize,
    marker: &mut RollingMarker,
) -> Result<usize, EchoError> {
    if len >= buffer.len() {
        return Err(EchoError::BufferTooSmall);
    }

    buffer[len] = marker.take();
    Ok(len + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_marker_wraps_after_z() {
        let mut marker = RollingMarker::new();
        for expected in b'A'..=b'Z' {
            assert_eq!(marker.take(), expected);
        }
        assert_eq!(marker.take(), b'A');
        assert_eq!(marker.take(), b'B');
    }

    #[test]
    fn test_classify_keyword() {
        assert_eq!(classify(b"cyan"), Request::Command(Color::Cyan));
        assert_eq!(classify(b"hello"), Request::Text);
        assert_eq!(classify(b""), Request::Text);
    }

    #[test]
    fn test_classify_nul_terminated_keyword() {
        assert_eq!(classify(b"magenta\0"), Request::Command(Color::Magenta));
        assert_eq!(classify(b"hello\0red"), Request::Text);
    }

    #[test]
    fn test_classify_long_payload_is_bulk() {
        let exact = [b'x'; PREVIEW_LIMIT];
        let long = [b'x'; PREVIEW_LIMIT + 1];
        assert_eq!(classify(&exact), Request::Text);
        assert_eq!(classify(&long), Request::Bulk);
    }

    #[test]
    fn test_long_payload_starting_with_keyword_is_not_a_command() {
        let mut long = [b' '; PREVIEW_LIMIT + 10];
        long[..3].copy_from_slice(b"red");
        assert_eq!(classify(&long).color(), None);
    }

    #[test]
    fn test_preview_replaces_control_bytes() {
        let p = preview(b"a\x1b[2Jb\r\n");
        assert_eq!(p.as_str(), "a.[2Jb..");
        assert!(!p.is_truncated());
    }

    #[test]
    fn test_preview_truncates_to_limit() {
        let long = [b'q'; 200];
        let p = preview(&long);
        assert_eq!(p.as_str().len(), PREVIEW_LIMIT);
        assert!(p.is_truncated());
    }

    #[test]
    fn test_seal_needs_room_for_marker() {
        let mut buffer = [0u8; 4];
        let mut marker = RollingMarker::new();
        assert_eq!(
            seal_reply(&mut buffer, 4, &mut marker),
            Err(EchoError::BufferTooSmall)
        );
        // Marker untouched on failure
        assert_eq!(seal_reply(&mut buffer, 3, &mut marker), Ok(4));
        assert_eq!(buffer[3], b'A');
    }

    proptest! {
        #[test]
        fn prop_reply_is_request_plus_marker(payload in proptest::collection::vec(any::<u8>(), 0..300)) {
            let mut buffer = [0u8; 512];
            buffer[..payload.len()].copy_from_slice(&payload);
            let mut marker = RollingMarker::new();

            let len = seal_reply(&mut buffer, payload.len(), &mut marker).unwrap();

            prop_assert_eq!(len, payload.len() + 1);
            prop_assert_eq!(&buffer[..payload.len()], &payload[..]);
            prop_assert_eq!(buffer[payload.len()], b'A');
        }

        #[test]
        fn prop_nth_marker_is_a_plus_n_mod_26(n in 0usize..2000) {
            let mut marker = RollingMarker::new();
            for _ in 0..n {
                marker.take();
            }
            prop_assert_eq!(marker.take(), b'A' + (n % 26) as u8);
        }

        #[test]
        fn prop_preview_never_exceeds_limit(payload in proptest::collection::vec(any::<u8>(), 0..300)) {
            let p = preview(&payload);
            prop_assert!(p.as_str().len() <= PREVIEW_LIMIT);
            prop_assert_eq!(p.is_truncated(), payload.len() > PREVIEW_LIMIT);
        }
    }
}
