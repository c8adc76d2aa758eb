//! UDP echo/command service
//!
//! One endpoint, one buffer, one datagram in flight. Each datagram is
//! received straight into the transmit buffer, possibly interpreted as a
//! color command, shown on the console and sent back with the rolling
//! marker appended. Any endpoint error is reported and ends the service;
//! the rest of the system keeps running.

use core::fmt::Write;

use heapless::String;
use lumen_protocol::{classify, preview, seal_reply, Request, RollingMarker};

use crate::addr::Peer;
use crate::console::SharedConsole;
use crate::indicator::{IndicatorOutput, StatusIndicator};
use crate::layout::{ECHO_PEER_ROW, ECHO_PEER_WIDTH, ECHO_TEXT_COL, ECHO_TEXT_ROW, VALUE_COL};
use crate::log::{LogBook, LogCategory};
use crate::traits::{Console, NetError, UdpEndpoint};

/// Largest datagram accepted (Ethernet MTU minus IPv4 and UDP headers)
pub const MAX_DATAGRAM: usize = 1472;

/// Receive/transmit buffer size: one datagram plus the marker byte
pub const ECHO_BUFFER_LEN: usize = MAX_DATAGRAM + 1;

/// Why the service stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EchoExit {
    Bind(NetError),
    Receive(NetError),
    Send(NetError),
}

impl EchoExit {
    /// Operation that failed
    pub fn operation(&self) -> &'static str {
        match self {
            EchoExit::Bind(_) => "bind",
            EchoExit::Receive(_) => "receive",
            EchoExit::Send(_) => "send",
        }
    }

    pub fn error(&self) -> NetError {
        match self {
            EchoExit::Bind(e) | EchoExit::Receive(e) | EchoExit::Send(e) => *e,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Bind,
    Receive,
    Terminated(EchoExit),
}

/// The echo service; consumed by [`EchoService::run`]
pub struct EchoService<'a, U, C, O> {
    endpoint: U,
    port: u16,
    console: &'a SharedConsole<C>,
    indicator: &'a StatusIndicator<O>,
    log: &'a LogBook,
    marker: RollingMarker,
}

impl<'a, U, C, O> EchoService<'a, U, C, O>
where
    U: UdpEndpoint,
    C: Console,
    O: IndicatorOutput,
{
    pub fn new(
        endpoint: U,
        port: u16,
        console: &'a SharedConsole<C>,
        indicator: &'a StatusIndicator<O>,
        log: &'a LogBook,
    ) -> Self {
        Self {
            endpoint,
            port,
            console,
            indicator,
            log,
            marker: RollingMarker::new(),
        }
    }

    /// Serve until an endpoint error; returns why it stopped
    pub async fn run(mut self) -> EchoExit {
        let mut buffer = [0u8; ECHO_BUFFER_LEN];
        let mut state = State::Bind;

        loop {
            state = match state {
                State::Bind => match self.endpoint.bind(self.port) {
                    Ok(()) => {
                        self.log.record(
                            LogCategory::Info,
                            format_args!("udp echo on port {}", self.port),
                        );
                        State::Receive
                    }
                    Err(e) => State::Terminated(EchoExit::Bind(e)),
                },
                State::Receive => match self.serve_one(&mut buffer).await {
                    Ok(()) => State::Receive,
                    Err(exit) => State::Terminated(exit),
                },
                State::Terminated(exit) => {
                    self.report(exit).await;
                    return exit;
                }
            };
        }
    }

    async fn serve_one(&mut self, buffer: &mut [u8; ECHO_BUFFER_LEN]) -> Result<(), EchoExit> {
        let (len, peer) = self
            .endpoint
            .recv_from(&mut buffer[..MAX_DATAGRAM])
            .await
            .map_err(EchoExit::Receive)?;

        let request = classify(&buffer[..len]);
        if let Some(color) = request.color() {
            self.indicator.set(color);
        }
        self.show(&buffer[..len], peer, request).await;

        // len <= MAX_DATAGRAM, so the marker always fits
        let reply_len = seal_reply(buffer, len, &mut self.marker)
            .map_err(|_| EchoExit::Receive(NetError::Truncated))?;

        self.endpoint
            .send_to(&buffer[..reply_len], peer)
            .await
            .map_err(EchoExit::Send)
    }

    async fn show(&self, payload: &[u8], peer: Peer, request: Request) {
        let shown = preview(payload);

        let mut origin: String<ECHO_PEER_WIDTH> = String::new();
        let _ = write!(origin, "{} ({} bytes", peer, payload.len());
        let _ = match request {
            Request::Command(color) => write!(origin, ", {}", color.name()),
            Request::Bulk => write!(origin, ", echo only"),
            Request::Text => Ok(()),
        };
        if shown.is_truncated() {
            let _ = write!(origin, ", preview cut");
        }
        let _ = origin.push(')');

        let mut console = self.console.lock().await;
        console.put_field(ECHO_PEER_ROW, VALUE_COL, &origin);
        console.put_field(ECHO_TEXT_ROW, ECHO_TEXT_COL, shown.as_str());
    }

    async fn report(&self, exit: EchoExit) {
        let code = exit.error().code();
        self.log.record(
            LogCategory::Error,
            format_args!("udp echo {} failed, code {}", exit.operation(), code),
        );

        let mut message: String<ECHO_PEER_WIDTH> = String::new();
        let _ = write!(
            message,
            "stopped: {} failed (code {})",
            exit.operation(),
            code
        );
        let mut console = self.console.lock().await;
        console.put_field(ECHO_PEER_ROW, VALUE_COL, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EndpointLog, MockEndpoint, RecordingConsole, RecordingOutput};
    use core::cell::RefCell;
    use core::net::Ipv4Addr;
    use embassy_futures::block_on;
    use crate::layout::MIN_COLS;
    use lumen_protocol::{Color, PREVIEW_LIMIT};

    const PEER: Peer = Peer::new(Ipv4Addr::new(10, 0, 0, 7), 5000);

    struct Rig {
        console: SharedConsole<RecordingConsole>,
        leds: RefCell<Vec<Color>>,
        log: LogBook,
        endpoint_log: RefCell<EndpointLog>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                console: SharedConsole::new(RecordingConsole::default()),
                leds: RefCell::new(Vec::new()),
                log: LogBook::new(),
                endpoint_log: RefCell::new(EndpointLog::default()),
            }
        }

        fn run(
            &self,
            indicator: &StatusIndicator<RecordingOutput<'_>>,
            setup: impl FnOnce(&mut MockEndpoint<'_>),
        ) -> EchoExit {
            let mut endpoint = MockEndpoint::new(&self.endpoint_log);
            setup(&mut endpoint);
            let service = EchoService::new(endpoint, 7, &self.console, indicator, &self.log);
            block_on(service.run())
        }
    }

    #[test]
    fn test_echo_with_marker() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        let exit = rig.run(&indicator, |ep| {
            ep.push(b"hello", PEER);
            ep.push(b"again", PEER);
        });

        assert_eq!(exit, EchoExit::Receive(NetError::Closed));
        let log = rig.endpoint_log.borrow();
        assert_eq!(log.bound, Some(7));
        assert_eq!(log.sent[0], (b"helloA".to_vec(), PEER));
        assert_eq!(log.sent[1], (b"againB".to_vec(), PEER));
        assert_eq!(indicator.color(), Color::Off);
    }

    #[test]
    fn test_keyword_sets_indicator() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        rig.run(&indicator, |ep| ep.push(b"yellow", PEER));

        assert_eq!(indicator.color(), Color::Yellow);
        assert_eq!(rig.endpoint_log.borrow().sent[0].0, b"yellowA".to_vec());

        let console = block_on(rig.console.lock());
        assert_eq!(
            console.field(ECHO_PEER_ROW, VALUE_COL),
            Some("stopped: receive failed (code -6)")
        );
        assert_eq!(console.field(ECHO_TEXT_ROW, ECHO_TEXT_COL), Some("yellow"));
    }

    #[test]
    fn test_keyword_with_trailing_newline_is_text() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        rig.run(&indicator, |ep| ep.push(b"red\n", PEER));
        assert_eq!(indicator.color(), Color::Off);
        assert_eq!(rig.endpoint_log.borrow().sent[0].0, b"red\nA".to_vec());
    }

    #[test]
    fn test_long_payload_echoed_in_full() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        let mut payload = vec![b'z'; 200];
        payload[..4].copy_from_slice(b"blue");
        rig.run(&indicator, |ep| ep.push(&payload, PEER));

        let sent = &rig.endpoint_log.borrow().sent[0].0;
        assert_eq!(sent.len(), 201);
        assert_eq!(&sent[..200], &payload[..]);
        assert_eq!(sent[200], b'A');
        assert_eq!(indicator.color(), Color::Off);

        let console = block_on(rig.console.lock());
        let shown = console.field(ECHO_TEXT_ROW, ECHO_TEXT_COL).unwrap();
        assert_eq!(shown.len(), PREVIEW_LIMIT);
        assert!(usize::from(ECHO_TEXT_COL) + shown.len() - 1 <= usize::from(MIN_COLS));
    }

    #[test]
    fn test_peer_field_reports_cut_preview() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        let widest = Peer::new(Ipv4Addr::new(255, 255, 255, 255), 65535);
        rig.run(&indicator, |ep| {
            ep.push(&[b'z'; MAX_DATAGRAM], widest);
            ep.push(b"short", PEER);
        });

        let console = block_on(rig.console.lock());
        let peer_rows: Vec<&str> = console
            .fields
            .iter()
            .filter(|(row, col, _)| *row == ECHO_PEER_ROW && *col == VALUE_COL)
            .map(|(_, _, text)| text.as_str())
            .collect();
        assert_eq!(
            peer_rows[0],
            "255.255.255.255:65535 (1472 bytes, echo only, preview cut)"
        );
        assert_eq!(peer_rows[1], "10.0.0.7:5000 (5 bytes)");
        assert!(usize::from(VALUE_COL) + peer_rows[0].len() - 1 <= usize::from(MIN_COLS));
    }

    #[test]
    fn test_nul_terminated_keyword_sets_indicator() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        rig.run(&indicator, |ep| ep.push(b"red\0", PEER));

        assert_eq!(indicator.color(), Color::Red);
        // The reply still carries every received byte
        assert_eq!(rig.endpoint_log.borrow().sent[0].0, b"red\0A".to_vec());
    }

    #[test]
    fn test_marker_wraps_across_datagrams() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        rig.run(&indicator, |ep| {
            for _ in 0..27 {
                ep.push(b"x", PEER);
            }
        });

        let log = rig.endpoint_log.borrow();
        assert_eq!(log.sent[25].0, b"xZ".to_vec());
        assert_eq!(log.sent[26].0, b"xA".to_vec());
    }

    #[test]
    fn test_bind_failure_terminates() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        let exit = rig.run(&indicator, |ep| {
            ep.bind_error = Some(NetError::AddressInUse);
            ep.push(b"never", PEER);
        });

        assert_eq!(exit, EchoExit::Bind(NetError::AddressInUse));
        assert!(rig.endpoint_log.borrow().sent.is_empty());
        let errors = rig.log.entries(LogCategory::Error);
        assert_eq!(errors[0].text.as_str(), "udp echo bind failed, code -2");
    }

    #[test]
    fn test_send_failure_terminates() {
        let rig = Rig::new();
        let indicator = StatusIndicator::new(RecordingOutput(&rig.leds));
        let exit = rig.run(&indicator, |ep| {
            ep.send_error = Some(NetError::NoRoute);
            ep.push(b"green", PEER);
            ep.push(b"blue", PEER);
        });

        assert_eq!(exit, EchoExit::Send(NetError::NoRoute));
        // The command applied before the reply failed; the second datagram
        // was never read
        assert_eq!(indicator.color(), Color::Green);
        assert_eq!(
            rig.log.entries(LogCategory::Error)[0].text.as_str(),
            "udp echo send failed, code -3"
        );
    }
}
