//! `ping` command

use core::fmt::Write;
use core::net::Ipv4Addr;

use embedded_hal_async::delay::DelayNs;

use crate::config::PingConfig;
use crate::console::SharedConsole;
use crate::traits::{Console, EchoProbe, ProbeError};

/// How a ping run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PingOutcome {
    /// Every probe was answered
    Complete,
    /// Probe `seq` got no reply; the rest were skipped
    TimedOut { seq: u16 },
    /// Probe `seq` could not be sent; the rest were skipped
    Failed { seq: u16, code: i16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PingSummary {
    pub sent: u16,
    pub received: u16,
    pub outcome: PingOutcome,
}

/// Send `config.count` sequenced probes to `target`
///
/// Probes go out one at a time with sequence numbers from 0. The first
/// timeout or failure ends the run.
pub async fn ping<P, D, C>(
    probe: &mut P,
    delay: &mut D,
    console: &SharedConsole<C>,
    target: Ipv4Addr,
    ident: u16,
    config: &PingConfig,
) -> PingSummary
where
    P: EchoProbe,
    D: DelayNs,
    C: Console,
{
    let mut summary = PingSummary {
        sent: 0,
        received: 0,
        outcome: PingOutcome::Complete,
    };

    {
        let mut con = console.lock().await;
        let _ = writeln!(con, "PING {} ({} probes)", target, config.count);
    }

    for seq in 0..config.count {
        if seq > 0 {
            delay.delay_ms(config.interval_ms).await;
        }

        summary.sent += 1;
        let result = probe.probe(target, ident, seq, config.timeout_ms).await;

        let mut con = console.lock().await;
        match result {
            Ok(reply) => {
                summary.received += 1;
                let _ = writeln!(
                    con,
                    "reply from {}: seq={} time={} ms",
                    target, seq, reply.rtt_ms
                );
            }
            Err(ProbeError::Timeout) => {
                let _ = writeln!(
                    con,
                    "seq={}: no reply within {} ms",
                    seq, config.timeout_ms
                );
                summary.outcome = PingOutcome::TimedOut { seq };
                break;
            }
            Err(ProbeError::Failed(code)) => {
                let _ = writeln!(con, "seq={}: send failed (code {})", seq, code);
                summary.outcome = PingOutcome::Failed { seq, code };
                break;
            }
        }
    }

    let mut con = console.lock().await;
    let _ = writeln!(
        con,
        "--- {}: {} sent, {} received",
        target, summary.sent, summary.received
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProbe, NoDelay, RecordingConsole};
    use crate::traits::ProbeReply;
    use embassy_futures::block_on;

    const TARGET: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

    #[test]
    fn test_eight_probes_in_order() {
        let console = SharedConsole::new(RecordingConsole::default());
        let mut probe = MockProbe::answering(8);
        let mut delay = NoDelay::default();
        let config = PingConfig::default();

        let summary = block_on(ping(&mut probe, &mut delay, &console, TARGET, 0x4c55, &config));

        assert_eq!(
            summary,
            PingSummary {
                sent: 8,
                received: 8,
                outcome: PingOutcome::Complete
            }
        );
        let seqs: Vec<u16> = probe.sent.iter().map(|p| p.2).collect();
        assert_eq!(seqs, (0..8).collect::<Vec<u16>>());
        assert!(probe.sent.iter().all(|p| p.0 == TARGET && p.1 == 0x4c55 && p.3 == 3000));
        // Delay between probes only
        assert_eq!(delay.calls, 7);
        assert_eq!(delay.waited_ms, 7000);

        let text = &block_on(console.lock()).text;
        assert!(text.contains("reply from 10.0.0.1: seq=7 time=8 ms"));
        assert!(text.ends_with("--- 10.0.0.1: 8 sent, 8 received\n"));
    }

    #[test]
    fn test_timeout_aborts_remaining() {
        let console = SharedConsole::new(RecordingConsole::default());
        let mut probe = MockProbe::answering(3);
        let mut delay = NoDelay::default();

        let summary = block_on(ping(
            &mut probe,
            &mut delay,
            &console,
            TARGET,
            1,
            &PingConfig::default(),
        ));

        assert_eq!(summary.outcome, PingOutcome::TimedOut { seq: 3 });
        assert_eq!(summary.sent, 4);
        assert_eq!(summary.received, 3);
        assert_eq!(probe.sent.len(), 4);
        assert!(block_on(console.lock())
            .text
            .contains("seq=3: no reply within 3000 ms"));
    }

    #[test]
    fn test_send_failure_aborts() {
        let console = SharedConsole::new(RecordingConsole::default());
        let mut probe = MockProbe::default();
        probe.script.push_back(Ok(ProbeReply { rtt_ms: 2 }));
        probe.script.push_back(Err(ProbeError::Failed(-3)));
        let mut delay = NoDelay::default();

        let summary = block_on(ping(
            &mut probe,
            &mut delay,
            &console,
            TARGET,
            1,
            &PingConfig::default(),
        ));

        assert_eq!(summary.outcome, PingOutcome::Failed { seq: 1, code: -3 });
        assert_eq!(probe.sent.len(), 2);
    }
}
