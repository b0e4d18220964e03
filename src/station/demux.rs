//! Text/binary demultiplexer for the station's incoming byte stream.
//!
//! The stream interleaves human-readable status lines with raw image
//! blobs, and nothing on the wire marks where a blob starts or ends. The
//! split is heuristic:
//!
//! - a newline-terminated segment that decodes as UTF-8 is a status line;
//! - a segment that does not decode starts (or continues) a binary
//!   transfer;
//! - a text line arriving mid-transfer finalizes the pending blob first (a
//!   blob is always followed by a status line);
//! - bytes idle past the inactivity gap finalize the transfer, and
//!   unterminated bytes idle past the gap are themselves treated as a blob,
//!   since a status line always arrives newline-terminated promptly.
//!
//! The heuristic cannot tell a genuinely empty blob from line noise; that
//! is a known limitation of the markerless design, not something this
//! module tries to repair.

use bytes::BytesMut;
use std::time::{Duration, Instant};

/// Default inactivity gap that finalizes a transfer.
pub const DEFAULT_TRANSFER_GAP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemuxEvent {
    StatusLine(String),
    TransferStarted,
    /// Raw accumulated blob, ready for a decode attempt.
    TransferFinalized(Vec<u8>),
}

#[derive(Debug)]
struct TransferSession {
    buffer: BytesMut,
    last_activity: Instant,
}

#[derive(Debug)]
pub struct DualModeLineDemux {
    accumulator: BytesMut,
    transfer: Option<TransferSession>,
    gap: Duration,
    last_byte_at: Option<Instant>,
}

impl DualModeLineDemux {
    #[must_use]
    pub fn new(gap: Duration) -> Self {
        Self {
            accumulator: BytesMut::new(),
            transfer: None,
            gap,
            last_byte_at: None,
        }
    }

    #[must_use]
    pub fn transfer_active(&self) -> bool {
        self.transfer.is_some()
    }

    /// Feed one burst of stream bytes.
    pub fn push(&mut self, data: &[u8], now: Instant) -> Vec<DemuxEvent> {
        self.accumulator.extend_from_slice(data);
        self.last_byte_at = Some(now);

        let mut events = Vec::new();
        while let Some(pos) = self.accumulator.iter().position(|&b| b == b'\n') {
            let mut line = self.accumulator.split_to(pos + 1);
            line.truncate(line.len() - 1); // drop the newline

            match std::str::from_utf8(&line) {
                Ok(text) => {
                    // A blob is always followed by a status line, so flush
                    // the pending transfer before reporting the text.
                    if let Some(session) = self.transfer.take() {
                        events.push(DemuxEvent::TransferFinalized(session.buffer.to_vec()));
                    }
                    events.push(DemuxEvent::StatusLine(text.trim_end_matches('\r').to_string()));
                }
                Err(_) => {
                    let session = self.transfer.get_or_insert_with(|| {
                        events.push(DemuxEvent::TransferStarted);
                        TransferSession {
                            buffer: BytesMut::new(),
                            last_activity: now,
                        }
                    });
                    session.buffer.extend_from_slice(&line);
                    session.last_activity = now;
                }
            }
        }
        events
    }

    /// Apply the inactivity gap. Call periodically even when no bytes
    /// arrive.
    pub fn poll(&mut self, now: Instant) -> Vec<DemuxEvent> {
        let mut events = Vec::new();

        let transfer_stale = self
            .transfer
            .as_ref()
            .is_some_and(|s| now.duration_since(s.last_activity) > self.gap);

        if transfer_stale {
            if let Some(mut session) = self.transfer.take() {
                // Fold in any unterminated residue before finalizing.
                if !self.accumulator.is_empty() {
                    session.buffer.extend_from_slice(&self.accumulator.split());
                }
                events.push(DemuxEvent::TransferFinalized(session.buffer.to_vec()));
            }
        } else if self.transfer.is_none() && !self.accumulator.is_empty() {
            if let Some(last) = self.last_byte_at {
                if now.duration_since(last) > self.gap {
                    // Unterminated bytes this stale are not a status line.
                    events.push(DemuxEvent::TransferStarted);
                    let blob = self.accumulator.split().to_vec();
                    events.push(DemuxEvent::TransferFinalized(blob));
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn text_lines_pass_through() {
        let t0 = Instant::now();
        let mut demux = DualModeLineDemux::new(ms(1000));
        let events = demux.push(b"[INFO] rover ready\r\nsecond line\n", t0);
        assert_eq!(
            events,
            vec![
                DemuxEvent::StatusLine("[INFO] rover ready".into()),
                DemuxEvent::StatusLine("second line".into()),
            ]
        );
    }

    #[test]
    fn undecodable_lines_enter_binary_mode() {
        let t0 = Instant::now();
        let mut demux = DualModeLineDemux::new(ms(1000));
        let events = demux.push(&[0xff, 0xfe, 0x01, b'\n'], t0);
        assert_eq!(events, vec![DemuxEvent::TransferStarted]);
        assert!(demux.transfer_active());
    }

    #[test]
    fn text_line_finalizes_pending_transfer_first() {
        let t0 = Instant::now();
        let mut demux = DualModeLineDemux::new(ms(1000));
        demux.push(&[0xff, 0xfe, b'\n'], t0);
        let events = demux.push(b"done\n", t0 + ms(100));
        assert_eq!(
            events,
            vec![
                DemuxEvent::TransferFinalized(vec![0xff, 0xfe]),
                DemuxEvent::StatusLine("done".into()),
            ]
        );
        assert!(!demux.transfer_active());
    }

    #[test]
    fn gap_finalizes_transfer_with_residue() {
        let t0 = Instant::now();
        let mut demux = DualModeLineDemux::new(ms(1000));
        demux.push(&[0xff, 0xfe, b'\n'], t0);
        // Unterminated tail bytes follow.
        demux.push(&[0x01, 0x02], t0 + ms(100));
        assert!(demux.poll(t0 + ms(500)).is_empty());
        let events = demux.poll(t0 + ms(1200));
        assert_eq!(
            events,
            vec![DemuxEvent::TransferFinalized(vec![0xff, 0xfe, 0x01, 0x02])]
        );
    }

    #[test]
    fn stale_unterminated_text_becomes_a_blob() {
        // Hex image payloads are printable ASCII and carry no newline; only
        // the inactivity gap can classify them.
        let t0 = Instant::now();
        let mut demux = DualModeLineDemux::new(ms(1000));
        demux.push(b"0a1b2c3d", t0);
        assert!(demux.poll(t0 + ms(900)).is_empty());
        let events = demux.poll(t0 + ms(1200));
        assert_eq!(
            events,
            vec![
                DemuxEvent::TransferStarted,
                DemuxEvent::TransferFinalized(b"0a1b2c3d".to_vec()),
            ]
        );
    }

    #[test]
    fn fresh_unterminated_text_is_left_alone() {
        let t0 = Instant::now();
        let mut demux = DualModeLineDemux::new(ms(1000));
        demux.push(b"partial", t0);
        // New bytes keep arriving, so the gap never elapses.
        demux.push(b" line", t0 + ms(800));
        assert!(demux.poll(t0 + ms(1500)).is_empty());
        let events = demux.push(b"\n", t0 + ms(1600));
        assert_eq!(events, vec![DemuxEvent::StatusLine("partial line".into())]);
    }

    #[test]
    fn multi_burst_binary_accumulates_in_order() {
        let t0 = Instant::now();
        let mut demux = DualModeLineDemux::new(ms(1000));
        demux.push(&[0xff, 0x01, b'\n'], t0);
        demux.push(&[0xfe, 0x02, b'\n'], t0 + ms(100));
        let events = demux.poll(t0 + ms(1300));
        assert_eq!(
            events,
            vec![DemuxEvent::TransferFinalized(vec![0xff, 0x01, 0xfe, 0x02])]
        );
    }
}
