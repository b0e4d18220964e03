use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::link::link_error::LinkError;

/// Contract of the serial byte-stream bridge on the station side.
///
/// Unlike [`super::radio::RadioLink`] this is an ordered byte stream with no
/// packet boundaries; reads return whatever burst of bytes was available.
pub trait ByteStream: Send {
    /// Write the full buffer to the stream.
    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// Wait up to `timeout` for the next burst of bytes. `Ok(None)` on timeout.
    fn read_timeout(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, LinkError>;

    /// Release the underlying handle. Reads after close report `Closed`.
    fn close(&mut self);
}

/// In-memory byte stream backed by an mpsc channel of byte bursts.
///
/// Read bursts preserve the chunk boundaries of the writes that produced
/// them, which is what a serial read of `in_waiting` bytes tends to see in
/// practice.
pub struct ChannelByteStream {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    closed: bool,
}

impl ChannelByteStream {
    /// Write-only handle usable while a reader thread owns the stream, the
    /// way a console writes commands while a background thread drains the
    /// port.
    #[must_use]
    pub fn writer(&self) -> StreamWriter {
        StreamWriter {
            tx: self.tx.clone(),
        }
    }

    /// Creates both ends of a duplex stream.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = mpsc::channel();
        let (tx_b, rx_a) = mpsc::channel();
        (
            Self {
                tx: tx_a,
                rx: rx_a,
                closed: false,
            },
            Self {
                tx: tx_b,
                rx: rx_b,
                closed: false,
            },
        )
    }
}

impl ByteStream for ChannelByteStream {
    fn write_all(&mut self, data: &[u8]) -> Result<(), LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        self.tx.send(data.to_vec()).map_err(|_| LinkError::Closed)
    }

    fn read_timeout(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, LinkError> {
        if self.closed {
            return Err(LinkError::Closed);
        }
        match self.rx.recv_timeout(timeout) {
            Ok(burst) => Ok(Some(burst)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LinkError::Closed),
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Write-only half of a [`ChannelByteStream`].
#[derive(Clone)]
pub struct StreamWriter {
    tx: Sender<Vec<u8>>,
}

impl StreamWriter {
    pub fn write_all(&self, data: &[u8]) -> Result<(), LinkError> {
        self.tx.send(data.to_vec()).map_err(|_| LinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn bursts_cross_the_pair() {
        let (mut a, mut b) = ChannelByteStream::pair();
        a.write_all(b"status line\n").unwrap();
        let burst = b.read_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(burst, Some(b"status line\n".to_vec()));
    }

    #[test]
    fn closed_stream_rejects_io() {
        let (mut a, _b) = ChannelByteStream::pair();
        a.close();
        assert!(matches!(a.write_all(b"x"), Err(LinkError::Closed)));
        assert!(matches!(
            a.read_timeout(Duration::from_millis(1)),
            Err(LinkError::Closed)
        ));
    }
}
