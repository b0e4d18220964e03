use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::link::link_error::LinkError;

/// Contract of the packet radio driver.
///
/// The driver delivers small, bounded, individually unreliable packets and
/// nothing else: no connection state, no multi-packet reassembly. All
/// receive calls are timeout-bounded; there is no blocking without a
/// deadline anywhere in this trait.
///
/// `send_with_ack` reports whether delivery was confirmed. The contract does
/// not itself retry; callers that ignore the boolean accept unconfirmed
/// delivery.
pub trait RadioLink: Send {
    /// Transmit one packet, fire-and-forget.
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError>;

    /// Transmit one packet and wait for the link-level acknowledgment.
    /// Returns `Ok(false)` when the packet went out but no ack came back.
    fn send_with_ack(&mut self, payload: &[u8]) -> Result<bool, LinkError>;

    /// Wait up to `timeout` for one packet. `Ok(None)` on timeout.
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, LinkError>;
}

/// In-memory radio pair for tests and the in-process demo binaries.
///
/// Two `LoopbackRadio` ends are cross-wired over mpsc channels; every
/// packet sent on one end becomes receivable on the other. Acks always
/// succeed since the channel cannot drop packets.
pub struct LoopbackRadio {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl LoopbackRadio {
    /// Creates both ends of a duplex radio link.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = mpsc::channel();
        let (tx_b, rx_a) = mpsc::channel();
        (
            Self { tx: tx_a, rx: rx_a },
            Self { tx: tx_b, rx: rx_b },
        )
    }
}

impl RadioLink for LoopbackRadio {
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        self.tx
            .send(payload.to_vec())
            .map_err(|_| LinkError::Closed)
    }

    fn send_with_ack(&mut self, payload: &[u8]) -> Result<bool, LinkError> {
        self.send(payload)?;
        Ok(true)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, LinkError> {
        match self.rx.recv_timeout(timeout) {
            Ok(pkt) => Ok(Some(pkt)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LinkError::Closed),
        }
    }
}
