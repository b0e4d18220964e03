//! Response payload -> bounded packets, and the inverse.
//!
//! Input  : one response payload as a byte slice (text or binary).
//! Output : a vector of packets, each within `max_packet_size`, carrying
//!          either a textual `[idx/total]` prefix or a 4-byte binary
//!          `seq/total` header.
//!
//! The text prefix is human-readable on a serial console; the binary header
//! is what reassembly relies on. Reassembly of header-framed packets is
//! exact: sort by seq, verify the totals agree and the range is contiguous,
//! concatenate.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::io::Cursor;

use crate::framing::framing_error::FramingError;
use crate::util;

/// Length of the binary `seq(u16 BE) || total(u16 BE)` packet header.
pub const BINARY_HEADER_LEN: usize = 4;

/// How each outgoing chunk is labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixPolicy {
    /// Raw chunk bytes, no labeling. Reassembly is order-dependent.
    None,
    /// ASCII `"[idx/total] "` prefix.
    Indexed,
    /// ASCII `"[HH:MM:SS idx/total] "` prefix.
    Timestamped,
}

/// Splits a response payload into bounded packets.
#[derive(Debug, Clone)]
pub struct TransportFramer {
    max_packet_size: usize,
    prefix: PrefixPolicy,
}

impl TransportFramer {
    #[must_use]
    pub fn new(max_packet_size: usize, prefix: PrefixPolicy) -> Self {
        Self {
            max_packet_size,
            prefix,
        }
    }

    /// Worst-case prefix length when both idx and total need `digits` digits.
    fn prefix_len(&self, digits: usize) -> usize {
        match self.prefix {
            PrefixPolicy::None => 0,
            // "[" idx "/" total "] "
            PrefixPolicy::Indexed => 4 + 2 * digits,
            // "[HH:MM:SS " idx "/" total "] "
            PrefixPolicy::Timestamped => 13 + 2 * digits,
        }
    }

    /// Splits `payload` into text-prefixed packets per the configured policy.
    ///
    /// The usable payload length per packet is `max_packet_size` minus the
    /// worst-case prefix length; the digit width of the chunk count feeds
    /// back into that overhead, so the split iterates until the width is
    /// stable. An empty payload produces no packets.
    ///
    /// # Errors
    ///
    /// [`FramingError::PacketTooSmall`] when the prefix leaves no room for
    /// payload bytes.
    pub fn frame(&self, payload: &[u8]) -> Result<Vec<Vec<u8>>, FramingError> {
        if payload.is_empty() {
            return Ok(Vec::new());
        }

        let mut digits = 1;
        let (usable, total) = loop {
            let overhead = self.prefix_len(digits);
            if overhead >= self.max_packet_size {
                return Err(FramingError::PacketTooSmall {
                    max_packet_size: self.max_packet_size,
                    overhead,
                });
            }
            let usable = self.max_packet_size - overhead;
            let total = payload.len().div_ceil(usable);
            let needed = decimal_digits(total);
            if needed <= digits {
                break (usable, total);
            }
            digits = needed;
        };

        let hms = util::hms_now();
        let mut out = Vec::with_capacity(total);
        for (i, chunk) in payload.chunks(usable).enumerate() {
            let idx = i + 1;
            let mut packet = match self.prefix {
                PrefixPolicy::None => Vec::with_capacity(chunk.len()),
                PrefixPolicy::Indexed => format!("[{idx}/{total}] ").into_bytes(),
                PrefixPolicy::Timestamped => {
                    let (h, m, s) = hms;
                    format!("[{h:02}:{m:02}:{s:02} {idx}/{total}] ").into_bytes()
                }
            };
            packet.extend_from_slice(chunk);
            debug_assert!(packet.len() <= self.max_packet_size);
            out.push(packet);
        }
        Ok(out)
    }

    /// Splits `payload` into packets with the 4-byte `seq/total` header.
    ///
    /// Sequence numbers are 1-based. An empty payload produces no packets.
    ///
    /// # Errors
    ///
    /// [`FramingError::PacketTooSmall`] when the header leaves no payload
    /// room, [`FramingError::TooManyChunks`] when the count overflows u16.
    pub fn frame_binary(&self, payload: &[u8]) -> Result<Vec<Vec<u8>>, FramingError> {
        if payload.is_empty() {
            return Ok(Vec::new());
        }
        if self.max_packet_size <= BINARY_HEADER_LEN {
            return Err(FramingError::PacketTooSmall {
                max_packet_size: self.max_packet_size,
                overhead: BINARY_HEADER_LEN,
            });
        }
        let usable = self.max_packet_size - BINARY_HEADER_LEN;
        let total = payload.len().div_ceil(usable);
        if total > usize::from(u16::MAX) {
            return Err(FramingError::TooManyChunks(total));
        }

        let mut out = Vec::with_capacity(total);
        for (i, chunk) in payload.chunks(usable).enumerate() {
            let mut packet = Vec::with_capacity(BINARY_HEADER_LEN + chunk.len());
            // Both writes into a Vec cannot fail.
            let _ = packet.write_u16::<BigEndian>((i + 1) as u16);
            let _ = packet.write_u16::<BigEndian>(total as u16);
            packet.extend_from_slice(chunk);
            out.push(packet);
        }
        Ok(out)
    }

    /// Reconstructs the original payload from header-framed packets.
    ///
    /// Packets may arrive in any order. The result is byte-identical to the
    /// framed payload.
    ///
    /// # Errors
    ///
    /// Reports short headers, disagreeing totals, duplicate or missing
    /// sequence numbers.
    pub fn reassemble(packets: &[Vec<u8>]) -> Result<Vec<u8>, FramingError> {
        if packets.is_empty() {
            return Ok(Vec::new());
        }

        let mut chunks: BTreeMap<u16, &[u8]> = BTreeMap::new();
        let mut expected_total: Option<u16> = None;

        for packet in packets {
            if packet.len() < BINARY_HEADER_LEN {
                return Err(FramingError::HeaderTooShort(packet.len()));
            }
            let mut cursor = Cursor::new(&packet[..BINARY_HEADER_LEN]);
            let seq = cursor.read_u16::<BigEndian>().map_err(|_| FramingError::HeaderTooShort(packet.len()))?;
            let total = cursor.read_u16::<BigEndian>().map_err(|_| FramingError::HeaderTooShort(packet.len()))?;

            match expected_total {
                None => expected_total = Some(total),
                Some(expected) if expected != total => {
                    return Err(FramingError::TotalMismatch {
                        expected,
                        actual: total,
                    });
                }
                Some(_) => {}
            }

            if chunks.insert(seq, &packet[BINARY_HEADER_LEN..]).is_some() {
                return Err(FramingError::DuplicateChunk(seq));
            }
        }

        let total = expected_total.unwrap_or(0);
        let mut out = Vec::new();
        for seq in 1..=total {
            let chunk = chunks
                .get(&seq)
                .copied()
                .ok_or(FramingError::MissingChunk(seq))?;
            out.extend_from_slice(chunk);
        }
        Ok(out)
    }
}

#[inline]
fn decimal_digits(mut n: usize) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}
