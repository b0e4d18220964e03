use bytes::Bytes;
use std::collections::VecDeque;

/// Default retransmission window, in packets.
pub const MAX_HISTORY: usize = 500;

/// Bounded FIFO of recently transmitted payloads.
///
/// Entries are addressed by absolute append order, so a station can ask for
/// "packet 17 of this session" long after later traffic. Once an entry is
/// evicted it is permanently unrecoverable; `by_index` reports that as
/// `None` rather than an error.
#[derive(Debug, Default)]
pub struct PacketHistory {
    entries: VecDeque<Bytes>,
    evicted: u64,
    capacity: usize,
}

impl PacketHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(MAX_HISTORY)),
            evicted: 0,
            capacity,
        }
    }

    /// O(1) push; evicts the oldest entry when the window is full.
    pub fn append(&mut self, payload: Bytes) {
        if self.capacity == 0 {
            self.evicted += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(payload);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of payloads ever appended.
    #[must_use]
    pub fn total_appended(&self) -> u64 {
        self.evicted + self.entries.len() as u64
    }

    /// The most recent `n` payloads in transmission order (all of them if
    /// fewer exist).
    #[must_use]
    pub fn last(&self, n: usize) -> Vec<Bytes> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// The payload at absolute append position `index`, if still resident.
    #[must_use]
    pub fn by_index(&self, index: u64) -> Option<Bytes> {
        if index < self.evicted {
            return None;
        }
        let offset = usize::try_from(index - self.evicted).ok()?;
        self.entries.get(offset).cloned()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn payload(i: usize) -> Bytes {
        Bytes::from(format!("packet-{i}"))
    }

    #[test]
    fn append_and_fetch_by_absolute_index() {
        let mut h = PacketHistory::with_capacity(10);
        for i in 0..5 {
            h.append(payload(i));
        }
        assert_eq!(h.len(), 5);
        assert_eq!(h.by_index(0).unwrap(), payload(0));
        assert_eq!(h.by_index(4).unwrap(), payload(4));
        assert_eq!(h.by_index(5), None);
    }

    #[test]
    fn eviction_keeps_exactly_the_most_recent_window() {
        let mut h = PacketHistory::with_capacity(3);
        for i in 0..10 {
            h.append(payload(i));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.total_appended(), 10);
        // Oldest entries are gone for good.
        assert_eq!(h.by_index(6), None);
        assert_eq!(h.by_index(7).unwrap(), payload(7));
        assert_eq!(h.by_index(9).unwrap(), payload(9));
        assert_eq!(h.last(10), vec![payload(7), payload(8), payload(9)]);
    }

    #[test]
    fn last_returns_newest_in_order() {
        let mut h = PacketHistory::with_capacity(10);
        for i in 0..4 {
            h.append(payload(i));
        }
        assert_eq!(h.last(2), vec![payload(2), payload(3)]);
        assert_eq!(h.last(0), Vec::<Bytes>::new());
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut h = PacketHistory::new();
        for i in 0..(MAX_HISTORY + 100) {
            h.append(payload(i));
            assert!(h.len() <= MAX_HISTORY);
        }
        assert_eq!(h.len(), MAX_HISTORY);
        assert_eq!(h.by_index(99), None);
        assert_eq!(h.by_index(100).unwrap(), payload(100));
    }
}
