//! Delivery counters.
//!
//! Updated with relaxed atomics from both the producer and the consumer; a
//! [`BridgeStats`] snapshot is eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a bridge's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Events handed to a waiting operation.
    pub delivered: u64,
    /// Events discarded because no operation was waiting.
    pub dropped: u64,
    /// Operations completed by their cancellation signal.
    pub cancelled: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    delivered: AtomicU64,
    dropped: AtomicU64,
    cancelled: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}
