use std::sync::atomic::{AtomicU64, Ordering};

/// Relay counters. Relaxed atomics; read for logs and tests only.
#[derive(Debug, Default)]
pub struct RelayStats {
    broadcasts: AtomicU64,
    deliveries: AtomicU64,
    failed_deliveries: AtomicU64,
}

/// Point-in-time copy of `RelayStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    pub broadcasts: u64,
    pub deliveries: u64,
    pub failed_deliveries: u64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            failed_deliveries: self.failed_deliveries.load(Ordering::Relaxed),
        }
    }
}
