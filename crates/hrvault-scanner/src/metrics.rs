//! Scan counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-lifetime scan counters, shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct ScanMetrics {
    scans_total: AtomicU64,
    threats_detected: AtomicU64,
    local_failures: AtomicU64,
    external_failures: AtomicU64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanMetricsSnapshot {
    pub scans_total: u64,
    pub threats_detected: u64,
    pub local_failures: u64,
    pub external_failures: u64,
}

impl ScanMetrics {
    pub fn record_scan(&self) {
        self.scans_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_threat(&self) {
        self.threats_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_failure(&self) {
        self.local_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_external_failure(&self) {
        self.external_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ScanMetricsSnapshot {
        ScanMetricsSnapshot {
            scans_total: self.scans_total.load(Ordering::Relaxed),
            threats_detected: self.threats_detected.load(Ordering::Relaxed),
            local_failures: self.local_failures.load(Ordering::Relaxed),
            external_failures: self.external_failures.load(Ordering::Relaxed),
        }
    }
}
