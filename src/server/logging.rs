//! In-memory usage counters. Nothing here is written to disk; submitted
//! predictions are counted by label only.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct UsageMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub rate_limited: AtomicU64,

    pub safe: AtomicU64,
    pub unsafe_: AtomicU64,

    pub ep_summary: AtomicU64,
    pub ep_rows: AtomicU64,
    pub ep_charts: AtomicU64,
    pub ep_predict: AtomicU64,
    pub ep_importance: AtomicU64,
}

/// Endpoint counted by [`UsageMetrics::hit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Summary,
    Rows,
    Charts,
    Predict,
    Importance,
    Other,
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self, endpoint: Endpoint) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let counter = match endpoint {
            Endpoint::Summary => &self.ep_summary,
            Endpoint::Rows => &self.ep_rows,
            Endpoint::Charts => &self.ep_charts,
            Endpoint::Predict => &self.ep_predict,
            Endpoint::Importance => &self.ep_importance,
            Endpoint::Other => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction(&self, safe: bool) {
        if safe {
            self.safe.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unsafe_.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
        self.record_error();
    }
}
