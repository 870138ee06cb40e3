//! Global atomic counters for node invocations.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before a binary exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations or locking.
pub struct Metrics {
    invocations: AtomicU64,
    searches_issued: AtomicU64,
    model_calls: AtomicU64,
    summaries_appended: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            invocations: AtomicU64::new(0),
            searches_issued: AtomicU64::new(0),
            model_calls: AtomicU64::new(0),
            summaries_appended: AtomicU64::new(0),
        }
    }

    pub fn inc_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "invocations", "counter incremented");
    }

    /// One per search batch handed to a search tool.
    pub fn inc_searches(&self) {
        self.searches_issued.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "searches_issued", "counter incremented");
    }

    pub fn inc_model_calls(&self) {
        self.model_calls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "model_calls", "counter incremented");
    }

    pub fn inc_summaries_appended(&self) {
        self.summaries_appended.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "summaries_appended", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            invocations = self.invocations(),
            searches_issued = self.searches_issued(),
            model_calls = self.model_calls(),
            summaries_appended = self.summaries_appended(),
        );
    }

    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn searches_issued(&self) -> u64 {
        self.searches_issued.load(Ordering::Relaxed)
    }

    pub fn model_calls(&self) -> u64 {
        self.model_calls.load(Ordering::Relaxed)
    }

    pub fn summaries_appended(&self) -> u64 {
        self.summaries_appended.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.invocations.store(0, Ordering::Relaxed);
        self.searches_issued.store(0, Ordering::Relaxed);
        self.model_calls.store(0, Ordering::Relaxed);
        self.summaries_appended.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_invocations();
        m.inc_invocations();
        assert_eq!(m.invocations(), 2);

        m.inc_searches();
        assert_eq!(m.searches_issued(), 1);

        m.inc_model_calls();
        m.inc_summaries_appended();
        assert_eq!(m.model_calls(), 1);
        assert_eq!(m.summaries_appended(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_invocations();
        m.inc_searches();
        m.inc_model_calls();
        m.inc_summaries_appended();
        m.reset();
        assert_eq!(m.invocations(), 0);
        assert_eq!(m.searches_issued(), 0);
        assert_eq!(m.model_calls(), 0);
        assert_eq!(m.summaries_appended(), 0);
    }
}
