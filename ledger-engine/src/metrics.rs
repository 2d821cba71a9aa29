//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `ledger_transactions_posted_total` - Committed transactions
//! - `ledger_postings_total` - Committed posting lines
//! - `ledger_transactions_rejected_total{kind}` - Failed posting attempts by error kind
//! - `ledger_post_duration_seconds` - Histogram of `post_transaction` latencies
//!
//! Each [`Metrics`] owns its registry, so several engines (or tests) can
//! coexist in one process.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed transactions
    pub transactions_posted: IntCounter,

    /// Committed postings
    pub postings_total: IntCounter,

    /// Rejections by error kind
    pub transactions_rejected: IntCounterVec,

    /// Posting latency histogram
    pub post_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_posted = IntCounter::new(
            "ledger_transactions_posted_total",
            "Total number of committed transactions",
        )?;
        registry.register(Box::new(transactions_posted.clone()))?;

        let postings_total =
            IntCounter::new("ledger_postings_total", "Total number of committed postings")?;
        registry.register(Box::new(postings_total.clone()))?;

        let transactions_rejected = IntCounterVec::new(
            Opts::new(
                "ledger_transactions_rejected_total",
                "Total number of rejected posting attempts",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(transactions_rejected.clone()))?;

        let post_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_post_duration_seconds",
                "Histogram of post_transaction latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(post_duration.clone()))?;

        Ok(Self {
            transactions_posted,
            postings_total,
            transactions_rejected,
            post_duration,
            registry,
        })
    }

    /// Record a committed transaction
    pub fn record_posted(&self, postings: usize) {
        self.transactions_posted.inc();
        self.postings_total.inc_by(postings as u64);
    }

    /// Record a failed posting attempt
    pub fn record_rejected(&self, kind: &str) {
        self.transactions_rejected.with_label_values(&[kind]).inc();
    }

    /// Record posting duration
    pub fn record_post_duration(&self, duration_seconds: f64) {
        self.post_duration.observe(duration_seconds);
    }

    /// Rejections recorded for one error kind
    pub fn rejected(&self, kind: &str) -> u64 {
        self.transactions_rejected.with_label_values(&[kind]).get()
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn gather_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("transactions_posted", &self.transactions_posted.get())
            .field("postings_total", &self.postings_total.get())
            .finish_non_exhaustive()
    }
}
