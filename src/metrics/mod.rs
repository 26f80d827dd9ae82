//! Instrumentation sink
//!
//! Counters and histograms are fire-and-forget: the sink signatures return
//! nothing, so a broken sink can never fail a request.

use std::sync::{Arc, Mutex};
use tracing::debug;

/// Request counter, tagged by endpoint
pub const API_CALLS: &str = "reddit.api.calls";
/// Request latency in milliseconds
pub const API_LATENCY: &str = "reddit.api.latency";
/// Failed requests
pub const API_ERRORS: &str = "reddit.api.errors";
/// Retry attempts
pub const API_RETRIES: &str = "reddit.api.retries";
/// Cool-down records written
pub const API_RATELIMIT: &str = "reddit.api.ratelimit";
/// Requests that opened a fresh connection
pub const CONNECTIONS_CREATED: &str = "reddit.api.connections.created";
/// Requests that reused a pooled connection
pub const CONNECTIONS_REUSED: &str = "reddit.api.connections.reused";
/// Idle time of a reused connection in milliseconds
pub const CONNECTIONS_IDLE_TIME: &str = "reddit.api.connections.idle_time";

/// Sample rate for high-volume request metrics
pub const DEFAULT_SAMPLE_RATE: f64 = 0.1;

/// Destination for counters and histograms
pub trait MetricsSink: Send + Sync {
    /// Increment a counter by one
    fn increment(&self, name: &str, tags: &[String], sample_rate: f64);

    /// Record a histogram value
    fn histogram(&self, name: &str, value: f64, tags: &[String], sample_rate: f64);
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment(&self, _name: &str, _tags: &[String], _sample_rate: f64) {}

    fn histogram(&self, _name: &str, _value: f64, _tags: &[String], _sample_rate: f64) {}
}

/// Sink that emits sampled `tracing` events on the `metrics` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl TracingMetrics {
    fn sampled(sample_rate: f64) -> bool {
        sample_rate >= 1.0 || rand::random::<f64>() < sample_rate
    }
}

impl MetricsSink for TracingMetrics {
    fn increment(&self, name: &str, tags: &[String], sample_rate: f64) {
        if Self::sampled(sample_rate) {
            debug!(target: "metrics", metric = name, tags = ?tags, sample_rate, "count");
        }
    }

    fn histogram(&self, name: &str, value: f64, tags: &[String], sample_rate: f64) {
        if Self::sampled(sample_rate) {
            debug!(target: "metrics", metric = name, value, tags = ?tags, sample_rate, "histogram");
        }
    }
}

/// One recorded metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    /// Metric name
    pub name: String,
    /// `None` for counters
    pub value: Option<f64>,
    /// Metric tags
    pub tags: Vec<String>,
}

/// Sink that keeps every event in memory, ignoring sample rates
#[derive(Debug, Clone, Default)]
pub struct MemoryMetrics {
    events: Arc<Mutex<Vec<MetricEvent>>>,
}

impl MemoryMetrics {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: MetricEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Snapshot of all recorded events
    pub fn events(&self) -> Vec<MetricEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of events recorded under `name`
    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name == name).count()
    }
}

impl MetricsSink for MemoryMetrics {
    fn increment(&self, name: &str, tags: &[String], _sample_rate: f64) {
        self.push(MetricEvent {
            name: name.to_string(),
            value: None,
            tags: tags.to_vec(),
        });
    }

    fn histogram(&self, name: &str, value: f64, tags: &[String], _sample_rate: f64) {
        self.push(MetricEvent {
            name: name.to_string(),
            value: Some(value),
            tags: tags.to_vec(),
        });
    }
}
