//! Fetch metrics for refresh streams.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Counters for one refresh stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetrics {
    /// Stream name.
    pub stream: String,
    /// Fetches issued.
    pub issued: u64,
    /// Completions that updated the visible state with data.
    pub settled: u64,
    /// Completions that updated the visible state with an error.
    pub failed: u64,
    /// Completions dropped because a newer fetch was issued or the stream
    /// was detached.
    pub discarded: u64,
    /// Latency of the last applied completion (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_latency_us: Option<u64>,
    /// Kind of the last applied error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_kind: Option<String>,
}

impl StreamMetrics {
    /// Create empty metrics for a named stream.
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            ..Default::default()
        }
    }

    /// Fetches issued but not yet completed.
    pub fn in_flight(&self) -> u64 {
        self.issued
            .saturating_sub(self.settled + self.failed + self.discarded)
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut s = format!(
            "{}: issued={} settled={} failed={} discarded={}",
            self.stream, self.issued, self.settled, self.failed, self.discarded
        );
        if let Some(us) = self.last_latency_us {
            s.push_str(&format!(" last={:.2}ms", us as f64 / 1000.0));
        }
        if let Some(kind) = &self.last_error_kind {
            s.push_str(&format!(" last_error={}", kind));
        }
        s
    }
}

/// Shared recorder for one stream's metrics.
///
/// Cheap to clone; clones record into the same counters.
#[derive(Debug, Clone)]
pub struct StreamRecorder {
    inner: Arc<Mutex<StreamMetrics>>,
}

impl StreamRecorder {
    /// Create a new recorder.
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StreamMetrics::new(stream))),
        }
    }

    pub fn record_issued(&self) {
        self.with(|m| m.issued += 1);
    }

    pub fn record_settled(&self, latency: Duration) {
        self.with(|m| {
            m.settled += 1;
            m.last_latency_us = Some(latency.as_micros() as u64);
        });
    }

    pub fn record_failed(&self, latency: Duration, kind: &str) {
        self.with(|m| {
            m.failed += 1;
            m.last_latency_us = Some(latency.as_micros() as u64);
            m.last_error_kind = Some(kind.to_string());
        });
    }

    pub fn record_discarded(&self) {
        self.with(|m| m.discarded += 1);
    }

    /// Copy of the current counters.
    pub fn snapshot(&self) -> StreamMetrics {
        self.with(|m| m.clone())
    }

    fn with<R>(&self, f: impl FnOnce(&mut StreamMetrics) -> R) -> R {
        // A poisoned lock only means a panic mid-update of plain counters.
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_counts() {
        let recorder = StreamRecorder::new("reviews");
        let clone = recorder.clone();

        recorder.record_issued();
        recorder.record_issued();
        recorder.record_issued();
        clone.record_discarded();
        recorder.record_failed(Duration::from_millis(3), "network");

        let m = recorder.snapshot();
        assert_eq!(m.issued, 3);
        assert_eq!(m.discarded, 1);
        assert_eq!(m.failed, 1);
        assert_eq!(m.in_flight(), 1);
        assert_eq!(m.last_latency_us, Some(3000));
        assert_eq!(m.last_error_kind.as_deref(), Some("network"));
    }

    #[test]
    fn test_summary_and_json() {
        let recorder = StreamRecorder::new("stats");
        recorder.record_issued();
        recorder.record_settled(Duration::from_micros(1500));

        let m = recorder.snapshot();
        assert_eq!(m.to_summary(), "stats: issued=1 settled=1 failed=0 discarded=0 last=1.50ms");
        let value: serde_json::Value = serde_json::from_str(&m.to_json()).unwrap();
        assert_eq!(value["settled"], 1);
        assert!(value.get("last_error_kind").is_none());
    }
}
