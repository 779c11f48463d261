//! Observability for the review dashboard.
//!
//! This crate provides:
//! - `init_logging` / `LoggingConfig` - `tracing` subscriber setup in human or JSON format
//! - `StreamMetrics` / `StreamRecorder` - Per-stream fetch counters and latency

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
