//! Review service adapters with endpoint timeouts and retries.
//!
//! This crate provides:
//! - `ReviewSource` - The async boundary the coordinator fetches through
//! - `HttpReviewSource` - `reqwest` adapter for the review service
//! - `MemoryReviewSource` - In-process source for tests and offline use
//! - `SourceConfig` - Base URL, API keys and transport overrides
//! - `Endpoint` / `TimeoutConfig` / `RetryPolicy` - Per-endpoint transport budgets

mod config;
mod endpoint;
mod http;
mod memory;
mod retry;
mod source;
mod timeout;
pub mod wire;

pub use config::*;
pub use endpoint::*;
pub use http::*;
pub use memory::*;
pub use retry::*;
pub use source::*;
pub use timeout::*;
