//! Refresh coordination for the review dashboard.
//!
//! This crate provides:
//! - `RefreshStream` - Latest-issued-wins fetch state with observable snapshots
//! - `DashboardSession` - Stats polling and criteria-driven review refreshes over a `ReviewSource`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use review_sync::{DashboardSession, SessionConfig};
//!
//! let session = DashboardSession::new(Arc::new(source), SessionConfig::default());
//! session.attach();
//!
//! let mut stats = session.subscribe_stats();
//! session.criteria().set_search_text("great");
//!
//! while stats.changed().await.is_ok() {
//!     let snapshot = stats.borrow_and_update().clone();
//!     // render snapshot
//! }
//! ```

mod session;
mod stream;

pub use session::*;
pub use stream::*;
