//! Review model, filtering and dashboard metrics.
//!
//! This crate provides:
//! - `Review` / `SentimentLabel` - Immutable review records
//! - `FilterCriteria` / `CriteriaModel` - The active filter selection and its observers
//! - `ReviewQuery` - Local predicate and remote query parameters from one mapping
//! - `compute_summary` / `compute_trend` / `build_dashboard` - Dashboard metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use review_core::prelude::*;
//!
//! let criteria = FilterCriteria::new()
//!     .with_search_text("great")
//!     .with_rating_range(4, 5)?;
//! let visible = review_core::query::apply(&criteria, &reviews);
//!
//! let summary = compute_summary(&SentimentCounts::new(6, 3, 1, 10))?;
//! assert_eq!(summary.positive_percentage, 60);
//! ```

pub mod criteria;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod query;
pub mod review;

pub use criteria::{CriteriaModel, FilterCriteria, RatingRange};
pub use error::{ReviewError, ReviewResult};
pub use ids::ReviewId;
pub use metrics::{
    build_dashboard, compute_language_distribution, compute_summary, compute_trend,
    DashboardMetrics, SentimentCounts, SummaryMetrics, TrendGranularity, TrendPoint,
};
pub use query::ReviewQuery;
pub use review::{Review, SentimentLabel, MAX_STAR_RATING, MIN_STAR_RATING};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::criteria::{CriteriaModel, FilterCriteria, RatingRange};
    pub use crate::error::{ReviewError, ReviewResult};
    pub use crate::ids::ReviewId;
    pub use crate::metrics::{
        build_dashboard, compute_summary, DashboardMetrics, SentimentCounts, TrendGranularity,
    };
    pub use crate::query::ReviewQuery;
    pub use crate::review::{Review, SentimentLabel};
}
