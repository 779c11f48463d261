//! Service endpoints and their default transport budgets.

use std::time::Duration;

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Endpoints of the review service.
///
/// Each endpoint carries a default timeout and retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Aggregate counts.
    Stats,
    /// Filtered review list.
    Reviews,
    /// Single-text sentiment and sarcasm analysis.
    Analyze,
    /// Star rating update.
    Rate,
    /// Helpful-vote update.
    Helpful,
    /// Supported analysis languages.
    Languages,
}

impl Endpoint {
    /// Path relative to the service base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Stats => "/api/stats",
            Self::Reviews => "/api/reviews",
            Self::Analyze => "/api/analyze",
            Self::Rate => "/api/rate",
            Self::Helpful => "/api/reviews/helpful",
            Self::Languages => "/api/languages",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Stats | Self::Reviews | Self::Languages => Method::Get,
            Self::Analyze | Self::Rate | Self::Helpful => Method::Post,
        }
    }

    /// Safe to repeat without side effects.
    pub fn is_idempotent(&self) -> bool {
        self.method() == Method::Get
    }

    /// Default total timeout for this endpoint.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Self::Stats => Duration::from_secs(5),
            Self::Reviews => Duration::from_secs(10),
            // Model inference on the service side can be slow on first use.
            Self::Analyze => Duration::from_secs(30),
            Self::Rate | Self::Helpful => Duration::from_secs(5),
            Self::Languages => Duration::from_secs(5),
        }
    }

    /// Default max retries for this endpoint.
    pub fn default_max_retries(&self) -> u32 {
        match self {
            Self::Stats | Self::Reviews => 2,
            Self::Languages => 1,
            // Writes and analysis are never repeated.
            Self::Analyze | Self::Rate | Self::Helpful => 0,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method().as_str(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_reads_are_retried() {
        for endpoint in [Endpoint::Analyze, Endpoint::Rate, Endpoint::Helpful] {
            assert!(!endpoint.is_idempotent());
            assert_eq!(endpoint.default_max_retries(), 0);
        }
        assert!(Endpoint::Stats.is_idempotent());
        assert_eq!(Endpoint::Helpful.to_string(), "POST /api/reviews/helpful");
    }
}
