//! Timeout configuration for service requests.

use std::time::Duration;

use crate::endpoint::Endpoint;

/// Timeout configuration for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total operation timeout.
    pub total: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: std::cmp::min(total / 4, Duration::from_secs(3)),
            total,
        }
    }

    /// Defaults for an endpoint.
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        Self::from_total(endpoint.default_timeout())
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(3),
            total: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_timeout_derived_from_total() {
        let t = TimeoutConfig::from_total(Duration::from_secs(4));
        assert_eq!(t.connect, Duration::from_secs(1));

        let t = TimeoutConfig::for_endpoint(Endpoint::Analyze);
        assert_eq!(t.total, Duration::from_secs(30));
        assert_eq!(t.connect, Duration::from_secs(3));
    }
}
