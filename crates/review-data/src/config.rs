//! Adapter configuration.

use std::time::Duration;

use crate::endpoint::Endpoint;
use crate::retry::RetryPolicy;
use crate::timeout::TimeoutConfig;

/// Optional API keys forwarded to the review service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub sentiment: String,
    pub sarcasm: String,
    pub language: String,
}

impl ApiKeys {
    /// Header name and value for every non-blank key.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        [
            ("X-Sentiment-Api-Key", self.sentiment.as_str()),
            ("X-Sarcasm-Api-Key", self.sarcasm.as_str()),
            ("X-Language-Api-Key", self.language.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .collect()
    }
}

/// Timeout and retry settings for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPolicy {
    pub timeout: TimeoutConfig,
    pub retry: RetryPolicy,
}

impl RequestPolicy {
    pub fn new(timeout: TimeoutConfig, retry: RetryPolicy) -> Self {
        Self { timeout, retry }
    }

    /// Defaults for an endpoint. Non-idempotent endpoints never retry.
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        let retry = if endpoint.is_idempotent() {
            RetryPolicy::new(endpoint.default_max_retries())
        } else {
            RetryPolicy::none()
        };
        Self {
            timeout: TimeoutConfig::for_endpoint(endpoint),
            retry,
        }
    }
}

/// Everything an HTTP review source needs, passed in at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Service root, e.g. `http://localhost:5000`.
    pub base_url: String,
    pub api_keys: ApiKeys,
    /// Overrides every endpoint's default timeout.
    pub timeout: Option<TimeoutConfig>,
    /// Overrides the retry budget of idempotent endpoints.
    pub retry: Option<RetryPolicy>,
}

impl SourceConfig {
    /// Create a config with endpoint defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_keys: ApiKeys::default(),
            timeout: None,
            retry: None,
        }
    }

    pub fn with_api_keys(mut self, keys: ApiKeys) -> Self {
        self.api_keys = keys;
        self
    }

    pub fn with_timeout(mut self, total: Duration) -> Self {
        self.timeout = Some(TimeoutConfig::from_total(total));
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Effective policy for an endpoint after overrides.
    pub fn policy_for(&self, endpoint: Endpoint) -> RequestPolicy {
        let mut policy = RequestPolicy::for_endpoint(endpoint);
        if let Some(timeout) = self.timeout {
            policy.timeout = timeout;
        }
        if endpoint.is_idempotent() {
            if let Some(retry) = &self.retry {
                policy.retry = retry.clone();
            }
        }
        policy
    }

    /// Absolute URL of an endpoint.
    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::new("http://localhost:5000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_keys_are_not_sent() {
        let keys = ApiKeys {
            sentiment: "8e72jd7-demo-key".to_string(),
            sarcasm: "  ".to_string(),
            language: String::new(),
        };
        assert_eq!(keys.headers(), vec![("X-Sentiment-Api-Key", "8e72jd7-demo-key")]);
    }

    #[test]
    fn test_retry_override_skips_writes() {
        let config = SourceConfig::new("http://svc/").with_retry(RetryPolicy::new(5));
        assert_eq!(config.policy_for(Endpoint::Reviews).retry.max_retries, 5);
        assert_eq!(config.policy_for(Endpoint::Rate).retry.max_retries, 0);
        assert_eq!(config.url(Endpoint::Stats), "http://svc/api/stats");
    }

    #[test]
    fn test_timeout_override_applies_everywhere() {
        let config = SourceConfig::default().with_timeout(Duration::from_secs(2));
        assert_eq!(config.policy_for(Endpoint::Analyze).timeout.total, Duration::from_secs(2));
    }
}
