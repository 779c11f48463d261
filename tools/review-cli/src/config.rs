//! CLI configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use review_data::{ApiKeys, RetryPolicy, SourceConfig};

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Review service connection.
    #[serde(default)]
    pub api: ApiConfig,

    /// Optional API keys forwarded to the service.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Alert thresholds.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    /// Background refresh settings.
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Adapter configuration for the HTTP review source.
    pub fn source_config(&self) -> SourceConfig {
        let mut config = SourceConfig::new(self.api.base_url.clone()).with_api_keys(ApiKeys {
            sentiment: self.keys.sentiment_api_key.clone(),
            sarcasm: self.keys.sarcasm_api_key.clone(),
            language: self.keys.language_api_key.clone(),
        });
        if let Some(ms) = self.api.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(retries) = self.api.max_retries {
            config = config.with_retry(RetryPolicy::new(retries));
        }
        config
    }

    /// Check ranges and required values. Returns errors and warnings.
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let url = self.api.base_url.trim();
        if url.is_empty() {
            errors.push("api.base_url is required".to_string());
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("api.base_url '{}' must start with http:// or https://", url));
        }

        if self.api.timeout_ms == Some(0) {
            errors.push("api.timeout_ms must be greater than 0".to_string());
        }
        if matches!(self.api.max_retries, Some(n) if n > 10) {
            warnings.push("api.max_retries above 10 can stall the dashboard".to_string());
        }

        if self.thresholds.negative_threshold > 100 {
            errors.push("thresholds.negative_threshold must be 0-100".to_string());
        }
        if self.thresholds.sarcasm_confidence > 100 {
            errors.push("thresholds.sarcasm_confidence must be 0-100".to_string());
        }

        if self.refresh.poll_interval_secs == 0 {
            errors.push("refresh.poll_interval_secs must be at least 1".to_string());
        }

        if self.keys.sentiment_api_key.is_empty() && self.keys.language_api_key.is_empty() {
            warnings.push("no API keys configured; the service may reject analysis".to_string());
        }

        (errors, warnings)
    }
}

/// Review service connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Service root URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Total request timeout in milliseconds (default: per endpoint).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Retries for read requests (default: per endpoint).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
            max_retries: None,
        }
    }
}

/// API keys. Empty keys are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default)]
    pub sentiment_api_key: String,

    #[serde(default)]
    pub sarcasm_api_key: String,

    #[serde(default)]
    pub language_api_key: String,
}

/// Alert thresholds, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Negative share above which the dashboard raises an alert.
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: u8,

    /// Sarcasm score at or above which an analysis is flagged.
    #[serde(default = "default_sarcasm_confidence")]
    pub sarcasm_confidence: u8,
}

fn default_negative_threshold() -> u8 {
    20
}

fn default_sarcasm_confidence() -> u8 {
    75
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            negative_threshold: default_negative_threshold(),
            sarcasm_confidence: default_sarcasm_confidence(),
        }
    }
}

/// Background refresh settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between stats refreshes in `watch`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Generate a default reviews.toml config file.
pub fn generate_default_config() -> String {
    r#"# Review dashboard configuration

[api]
base_url = "http://localhost:5000"
# timeout_ms = 10000
# max_retries = 2

[keys]
sentiment_api_key = ""
sarcasm_api_key = ""
language_api_key = ""

[thresholds]
# Alert when negative reviews exceed this share (percent).
negative_threshold = 20
# Flag analyses whose sarcasm score reaches this confidence (percent).
sarcasm_confidence = 75

[refresh]
poll_interval_secs = 5
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config, CliConfig::default());
        let (errors, _) = config.validate();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://reviews.example.com"
            timeout_ms = 2500

            [thresholds]
            negative_threshold = 35
            "#,
        )
        .unwrap();
        assert_eq!(config.thresholds.negative_threshold, 35);
        assert_eq!(config.thresholds.sarcasm_confidence, 75);
        assert_eq!(config.refresh.poll_interval_secs, 5);

        let source = config.source_config();
        assert_eq!(source.base_url, "https://reviews.example.com");
        assert_eq!(source.timeout.unwrap().total, Duration::from_millis(2500));
        assert!(source.retry.is_none());
    }

    #[test]
    fn test_validate_reports_out_of_range_values() {
        let mut config = CliConfig::default();
        config.api.base_url = "localhost:5000".to_string();
        config.thresholds.sarcasm_confidence = 150;
        config.refresh.poll_interval_secs = 0;

        let (errors, _) = config.validate();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_json_config() {
        let config: CliConfig = serde_json::from_str(
            r#"{"keys": {"sentiment_api_key": "8e72jd7-demo-key"}, "refresh": {"poll_interval_secs": 10}}"#,
        )
        .unwrap();
        assert_eq!(config.keys.sentiment_api_key, "8e72jd7-demo-key");
        assert_eq!(config.refresh.poll_interval_secs, 10);
        assert_eq!(config.api.base_url, "http://localhost:5000");
    }
}
