//! Review error types.

use thiserror::Error;

/// Errors surfaced by criteria updates, aggregation and data adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// Caller-side precondition failure. Never reaches the network.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport failure or non-success status code.
    #[error("Network error{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// Transport succeeded but the payload reported `success: false`.
    #[error("Server error: {0}")]
    Server(String),

    /// Payload missing required fields or of unexpected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ReviewError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        ReviewError::Validation(msg.into())
    }

    /// Create a network error without a status code.
    pub fn network(msg: impl Into<String>) -> Self {
        ReviewError::Network {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a network error for a non-success HTTP status.
    pub fn http_status(status: u16, msg: impl Into<String>) -> Self {
        ReviewError::Network {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        ReviewError::Parse(msg.into())
    }

    /// Build a server error from an envelope's `details` and `error` fields.
    ///
    /// `details` wins over `error`; if both are absent or blank a generic
    /// message is used.
    pub fn from_envelope(details: Option<&str>, error: Option<&str>) -> Self {
        let message = [details, error]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
            .unwrap_or("Request failed")
            .to_string();
        ReviewError::Server(message)
    }

    /// Short category name, used for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ReviewError::Validation(_) => "validation",
            ReviewError::Network { .. } => "network",
            ReviewError::Server(_) => "server",
            ReviewError::Parse(_) => "parse",
        }
    }

    /// Whether this error was raised before any network interaction.
    pub fn is_validation(&self) -> bool {
        matches!(self, ReviewError::Validation(_))
    }
}

impl From<serde_json::Error> for ReviewError {
    fn from(e: serde_json::Error) -> Self {
        ReviewError::Parse(e.to_string())
    }
}

/// Result alias for review operations.
pub type ReviewResult<T> = Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_prefers_details() {
        let err = ReviewError::from_envelope(Some("Text field cannot be empty"), Some("Invalid input"));
        assert_eq!(err, ReviewError::Server("Text field cannot be empty".to_string()));
    }

    #[test]
    fn test_envelope_falls_back_to_error_then_generic() {
        let err = ReviewError::from_envelope(None, Some("Invalid rating data"));
        assert_eq!(err, ReviewError::Server("Invalid rating data".to_string()));

        let err = ReviewError::from_envelope(Some("  "), None);
        assert_eq!(err, ReviewError::Server("Request failed".to_string()));
    }

    #[test]
    fn test_network_display_includes_status() {
        let err = ReviewError::http_status(503, "Service Unavailable");
        assert_eq!(err.to_string(), "Network error (HTTP 503): Service Unavailable");
        assert_eq!(ReviewError::network("refused").to_string(), "Network error: refused");
    }
}
