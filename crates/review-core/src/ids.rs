//! Review identifier newtype.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque, unique review identifier.
///
/// The service stores integer keys, but identifiers are treated as opaque
/// strings everywhere past the wire boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReviewId(String);

impl ReviewId {
    /// Create a new ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// JSON form expected by the write endpoints: numeric when the ID is a
    /// canonical decimal integer, string otherwise. IDs such as "007" or
    /// "+7" stay strings so they reach the service unchanged.
    pub fn to_json(&self) -> serde_json::Value {
        match self.0.parse::<u64>() {
            Ok(n) if n.to_string() == self.0 => serde_json::Value::from(n),
            _ => serde_json::Value::from(self.0.clone()),
        }
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReviewId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReviewId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for ReviewId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl AsRef<str> for ReviewId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ReviewId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Ok(ReviewId(n.to_string())),
            RawId::Text(s) if !s.trim().is_empty() => Ok(ReviewId(s)),
            RawId::Text(_) => Err(serde::de::Error::custom("review id must not be empty")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_integer_and_string() {
        let a: ReviewId = serde_json::from_str("42").unwrap();
        let b: ReviewId = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(a.as_str(), "42");
        assert_eq!(b.as_str(), "abc-1");
        assert!(serde_json::from_str::<ReviewId>("\"\"").is_err());
    }

    #[test]
    fn test_to_json_keeps_numeric_ids_numeric() {
        assert_eq!(ReviewId::from(7u64).to_json(), serde_json::json!(7));
        assert_eq!(ReviewId::new("r-7").to_json(), serde_json::json!("r-7"));
    }

    #[test]
    fn test_to_json_keeps_padded_ids_as_strings() {
        assert_eq!(ReviewId::new("007").to_json(), serde_json::json!("007"));
        assert_eq!(ReviewId::new("+7").to_json(), serde_json::json!("+7"));
        assert_eq!(ReviewId::new("0").to_json(), serde_json::json!(0));
    }
}
