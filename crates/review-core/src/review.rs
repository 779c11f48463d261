//! Review records and sentiment labels.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, ReviewResult};
use crate::ids::ReviewId;

/// Lowest star rating a review can carry.
pub const MIN_STAR_RATING: u8 = 1;
/// Highest star rating a review can carry.
pub const MAX_STAR_RATING: u8 = 5;

/// Categorical judgment of review tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    Sarcastic,
}

impl SentimentLabel {
    /// All labels in display order.
    pub const ALL: [SentimentLabel; 4] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
        SentimentLabel::Sarcastic,
    ];

    /// Canonical name, as used in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Sarcastic => "Sarcastic",
        }
    }

    /// Star weight used for the dashboard's average rating.
    ///
    /// Sarcastic reviews carry no weight of their own.
    pub fn rating_weight(&self) -> Option<u32> {
        match self {
            SentimentLabel::Positive => Some(5),
            SentimentLabel::Neutral => Some(3),
            SentimentLabel::Negative => Some(1),
            SentimentLabel::Sarcastic => None,
        }
    }

    /// Decode a label as emitted by the analyzer.
    ///
    /// Exact names match case-insensitively. Compound labels are folded:
    /// anything mentioning sarcasm is `Sarcastic`, then `negative`,
    /// `positive` and `neutral` are tried in that order.
    pub fn parse_lenient(raw: &str) -> ReviewResult<Self> {
        let lower = raw.trim().to_lowercase();
        let exact = match lower.as_str() {
            "positive" => Some(SentimentLabel::Positive),
            "neutral" => Some(SentimentLabel::Neutral),
            "negative" => Some(SentimentLabel::Negative),
            "sarcastic" => Some(SentimentLabel::Sarcastic),
            _ => None,
        };
        if let Some(label) = exact {
            return Ok(label);
        }

        if lower.contains("sarcas") {
            Ok(SentimentLabel::Sarcastic)
        } else if lower.contains("negative") {
            Ok(SentimentLabel::Negative)
        } else if lower.contains("positive") {
            Ok(SentimentLabel::Positive)
        } else if lower.contains("neutral") {
            Ok(SentimentLabel::Neutral)
        } else {
            Err(ReviewError::parse(format!("unknown sentiment label '{}'", raw)))
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = ReviewError;

    /// Strict parse of a canonical name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SentimentLabel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReviewError::validation(format!("unknown sentiment '{}'", s)))
    }
}

/// Validate a star rating.
pub fn check_star_rating(rating: i64) -> ReviewResult<u8> {
    if (MIN_STAR_RATING as i64..=MAX_STAR_RATING as i64).contains(&rating) {
        Ok(rating as u8)
    } else {
        Err(ReviewError::validation(format!(
            "rating must be between {} and {}, got {}",
            MIN_STAR_RATING, MAX_STAR_RATING, rating
        )))
    }
}

/// A product review as fetched from the service.
///
/// Read-only once fetched; shared between consumers by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub username: String,
    pub text: String,
    pub sentiment_label: SentimentLabel,
    /// Analyzer confidence, in [0,1].
    pub sentiment_score: f64,
    /// Independent sarcasm probability, in [0,1].
    pub sarcasm_score: f64,
    /// Star rating, in [1,5].
    pub star_rating: u8,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub helpful_count: u32,
}

impl Review {
    /// Create a review with default metadata.
    ///
    /// Fails if `star_rating` is outside [1,5].
    pub fn new(
        id: impl Into<ReviewId>,
        text: impl Into<String>,
        sentiment_label: SentimentLabel,
        star_rating: u8,
    ) -> ReviewResult<Self> {
        let star_rating = check_star_rating(star_rating as i64)?;
        Ok(Self {
            id: id.into(),
            username: "Anonymous".to_string(),
            text: text.into(),
            sentiment_label,
            sentiment_score: 0.0,
            sarcasm_score: 0.0,
            star_rating,
            language: "English".to_string(),
            created_at: Utc::now(),
            helpful_count: 0,
        })
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_helpful_count(mut self, count: u32) -> Self {
        self.helpful_count = count;
        self
    }

    /// Set analyzer scores, clamped into [0,1].
    pub fn with_scores(mut self, sentiment: f64, sarcasm: f64) -> Self {
        self.sentiment_score = sentiment.clamp(0.0, 1.0);
        self.sarcasm_score = sarcasm.clamp(0.0, 1.0);
        self
    }
}
