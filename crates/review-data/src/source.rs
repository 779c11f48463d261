//! The review source boundary and its result types.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use review_core::{FilterCriteria, Review, ReviewId, ReviewResult, SentimentCounts, SentimentLabel};

/// Aggregate counts reported by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub total_reviews: i64,
    /// Counts per label. Compound analyzer labels are folded into their
    /// canonical label.
    pub sentiment_distribution: BTreeMap<SentimentLabel, i64>,
}

impl ReviewStats {
    /// Counts in the shape the metrics aggregator expects.
    ///
    /// Sarcastic reviews are only tracked when the source reported any.
    pub fn counts(&self) -> SentimentCounts {
        let get = |label| self.sentiment_distribution.get(&label).copied().unwrap_or(0);
        let counts = SentimentCounts::new(
            get(SentimentLabel::Positive),
            get(SentimentLabel::Neutral),
            get(SentimentLabel::Negative),
            self.total_reviews,
        );
        match self.sentiment_distribution.get(&SentimentLabel::Sarcastic) {
            Some(n) => counts.with_sarcastic(*n),
            None => counts,
        }
    }
}

/// Sentiment part of a text analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Label exactly as the analyzer reported it.
    pub raw_label: String,
    pub score: f64,
}

/// Sarcasm part of a text analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SarcasmResult {
    pub score: f64,
    pub is_sarcastic: bool,
}

/// Result of analyzing a single text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAnalysis {
    /// Stored review created for this text, when the service reports one.
    pub review_id: Option<ReviewId>,
    pub sentiment: SentimentResult,
    pub sarcasm: SarcasmResult,
    pub language: String,
    /// Corpus stats after storing the analyzed text.
    pub stats: Option<ReviewStats>,
}

impl TextAnalysis {
    /// Whether the sarcasm score reaches a confidence threshold (percent).
    pub fn is_sarcastic_at(&self, confidence_pct: u8) -> bool {
        self.sarcasm.score * 100.0 >= confidence_pct as f64
    }
}

/// Acknowledgement of a rating update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingAck {
    pub review_id: ReviewId,
    pub rating: u8,
}

/// Acknowledgement of a helpful-vote update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpfulAck {
    pub review_id: ReviewId,
    pub increment: bool,
}

/// A language the analyzer accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedLanguage {
    pub code: String,
    pub name: String,
}

/// Source of review data and analysis.
///
/// Implementations perform caller-side validation (empty analysis text,
/// ratings outside 1-5) before any I/O.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Aggregate counts over the whole corpus.
    async fn fetch_stats(&self) -> ReviewResult<ReviewStats>;

    /// Reviews matching `criteria`, in source order. No match is an empty
    /// list, not an error.
    async fn fetch_reviews(&self, criteria: &FilterCriteria) -> ReviewResult<Vec<Review>>;

    /// Set a review's star rating.
    async fn submit_rating(&self, review_id: &ReviewId, rating: i64) -> ReviewResult<RatingAck>;

    /// Analyze a single text.
    async fn analyze_text(&self, text: &str, language: &str) -> ReviewResult<TextAnalysis>;

    /// Add (or withdraw) a helpful vote.
    async fn mark_helpful(&self, review_id: &ReviewId, increment: bool) -> ReviewResult<HelpfulAck>;

    /// Languages accepted by the analyzer.
    async fn fetch_languages(&self) -> ReviewResult<Vec<SupportedLanguage>>;
}

/// Reject empty or whitespace-only analysis text.
pub fn check_analysis_text(text: &str) -> ReviewResult<()> {
    if text.trim().is_empty() {
        return Err(review_core::ReviewError::validation("text to analyze must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counts_track_sarcasm_only_when_reported() {
        let mut stats = ReviewStats {
            total_reviews: 4,
            sentiment_distribution: BTreeMap::from([
                (SentimentLabel::Positive, 1),
                (SentimentLabel::Negative, 1),
                (SentimentLabel::Neutral, 2),
            ]),
        };
        assert_eq!(stats.counts(), SentimentCounts::new(1, 2, 1, 4));

        stats.sentiment_distribution.insert(SentimentLabel::Sarcastic, 1);
        stats.total_reviews = 5;
        assert_eq!(stats.counts().sarcastic, Some(1));
        assert!(stats.counts().validate().is_ok());
    }

    #[test]
    fn test_blank_analysis_text_rejected() {
        assert!(check_analysis_text("").unwrap_err().is_validation());
        assert!(check_analysis_text(" \n\t").unwrap_err().is_validation());
        assert!(check_analysis_text("fine").is_ok());
    }
}
