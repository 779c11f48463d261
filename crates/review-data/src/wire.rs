//! JSON shapes exchanged with the review service and their decoding into
//! domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use review_core::review::check_star_rating;
use review_core::{Review, ReviewError, ReviewId, ReviewResult, SentimentLabel};

use crate::source::{ReviewStats, SarcasmResult, SentimentResult, SupportedLanguage, TextAnalysis};

/// SQL-style timestamps as stored by the service.
const SQL_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// A number that may arrive as an integer, a float or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberLike {
    fn as_i64(&self, field: &str) -> ReviewResult<i64> {
        match self {
            NumberLike::Int(n) => Ok(*n),
            NumberLike::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            NumberLike::Float(f) => Err(ReviewError::parse(format!("{} must be an integer, got {}", field, f))),
            NumberLike::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ReviewError::parse(format!("{} must be an integer, got '{}'", field, s))),
        }
    }
}

/// A review row as returned by `GET /api/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireReview {
    pub id: ReviewId,
    #[serde(default)]
    pub username: Option<String>,
    pub text: String,
    #[serde(alias = "sentiment_label")]
    pub sentiment: String,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub sarcasm_score: Option<f64>,
    #[serde(default)]
    pub star_rating: Option<NumberLike>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub helpful_count: Option<NumberLike>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WireReview {
    /// Decode into a [`Review`]. Missing timestamps become `fetched_at`.
    pub fn into_review(self, fetched_at: DateTime<Utc>) -> ReviewResult<Review> {
        let label = SentimentLabel::parse_lenient(&self.sentiment)?;

        let rating = self
            .star_rating
            .as_ref()
            .ok_or_else(|| ReviewError::parse(format!("review {} has no star_rating", self.id)))?
            .as_i64("star_rating")?;
        let rating = check_star_rating(rating)
            .map_err(|_| ReviewError::parse(format!("review {} has star_rating {}", self.id, rating)))?;

        let helpful = match &self.helpful_count {
            Some(n) => n.as_i64("helpful_count")?,
            None => 0,
        };
        let helpful = u32::try_from(helpful)
            .map_err(|_| ReviewError::parse(format!("review {} has helpful_count {}", self.id, helpful)))?;

        let created_at = match self.created_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_timestamp(raw)?,
            _ => fetched_at,
        };

        let sentiment_score = unit_score(&self.id, "sentiment_score", self.sentiment_score)?;
        let sarcasm_score = unit_score(&self.id, "sarcasm_score", self.sarcasm_score)?;

        let mut review = Review::new(self.id, self.text, label, rating)?
            .with_scores(sentiment_score, sarcasm_score)
            .with_created_at(created_at)
            .with_helpful_count(helpful);
        if let Some(username) = self.username.filter(|u| !u.trim().is_empty()) {
            review = review.with_username(username);
        }
        if let Some(language) = self.language.filter(|l| !l.trim().is_empty()) {
            review = review.with_language(language);
        }
        Ok(review)
    }
}

fn unit_score(id: &ReviewId, field: &str, score: Option<f64>) -> ReviewResult<f64> {
    match score {
        None => Ok(0.0),
        Some(s) if (0.0..=1.0).contains(&s) => Ok(s),
        Some(s) => Err(ReviewError::parse(format!("review {} has {} {}", id, field, s))),
    }
}

/// Parse an RFC 3339 timestamp, or a naive SQL timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> ReviewResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, SQL_TIMESTAMP)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| ReviewError::parse(format!("unrecognized timestamp '{}'", raw)))
}

/// Response of `GET /api/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireStats {
    pub total_reviews: i64,
    #[serde(default)]
    pub sentiment_distribution: BTreeMap<String, i64>,
}

impl WireStats {
    /// Fold raw labels into canonical ones, summing counts that collapse
    /// onto the same label.
    pub fn into_stats(self) -> ReviewResult<ReviewStats> {
        let mut distribution = BTreeMap::new();
        for (raw, count) in self.sentiment_distribution {
            let label = SentimentLabel::parse_lenient(&raw)?;
            let slot = distribution.entry(label).or_insert(0i64);
            *slot = slot.checked_add(count).ok_or_else(|| {
                ReviewError::parse(format!("'{}' count overflows when folded into {}", raw, label))
            })?;
        }
        Ok(ReviewStats {
            total_reviews: self.total_reviews,
            sentiment_distribution: distribution,
        })
    }
}

/// Fields shared by every enveloped response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvelopeStatus {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl EnvelopeStatus {
    /// `Ok` when the envelope reports success.
    pub fn check(&self) -> ReviewResult<()> {
        match self.success {
            Some(true) => Ok(()),
            Some(false) => Err(ReviewError::from_envelope(
                self.details.as_deref(),
                self.error.as_deref(),
            )),
            None => Err(ReviewError::parse("response has no 'success' field")),
        }
    }

    /// Message carried by an error body, if any.
    pub fn message(&self) -> Option<String> {
        [self.details.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// Response of `GET /api/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewsEnvelope {
    #[serde(flatten)]
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub reviews: Option<Vec<WireReview>>,
}

impl ReviewsEnvelope {
    /// Decode the review rows. Rows that cannot be decoded are skipped
    /// with a warning, so unrated rows stored for analyzed texts do not
    /// hide the rest of the list.
    pub fn into_reviews(self, fetched_at: DateTime<Utc>) -> ReviewResult<Vec<Review>> {
        self.status.check()?;
        let rows = self
            .reviews
            .ok_or_else(|| ReviewError::parse("response has no 'reviews' field"))?;

        let received = rows.len();
        let mut reviews = Vec::with_capacity(received);
        for row in rows {
            match row.into_review(fetched_at) {
                Ok(review) => reviews.push(review),
                Err(e) => debug!(error = %e, "skipping review row"),
            }
        }

        let skipped = received - reviews.len();
        if skipped > 0 {
            warn!(skipped, received, "skipped undecodable review rows");
        }
        Ok(reviews)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSentiment {
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSarcasm {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub is_sarcastic: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireAnalysis {
    #[serde(default)]
    pub id: Option<ReviewId>,
    pub sentiment: WireSentiment,
    pub sarcasm: WireSarcasm,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stats: Option<WireStats>,
}

/// Response of `POST /api/analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeEnvelope {
    #[serde(flatten)]
    pub status: EnvelopeStatus,
    #[serde(default)]
    pub data: Option<WireAnalysis>,
}

impl AnalyzeEnvelope {
    /// Decode the analysis. `requested_language` fills in a missing
    /// language field.
    pub fn into_analysis(self, requested_language: &str) -> ReviewResult<TextAnalysis> {
        self.status.check()?;
        let data = self
            .data
            .ok_or_else(|| ReviewError::parse("response has no 'data' field"))?;

        let label = SentimentLabel::parse_lenient(&data.sentiment.label)?;
        let sarcasm_score = data.sarcasm.score.clamp(0.0, 1.0);
        let stats = data.stats.map(WireStats::into_stats).transpose()?;

        Ok(TextAnalysis {
            review_id: data.id,
            sentiment: SentimentResult {
                label,
                raw_label: data.sentiment.label,
                score: data.sentiment.score.clamp(0.0, 1.0),
            },
            sarcasm: SarcasmResult {
                score: sarcasm_score,
                is_sarcastic: data.sarcasm.is_sarcastic.unwrap_or(sarcasm_score > 0.5),
            },
            language: data
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| requested_language.to_string()),
            stats,
        })
    }
}

/// Response of the write endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AckEnvelope {
    #[serde(flatten)]
    pub status: EnvelopeStatus,
}

/// Response of `GET /api/languages`.
pub type LanguagesResponse = Vec<SupportedLanguage>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_review_row_with_sql_timestamp_and_defaults() {
        let row: WireReview = serde_json::from_value(json!({
            "id": 3,
            "text": "It works as expected.",
            "sentiment": "Neutral",
            "sentiment_score": 0.5,
            "star_rating": 3,
            "language": "English",
            "username": null,
            "helpful_count": 0,
            "created_at": "2024-02-11 08:30:00"
        }))
        .unwrap();
        let review = row.into_review(fetched_at()).unwrap();
        assert_eq!(review.id.as_str(), "3");
        assert_eq!(review.username, "Anonymous");
        assert_eq!(review.sarcasm_score, 0.0);
        assert_eq!(
            review.created_at,
            Utc.with_ymd_and_hms(2024, 2, 11, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_timestamp_defaults_to_fetch_time() {
        let row: WireReview = serde_json::from_value(json!({
            "id": "r-1", "text": "ok", "sentiment": "positive", "star_rating": "5"
        }))
        .unwrap();
        let review = row.into_review(fetched_at()).unwrap();
        assert_eq!(review.created_at, fetched_at());
        assert_eq!(review.star_rating, 5);
        assert_eq!(review.sentiment_label, SentimentLabel::Positive);
    }

    #[test]
    fn test_unrated_row_is_a_parse_error() {
        for rating in [json!(0), json!(null), json!(7)] {
            let row: WireReview = serde_json::from_value(json!({
                "id": 1, "text": "x", "sentiment": "Neutral", "star_rating": rating
            }))
            .unwrap();
            assert!(matches!(row.into_review(fetched_at()), Err(ReviewError::Parse(_))));
        }
    }

    #[test]
    fn test_out_of_range_score_is_a_parse_error() {
        let row: WireReview = serde_json::from_value(json!({
            "id": 9, "text": "x", "sentiment": "Positive", "star_rating": 4, "sarcasm_score": 1.7
        }))
        .unwrap();
        let err = row.into_review(fetched_at()).unwrap_err();
        assert_eq!(err, ReviewError::parse("review 9 has sarcasm_score 1.7"));
    }

    #[test]
    fn test_reviews_envelope_skips_unrated_rows() {
        let env: ReviewsEnvelope = serde_json::from_value(json!({
            "success": true,
            "reviews": [
                {"id": 1, "text": "Great", "sentiment": "Positive", "star_rating": 5},
                {"id": 2, "text": "analyzed only", "sentiment": "Neutral", "star_rating": 0},
                {"id": 3, "text": "Meh", "sentiment": "Neutral", "star_rating": 3}
            ]
        }))
        .unwrap();
        let reviews = env.into_reviews(fetched_at()).unwrap();
        let ids: Vec<&str> = reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn test_stats_fold_rejects_overflowing_counts() {
        let stats: WireStats = serde_json::from_value(json!({
            "total_reviews": 1,
            "sentiment_distribution": {
                "Negative": i64::MAX,
                "potentially negative": 1
            }
        }))
        .unwrap();
        assert!(matches!(stats.into_stats(), Err(ReviewError::Parse(_))));
    }

    #[test]
    fn test_stats_fold_compound_labels() {
        let stats: WireStats = serde_json::from_value(json!({
            "total_reviews": 6,
            "sentiment_distribution": {
                "Positive": 3,
                "Negative": 1,
                "potentially negative": 1,
                "Neutral": 1
            }
        }))
        .unwrap();
        let stats = stats.into_stats().unwrap();
        assert_eq!(stats.sentiment_distribution[&SentimentLabel::Negative], 2);
        assert!(stats.counts().validate().is_ok());
    }

    #[test]
    fn test_envelope_failure_prefers_details() {
        let env: AnalyzeEnvelope = serde_json::from_value(json!({
            "success": false,
            "error": "Invalid input",
            "details": "Text field cannot be empty",
            "data": null
        }))
        .unwrap();
        assert_eq!(
            env.into_analysis("en").unwrap_err(),
            ReviewError::Server("Text field cannot be empty".to_string())
        );
    }

    #[test]
    fn test_analysis_defaults_sarcasm_flag_from_score() {
        let env: AnalyzeEnvelope = serde_json::from_value(json!({
            "success": true,
            "data": {
                "sentiment": {"label": "sarcastically positive (actually negative)", "score": 0.8},
                "sarcasm": {"score": 0.91}
            }
        }))
        .unwrap();
        let analysis = env.into_analysis("en").unwrap();
        assert_eq!(analysis.sentiment.label, SentimentLabel::Sarcastic);
        assert!(analysis.sarcasm.is_sarcastic);
        assert_eq!(analysis.language, "en");
        assert!(analysis.review_id.is_none());
    }
}
