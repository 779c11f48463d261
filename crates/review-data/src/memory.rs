//! In-process review source.

use async_trait::async_trait;
use tokio::sync::RwLock;

use review_core::review::check_star_rating;
use review_core::{
    FilterCriteria, Review, ReviewError, ReviewId, ReviewQuery, ReviewResult, SentimentCounts,
};

use crate::source::{
    check_analysis_text, HelpfulAck, RatingAck, ReviewSource, ReviewStats, SupportedLanguage,
    TextAnalysis,
};

/// Review source over a fixed in-memory list.
///
/// Filtering goes through the same query parameters the HTTP source sends,
/// so it evaluates criteria exactly as a conforming service would.
pub struct MemoryReviewSource {
    reviews: RwLock<Vec<Review>>,
    languages: Vec<SupportedLanguage>,
    analysis: Option<TextAnalysis>,
}

impl MemoryReviewSource {
    /// Create a new source over `reviews`.
    pub fn new(reviews: Vec<Review>) -> Self {
        Self {
            reviews: RwLock::new(reviews),
            languages: Vec::new(),
            analysis: None,
        }
    }

    /// Languages returned by [`ReviewSource::fetch_languages`].
    pub fn with_languages(mut self, languages: Vec<SupportedLanguage>) -> Self {
        self.languages = languages;
        self
    }

    /// Canned result for [`ReviewSource::analyze_text`].
    pub fn with_analysis(mut self, analysis: TextAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    /// Snapshot of the stored reviews.
    pub async fn reviews(&self) -> Vec<Review> {
        self.reviews.read().await.clone()
    }

    async fn update<F>(&self, review_id: &ReviewId, f: F) -> ReviewResult<()>
    where
        F: FnOnce(&mut Review),
    {
        let mut reviews = self.reviews.write().await;
        let review = reviews
            .iter_mut()
            .find(|r| &r.id == review_id)
            .ok_or_else(|| ReviewError::Server(format!("review {} not found", review_id)))?;
        f(review);
        Ok(())
    }
}

#[async_trait]
impl ReviewSource for MemoryReviewSource {
    async fn fetch_stats(&self) -> ReviewResult<ReviewStats> {
        let counts = SentimentCounts::from_reviews(&self.reviews.read().await);
        let sentiment_distribution = review_core::SentimentLabel::ALL
            .into_iter()
            .map(|label| (label, counts.count(label)))
            .filter(|(_, n)| *n > 0)
            .collect();
        Ok(ReviewStats {
            total_reviews: counts.total,
            sentiment_distribution,
        })
    }

    async fn fetch_reviews(&self, criteria: &FilterCriteria) -> ReviewResult<Vec<Review>> {
        let pairs = ReviewQuery::new(criteria.clone()).to_query_pairs();
        let query = ReviewQuery::from_query_pairs(pairs)?;
        Ok(query.apply(&self.reviews.read().await))
    }

    async fn submit_rating(&self, review_id: &ReviewId, rating: i64) -> ReviewResult<RatingAck> {
        let rating = check_star_rating(rating)?;
        self.update(review_id, |r| r.star_rating = rating).await?;
        Ok(RatingAck {
            review_id: review_id.clone(),
            rating,
        })
    }

    async fn analyze_text(&self, text: &str, language: &str) -> ReviewResult<TextAnalysis> {
        check_analysis_text(text)?;
        let mut analysis = self
            .analysis
            .clone()
            .ok_or_else(|| ReviewError::Server("analysis is not available".to_string()))?;
        analysis.language = language.to_string();
        Ok(analysis)
    }

    async fn mark_helpful(&self, review_id: &ReviewId, increment: bool) -> ReviewResult<HelpfulAck> {
        self.update(review_id, |r| {
            r.helpful_count = if increment {
                r.helpful_count.saturating_add(1)
            } else {
                r.helpful_count.saturating_sub(1)
            };
        })
        .await?;
        Ok(HelpfulAck {
            review_id: review_id.clone(),
            increment,
        })
    }

    async fn fetch_languages(&self) -> ReviewResult<Vec<SupportedLanguage>> {
        Ok(self.languages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_core::SentimentLabel;

    fn sample() -> MemoryReviewSource {
        MemoryReviewSource::new(vec![
            Review::new(1u64, "Great product! Exactly what I needed.", SentimentLabel::Positive, 5)
                .unwrap()
                .with_username("John"),
            Review::new(2u64, "Not worth the money.", SentimentLabel::Negative, 2).unwrap(),
            Review::new(3u64, "It works as expected.", SentimentLabel::Neutral, 3).unwrap(),
            Review::new(4u64, "Producto excelente", SentimentLabel::Positive, 4)
                .unwrap()
                .with_language("Spanish"),
        ])
    }

    #[tokio::test]
    async fn test_fetch_reviews_matches_local_predicate() {
        let source = sample();
        let criteria = FilterCriteria::new()
            .with_sentiment_toggled(SentimentLabel::Positive)
            .with_rating_range(4, 5)
            .unwrap();
        let remote = source.fetch_reviews(&criteria).await.unwrap();
        let local = review_core::query::apply(&criteria, &source.reviews().await);
        assert_eq!(remote, local);
        assert_eq!(remote.len(), 2);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let source = sample();
        let criteria = FilterCriteria::new().with_search_text("nothing like this");
        assert!(source.fetch_reviews(&criteria).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_from_stored_reviews() {
        let stats = sample().fetch_stats().await.unwrap();
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.sentiment_distribution[&SentimentLabel::Positive], 2);
        assert!(!stats.sentiment_distribution.contains_key(&SentimentLabel::Sarcastic));
    }

    #[tokio::test]
    async fn test_rating_validated_and_applied() {
        let source = sample();
        let id = ReviewId::from(2u64);
        assert!(source.submit_rating(&id, 6).await.unwrap_err().is_validation());

        let ack = source.submit_rating(&id, 3).await.unwrap();
        assert_eq!(ack.rating, 3);
        assert_eq!(source.reviews().await[1].star_rating, 3);

        let missing = source.submit_rating(&ReviewId::new("99"), 3).await;
        assert!(matches!(missing, Err(ReviewError::Server(_))));
    }

    #[tokio::test]
    async fn test_helpful_votes_never_go_negative() {
        let source = sample();
        let id = ReviewId::from(3u64);
        source.mark_helpful(&id, false).await.unwrap();
        assert_eq!(source.reviews().await[2].helpful_count, 0);
        source.mark_helpful(&id, true).await.unwrap();
        assert_eq!(source.reviews().await[2].helpful_count, 1);
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_text() {
        let err = sample().analyze_text("   ", "en").await.unwrap_err();
        assert!(err.is_validation());
    }
}
