//! Review query engine.
//!
//! One mapping from [`FilterCriteria`] serves both evaluation paths: a local
//! predicate over fetched reviews, and the query parameters sent to the
//! reviews endpoint. [`ReviewQuery::from_query_pairs`] inverts
//! [`ReviewQuery::to_query_pairs`] exactly, so a server (or an in-memory
//! stand-in) can rebuild the same predicate from the request.

use crate::criteria::FilterCriteria;
use crate::error::{ReviewError, ReviewResult};
use crate::review::{Review, SentimentLabel};

/// Query parameter names understood by the reviews endpoint.
pub mod params {
    pub const SEARCH: &str = "search";
    pub const SENTIMENTS: &str = "sentiments";
    pub const RATING_MIN: &str = "rating_min";
    pub const RATING_MAX: &str = "rating_max";
    pub const LANGUAGES: &str = "languages";
}

/// A compiled filter over reviews.
#[derive(Debug, Clone)]
pub struct ReviewQuery {
    criteria: FilterCriteria,
    needle: String,
}

impl ReviewQuery {
    /// Compile criteria into a query.
    pub fn new(criteria: FilterCriteria) -> Self {
        let needle = criteria.search_text().to_lowercase();
        Self { criteria, needle }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Whether a single review passes every dimension.
    pub fn matches(&self, review: &Review) -> bool {
        self.matches_search(review)
            && self.matches_sentiment(review)
            && self.criteria.rating_range().contains(review.star_rating)
            && self.matches_language(review)
    }

    fn matches_search(&self, review: &Review) -> bool {
        self.needle.is_empty() || review.text.to_lowercase().contains(&self.needle)
    }

    fn matches_sentiment(&self, review: &Review) -> bool {
        let sentiments = self.criteria.sentiments();
        sentiments.is_empty() || sentiments.contains(&review.sentiment_label)
    }

    fn matches_language(&self, review: &Review) -> bool {
        let languages = self.criteria.languages();
        languages.is_empty() || languages.contains(&review.language)
    }

    /// Filter reviews, preserving their original order.
    pub fn apply(&self, reviews: &[Review]) -> Vec<Review> {
        reviews.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// Filter an owned collection without cloning survivors.
    pub fn apply_owned(&self, reviews: Vec<Review>) -> Vec<Review> {
        reviews.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Query parameters for the remote reviews endpoint.
    ///
    /// Empty sets and empty search text are omitted; rating bounds are
    /// always sent.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let c = &self.criteria;
        let mut pairs = Vec::with_capacity(5);

        if !c.search_text().is_empty() {
            pairs.push((params::SEARCH, c.search_text().to_string()));
        }
        if !c.sentiments().is_empty() {
            let csv = c
                .sentiments()
                .iter()
                .map(SentimentLabel::as_str)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push((params::SENTIMENTS, csv));
        }
        pairs.push((params::RATING_MIN, c.rating_range().min().to_string()));
        pairs.push((params::RATING_MAX, c.rating_range().max().to_string()));
        if !c.languages().is_empty() {
            let csv = c
                .languages()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push((params::LANGUAGES, csv));
        }

        pairs
    }

    /// Rebuild a query from request parameters.
    ///
    /// Unknown parameters are ignored; missing ones take their match-all
    /// default. Malformed values are a validation error.
    pub fn from_query_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> ReviewResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = FilterCriteria::new();
        let mut rating_min = None;
        let mut rating_max = None;

        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                params::SEARCH => criteria = criteria.with_search_text(value),
                params::SENTIMENTS => {
                    let labels = split_csv(value)
                        .map(str::parse::<SentimentLabel>)
                        .collect::<ReviewResult<Vec<_>>>()?;
                    criteria = criteria.with_sentiments(labels);
                }
                params::RATING_MIN => rating_min = Some(parse_bound(params::RATING_MIN, value)?),
                params::RATING_MAX => rating_max = Some(parse_bound(params::RATING_MAX, value)?),
                params::LANGUAGES => criteria = criteria.with_languages(split_csv(value))?,
                _ => {}
            }
        }

        let defaults = criteria.rating_range();
        let criteria = criteria.with_rating_range(
            rating_min.unwrap_or(defaults.min() as i64),
            rating_max.unwrap_or(defaults.max() as i64),
        )?;

        Ok(Self::new(criteria))
    }
}

impl From<FilterCriteria> for ReviewQuery {
    fn from(criteria: FilterCriteria) -> Self {
        Self::new(criteria)
    }
}

/// Filter reviews by criteria. Stable and O(n).
pub fn apply(criteria: &FilterCriteria, reviews: &[Review]) -> Vec<Review> {
    ReviewQuery::new(criteria.clone()).apply(reviews)
}

fn split_csv(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').filter(|s| !s.is_empty())
}

fn parse_bound(name: &str, value: &str) -> ReviewResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ReviewError::validation(format!("{} must be an integer, got '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::SentimentLabel::*;

    fn review(id: &str, text: &str, label: SentimentLabel, stars: u8, language: &str) -> Review {
        Review::new(id, text, label, stars)
            .unwrap()
            .with_language(language)
    }

    fn corpus() -> Vec<Review> {
        vec![
            review("1", "Great product! Exactly what I needed.", Positive, 5, "English"),
            review("2", "Not worth the money.", Negative, 2, "English"),
            review("3", "It works as expected.", Neutral, 3, "Hindi"),
            review("4", "Could be better.", Neutral, 3, "English"),
            review("5", "Oh great, it broke on day one.", Sarcastic, 1, "Tamil"),
        ]
    }

    #[test]
    fn test_default_criteria_is_identity() {
        let reviews = corpus();
        assert_eq!(apply(&FilterCriteria::new(), &reviews), reviews);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let reviews = corpus();
        let c = FilterCriteria::new()
            .with_search_text("great")
            .with_rating_range(1, 5)
            .unwrap();
        let once = apply(&c, &reviews);
        assert_eq!(apply(&c, &once), once);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let c = FilterCriteria::new().with_search_text("great");
        let ids: Vec<_> = apply(&c, &corpus()).into_iter().map(|r| r.id.into_inner()).collect();
        assert_eq!(ids, vec!["1", "5"]);

        let c = FilterCriteria::new().with_search_text("GREAT PRODUCT");
        assert_eq!(apply(&c, &corpus()).len(), 1);
    }

    #[test]
    fn test_rating_bounds_are_inclusive() {
        let c = FilterCriteria::new().with_rating_range(2, 3).unwrap();
        let stars: Vec<u8> = apply(&c, &corpus()).iter().map(|r| r.star_rating).collect();
        assert_eq!(stars, vec![2, 3, 3]);
    }

    #[test]
    fn test_dimensions_are_anded_and_order_preserved() {
        let c = FilterCriteria::new()
            .with_sentiment_toggled(Neutral)
            .with_sentiment_toggled(Negative)
            .with_language_toggled("English")
            .unwrap();
        let ids: Vec<_> = apply(&c, &corpus()).into_iter().map(|r| r.id.into_inner()).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }

    #[test]
    fn test_query_pairs_round_trip() {
        let c = FilterCriteria::new()
            .with_search_text("works, mostly")
            .with_sentiment_toggled(Sarcastic)
            .with_sentiment_toggled(Positive)
            .with_rating_range(2, 5)
            .unwrap()
            .with_languages(["Hindi", "English"])
            .unwrap();
        let query = ReviewQuery::new(c.clone());
        let pairs = query.to_query_pairs();

        assert!(pairs.contains(&("sentiments", "Positive,Sarcastic".to_string())));
        assert!(pairs.contains(&("languages", "English,Hindi".to_string())));
        assert!(pairs.contains(&("rating_min", "2".to_string())));

        let rebuilt = ReviewQuery::from_query_pairs(pairs).unwrap();
        assert_eq!(rebuilt.criteria(), &c);
    }

    #[test]
    fn test_default_pairs_only_carry_rating_bounds() {
        let pairs = ReviewQuery::new(FilterCriteria::new()).to_query_pairs();
        assert_eq!(
            pairs,
            vec![("rating_min", "1".to_string()), ("rating_max", "5".to_string())]
        );
    }

    #[test]
    fn test_from_query_pairs_rejects_bad_values() {
        assert!(ReviewQuery::from_query_pairs([("rating_min", "4"), ("rating_max", "2")]).is_err());
        assert!(ReviewQuery::from_query_pairs([("rating_min", "x")]).is_err());
        assert!(ReviewQuery::from_query_pairs([("sentiments", "Angry")]).is_err());
        assert!(ReviewQuery::from_query_pairs([("page", "2")]).unwrap().criteria().is_unconstrained());
    }
}
