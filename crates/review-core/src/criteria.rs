//! Filter criteria and the observable criteria model.

use std::collections::BTreeSet;

use serde::Serialize;
use tokio::sync::watch;

use crate::error::{ReviewError, ReviewResult};
use crate::review::{check_star_rating, SentimentLabel, MAX_STAR_RATING, MIN_STAR_RATING};

/// Inclusive star-rating bounds, always `1 <= min <= max <= 5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RatingRange {
    min: u8,
    max: u8,
}

impl RatingRange {
    /// Create a range, rejecting out-of-bounds or inverted inputs.
    pub fn new(min: i64, max: i64) -> ReviewResult<Self> {
        let min = check_star_rating(min)?;
        let max = check_star_rating(max)?;
        if min > max {
            return Err(ReviewError::validation(format!(
                "rating range minimum {} exceeds maximum {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Inclusive on both ends.
    pub fn contains(&self, rating: u8) -> bool {
        self.min <= rating && rating <= self.max
    }

    /// Whether the range admits every valid rating.
    pub fn is_full(&self) -> bool {
        self.min == MIN_STAR_RATING && self.max == MAX_STAR_RATING
    }
}

impl Default for RatingRange {
    fn default() -> Self {
        Self {
            min: MIN_STAR_RATING,
            max: MAX_STAR_RATING,
        }
    }
}

/// The active filter selection.
///
/// A value type: every update produces a new value, so a reader never sees
/// a half-applied change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterCriteria {
    search_text: String,
    sentiments: BTreeSet<SentimentLabel>,
    rating_range: RatingRange,
    languages: BTreeSet<String>,
}

impl FilterCriteria {
    /// Criteria that match every review.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn sentiments(&self) -> &BTreeSet<SentimentLabel> {
        &self.sentiments
    }

    pub fn rating_range(&self) -> RatingRange {
        self.rating_range
    }

    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }

    /// Whether every dimension is at its match-all default.
    pub fn is_unconstrained(&self) -> bool {
        self.search_text.is_empty()
            && self.sentiments.is_empty()
            && self.rating_range.is_full()
            && self.languages.is_empty()
    }

    /// Add the label if absent, remove it if present.
    pub fn with_sentiment_toggled(&self, label: SentimentLabel) -> Self {
        let mut next = self.clone();
        if !next.sentiments.remove(&label) {
            next.sentiments.insert(label);
        }
        next
    }

    /// Add the language if absent, remove it if present.
    ///
    /// Names must be non-blank and free of commas, since the remote query
    /// carries them as a comma-separated list.
    pub fn with_language_toggled(&self, name: impl Into<String>) -> ReviewResult<Self> {
        let name = name.into();
        check_language_name(&name)?;
        let mut next = self.clone();
        if !next.languages.remove(&name) {
            next.languages.insert(name);
        }
        Ok(next)
    }

    pub fn with_search_text(&self, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.search_text = text.into();
        next
    }

    pub fn with_rating_range(&self, min: i64, max: i64) -> ReviewResult<Self> {
        let range = RatingRange::new(min, max)?;
        let mut next = self.clone();
        next.rating_range = range;
        Ok(next)
    }

    /// Replace the sentiment set wholesale.
    pub fn with_sentiments(&self, labels: impl IntoIterator<Item = SentimentLabel>) -> Self {
        let mut next = self.clone();
        next.sentiments = labels.into_iter().collect();
        next
    }

    /// Replace the language set wholesale.
    pub fn with_languages<I, S>(&self, names: I) -> ReviewResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut languages = BTreeSet::new();
        for name in names {
            let name = name.into();
            check_language_name(&name)?;
            languages.insert(name);
        }
        let mut next = self.clone();
        next.languages = languages;
        Ok(next)
    }
}

fn check_language_name(name: &str) -> ReviewResult<()> {
    if name.trim().is_empty() {
        return Err(ReviewError::validation("language name must not be empty"));
    }
    if name.contains(',') {
        return Err(ReviewError::validation(format!(
            "language name '{}' must not contain ','",
            name
        )));
    }
    Ok(())
}

/// Observable holder of the session's current criteria.
///
/// Every mutator applies its change in one atomic step and notifies
/// subscribers when the value actually changed. Rejected updates leave the
/// current value untouched.
#[derive(Debug)]
pub struct CriteriaModel {
    tx: watch::Sender<FilterCriteria>,
}

impl CriteriaModel {
    /// Create a model holding `initial`.
    pub fn new(initial: FilterCriteria) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the current criteria.
    pub fn current(&self) -> FilterCriteria {
        self.tx.borrow().clone()
    }

    /// Subscribe to criteria changes. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<FilterCriteria> {
        self.tx.subscribe()
    }

    pub fn toggle_sentiment(&self, label: SentimentLabel) -> FilterCriteria {
        self.apply(|c| Ok(c.with_sentiment_toggled(label)))
            .unwrap_or_else(|_| self.current())
    }

    pub fn toggle_language(&self, name: impl Into<String>) -> ReviewResult<FilterCriteria> {
        let name = name.into();
        self.apply(move |c| c.with_language_toggled(name))
    }

    pub fn set_search_text(&self, text: impl Into<String>) -> FilterCriteria {
        let text = text.into();
        self.apply(move |c| Ok(c.with_search_text(text)))
            .unwrap_or_else(|_| self.current())
    }

    pub fn set_rating_range(&self, min: i64, max: i64) -> ReviewResult<FilterCriteria> {
        self.apply(|c| c.with_rating_range(min, max))
    }

    /// Replace the criteria wholesale.
    pub fn replace(&self, criteria: FilterCriteria) -> FilterCriteria {
        self.apply(move |_| Ok(criteria))
            .unwrap_or_else(|_| self.current())
    }

    /// Back to match-all.
    pub fn reset(&self) -> FilterCriteria {
        self.replace(FilterCriteria::default())
    }

    fn apply<F>(&self, update: F) -> ReviewResult<FilterCriteria>
    where
        F: FnOnce(&FilterCriteria) -> ReviewResult<FilterCriteria>,
    {
        let mut outcome = None;
        self.tx.send_if_modified(|current| match update(current) {
            Ok(next) => {
                let changed = next != *current;
                *current = next.clone();
                outcome = Some(Ok(next));
                changed
            }
            Err(e) => {
                outcome = Some(Err(e));
                false
            }
        });
        outcome.unwrap_or_else(|| Ok(self.current()))
    }
}

impl Default for CriteriaModel {
    fn default() -> Self {
        Self::new(FilterCriteria::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_range_validation() {
        assert!(RatingRange::new(1, 5).is_ok());
        assert!(RatingRange::new(3, 3).is_ok());
        assert!(RatingRange::new(4, 2).is_err());
        assert!(RatingRange::new(0, 5).is_err());
        assert!(RatingRange::new(1, 6).is_err());
    }

    #[test]
    fn test_toggle_sentiment_adds_then_removes() {
        let c = FilterCriteria::new().with_sentiment_toggled(SentimentLabel::Negative);
        assert!(c.sentiments().contains(&SentimentLabel::Negative));
        let c = c.with_sentiment_toggled(SentimentLabel::Negative);
        assert!(c.sentiments().is_empty());
    }

    #[test]
    fn test_language_names_with_commas_rejected() {
        assert!(FilterCriteria::new().with_language_toggled("English, US").is_err());
        assert!(FilterCriteria::new().with_language_toggled("  ").is_err());
    }

    #[test]
    fn test_model_rejects_inverted_range_without_notifying() {
        let model = CriteriaModel::default();
        let mut rx = model.subscribe();
        rx.borrow_and_update();

        let err = model.set_rating_range(5, 1).unwrap_err();
        assert!(err.is_validation());
        assert!(!rx.has_changed().unwrap());
        assert_eq!(model.current().rating_range(), RatingRange::default());
    }

    #[test]
    fn test_model_notifies_on_change() {
        let model = CriteriaModel::default();
        let mut rx = model.subscribe();
        rx.borrow_and_update();

        model.set_search_text("great");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().search_text(), "great");

        // Same value again is not a change.
        model.set_search_text("great");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_model_mutators_compose() {
        let model = CriteriaModel::default();
        model.toggle_sentiment(SentimentLabel::Positive);
        model.toggle_language("Hindi").unwrap();
        let current = model.set_rating_range(2, 4).unwrap();

        assert!(current.sentiments().contains(&SentimentLabel::Positive));
        assert!(current.languages().contains("Hindi"));
        assert_eq!((current.rating_range().min(), current.rating_range().max()), (2, 4));
        assert!(model.reset().is_unconstrained());
    }
}
