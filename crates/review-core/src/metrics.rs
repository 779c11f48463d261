//! Dashboard metrics aggregation.
//!
//! All divisions are zero-safe: an empty corpus yields zero percentages and
//! a zero average, never NaN.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, ReviewResult};
use crate::review::{Review, SentimentLabel};

/// Raw sentiment counts, as reported by the stats endpoint.
///
/// Counts are signed so malformed upstream values can be detected rather
/// than wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    /// Present when the source tracks sarcastic reviews separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sarcastic: Option<i64>,
    pub total: i64,
}

impl SentimentCounts {
    pub fn new(positive: i64, neutral: i64, negative: i64, total: i64) -> Self {
        Self {
            positive,
            neutral,
            negative,
            sarcastic: None,
            total,
        }
    }

    pub fn with_sarcastic(mut self, sarcastic: i64) -> Self {
        self.sarcastic = Some(sarcastic);
        self
    }

    /// Count labels over a review set.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut counts = Self::default().with_sarcastic(0);
        for review in reviews {
            match review.sentiment_label {
                SentimentLabel::Positive => counts.positive += 1,
                SentimentLabel::Neutral => counts.neutral += 1,
                SentimentLabel::Negative => counts.negative += 1,
                SentimentLabel::Sarcastic => *counts.sarcastic.get_or_insert(0) += 1,
            }
        }
        counts.total = reviews.len() as i64;
        counts
    }

    /// Count for a single label. Untracked sarcastic counts read as zero.
    pub fn count(&self, label: SentimentLabel) -> i64 {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Sarcastic => self.sarcastic.unwrap_or(0),
        }
    }

    /// Reject negative counts and totals that disagree with the categories.
    pub fn validate(&self) -> ReviewResult<()> {
        let fields = [
            ("positive", Some(self.positive)),
            ("neutral", Some(self.neutral)),
            ("negative", Some(self.negative)),
            ("sarcastic", self.sarcastic),
            ("total", Some(self.total)),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                if v < 0 {
                    return Err(ReviewError::validation(format!(
                        "{} count must not be negative, got {}",
                        name, v
                    )));
                }
            }
        }

        let sum = [self.neutral, self.negative, self.sarcastic.unwrap_or(0)]
            .into_iter()
            .try_fold(self.positive, i64::checked_add)
            .ok_or_else(|| ReviewError::validation("sum of category counts overflows"))?;
        if sum != self.total {
            return Err(ReviewError::validation(format!(
                "total {} does not match sum of category counts {}",
                self.total, sum
            )));
        }
        Ok(())
    }

    fn tracked_labels(&self) -> impl Iterator<Item = SentimentLabel> + '_ {
        SentimentLabel::ALL
            .into_iter()
            .filter(|l| *l != SentimentLabel::Sarcastic || self.sarcastic.is_some())
    }
}

/// `round(100 * count / total)`, or 0 when `total` is 0.
pub fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * count as f64 / total as f64).round() as u32
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Headline numbers derived from counts alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_reviews: u64,
    pub sentiment_distribution: BTreeMap<SentimentLabel, u64>,
    pub positive_percentage: u32,
    pub negative_percentage: u32,
    pub average_rating: f64,
}

/// Compute headline metrics from validated counts.
pub fn compute_summary(counts: &SentimentCounts) -> ReviewResult<SummaryMetrics> {
    counts.validate()?;

    let total = counts.total as u64;
    let sentiment_distribution: BTreeMap<SentimentLabel, u64> = counts
        .tracked_labels()
        .map(|label| (label, counts.count(label) as u64))
        .collect();

    let average_rating = if total == 0 {
        0.0
    } else {
        // 5 * i64::MAX does not fit in u64.
        let weighted: u128 = SentimentLabel::ALL
            .into_iter()
            .filter_map(|label| {
                label
                    .rating_weight()
                    .map(|w| w as u128 * counts.count(label) as u128)
            })
            .sum();
        round_one_decimal(weighted as f64 / total as f64)
    };

    Ok(SummaryMetrics {
        total_reviews: total,
        positive_percentage: percentage(counts.positive as u64, total),
        negative_percentage: percentage(counts.negative as u64, total),
        average_rating,
        sentiment_distribution,
    })
}

/// Calendar bucket size for the trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendGranularity {
    Day,
    /// ISO-8601 week, starting Monday.
    Week,
    #[default]
    Month,
}

impl TrendGranularity {
    /// First day of the bucket containing `date`.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TrendGranularity::Day => date,
            TrendGranularity::Week => {
                let back = date.weekday().num_days_from_monday() as u64;
                date.checked_sub_days(Days::new(back)).unwrap_or(date)
            }
            TrendGranularity::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Display label for the bucket starting at `start`.
    pub fn label(&self, start: NaiveDate) -> String {
        match self {
            TrendGranularity::Day => start.format("%Y-%m-%d").to_string(),
            TrendGranularity::Week => {
                let week = start.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            TrendGranularity::Month => start.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for TrendGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendGranularity::Day => write!(f, "day"),
            TrendGranularity::Week => write!(f, "week"),
            TrendGranularity::Month => write!(f, "month"),
        }
    }
}

impl FromStr for TrendGranularity {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(TrendGranularity::Day),
            "week" | "weekly" => Ok(TrendGranularity::Week),
            "month" | "monthly" => Ok(TrendGranularity::Month),
            other => Err(ReviewError::validation(format!("unknown granularity '{}'", other))),
        }
    }
}

/// One bucket of the sentiment trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Bucket label, e.g. `2024-03` or `2024-W09`.
    pub period: String,
    pub period_start: NaiveDate,
    pub total: u64,
    /// Percentage of the bucket's reviews per label.
    pub percentages: BTreeMap<SentimentLabel, u32>,
}

/// Per-label percentages per calendar bucket, oldest first.
///
/// Buckets without reviews are omitted.
pub fn compute_trend(reviews: &[Review], granularity: TrendGranularity) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<NaiveDate, BTreeMap<SentimentLabel, u64>> = BTreeMap::new();
    for review in reviews {
        let start = granularity.bucket_start(review.created_at.date_naive());
        *buckets
            .entry(start)
            .or_default()
            .entry(review.sentiment_label)
            .or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|(start, counts)| {
            let total: u64 = counts.values().sum();
            let percentages = SentimentLabel::ALL
                .into_iter()
                .map(|label| (label, percentage(counts.get(&label).copied().unwrap_or(0), total)))
                .collect();
            TrendPoint {
                period: granularity.label(start),
                period_start: start,
                total,
                percentages,
            }
        })
        .collect()
}

/// Share of reviews per language, as integer percentages.
///
/// Rounded independently, so the values need not sum to exactly 100.
pub fn compute_language_distribution(reviews: &[Review]) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for review in reviews {
        *counts.entry(review.language.as_str()).or_insert(0) += 1;
    }
    let total = reviews.len() as u64;
    counts
        .into_iter()
        .map(|(language, count)| (language.to_string(), percentage(count, total)))
        .collect()
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_reviews: u64,
    pub sentiment_distribution: BTreeMap<SentimentLabel, u64>,
    pub positive_percentage: u32,
    pub negative_percentage: u32,
    pub average_rating: f64,
    pub trend: Vec<TrendPoint>,
    pub language_distribution: BTreeMap<String, u32>,
    pub computed_at: DateTime<Utc>,
}

impl DashboardMetrics {
    /// Metrics with only the summary populated.
    pub fn from_summary(summary: SummaryMetrics) -> Self {
        Self {
            total_reviews: summary.total_reviews,
            sentiment_distribution: summary.sentiment_distribution,
            positive_percentage: summary.positive_percentage,
            negative_percentage: summary.negative_percentage,
            average_rating: summary.average_rating,
            trend: Vec::new(),
            language_distribution: BTreeMap::new(),
            computed_at: Utc::now(),
        }
    }

    /// Whether negative sentiment exceeds the alert threshold (percent).
    pub fn negative_alert(&self, threshold_pct: u8) -> bool {
        self.negative_percentage > threshold_pct as u32
    }
}

/// Combine count-based summary with review-based trend and language shares.
pub fn build_dashboard(
    counts: &SentimentCounts,
    reviews: &[Review],
    granularity: TrendGranularity,
) -> ReviewResult<DashboardMetrics> {
    let summary = compute_summary(counts)?;
    let mut metrics = DashboardMetrics::from_summary(summary);
    metrics.trend = compute_trend(reviews, granularity);
    metrics.language_distribution = compute_language_distribution(reviews);
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn review_on(id: &str, label: SentimentLabel, y: i32, m: u32, d: u32, language: &str) -> Review {
        Review::new(id, "text", label, 3)
            .unwrap()
            .with_language(language)
            .with_created_at(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_summary_from_counts() {
        let summary = compute_summary(&SentimentCounts::new(6, 3, 1, 10)).unwrap();
        assert_eq!(summary.positive_percentage, 60);
        assert_eq!(summary.negative_percentage, 10);
        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.sentiment_distribution.values().sum::<u64>(), 10);
        assert!(!summary.sentiment_distribution.contains_key(&SentimentLabel::Sarcastic));
    }

    #[test]
    fn test_empty_counts_are_zero() {
        let summary = compute_summary(&SentimentCounts::new(0, 0, 0, 0)).unwrap();
        assert_eq!(summary.positive_percentage, 0);
        assert_eq!(summary.negative_percentage, 0);
        assert_eq!(summary.average_rating, 0.0);
    }

    #[test]
    fn test_overflowing_counts_are_rejected() {
        let err = compute_summary(&SentimentCounts::new(i64::MAX, 1, 0, 0)).unwrap_err();
        assert!(err.is_validation());

        let err = SentimentCounts::new(1, 1, 1, 3)
            .with_sarcastic(i64::MAX)
            .validate()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_huge_counts_average_without_overflow() {
        let summary = compute_summary(&SentimentCounts::new(i64::MAX, 0, 0, i64::MAX)).unwrap();
        assert_eq!(summary.positive_percentage, 100);
        assert_eq!(summary.average_rating, 5.0);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        // (5*2 + 1*1) / 3 = 3.666..
        let summary = compute_summary(&SentimentCounts::new(2, 0, 1, 3)).unwrap();
        assert_eq!(summary.average_rating, 3.7);
        assert_eq!(summary.positive_percentage, 67);
        assert_eq!(summary.negative_percentage, 33);
    }

    #[test]
    fn test_sarcastic_counts_in_total_but_not_weight() {
        let counts = SentimentCounts::new(1, 0, 0, 2).with_sarcastic(1);
        let summary = compute_summary(&counts).unwrap();
        assert_eq!(summary.average_rating, 2.5);
        assert_eq!(summary.sentiment_distribution[&SentimentLabel::Sarcastic], 1);
    }

    #[test]
    fn test_inconsistent_counts_rejected() {
        let err = compute_summary(&SentimentCounts::new(6, 3, 1, 11)).unwrap_err();
        assert!(err.is_validation());
        let err = compute_summary(&SentimentCounts::new(-1, 3, 1, 3)).unwrap_err();
        assert!(err.is_validation());
        let err = compute_summary(&SentimentCounts::new(1, 0, 0, 0).with_sarcastic(-1)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_counts_from_reviews() {
        let reviews = vec![
            review_on("1", SentimentLabel::Positive, 2024, 1, 3, "English"),
            review_on("2", SentimentLabel::Sarcastic, 2024, 1, 4, "English"),
            review_on("3", SentimentLabel::Negative, 2024, 2, 1, "Hindi"),
        ];
        let counts = SentimentCounts::from_reviews(&reviews);
        assert_eq!(counts, SentimentCounts::new(1, 0, 1, 3).with_sarcastic(1));
        assert!(counts.validate().is_ok());
    }

    #[test]
    fn test_monthly_trend_is_chronological() {
        let reviews = vec![
            review_on("1", SentimentLabel::Negative, 2024, 3, 9, "English"),
            review_on("2", SentimentLabel::Positive, 2024, 1, 3, "English"),
            review_on("3", SentimentLabel::Positive, 2024, 1, 20, "English"),
            review_on("4", SentimentLabel::Neutral, 2024, 1, 21, "English"),
            review_on("5", SentimentLabel::Positive, 2024, 3, 1, "English"),
        ];
        let trend = compute_trend(&reviews, TrendGranularity::Month);
        let periods: Vec<_> = trend.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["2024-01", "2024-03"]);

        assert_eq!(trend[0].total, 3);
        assert_eq!(trend[0].percentages[&SentimentLabel::Positive], 67);
        assert_eq!(trend[0].percentages[&SentimentLabel::Neutral], 33);
        assert_eq!(trend[0].percentages[&SentimentLabel::Sarcastic], 0);
        assert_eq!(trend[1].percentages[&SentimentLabel::Negative], 50);
    }

    #[test]
    fn test_weekly_buckets_start_monday() {
        // 2024-01-07 is a Sunday, 2024-01-08 a Monday.
        let reviews = vec![
            review_on("1", SentimentLabel::Positive, 2024, 1, 7, "English"),
            review_on("2", SentimentLabel::Positive, 2024, 1, 8, "English"),
        ];
        let trend = compute_trend(&reviews, TrendGranularity::Week);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].period, "2024-W01");
        assert_eq!(trend[1].period_start, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[test]
    fn test_trend_of_nothing_is_empty() {
        assert!(compute_trend(&[], TrendGranularity::Day).is_empty());
    }

    #[test]
    fn test_language_distribution() {
        let reviews = vec![
            review_on("1", SentimentLabel::Positive, 2024, 1, 1, "English"),
            review_on("2", SentimentLabel::Positive, 2024, 1, 1, "Hindi"),
            review_on("3", SentimentLabel::Positive, 2024, 1, 1, "Tamil"),
        ];
        let dist = compute_language_distribution(&reviews);
        assert_eq!(dist["English"], 33);
        assert_eq!(dist.values().sum::<u32>(), 99);
        assert!(compute_language_distribution(&[]).is_empty());
    }

    #[test]
    fn test_dashboard_and_alert() {
        let reviews = vec![review_on("1", SentimentLabel::Negative, 2024, 5, 1, "English")];
        let metrics = build_dashboard(
            &SentimentCounts::new(3, 3, 4, 10),
            &reviews,
            TrendGranularity::Month,
        )
        .unwrap();
        assert_eq!(metrics.negative_percentage, 40);
        assert_eq!(metrics.trend.len(), 1);
        assert_eq!(metrics.language_distribution["English"], 100);
        assert!(metrics.negative_alert(20));
        assert!(!metrics.negative_alert(40));
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("Weekly".parse::<TrendGranularity>().unwrap(), TrendGranularity::Week);
        assert!("hourly".parse::<TrendGranularity>().is_err());
    }
}
