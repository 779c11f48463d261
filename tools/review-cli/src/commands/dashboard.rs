//! One-shot dashboard: summary, trend and language shares.

use anyhow::{Context as _, Result};

use review_core::{build_dashboard, DashboardMetrics, FilterCriteria, SentimentLabel};
use review_data::ReviewSource;

use super::DashboardArgs;
use crate::context::Context;
use crate::output::{percentage_bar, sentiment_badge};

/// Run the dashboard command.
pub async fn run(args: DashboardArgs, ctx: &Context) -> Result<()> {
    let source = ctx.source()?;
    let criteria = FilterCriteria::default();

    let spinner = ctx.output.spinner("Loading dashboard...");
    let (stats, reviews) = futures::join!(source.fetch_stats(), source.fetch_reviews(&criteria));
    spinner.finish_and_clear();

    let stats = stats.context("Failed to fetch stats")?;
    let reviews = reviews.context("Failed to fetch reviews")?;

    let metrics = build_dashboard(&stats.counts(), &reviews, args.granularity)
        .context("Service returned inconsistent stats")?;

    if ctx.output.is_json() {
        ctx.output.json(&metrics);
        return Ok(());
    }

    print_dashboard(ctx, &metrics, args.granularity.to_string().as_str());
    Ok(())
}

pub(crate) fn print_dashboard(ctx: &Context, metrics: &DashboardMetrics, granularity: &str) {
    let threshold = ctx.config.thresholds.negative_threshold;

    ctx.output.header("Summary");
    ctx.output.kv("Total reviews", &metrics.total_reviews.to_string());
    ctx.output.kv("Positive", &format!("{}%", metrics.positive_percentage));
    ctx.output.kv("Negative", &format!("{}%", metrics.negative_percentage));
    ctx.output.kv("Average rating", &format!("{:.1}", metrics.average_rating));
    if metrics.negative_alert(threshold) {
        ctx.output.warn(&format!(
            "Negative reviews at {}% (threshold {}%)",
            metrics.negative_percentage, threshold
        ));
    }

    ctx.output.header(&format!("Trend (by {})", granularity));
    if metrics.trend.is_empty() {
        ctx.output.info("No dated reviews yet.");
    } else {
        let widths = [10, 6, 10, 10, 10, 10];
        let mut heading = vec!["PERIOD".to_string(), "COUNT".to_string()];
        heading.extend(SentimentLabel::ALL.iter().map(|l| sentiment_badge(*l)));
        let heading: Vec<&str> = heading.iter().map(String::as_str).collect();
        ctx.output.table_row(&heading, &widths);

        for point in &metrics.trend {
            let mut row = vec![point.period.clone(), point.total.to_string()];
            row.extend(SentimentLabel::ALL.iter().map(|label| {
                format!("{}%", point.percentages.get(label).copied().unwrap_or(0))
            }));
            let row: Vec<&str> = row.iter().map(String::as_str).collect();
            ctx.output.table_row(&row, &widths);
        }
    }

    ctx.output.header("Languages");
    if metrics.language_distribution.is_empty() {
        ctx.output.info("No reviews yet.");
        return;
    }
    let mut languages: Vec<(&String, &u32)> = metrics.language_distribution.iter().collect();
    languages.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (language, pct) in languages {
        ctx.output.table_row(
            &[language, &percentage_bar(*pct, 20), &format!("{:>3}%", pct)],
            &[12, 20, 4],
        );
    }
}
