//! Corpus statistics.

use anyhow::{Context as _, Result};
use serde::Serialize;

use review_core::metrics::percentage;
use review_core::{compute_summary, SentimentLabel, SummaryMetrics};
use review_data::ReviewSource;

use super::StatsArgs;
use crate::context::Context;
use crate::output::{percentage_bar, sentiment_badge};

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    summary: SummaryMetrics,
    negative_alert: bool,
    negative_threshold: u8,
}

/// Run the stats command.
pub async fn run(_args: StatsArgs, ctx: &Context) -> Result<()> {
    let source = ctx.source()?;

    let spinner = ctx.output.spinner("Fetching stats...");
    let stats = source.fetch_stats().await;
    spinner.finish_and_clear();
    let stats = stats.context("Failed to fetch stats")?;

    let summary = compute_summary(&stats.counts()).context("Service returned inconsistent stats")?;
    let threshold = ctx.config.thresholds.negative_threshold;
    let alert = summary.negative_percentage > threshold as u32;

    if ctx.output.is_json() {
        ctx.output.json(&StatsReport {
            summary,
            negative_alert: alert,
            negative_threshold: threshold,
        });
        return Ok(());
    }

    ctx.output.header("Review Stats");
    print_summary(ctx, &summary);

    if alert {
        ctx.output.info("");
        ctx.output.warn(&format!(
            "Negative reviews at {}% (threshold {}%)",
            summary.negative_percentage, threshold
        ));
    }

    Ok(())
}

/// Totals plus one bar per tracked label.
pub(crate) fn print_summary(ctx: &Context, summary: &SummaryMetrics) {
    ctx.output.kv("Total reviews", &summary.total_reviews.to_string());
    ctx.output.kv("Average rating", &format!("{:.1}", summary.average_rating));
    ctx.output.info("");

    let total = summary.total_reviews;
    for label in SentimentLabel::ALL {
        let Some(count) = summary.sentiment_distribution.get(&label) else {
            continue;
        };
        let pct = percentage(*count, total);
        ctx.output.table_row(
            &[
                &sentiment_badge(label),
                &percentage_bar(pct, 30),
                &format!("{:>3}%", pct),
                &format!("({})", count),
            ],
            &[10, 30, 4, 8],
        );
    }
}
