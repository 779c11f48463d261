//! Filtered review listing.

use anyhow::{Context as _, Result};

use review_core::Review;
use review_data::ReviewSource;

use super::ListArgs;
use crate::context::Context;
use crate::output::{sentiment_badge, stars, truncate};

/// Run the list command.
pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let criteria = args.filter.criteria()?;
    let source = ctx.source()?;

    let spinner = ctx.output.spinner("Fetching reviews...");
    let reviews = source.fetch_reviews(&criteria).await;
    spinner.finish_and_clear();
    let mut reviews = reviews.context("Failed to fetch reviews")?;

    let matched = reviews.len();
    if let Some(limit) = args.limit {
        reviews.truncate(limit);
    }

    if ctx.output.is_json() {
        ctx.output.json(&reviews);
        return Ok(());
    }

    if reviews.is_empty() {
        ctx.output.info("No reviews match the current filters.");
        return Ok(());
    }

    ctx.output.header(&format!("Reviews ({})", matched));
    print_reviews(ctx, &reviews);

    if reviews.len() < matched {
        ctx.output.info("");
        ctx.output.info(&format!("Showing {} of {} reviews", reviews.len(), matched));
    }

    Ok(())
}

pub(crate) fn print_reviews(ctx: &Context, reviews: &[Review]) {
    let widths = [8, 6, 10, 10, 12, 60];
    ctx.output.table_row(&["ID", "RATING", "SENTIMENT", "LANGUAGE", "DATE", "TEXT"], &widths);
    for review in reviews {
        ctx.output.table_row(
            &[
                review.id.as_str(),
                &stars(review.star_rating),
                &sentiment_badge(review.sentiment_label),
                &review.language,
                &review.created_at.format("%Y-%m-%d").to_string(),
                &truncate(&review.text, 60),
            ],
            &widths,
        );
    }
}
