//! Review feedback: star ratings and helpful votes.

use anyhow::{Context as _, Result};

use review_core::ReviewId;
use review_data::ReviewSource;

use super::{HelpfulArgs, RateArgs};
use crate::context::Context;
use crate::output::stars;

/// Run the rate command.
pub async fn run(args: RateArgs, ctx: &Context) -> Result<()> {
    let source = ctx.source()?;
    let id = ReviewId::new(args.id);

    let ack = source
        .submit_rating(&id, args.rating)
        .await
        .with_context(|| format!("Failed to rate review {}", id))?;

    if ctx.output.is_json() {
        ctx.output.json(&ack);
        return Ok(());
    }

    ctx.output.success(&format!("Rated review {} {}", ack.review_id, stars(ack.rating)));
    Ok(())
}

/// Run the helpful command.
pub async fn run_helpful(args: HelpfulArgs, ctx: &Context) -> Result<()> {
    let source = ctx.source()?;
    let id = ReviewId::new(args.id);

    let ack = source
        .mark_helpful(&id, !args.undo)
        .await
        .with_context(|| format!("Failed to update helpful vote on review {}", id))?;

    if ctx.output.is_json() {
        ctx.output.json(&ack);
        return Ok(());
    }

    if ack.increment {
        ctx.output.success(&format!("Marked review {} as helpful", ack.review_id));
    } else {
        ctx.output.success(&format!("Withdrew helpful vote on review {}", ack.review_id));
    }
    Ok(())
}
