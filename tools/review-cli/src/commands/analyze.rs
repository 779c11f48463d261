//! Single-text analysis.

use anyhow::{Context as _, Result};
use serde::Serialize;

use review_data::{ReviewSource, TextAnalysis};

use super::AnalyzeArgs;
use crate::context::Context;
use crate::output::sentiment_badge;

#[derive(Serialize)]
struct AnalysisReport<'a> {
    #[serde(flatten)]
    analysis: &'a TextAnalysis,
    /// Sarcasm judged against the configured confidence, not the service's flag.
    flagged_sarcastic: bool,
}

/// Run the analyze command.
pub async fn run(args: AnalyzeArgs, ctx: &Context) -> Result<()> {
    let source = ctx.source()?;

    let spinner = ctx.output.spinner("Analyzing...");
    let analysis = source.analyze_text(&args.text, &args.language).await;
    spinner.finish_and_clear();
    let analysis = analysis.context("Analysis failed")?;

    let confidence = ctx.config.thresholds.sarcasm_confidence;
    let flagged = analysis.is_sarcastic_at(confidence);

    if ctx.output.is_json() {
        ctx.output.json(&AnalysisReport {
            analysis: &analysis,
            flagged_sarcastic: flagged,
        });
        return Ok(());
    }

    ctx.output.header("Analysis");
    ctx.output.kv(
        "Sentiment",
        &format!(
            "{} ({:.0}% confidence)",
            sentiment_badge(analysis.sentiment.label),
            analysis.sentiment.score * 100.0
        ),
    );
    if !analysis.sentiment.raw_label.eq_ignore_ascii_case(analysis.sentiment.label.as_str()) {
        ctx.output.kv("Analyzer label", &analysis.sentiment.raw_label);
    }
    ctx.output.kv("Sarcasm", &format!("{:.0}%", analysis.sarcasm.score * 100.0));
    ctx.output.kv("Language", &analysis.language);
    if let Some(id) = &analysis.review_id {
        ctx.output.kv("Stored as", id.as_str());
    }

    if flagged {
        ctx.output.warn(&format!("Likely sarcastic (at or above {}% confidence)", confidence));
    }

    Ok(())
}
