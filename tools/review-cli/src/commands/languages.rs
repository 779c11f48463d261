//! Languages accepted by the analyzer.

use anyhow::{Context as _, Result};

use review_data::ReviewSource;

use super::LanguagesArgs;
use crate::context::Context;

/// Run the languages command.
pub async fn run(_args: LanguagesArgs, ctx: &Context) -> Result<()> {
    let source = ctx.source()?;
    let languages = source
        .fetch_languages()
        .await
        .context("Failed to fetch supported languages")?;

    if ctx.output.is_json() {
        ctx.output.json(&languages);
        return Ok(());
    }

    ctx.output.header("Supported languages");
    for language in &languages {
        ctx.output.table_row(&[&language.code, &language.name], &[6, 20]);
    }
    Ok(())
}
