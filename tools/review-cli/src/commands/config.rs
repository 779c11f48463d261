//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use console::Term;
use dialoguer::Confirm;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force, format } => init_config(force, &format, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;

    ctx.output.info("");
    ctx.output.info("[api]");
    ctx.output.kv("base_url", &config.api.base_url);
    if let Some(ms) = config.api.timeout_ms {
        ctx.output.kv("timeout_ms", &ms.to_string());
    }
    if let Some(n) = config.api.max_retries {
        ctx.output.kv("max_retries", &n.to_string());
    }

    ctx.output.info("");
    ctx.output.info("[keys]");
    ctx.output.kv("sentiment_api_key", &mask(&config.keys.sentiment_api_key));
    ctx.output.kv("sarcasm_api_key", &mask(&config.keys.sarcasm_api_key));
    ctx.output.kv("language_api_key", &mask(&config.keys.language_api_key));

    ctx.output.info("");
    ctx.output.info("[thresholds]");
    ctx.output.kv(
        "negative_threshold",
        &format!("{}%", config.thresholds.negative_threshold),
    );
    ctx.output.kv(
        "sarcasm_confidence",
        &format!("{}%", config.thresholds.sarcasm_confidence),
    );

    ctx.output.info("");
    ctx.output.info("[refresh]");
    ctx.output.kv(
        "poll_interval_secs",
        &config.refresh.poll_interval_secs.to_string(),
    );

    Ok(())
}

async fn init_config(force: bool, format: &str, ctx: &Context) -> Result<()> {
    let file_name = match format {
        "toml" => "reviews.toml",
        "json" => "reviews.json",
        other => bail!("Unknown config format '{}'. Use toml or json.", other),
    };
    let config_path = ctx.cwd.join(file_name);

    if config_path.exists() && !force {
        if ctx.output.is_json() || !Term::stdout().is_term() {
            bail!(
                "Config file already exists: {}. Use --force to overwrite.",
                config_path.display()
            );
        }

        let confirmed = Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", config_path.display()))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Config init cancelled");
            return Ok(());
        }
    }

    if format == "json" {
        CliConfig::default().save(&config_path.to_string_lossy())?;
    } else {
        fs::write(&config_path, generate_default_config())?;
    }

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = ctx.config.validate();

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Show only that a key is set, plus its last four characters.
fn mask(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "(not set)");
        assert_eq!(mask("8e72jd7-demo-key"), "****-key");
        assert_eq!(mask("ab"), "****ab");
    }
}
