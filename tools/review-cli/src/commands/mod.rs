//! CLI command implementations.

pub mod analyze;
pub mod config;
pub mod dashboard;
pub mod languages;
pub mod list;
pub mod rate;
pub mod stats;
pub mod watch;

use anyhow::Result;
use clap::{Args, Subcommand};

use review_core::{FilterCriteria, SentimentLabel, TrendGranularity};

/// Arguments for the stats command.
#[derive(Args)]
pub struct StatsArgs {}

/// Review filter flags, shared by `list` and `watch`.
#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive text to search for.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sentiment to include (repeatable).
    #[arg(long = "sentiment")]
    pub sentiments: Vec<SentimentLabel>,

    /// Lowest star rating to include.
    #[arg(long, default_value = "1")]
    pub min_rating: i64,

    /// Highest star rating to include.
    #[arg(long, default_value = "5")]
    pub max_rating: i64,

    /// Language name to include (repeatable).
    #[arg(long = "language")]
    pub languages: Vec<String>,
}

impl FilterArgs {
    /// Build filter criteria from the flags.
    pub fn criteria(&self) -> Result<FilterCriteria> {
        let criteria = FilterCriteria::new()
            .with_search_text(self.search.clone().unwrap_or_default())
            .with_sentiments(self.sentiments.iter().copied())
            .with_rating_range(self.min_rating, self.max_rating)?
            .with_languages(self.languages.iter().map(String::as_str))?;
        Ok(criteria)
    }
}

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Show at most N reviews.
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the dashboard command.
#[derive(Args)]
pub struct DashboardArgs {
    /// Trend bucket size (day, week, month).
    #[arg(short, long, default_value = "month")]
    pub granularity: TrendGranularity,
}

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Text to analyze.
    pub text: String,

    /// Language code of the text.
    #[arg(short, long, default_value = "en")]
    pub language: String,
}

/// Arguments for the rate command.
#[derive(Args)]
pub struct RateArgs {
    /// Review ID.
    pub id: String,

    /// Star rating (1-5).
    #[arg(allow_negative_numbers = true)]
    pub rating: i64,
}

/// Arguments for the helpful command.
#[derive(Args)]
pub struct HelpfulArgs {
    /// Review ID.
    pub id: String,

    /// Withdraw a helpful vote instead of adding one.
    #[arg(long)]
    pub undo: bool,
}

/// Arguments for the languages command.
#[derive(Args)]
pub struct LanguagesArgs {}

/// Arguments for the watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between stats refreshes (default: from config).
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Trend bucket size (day, week, month).
    #[arg(short, long, default_value = "month")]
    pub granularity: TrendGranularity,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,

        /// File format (toml or json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate the config file.
    Validate,
}
