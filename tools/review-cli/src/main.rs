//! Reviews CLI - Command line dashboard for the review sentiment service.
//!
//! Commands:
//! - `reviews stats` - Corpus totals and sentiment distribution
//! - `reviews list` - Filtered review listing
//! - `reviews dashboard` - Summary, trend and language shares
//! - `reviews analyze` - Analyze a single text
//! - `reviews rate` / `reviews helpful` - Review feedback
//! - `reviews languages` - Languages the analyzer accepts
//! - `reviews watch` - Live dashboard until Ctrl-C
//! - `reviews config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use review_observability::{init_logging, LogFormat, LogLevel, LoggingConfig};

use commands::{
    AnalyzeArgs, ConfigArgs, DashboardArgs, HelpfulArgs, LanguagesArgs, ListArgs, RateArgs,
    StatsArgs, WatchArgs,
};

/// Reviews CLI - Browse, analyze and monitor product reviews
#[derive(Parser)]
#[command(name = "reviews")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output (-v info logs, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log format on stderr (human or json)
    #[arg(long, global = true, default_value = "human")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show corpus totals and sentiment distribution
    Stats(StatsArgs),

    /// List reviews matching filters
    List(ListArgs),

    /// Show summary, trend and language distribution
    Dashboard(DashboardArgs),

    /// Analyze sentiment and sarcasm of a text
    Analyze(AnalyzeArgs),

    /// Set a review's star rating
    Rate(RateArgs),

    /// Mark a review as helpful
    Helpful(HelpfulArgs),

    /// List languages the analyzer accepts
    Languages(LanguagesArgs),

    /// Follow live stats and reviews
    Watch(WatchArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose > 0, cli.json);

    let logging = LoggingConfig::new(LogLevel::from_verbosity(cli.verbose)).with_format(cli.log_format);
    if let Err(e) = init_logging(&logging) {
        output.warn(&format!("Logging disabled: {}", e));
    }

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = match context::Context::load(config_path, output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Stats(args) => commands::stats::run(args, &ctx).await,
        Commands::List(args) => commands::list::run(args, &ctx).await,
        Commands::Dashboard(args) => commands::dashboard::run(args, &ctx).await,
        Commands::Analyze(args) => commands::analyze::run(args, &ctx).await,
        Commands::Rate(args) => commands::rate::run(args, &ctx).await,
        Commands::Helpful(args) => commands::rate::run_helpful(args, &ctx).await,
        Commands::Languages(args) => commands::languages::run(args, &ctx).await,
        Commands::Watch(args) => commands::watch::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
