use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use gazette::{config::Config, pipeline::Pipeline};
use tracing_subscriber::EnvFilter;

/// Collect, rank and extract articles from the configured sources and write
/// the daily digest.
#[derive(Parser, Debug)]
#[command(name = "gazette")]
#[command(version)]
struct Args {
    /// Run date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Synthesis adapter: template, command or remote
    #[arg(long)]
    adapter: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    if args.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut config = Config::from_env()?;
    if let Some(adapter) = args.adapter {
        config = config.with_adapter(adapter);
    }
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());

    let mut pipeline = Pipeline::from_config(&config)?;
    let summary = pipeline.run(date).await?;

    tracing::info!(
        run_id = %summary.run_id,
        "done: {} discovered, {} selected, {} extracted, {} failed",
        summary.items_discovered,
        summary.items_selected,
        summary.items_extracted,
        summary.items_failed
    );
    Ok(())
}
