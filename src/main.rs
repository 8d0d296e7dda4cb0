//! STOCKSCORE — moving-average stock scoring and capital allocation
//!
//! Entry point. Loads configuration, initialises structured logging,
//! fetches price histories, scores every ticker against its 50-day
//! average and prints the proposed split of the monthly budget.

use anyhow::{Context, Result};
use tracing::info;

use stockscore::config::{self, OutputFormat};
use stockscore::data::yahoo::YahooProvider;
use stockscore::engine::Pipeline;
use stockscore::strategy::allocator::Allocator;
use stockscore::strategy::scorer::Scorer;
use stockscore::strategy::StrategyOrchestrator;

const CONFIG_ENV: &str = "STOCKSCORE_CONFIG";
const DEFAULT_CONFIG: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let mut cfg = config::AppConfig::load_or_default(&config_path)?;
    cfg.apply_env_overrides()?;
    cfg.validate().context("Invalid configuration")?;

    info!(
        config = %config_path,
        tickers = cfg.portfolio.tickers.len(),
        capital = %cfg.portfolio.capital,
        currency = %cfg.portfolio.currency,
        "STOCKSCORE starting up"
    );

    let strategy = StrategyOrchestrator::new(
        Scorer::new(cfg.scoring.clone())?,
        Allocator::new(cfg.allocation.clone()),
    );
    let provider = YahooProvider::new(&cfg.provider)?;
    let pipeline = Pipeline::new(
        provider,
        strategy,
        cfg.provider.max_concurrency,
        cfg.portfolio.currency.clone(),
    );

    let report = pipeline
        .run(&cfg.portfolio.tickers, cfg.portfolio.capital)
        .await?;

    match cfg.output.format {
        OutputFormat::Table => println!("{report}"),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stockscore=info"));

    let json_logging = std::env::var("STOCKSCORE_LOG_JSON").is_ok();

    // Logs go to stderr so stdout carries only the report.
    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
