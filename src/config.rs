//! Configuration loading from TOML with environment variable overrides.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a missing file or section falls back to the
//! stock watch-list and a 3000 monthly budget.
//!
//! Overrides: `STOCKSCORE_CAPITAL` (budget), `STOCKSCORE_TICKERS`
//! (comma-separated symbols).

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::strategy::allocator::AllocatorConfig;
use crate::strategy::scorer::ScoringConfig;

pub const CAPITAL_ENV: &str = "STOCKSCORE_CAPITAL";
pub const TICKERS_ENV: &str = "STOCKSCORE_TICKERS";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub portfolio: PortfolioConfig,
    pub scoring: ScoringConfig,
    pub allocation: AllocatorConfig,
    pub provider: ProviderConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Budget to split on each run.
    pub capital: Decimal,
    /// Label printed next to amounts.
    pub currency: String,
    pub tickers: Vec<String>,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            capital: dec!(3000),
            currency: "PLN".to_string(),
            tickers: ["GRG.L", "LEG", "MAN", "LDOS", "LKQ", "KDP", "UPS", "GPC"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Calendar days of history to request. 110 days covers ~75 sessions.
    pub lookback_days: i64,
    pub timeout_secs: u64,
    /// Tickers fetched in parallel.
    pub max_concurrency: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            lookback_days: 110,
            timeout_secs: 15,
            max_concurrency: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Apply `STOCKSCORE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides using an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(CAPITAL_ENV) {
            let capital = Decimal::from_str(raw.trim())
                .with_context(|| format!("{CAPITAL_ENV} is not a valid amount: {raw}"))?;
            info!(capital = %capital, "Capital overridden from environment");
            self.portfolio.capital = capital;
        }

        if let Some(raw) = lookup(TICKERS_ENV) {
            let tickers: Vec<String> = raw
                .split(',')
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
            if tickers.is_empty() {
                anyhow::bail!("{TICKERS_ENV} is set but contains no tickers");
            }
            info!(count = tickers.len(), "Tickers overridden from environment");
            self.portfolio.tickers = tickers;
        }

        Ok(())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        if self.provider.max_concurrency == 0 {
            anyhow::bail!("provider.max_concurrency must be at least 1");
        }
        if self.provider.lookback_days <= 0 {
            anyhow::bail!("provider.lookback_days must be positive");
        }
        Ok(())
    }
}
