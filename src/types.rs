//! Shared types for STOCKSCORE.
//!
//! These types form the data model used across all modules.
//! Providers produce `PriceHistory`, the scorer turns it into
//! `ScoredRecord`s and the allocator turns those into
//! `AllocationRecord`s.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Price data
// ---------------------------------------------------------------------------

/// Daily closing prices for one ticker, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(closes: Vec<f64>) -> Self {
        Self { closes }
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    /// The most recent `n` closes, or `None` if the series is shorter.
    pub fn tail(&self, n: usize) -> Option<&[f64]> {
        if n > self.closes.len() {
            return None;
        }
        Some(&self.closes[self.closes.len() - n..])
    }
}

/// Everything a provider knows about one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: String,
    /// Display name (long name, then short name), if the provider has one.
    pub company: Option<String>,
    pub currency: Option<String>,
    pub closes: PriceSeries,
    /// Current market price. May differ from the last close intraday.
    pub latest_price: f64,
}

// ---------------------------------------------------------------------------
// Scoring output
// ---------------------------------------------------------------------------

/// Score breakdown for a single ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Quote currency of `latest_price`, as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub latest_price: f64,
    pub moving_average_50: f64,
    /// (latest - MA) / MA. Negative when trading below the average.
    pub price_difference_percent: f64,
    pub stability: f64,
    pub closeness: f64,
    pub extra_value: f64,
    pub overall_score: f64,
}

impl ScoredRecord {
    /// Attach the provider's display name and quote currency.
    pub fn with_listing(self, company: Option<String>, currency: Option<String>) -> Self {
        Self {
            company,
            currency,
            ..self
        }
    }

    /// Company name if known, otherwise the ticker.
    pub fn display_name(&self) -> &str {
        self.company.as_deref().unwrap_or(&self.ticker)
    }
}

impl fmt::Display for ScoredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {:.2} (MA50 {:.2}, {:+.2}%) score={:.4}",
            self.ticker,
            self.latest_price,
            self.moving_average_50,
            self.price_difference_percent * 100.0,
            self.overall_score,
        )
    }
}

// ---------------------------------------------------------------------------
// Allocation output
// ---------------------------------------------------------------------------

/// Proposed share of the periodic budget for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub ticker: String,
    pub investment_fraction: f64,
    pub investment_amount: Decimal,
}

impl fmt::Display for AllocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2}% -> {:.2}",
            self.ticker,
            self.investment_fraction * 100.0,
            self.investment_amount,
        )
    }
}

/// A ticker that was dropped from the run, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the scoring and allocation core.
///
/// `InsufficientHistory` and `InvalidPrice` are per-ticker: the batch
/// drops the ticker and carries on. `InvalidCapital` aborts the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("Insufficient history for {ticker}: need {required} closes, have {available}")]
    InsufficientHistory {
        ticker: String,
        required: usize,
        available: usize,
    },

    #[error("Invalid price for {ticker}: latest={latest_price}, moving average={moving_average}")]
    InvalidPrice {
        ticker: String,
        latest_price: f64,
        moving_average: f64,
    },

    #[error("Invalid capital: {0} (must be zero or positive)")]
    InvalidCapital(Decimal),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScoreError {
    /// Whether the error only affects a single ticker.
    pub fn is_per_ticker(&self) -> bool {
        matches!(
            self,
            ScoreError::InsufficientHistory { .. } | ScoreError::InvalidPrice { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
