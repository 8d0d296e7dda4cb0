//! Price-history providers.
//!
//! Defines the `PriceProvider` trait and the Yahoo Finance chart
//! implementation used by the binary.

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::PriceHistory;

/// Abstraction over market-data sources.
///
/// A provider may fail for individual tickers (unknown symbol, no
/// history); callers treat that as "skip this ticker", not as a failed run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetch daily closes (oldest first) and the current price for a ticker.
    async fn fetch_history(&self, ticker: &str) -> Result<PriceHistory>;
}
