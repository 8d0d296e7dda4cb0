//! Core engine: the fetch → score → allocate run.

pub mod fetcher;
pub mod report;

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::data::PriceProvider;
use crate::strategy::allocator::Allocator;
use crate::strategy::StrategyOrchestrator;
use fetcher::Fetcher;
use report::Report;

/// Ties a price provider to the scoring/allocation strategy.
pub struct Pipeline<P: PriceProvider> {
    provider: P,
    strategy: StrategyOrchestrator,
    max_concurrency: usize,
    currency: String,
}

impl<P: PriceProvider> Pipeline<P> {
    pub fn new(
        provider: P,
        strategy: StrategyOrchestrator,
        max_concurrency: usize,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            strategy,
            max_concurrency,
            currency: currency.into(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run once over `tickers` with the given budget.
    ///
    /// Per-ticker failures land in `Report::skipped`. An invalid budget
    /// fails the run before anything is fetched.
    pub async fn run(&self, tickers: &[String], capital: Decimal) -> Result<Report> {
        Allocator::check_capital(capital)?;

        info!(tickers = tickers.len(), capital = %capital, "Starting run");

        let fetcher = Fetcher::new(&self.provider, self.max_concurrency);
        let (histories, mut skipped) = fetcher.fetch_batch(tickers).await;

        let outcome = self.strategy.run(&histories, capital)?;
        skipped.extend(outcome.skipped);

        let report = Report {
            generated_at: Utc::now(),
            capital,
            currency: self.currency.clone(),
            scored: outcome.scored,
            allocations: outcome.allocations,
            skipped,
        };

        info!(
            scored = report.scored.len(),
            skipped = report.skipped.len(),
            allocated = %report.total_allocated(),
            "Run complete"
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
