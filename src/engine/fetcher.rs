//! Batch price fetcher.
//!
//! Fetches histories for a ticker list through a `PriceProvider` with
//! bounded concurrency. Results come back in input order; tickers the
//! provider cannot serve are reported as skipped.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::data::PriceProvider;
use crate::types::{PriceHistory, SkippedTicker};

pub struct Fetcher<'a> {
    provider: &'a dyn PriceProvider,
    max_concurrency: usize,
}

impl<'a> Fetcher<'a> {
    pub fn new(provider: &'a dyn PriceProvider, max_concurrency: usize) -> Self {
        Self {
            provider,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Fetch every ticker. Never fails as a whole.
    pub async fn fetch_batch(&self, tickers: &[String]) -> (Vec<PriceHistory>, Vec<SkippedTicker>) {
        info!(
            provider = self.provider.name(),
            count = tickers.len(),
            concurrency = self.max_concurrency,
            "Fetching price histories"
        );

        let results: Vec<_> = stream::iter(tickers)
            .map(|ticker| async move { (ticker, self.provider.fetch_history(ticker).await) })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut histories = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();

        for (ticker, result) in results {
            match result {
                Ok(h) => histories.push(h),
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Fetch failed, skipping ticker");
                    skipped.push(SkippedTicker {
                        ticker: ticker.clone(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }

        info!(
            fetched = histories.len(),
            skipped = skipped.len(),
            "Price fetch complete"
        );

        (histories, skipped)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
