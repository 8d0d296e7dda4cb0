//! Mock price provider for integration testing.
//!
//! Provides a deterministic `PriceProvider` implementation that serves
//! known histories from memory, counts calls, and can be forced to fail.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stockscore::data::PriceProvider;
use stockscore::types::{PriceHistory, PriceSeries};

/// A mock provider for deterministic testing.
///
/// Histories and failures are fully controllable from test code.
pub struct MockProvider {
    histories: HashMap<String, PriceHistory>,
    calls: Arc<AtomicUsize>,
    /// If set, every fetch returns this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    /// Create a provider with the default watch-list histories.
    pub fn new() -> Self {
        Self::with_histories(Self::default_histories())
    }

    pub fn with_histories(histories: Vec<PriceHistory>) -> Self {
        Self {
            histories: histories.into_iter().map(|h| (h.ticker.clone(), h)).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Force all subsequent fetches to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Build a history whose closes are `base` plus a repeating wobble.
    pub fn history(ticker: &str, company: &str, base: f64, wobble: f64, closes: usize, latest: f64) -> PriceHistory {
        PriceHistory {
            ticker: ticker.to_string(),
            company: Some(company.to_string()),
            currency: Some("USD".to_string()),
            closes: PriceSeries::new(
                (0..closes)
                    .map(|i| base + wobble * [0.0, 1.0, 0.0, -1.0][i % 4])
                    .collect(),
            ),
            latest_price: latest,
        }
    }

    /// Watch-list histories with known characteristics:
    /// - `UPS`: flat at 100, trading 5% below average
    /// - `KDP`: flat at 30, trading on the average
    /// - `LDOS`: wobbling around 150, 2% above average
    /// - `GPC`: flat at 120, 120% above average (scores zero)
    /// - `LEG`: only 30 sessions of history
    /// - `MAN`: bad quote (zero price)
    fn default_histories() -> Vec<PriceHistory> {
        vec![
            Self::history("UPS", "United Parcel Service, Inc.", 100.0, 0.0, 70, 95.0),
            Self::history("KDP", "Keurig Dr Pepper Inc.", 30.0, 0.0, 70, 30.0),
            Self::history("LDOS", "Leidos Holdings, Inc.", 150.0, 2.0, 70, 153.0),
            Self::history("GPC", "Genuine Parts Company", 120.0, 0.0, 70, 264.0),
            Self::history("LEG", "Leggett & Platt, Incorporated", 10.0, 0.0, 30, 10.0),
            Self::history("MAN", "ManpowerGroup Inc.", 60.0, 0.0, 70, 0.0),
        ]
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_history(&self, ticker: &str) -> Result<PriceHistory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        self.histories
            .get(ticker)
            .cloned()
            .ok_or_else(|| anyhow!("No data found for {ticker}, symbol may be delisted"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetch_known_ticker() {
        let provider = MockProvider::new();
        let h = provider.fetch_history("UPS").await.unwrap();
        assert_eq!(h.closes.len(), 70);
        assert_eq!(h.latest_price, 95.0);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_unknown_ticker() {
        let provider = MockProvider::new();
        let err = provider.fetch_history("ZZZZ").await.unwrap_err();
        assert!(err.to_string().contains("delisted"));
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let provider = MockProvider::new();
        provider.set_error("simulated outage");
        assert!(provider.fetch_history("UPS").await.is_err());

        provider.clear_error();
        assert!(provider.fetch_history("UPS").await.is_ok());
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_mock_wobble_is_centred() {
        let h = MockProvider::history("X", "X", 50.0, 3.0, 8, 50.0);
        let mean: f64 = h.closes.closes().iter().sum::<f64>() / 8.0;
        assert_eq!(mean, 50.0);
    }
}
