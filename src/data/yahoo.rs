//! Yahoo Finance price provider.
//!
//! Pulls daily candles from the public chart endpoint. No API key is
//! required, but Yahoo rejects requests without a browser-like user agent.
//!
//! API: `{base}/v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d`
//! Response: `chart.result[0]` with `meta` (current price, names) and
//! parallel `timestamp` / `indicators.quote[0].close` arrays. Closes are
//! `null` for sessions without trades.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::PriceProvider;
use crate::config::ProviderConfig;
use crate::types::{PriceHistory, PriceSeries};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; STOCKSCORE/0.1.0)";

// ---------------------------------------------------------------------------
// Chart API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

pub struct YahooProvider {
    http: Client,
    base_url: String,
    lookback_days: i64,
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build Yahoo HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            lookback_days: config.lookback_days,
        })
    }

    fn chart_url(&self, ticker: &str, period1: i64, period2: i64) -> String {
        format!(
            "{}/v8/finance/chart/{}?period1={period1}&period2={period2}&interval=1d&events=history",
            self.base_url,
            urlencoding::encode(ticker),
        )
    }

    /// Turn a chart response into a history.
    fn parse_chart(ticker: &str, resp: ChartResponse) -> Result<PriceHistory> {
        if let Some(err) = resp.chart.error {
            anyhow::bail!("Yahoo chart error for {ticker}: {} ({})", err.description, err.code);
        }

        let result = resp
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .with_context(|| format!("Yahoo returned no chart data for {ticker}"))?;

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        // Pair closes with timestamps so gaps and ordering survive null-dropping.
        let mut candles: Vec<(i64, f64)> = if result.timestamp.len() == closes.len() {
            result
                .timestamp
                .iter()
                .zip(&closes)
                .filter_map(|(&ts, c)| c.map(|c| (ts, c)))
                .collect()
        } else {
            closes
                .iter()
                .enumerate()
                .filter_map(|(i, c)| c.map(|c| (i as i64, c)))
                .collect()
        };
        candles.sort_by_key(|(ts, _)| *ts);

        let closes: Vec<f64> = candles
            .into_iter()
            .map(|(_, c)| c)
            .filter(|c| c.is_finite())
            .collect();

        if closes.is_empty() {
            anyhow::bail!("No closing prices for {ticker}");
        }

        let latest_price = result
            .meta
            .regular_market_price
            .or_else(|| closes.last().copied())
            .with_context(|| format!("No current price for {ticker}"))?;

        let company = result.meta.long_name.or(result.meta.short_name);

        Ok(PriceHistory {
            ticker: ticker.to_string(),
            company,
            currency: result.meta.currency,
            closes: PriceSeries::new(closes),
            latest_price,
        })
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_history(&self, ticker: &str) -> Result<PriceHistory> {
        let now = Utc::now();
        let period1 = (now - Duration::days(self.lookback_days)).timestamp();
        let url = self.chart_url(ticker, period1, now.timestamp());

        let resp = self.http.get(&url).send().await
            .context(format!("Yahoo request failed for {ticker}"))?;

        let status = resp.status();
        let body = resp.text().await
            .context(format!("Failed to read Yahoo response for {ticker}"))?;

        // Yahoo reports unknown symbols as 404 with a JSON error body.
        let parsed: Result<ChartResponse, _> = serde_json::from_str(&body);
        let chart = match parsed {
            Ok(chart) => chart,
            Err(_) if !status.is_success() => {
                anyhow::bail!("Yahoo API error for {ticker}: {status}");
            }
            Err(e) => {
                return Err(e).context(format!("Failed to parse Yahoo response for {ticker}"));
            }
        };

        let history = Self::parse_chart(ticker, chart)?;

        debug!(
            ticker,
            closes = history.closes.len(),
            latest_price = history.latest_price,
            company = ?history.company,
            "Price history fetched"
        );

        Ok(history)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
