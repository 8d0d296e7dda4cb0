//! Moving-average scoring.
//!
//! Compares a ticker's latest price to its trailing 50-day average and
//! combines three bounded sub-scores into an overall attractiveness score:
//!
//! - **Stability**: how flat the average has been inside the window.
//! - **Closeness**: how near the price sits to the average.
//! - **ExtraValue**: a bonus for trading below the average.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{PriceSeries, ScoreError, ScoredRecord};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Statistic used to measure how flat the moving average is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum StabilityMethod {
    /// Dispersion of `span`-day rolling means across the averaging window,
    /// relative to the moving average.
    RollingDispersion { span: usize },
    /// Relative change of the moving average over the last `lag` sessions.
    /// A change of `threshold` or more gives zero stability.
    ///
    /// `lag` counts sessions between the two averages: `lag = 5` compares
    /// with the average ending 5 closes ago and needs `window + 5` closes.
    /// Comparing with the fifth most recent average is `lag = 4`.
    Slope { lag: usize, threshold: f64 },
}

impl Default for StabilityMethod {
    fn default() -> Self {
        StabilityMethod::RollingDispersion { span: 10 }
    }
}

/// How closeness decays as the price moves away from the average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ClosenessShape {
    /// `1 - |d|`, clamped to [0, 1].
    Linear,
    /// `exp(-d² / 2σ²)`.
    Gaussian { sigma: f64 },
}

impl Default for ClosenessShape {
    fn default() -> Self {
        ClosenessShape::Linear
    }
}

/// Scoring configuration. Threaded into the scorer explicitly; there is no
/// global weighting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Moving-average window in sessions.
    pub window: usize,
    pub stability: StabilityMethod,
    pub closeness: ClosenessShape,
    /// Exponent applied to stability in the composite. 0 ignores it.
    pub stability_weight: f64,
    /// Exponent applied to closeness in the composite. 0 ignores it.
    pub closeness_weight: f64,
    /// Maximum ExtraValue bonus in percent (25.0 caps ExtraValue at 1.25).
    pub extra_value_cap_percent: Option<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window: 50,
            stability: StabilityMethod::default(),
            closeness: ClosenessShape::default(),
            stability_weight: 1.0,
            closeness_weight: 1.0,
            extra_value_cap_percent: None,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ScoreError> {
        let bad = |msg: String| -> Result<(), ScoreError> { Err(ScoreError::Config(msg)) };

        if self.window < 2 {
            return bad(format!("scoring.window must be at least 2, got {}", self.window));
        }
        match self.stability {
            StabilityMethod::RollingDispersion { span } if span == 0 => {
                return bad("scoring.stability.span must be at least 1".into());
            }
            StabilityMethod::Slope { lag, .. } if lag == 0 => {
                return bad("scoring.stability.lag must be at least 1".into());
            }
            StabilityMethod::Slope { threshold, .. } if !(threshold > 0.0) => {
                return bad(format!("scoring.stability.threshold must be positive, got {threshold}"));
            }
            _ => {}
        }
        if let ClosenessShape::Gaussian { sigma } = self.closeness {
            if !(sigma > 0.0) {
                return bad(format!("scoring.closeness.sigma must be positive, got {sigma}"));
            }
        }
        for (name, w) in [
            ("stability_weight", self.stability_weight),
            ("closeness_weight", self.closeness_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return bad(format!("scoring.{name} must be finite and >= 0, got {w}"));
            }
        }
        if let Some(cap) = self.extra_value_cap_percent {
            if !cap.is_finite() || cap < 0.0 {
                return bad(format!("scoring.extra_value_cap_percent must be >= 0, got {cap}"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Means of every `span`-long run in `values`.
fn rolling_means(values: &[f64], span: usize) -> Vec<f64> {
    values.windows(span).map(mean).collect()
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Turns a price history into a `ScoredRecord`.
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoreError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Score one ticker.
    ///
    /// `series` holds daily closes, most recent last; only the trailing
    /// `window` closes feed the average. `latest_price` is the current price
    /// and need not equal the last close.
    pub fn score(
        &self,
        ticker: &str,
        series: &PriceSeries,
        latest_price: f64,
    ) -> Result<ScoredRecord, ScoreError> {
        let window = self.config.window;

        let recent = series.tail(window).ok_or_else(|| ScoreError::InsufficientHistory {
            ticker: ticker.to_string(),
            required: window,
            available: series.len(),
        })?;

        let moving_average = mean(recent);

        if !latest_price.is_finite()
            || latest_price <= 0.0
            || !moving_average.is_finite()
            || moving_average <= 0.0
        {
            return Err(ScoreError::InvalidPrice {
                ticker: ticker.to_string(),
                latest_price,
                moving_average,
            });
        }

        let diff = (latest_price - moving_average) / moving_average;

        let stability = self.stability(ticker, series, recent, moving_average)?;
        let closeness = self.closeness(diff);
        let extra_value = self.extra_value(latest_price, moving_average, diff);

        let overall_score = stability.powf(self.config.stability_weight)
            * closeness.powf(self.config.closeness_weight)
            * extra_value;

        debug!(
            ticker,
            latest_price,
            moving_average = format!("{:.4}", moving_average),
            diff = format!("{:+.2}%", diff * 100.0),
            stability = format!("{:.4}", stability),
            closeness = format!("{:.4}", closeness),
            extra_value = format!("{:.4}", extra_value),
            score = format!("{:.4}", overall_score),
            "Ticker scored"
        );

        Ok(ScoredRecord {
            ticker: ticker.to_string(),
            company: None,
            currency: None,
            latest_price,
            moving_average_50: moving_average,
            price_difference_percent: diff,
            stability,
            closeness,
            extra_value,
            overall_score,
        })
    }

    fn stability(
        &self,
        ticker: &str,
        series: &PriceSeries,
        recent: &[f64],
        moving_average: f64,
    ) -> Result<f64, ScoreError> {
        match self.config.stability {
            StabilityMethod::RollingDispersion { span } => {
                let means = if span <= recent.len() {
                    rolling_means(recent, span)
                } else {
                    Vec::new()
                };
                if means.len() < 2 {
                    return Err(ScoreError::InsufficientHistory {
                        ticker: ticker.to_string(),
                        required: span + 1,
                        available: recent.len(),
                    });
                }
                Ok((1.0 - std_dev(&means) / moving_average).clamp(0.0, 1.0))
            }
            StabilityMethod::Slope { lag, threshold } => {
                let window = self.config.window;
                let required = window + lag;
                if series.len() < required {
                    return Err(ScoreError::InsufficientHistory {
                        ticker: ticker.to_string(),
                        required,
                        available: series.len(),
                    });
                }
                let closes = series.closes();
                let end = closes.len() - lag;
                let earlier = mean(&closes[end - window..end]);
                if !(earlier > 0.0) {
                    return Err(ScoreError::InvalidPrice {
                        ticker: ticker.to_string(),
                        latest_price: closes[closes.len() - 1],
                        moving_average: earlier,
                    });
                }
                let slope = (moving_average - earlier) / earlier;
                Ok((1.0 - slope.abs() / threshold).clamp(0.0, 1.0))
            }
        }
    }

    fn closeness(&self, diff: f64) -> f64 {
        match self.config.closeness {
            ClosenessShape::Linear => (1.0 - diff.abs()).clamp(0.0, 1.0),
            ClosenessShape::Gaussian { sigma } => {
                (-(diff * diff) / (2.0 * sigma * sigma)).exp().clamp(0.0, 1.0)
            }
        }
    }

    fn extra_value(&self, latest_price: f64, moving_average: f64, diff: f64) -> f64 {
        if latest_price >= moving_average {
            return 1.0;
        }
        let bonus = 1.0 + diff.abs();
        match self.config.extra_value_cap_percent {
            Some(cap) => bonus.min(1.0 + cap / 100.0),
            None => bonus,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
