//! Capital allocation.
//!
//! Splits a periodic investment budget across scored tickers in
//! proportion to their overall score, rounds to currency precision and
//! reconciles the rounding residual so the amounts add up to the budget.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{AllocationRecord, ScoreError, ScoredRecord};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Allocation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Currency precision for rounded amounts.
    pub decimal_places: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self { decimal_places: 2 }
    }
}

// ---------------------------------------------------------------------------
// Allocator
// ---------------------------------------------------------------------------

pub struct Allocator {
    config: AllocatorConfig,
}

impl Allocator {
    pub fn new(config: AllocatorConfig) -> Self {
        Self { config }
    }

    /// Reject budgets no distribution can satisfy.
    pub fn check_capital(total_capital: Decimal) -> Result<(), ScoreError> {
        if total_capital < Decimal::ZERO {
            return Err(ScoreError::InvalidCapital(total_capital));
        }
        Ok(())
    }

    /// Split `total_capital` across `records` by overall score.
    ///
    /// Output order matches input order. When no record has a positive
    /// score the budget is split equally.
    pub fn allocate(
        &self,
        records: &[ScoredRecord],
        total_capital: Decimal,
    ) -> Result<Vec<AllocationRecord>, ScoreError> {
        Self::check_capital(total_capital)?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let fractions = Self::fractions(records);
        let target = self.round(total_capital);

        let exact: Vec<Decimal> = fractions
            .iter()
            .map(|&f| Decimal::from_f64(f).unwrap_or(Decimal::ZERO) * total_capital)
            .collect();
        let mut amounts: Vec<Decimal> = exact.iter().map(|&a| self.round(a)).collect();

        self.reconcile(&mut amounts, &exact, target);

        let allocations: Vec<AllocationRecord> = records
            .iter()
            .zip(fractions)
            .zip(amounts)
            .map(|((rec, investment_fraction), investment_amount)| {
                debug!(
                    ticker = %rec.ticker,
                    score = format!("{:.4}", rec.overall_score),
                    fraction = format!("{:.2}%", investment_fraction * 100.0),
                    amount = %investment_amount,
                    "Allocation sized"
                );
                AllocationRecord {
                    ticker: rec.ticker.clone(),
                    investment_fraction,
                    investment_amount,
                }
            })
            .collect();

        Ok(allocations)
    }

    /// Score-proportional fractions, or an equal split if nothing scored.
    fn fractions(records: &[ScoredRecord]) -> Vec<f64> {
        let weights: Vec<f64> = records
            .iter()
            .map(|r| {
                if r.overall_score.is_finite() {
                    r.overall_score.max(0.0)
                } else {
                    0.0
                }
            })
            .collect();
        let total: f64 = weights.iter().sum();

        if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            warn!(
                tickers = records.len(),
                "No positive scores, splitting capital equally"
            );
            let equal = 1.0 / records.len() as f64;
            vec![equal; records.len()]
        }
    }

    fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.config.decimal_places, RoundingStrategy::MidpointNearestEven)
    }

    /// Smallest amount expressible at the configured precision.
    fn unit(&self) -> Decimal {
        Decimal::new(1, self.config.decimal_places.min(28))
    }

    /// Spread the rounding residual one unit at a time so the total is exact.
    ///
    /// Missing units go to the amounts rounded down the most, surplus units
    /// come off the amounts rounded up the most. Ties favour the largest
    /// amount, then input order. No amount is taken below zero.
    fn reconcile(&self, amounts: &mut [Decimal], exact: &[Decimal], target: Decimal) {
        let unit = self.unit();
        let mut residual = target - amounts.iter().sum::<Decimal>();
        if residual.is_zero() {
            return;
        }
        debug!(residual = %residual, "Reconciling rounding residual");

        let mut order: Vec<usize> = (0..amounts.len()).collect();

        if residual > Decimal::ZERO {
            order.sort_by(|&a, &b| {
                (exact[b] - amounts[b])
                    .cmp(&(exact[a] - amounts[a]))
                    .then(amounts[b].cmp(&amounts[a]))
            });
            while residual >= unit {
                for &i in &order {
                    if residual < unit {
                        break;
                    }
                    amounts[i] += unit;
                    residual -= unit;
                }
            }
        } else {
            order.sort_by(|&a, &b| {
                (amounts[b] - exact[b])
                    .cmp(&(amounts[a] - exact[a]))
                    .then(amounts[b].cmp(&amounts[a]))
            });
            while -residual >= unit {
                let mut moved = false;
                for &i in &order {
                    if -residual < unit {
                        break;
                    }
                    if amounts[i] >= unit {
                        amounts[i] -= unit;
                        residual += unit;
                        moved = true;
                    }
                }
                if !moved {
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
