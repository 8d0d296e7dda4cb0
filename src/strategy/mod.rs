//! Strategy engine: moving-average scoring and capital allocation.

pub mod allocator;
pub mod scorer;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::types::{AllocationRecord, PriceHistory, ScoreError, ScoredRecord, SkippedTicker};
use allocator::Allocator;
use scorer::Scorer;

/// Output of one scoring + allocation pass.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub scored: Vec<ScoredRecord>,
    pub allocations: Vec<AllocationRecord>,
    pub skipped: Vec<SkippedTicker>,
}

/// Pipelines scoring → allocation over a batch of price histories.
pub struct StrategyOrchestrator {
    scorer: Scorer,
    allocator: Allocator,
}

impl StrategyOrchestrator {
    pub fn new(scorer: Scorer, allocator: Allocator) -> Self {
        Self { scorer, allocator }
    }

    /// Score every history. Per-ticker failures are skipped; any other
    /// error aborts the batch.
    pub fn score_batch(
        &self,
        histories: &[PriceHistory],
    ) -> Result<(Vec<ScoredRecord>, Vec<SkippedTicker>), ScoreError> {
        let mut scored = Vec::with_capacity(histories.len());
        let mut skipped = Vec::new();

        for h in histories {
            match self.scorer.score(&h.ticker, &h.closes, h.latest_price) {
                Ok(rec) => scored.push(rec.with_listing(h.company.clone(), h.currency.clone())),
                Err(e) if !e.is_per_ticker() => return Err(e),
                Err(e) => {
                    warn!(ticker = %h.ticker, error = %e, "Scoring failed, skipping ticker");
                    skipped.push(SkippedTicker {
                        ticker: h.ticker.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok((scored, skipped))
    }

    /// Score the batch and split `total_capital` across the survivors.
    ///
    /// Fails only on an invalid budget.
    pub fn run(
        &self,
        histories: &[PriceHistory],
        total_capital: Decimal,
    ) -> Result<StrategyOutcome, ScoreError> {
        Allocator::check_capital(total_capital)?;

        let (scored, skipped) = self.score_batch(histories)?;
        let allocations = self.allocator.allocate(&scored, total_capital)?;

        info!(
            scored = scored.len(),
            skipped = skipped.len(),
            capital = %total_capital,
            "Strategy pass complete"
        );

        Ok(StrategyOutcome {
            scored,
            allocations,
            skipped,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
