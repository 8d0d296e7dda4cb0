//! Run report: scored tickers, proposed allocation, and skipped symbols.
//!
//! Rendered as plain-text tables for the terminal or as JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::types::{AllocationRecord, ScoredRecord, SkippedTicker};

/// Summary of a complete fetch → score → allocate run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub capital: Decimal,
    pub currency: String,
    /// In input ticker order.
    pub scored: Vec<ScoredRecord>,
    /// Joined 1:1 with `scored` by ticker, same order.
    pub allocations: Vec<AllocationRecord>,
    pub skipped: Vec<SkippedTicker>,
}

impl Report {
    /// Scored records, best opportunity first.
    pub fn ranked(&self) -> Vec<&ScoredRecord> {
        let mut ranked: Vec<&ScoredRecord> = self.scored.iter().collect();
        ranked.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
        ranked
    }

    pub fn allocation_for(&self, ticker: &str) -> Option<&AllocationRecord> {
        self.allocations.iter().find(|a| a.ticker == ticker)
    }

    pub fn total_allocated(&self) -> Decimal {
        self.allocations.iter().map(|a| a.investment_amount).sum()
    }

    /// Whether any ticker produced a positive score.
    pub fn has_signal(&self) -> bool {
        self.scored.iter().any(|s| s.overall_score > 0.0)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialise report")
    }

    fn name_for<'a>(&'a self, ticker: &'a str) -> &'a str {
        self.scored
            .iter()
            .find(|s| s.ticker == ticker)
            .map(|s| s.display_name())
            .unwrap_or(ticker)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scored.is_empty() {
            writeln!(f, "No valid data for any ticker. Check the logs for errors.")?;
        } else {
            writeln!(f, "Scores (closer to the 50-day average is better, best first):")?;
            writeln!(
                f,
                "{:<32} {:>10} {:>4} {:>10} {:>8} {:>9} {:>9} {:>7} {:>7}",
                "Company", "Price", "Ccy", "MA50", "Diff%", "Stability", "Closeness", "Extra", "Score"
            )?;
            for s in self.ranked() {
                writeln!(
                    f,
                    "{:<32} {:>10.2} {:>4} {:>10.2} {:>+8.2} {:>9.4} {:>9.4} {:>7.4} {:>7.4}",
                    truncate(s.display_name(), 32),
                    s.latest_price,
                    s.currency.as_deref().unwrap_or("-"),
                    s.moving_average_50,
                    s.price_difference_percent * 100.0,
                    s.stability,
                    s.closeness,
                    s.extra_value,
                    s.overall_score,
                )?;
            }

            if !self.has_signal() {
                writeln!(f, "\nNo ticker scored above zero; capital split equally.")?;
            }

            writeln!(f, "\nProposed allocation of {:.2} {}:", self.capital, self.currency)?;
            writeln!(f, "{:<32} {:>8} {:>12}", "Company", "Share%", self.currency)?;
            for a in &self.allocations {
                writeln!(
                    f,
                    "{:<32} {:>8.2} {:>12.2}",
                    truncate(self.name_for(&a.ticker), 32),
                    a.investment_fraction * 100.0,
                    a.investment_amount,
                )?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f, "\nSkipped:")?;
            for s in &self.skipped {
                writeln!(f, "  {}: {}", s.ticker, s.reason)?;
            }
        }

        write!(
            f,
            "\nAnalysis performed: {}",
            self.generated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        )
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
