//! End-to-end runs of the scoring pipeline.
//!
//! Replays the mock watch-list through fetch → score → allocate and checks
//! the report the binary would print.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stockscore::engine::Pipeline;
use stockscore::strategy::allocator::{Allocator, AllocatorConfig};
use stockscore::strategy::scorer::{Scorer, ScoringConfig};
use stockscore::strategy::StrategyOrchestrator;
use stockscore::types::ScoreError;

use crate::mock_provider::MockProvider;

fn strategy() -> StrategyOrchestrator {
    StrategyOrchestrator::new(
        Scorer::new(ScoringConfig::default()).unwrap(),
        Allocator::new(AllocatorConfig::default()),
    )
}

fn watch_list() -> Vec<String> {
    ["GRG.L", "LEG", "MAN", "LDOS", "LKQ", "KDP", "UPS", "GPC"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

#[tokio::test]
async fn test_watch_list_run() {
    let pipeline = Pipeline::new(MockProvider::new(), strategy(), 8, "PLN");
    let report = pipeline.run(&watch_list(), dec!(3000)).await.unwrap();

    // Scored records keep input order.
    let scored: Vec<_> = report.scored.iter().map(|s| s.ticker.as_str()).collect();
    assert_eq!(scored, vec!["LDOS", "KDP", "UPS", "GPC"]);

    // Fetch failures first, then scoring failures, each in input order.
    let skipped: Vec<_> = report.skipped.iter().map(|s| s.ticker.as_str()).collect();
    assert_eq!(skipped, vec!["GRG.L", "LKQ", "LEG", "MAN"]);
    assert!(report.skipped[2].reason.contains("Insufficient history"));
    assert!(report.skipped[3].reason.contains("Invalid price"));

    // Allocation covers exactly the scored tickers and the whole budget.
    assert_eq!(report.allocations.len(), 4);
    assert_eq!(report.total_allocated(), dec!(3000.00));
    let fraction_sum: f64 = report.allocations.iter().map(|a| a.investment_fraction).sum();
    assert!((fraction_sum - 1.0).abs() < 1e-9);

    let gpc = report.allocation_for("GPC").unwrap();
    assert_eq!(gpc.investment_fraction, 0.0);
    assert_eq!(gpc.investment_amount, Decimal::ZERO);

    // KDP sits exactly on its average and ranks first.
    let ranked = report.ranked();
    assert_eq!(ranked[0].ticker, "KDP");
    assert_eq!(ranked[0].overall_score, 1.0);
    assert_eq!(ranked.last().unwrap().ticker, "GPC");

    let ups = report.scored.iter().find(|s| s.ticker == "UPS").unwrap();
    assert!((ups.overall_score - 0.9975).abs() < 1e-9);
    assert_eq!(ups.company.as_deref(), Some("United Parcel Service, Inc."));
    assert_eq!(ups.currency.as_deref(), Some("USD"));
}

#[tokio::test]
async fn test_records_respect_bounds() {
    let pipeline = Pipeline::new(MockProvider::new(), strategy(), 3, "PLN");
    let report = pipeline.run(&watch_list(), dec!(1072.32)).await.unwrap();

    for s in &report.scored {
        assert!((0.0..=1.0).contains(&s.stability));
        assert!((0.0..=1.0).contains(&s.closeness));
        assert!(s.extra_value >= 1.0);
        assert!(s.overall_score >= 0.0);
        let diff = (s.latest_price - s.moving_average_50) / s.moving_average_50;
        assert!((s.price_difference_percent - diff).abs() < 1e-12);
    }
    for a in &report.allocations {
        assert!((0.0..=1.0).contains(&a.investment_fraction));
        assert!(a.investment_amount >= Decimal::ZERO);
    }
    assert_eq!(report.total_allocated(), dec!(1072.32));
}

#[tokio::test]
async fn test_concurrency_does_not_change_results() {
    let serial = Pipeline::new(MockProvider::new(), strategy(), 1, "PLN")
        .run(&watch_list(), dec!(3000))
        .await
        .unwrap();
    let parallel = Pipeline::new(MockProvider::new(), strategy(), 8, "PLN")
        .run(&watch_list(), dec!(3000))
        .await
        .unwrap();

    assert_eq!(serial.scored, parallel.scored);
    assert_eq!(serial.allocations, parallel.allocations);
    assert_eq!(serial.skipped, parallel.skipped);
}

#[tokio::test]
async fn test_all_zero_scores_split_equally() {
    let provider = MockProvider::with_histories(vec![
        MockProvider::history("A", "Alpha", 10.0, 0.0, 60, 30.0),
        MockProvider::history("B", "Beta", 20.0, 0.0, 60, 60.0),
        MockProvider::history("C", "Gamma", 40.0, 0.0, 60, 100.0),
    ]);
    let pipeline = Pipeline::new(provider, strategy(), 4, "PLN");
    let tickers: Vec<String> = ["A", "B", "C"].iter().map(|t| t.to_string()).collect();
    let report = pipeline.run(&tickers, dec!(3000)).await.unwrap();

    assert!(!report.has_signal());
    for a in &report.allocations {
        assert_eq!(a.investment_amount, dec!(1000.00));
    }
    assert!(report.to_string().contains("capital split equally"));
}

#[tokio::test]
async fn test_negative_capital_fails_without_fetching() {
    let pipeline = Pipeline::new(MockProvider::new(), strategy(), 8, "PLN");
    let err = pipeline.run(&watch_list(), dec!(-1)).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ScoreError>(),
        Some(ScoreError::InvalidCapital(_))
    ));
    assert_eq!(pipeline.provider().call_count(), 0);
}

#[tokio::test]
async fn test_provider_outage_yields_empty_report() {
    let provider = MockProvider::new();
    provider.set_error("simulated outage");
    let pipeline = Pipeline::new(provider, strategy(), 8, "PLN");

    let report = pipeline.run(&watch_list(), dec!(3000)).await.unwrap();
    assert!(report.scored.is_empty());
    assert!(report.allocations.is_empty());
    assert_eq!(report.skipped.len(), 8);
    assert_eq!(pipeline.provider().call_count(), 8);

    let text = report.to_string();
    assert!(text.contains("No valid data"));
    assert!(text.contains("simulated outage"));
}

#[tokio::test]
async fn test_json_report() {
    let pipeline = Pipeline::new(MockProvider::new(), strategy(), 8, "USD");
    let report = pipeline.run(&watch_list(), dec!(1500)).await.unwrap();

    let v: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(v["currency"], "USD");
    assert_eq!(v["capital"], 1500.0);
    assert_eq!(v["scored"].as_array().unwrap().len(), 4);
    assert_eq!(v["skipped"].as_array().unwrap().len(), 4);
    assert!(v["generated_at"].is_string());
}
