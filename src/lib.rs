//! STOCKSCORE — moving-average stock scoring and capital allocation
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod strategy;
pub mod engine;
