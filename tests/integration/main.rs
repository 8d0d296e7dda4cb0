//! Integration tests: full fetch → score → allocate runs against a
//! deterministic in-memory provider.

mod mock_provider;
mod simulation;
