//! evalgate workspace-level test utilities.
//!
//! This crate exists solely to host workspace-level tests: the BDD scenarios
//! in `tests/cucumber.rs` (driven by `features/`) and the cross-crate suite in
//! `tests/integration/`.
//!
//! The engine itself lives in the workspace member crates:
//! - `evalgate-types`: record, report and config contracts
//! - `evalgate-stats`: descriptive statistics
//! - `evalgate-significance`: Welch's t-test, Cohen's d, confidence intervals
//! - `evalgate-domain`: tally, aggregation and report composition
//! - `evalgate-adapters`: record stores
//! - `evalgate-app`: use cases, rendering and export
//! - `evalgate-cli`: the `evalgate` binary
