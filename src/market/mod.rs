//! Market comparison module
//!
//! Places an estimate in the context of the historical dataset:
//! - Percentile rank among all historical salaries
//! - Deviation from the market mean
//! - Benchmark statistics of similar profiles

mod reference;

pub use reference::{BenchmarkStats, MarketComparison, MarketReference, BENCHMARK_FIELDS};
