#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/diagnosis/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Stock diagnosis engine.
//!
//! # Example
//!
//! ```
//! use diagnosis_engine::{EngineConfig, MetricsInput, analyze};
//!
//! let input = MetricsInput {
//!     revenue: 1000.0,
//!     operating_income: 150.0,
//!     net_income: 80.0,
//!     ebit: 160.0,
//!     total_assets: 900.0,
//!     current_assets: 500.0,
//!     current_liabilities: 300.0,
//!     retained_earnings: 200.0,
//!     long_term_debt: 100.0,
//!     market_cap: 1200.0,
//!     ..Default::default()
//! };
//!
//! let result = analyze(&input, &EngineConfig::default(), None);
//! assert!(result.ratios.z_score.is_some());
//! ```

/// The full analysis pipeline.
pub mod analyze;
/// Thresholds, valuation assumptions and tag tuning.
pub mod config;
/// Corporate state, expectation and risk classification.
pub mod diagnose;
/// Engine input types.
pub mod input;
/// Fundamental ratios and scores.
pub mod ratios;
/// Character tag detection.
pub mod tags;
/// Final label resolution.
pub mod verdict;

pub use analyze::{analyze, compute_ratios};
pub use config::{EngineConfig, SectorMargin, TagThresholds, ValuationAssumptions};
pub use input::{MetricsInput, PriorPeriod};
pub use tags::TagHistory;
pub use verdict::resolve_verdict;
