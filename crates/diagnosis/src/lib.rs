#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/diagnosis/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Fundamental stock diagnosis.
//!
//! This crate re-exports the core types, the engine, the portfolio
//! aggregator and the store implementations, and provides an [`Analyzer`]
//! that ties a data provider and a store to the engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use diagnosis::{Analyzer, BatchConfig, SqliteStore, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> diagnosis::Result<()> {
//!     let store = Arc::new(SqliteStore::new("diagnosis.db")?);
//!     let analyzer = Analyzer::new(Arc::new(my_provider), store);
//!
//!     let symbols = vec![Symbol::new("7203"), Symbol::new("6758")];
//!     let summary = analyzer.analyze_batch(&symbols, &BatchConfig::default()).await;
//!     println!("{} succeeded, {} failed", summary.succeeded.len(), summary.failed.len());
//!
//!     let report = analyzer.portfolio_report("main").await?;
//!     println!("health {}: {}", report.health_score, report.diagnosis_summary);
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use diagnosis_core::*;

// Engine
pub use diagnosis_engine::{
    EngineConfig, MetricsInput, PriorPeriod, TagHistory, TagThresholds, ValuationAssumptions,
    analyze, compute_ratios,
};

// Portfolio aggregation
pub use diagnosis_portfolio::{
    Category, ExposureConfig, Holding, Narrative, NarrativeDependency, PortfolioReport,
    analyze_portfolio,
};

// Store implementations
pub use diagnosis_store::InMemoryStore;
#[cfg(feature = "store-sqlite")]
pub use diagnosis_store::SqliteStore;

mod analyzer;
mod batch;

pub use analyzer::Analyzer;
pub use batch::{BatchConfig, BatchSummary};
