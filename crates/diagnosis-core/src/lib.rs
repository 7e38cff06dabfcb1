#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/diagnosis/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for fundamental stock diagnosis.
//!
//! This crate provides the foundational abstractions shared by the engine,
//! the portfolio aggregator and the persistence layer:
//!
//! - [`FundamentalDataProvider`](provider::FundamentalDataProvider) - Financial statements and market data
//! - [`ReferenceDataProvider`](provider::ReferenceDataProvider) - Company metadata
//! - [`AnalysisStore`](store::AnalysisStore) - Persistence abstraction
//! - [`DiagnosisResult`](diagnosis::DiagnosisResult) - Output of one analysis pass

/// Ordered alias resolution for raw line items.
pub mod alias;
/// Diagnosis output types (ratios, labels, tags, verdict).
pub mod diagnosis;
/// Error types for diagnosis operations.
pub mod error;
/// Reporting period definitions.
pub mod period;
/// Provider traits for fetching fundamental data.
pub mod provider;
/// Store trait for persisting statements and analysis results.
pub mod store;
/// Core data types (Symbol, FinancialStatement, MarketData, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use alias::{LineItems, resolve_alias};
pub use diagnosis::{
    AltmanZone, AnalysisRecord, CharacterTags, CorporateState, DiagnosisResult, DupontBreakdown,
    ExpectationStructure, FinalLabel, RatioSet, RiskAssessment, RiskLevel, Tag, Verdict,
};
pub use error::{DiagnosisError, Result};
pub use period::PeriodType;
pub use provider::{DataProvider, FundamentalDataProvider, ReferenceDataProvider};
pub use store::AnalysisStore;
pub use types::{
    CompanyInfo, FetchLog, FetchStatus, FinancialStatement, MarketData, PortfolioItem, Symbol,
};
