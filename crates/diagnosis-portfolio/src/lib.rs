#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/diagnosis/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Portfolio exposure aggregation.
//!
//! - [`analyze_portfolio`] - Builds a [`PortfolioReport`] from holdings and their latest diagnoses
//! - [`Category`] - One bucket per holding, assigned by tag priority
//! - [`Narrative`] - Macro assumptions the portfolio can depend on

/// Value-weighted exposure aggregation.
pub mod exposure;
/// Holding categories and the narrative table.
pub mod narrative;
/// Portfolio report types.
pub mod report;

pub use exposure::{ExposureConfig, analyze_portfolio};
pub use narrative::{Category, Narrative, default_narratives};
pub use report::{EMPTY_PORTFOLIO_MESSAGE, Holding, NarrativeDependency, PortfolioReport};
