//! Portfolio report types.

use diagnosis_core::{DiagnosisError, DiagnosisResult, Result, Symbol, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::narrative::Category;

/// Message of the report produced for a portfolio without value.
pub const EMPTY_PORTFOLIO_MESSAGE: &str = "Portfolio is empty. Add holdings to run a diagnosis.";

/// A weighted holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Held symbol.
    pub symbol: Symbol,
    /// Shares held.
    pub quantity: f64,
    /// Average acquisition price.
    pub average_price: f64,
    /// Price of the latest diagnosis.
    pub price: f64,
    /// `price * quantity`.
    pub market_value: f64,
    /// `average_price * quantity`.
    pub cost_basis: f64,
    /// `market_value - cost_basis`.
    pub unrealized_pnl: f64,
    /// Share of total value, in percent.
    pub weight: f64,
    /// Assigned category.
    pub category: Category,
    /// Latest diagnosis of the stock.
    pub diagnosis: DiagnosisResult,
}

/// Dependency of the portfolio on one narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeDependency {
    /// Narrative identifier.
    pub key: String,
    /// Short label.
    pub label: String,
    /// Weighted dependency in `[0, 100]`.
    pub dependency_score: f64,
    /// What the dependency means.
    pub description: String,
    /// Scenario under which the assumption breaks.
    pub risk_scenario: String,
}

/// Aggregated exposure report of one portfolio.
///
/// Recomputed on every request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// Sum of holding market values.
    pub total_value: f64,
    /// Health score in `[0, 100]`.
    pub health_score: u8,
    /// One-sentence diagnosis.
    pub diagnosis_summary: String,
    /// Percentage of total value carrying each tag.
    pub tag_exposure: BTreeMap<Tag, f64>,
    /// Percentage of total value in each category.
    pub category_exposure: BTreeMap<Category, f64>,
    /// Narrative dependencies, highest first.
    pub narrative_dependency: Vec<NarrativeDependency>,
    /// Holdings that were weighted.
    pub holdings: Vec<Holding>,
    /// Symbols held without any diagnosis.
    pub excluded: Vec<Symbol>,
}

impl PortfolioReport {
    /// The fixed report for a portfolio with zero total value.
    #[must_use]
    pub fn empty(excluded: Vec<Symbol>) -> Self {
        Self {
            total_value: 0.0,
            health_score: 0,
            diagnosis_summary: EMPTY_PORTFOLIO_MESSAGE.to_string(),
            tag_exposure: Tag::ALL.into_iter().map(|tag| (tag, 0.0)).collect(),
            category_exposure: Category::ALL.into_iter().map(|cat| (cat, 0.0)).collect(),
            narrative_dependency: Vec::new(),
            holdings: Vec::new(),
            excluded,
        }
    }

    /// Returns true for the fixed empty report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// The most depended-upon narrative.
    #[must_use]
    pub fn top_narrative(&self) -> Option<&NarrativeDependency> {
        self.narrative_dependency.first()
    }

    /// Renders the report as loosely typed JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| DiagnosisError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = PortfolioReport::empty(vec![Symbol::new("9999")]);
        assert!(report.is_empty());
        assert_eq!(report.health_score, 0);
        assert_eq!(report.tag_exposure.len(), 11);
        assert_eq!(report.category_exposure.len(), 5);
        assert!(report.tag_exposure.values().all(|v| *v == 0.0));
        assert!(report.top_narrative().is_none());
    }

    #[test]
    fn test_to_json_shape() {
        let json = PortfolioReport::empty(Vec::new()).to_json().unwrap();
        assert_eq!(json["diagnosis_summary"], EMPTY_PORTFOLIO_MESSAGE);
        assert_eq!(json["tag_exposure"]["tag_zombie"], 0.0);
        assert_eq!(json["category_exposure"]["Speculative"], 0.0);
        assert!(json["narrative_dependency"].as_array().unwrap().is_empty());
    }
}
