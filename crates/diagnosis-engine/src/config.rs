//! Thresholds, valuation assumptions and tag tuning.
//!
//! Classification cutoffs used by the diagnoser and the verdict cascade are
//! plain constants. Valuation assumptions and tag thresholds are grouped in
//! serde-friendly structs so callers can override them from configuration.

use serde::{Deserialize, Serialize};

/// Z-Score below which a company is in the distress zone.
pub const Z_DISTRESS_THRESHOLD: f64 = 1.81;
/// Z-Score at or above which a company is in the safe zone.
pub const Z_SAFE_THRESHOLD: f64 = 2.99;

/// F-Score at or below which fundamentals count as weak.
pub const F_SCORE_WEAK: u8 = 3;
/// F-Score at or above which fundamentals count as strong.
pub const F_SCORE_STRONG: u8 = 5;
/// Upper bound of the F-Score.
pub const F_SCORE_MAX: u8 = 9;

/// Implied revenue growth (%) above which a cash-burning company is a single engine.
pub const SINGLE_ENGINE_MIN_IMPLIED_GROWTH: f64 = 25.0;
/// Reality gap (pts) above which expectations are overheated.
pub const GAP_OVERHEATED: f64 = 20.0;
/// Reality gap (pts) below which a company is underestimated.
pub const GAP_UNDERESTIMATED: f64 = -10.0;
/// Reality gap (pts) above which expectations are optimistic.
pub const GAP_OPTIMISTIC: f64 = 10.0;

/// Accruals ratio above which earnings quality is a risk factor.
pub const ACCRUALS_RISK_THRESHOLD: f64 = 0.15;

/// Duration returned when the discount rate does not exceed implied growth.
pub const EQUITY_DURATION_CAP: f64 = 50.0;

/// Sector used when none is known.
pub const DEFAULT_SECTOR: &str = "Unknown";
/// Margin assumed when no sector pattern matches.
pub const DEFAULT_TARGET_MARGIN: f64 = 0.10;

/// Steady-state FCF margin by sector, scanned in order; the first pattern
/// contained in the sector name wins.
pub const SECTOR_MARGINS: &[(&str, f64)] = &[
    ("Pharmaceutical", 0.20),
    ("Information & Communication", 0.15),
    ("Precision Instruments", 0.12),
    ("Electric Appliances", 0.08),
    ("Machinery", 0.08),
    ("Chemicals", 0.08),
    ("Transportation Equipment", 0.05),
    ("Land Transportation", 0.07),
    ("Electric Power & Gas", 0.05),
    ("Retail Trade", 0.04),
    ("Wholesale Trade", 0.03),
    ("Foods", 0.05),
    ("Construction", 0.04),
    ("Real Estate", 0.12),
    ("Banks", 0.15),
    ("Securities", 0.15),
    ("Insurance", 0.10),
    ("Services", 0.12),
    ("Technology", 0.18),
    ("Healthcare", 0.15),
    ("Utilities", 0.06),
    ("Energy", 0.08),
];

/// One entry of the sector margin table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMargin {
    /// Substring matched against the sector name (case-sensitive).
    pub pattern: String,
    /// Steady-state FCF margin.
    pub margin: f64,
}

/// Market and DCF assumptions used by the implied-growth ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationAssumptions {
    /// Risk-free rate for the cost of equity (default: 0.01).
    pub risk_free_rate: f64,
    /// Equity market risk premium (default: 0.06).
    pub market_risk_premium: f64,
    /// Discount rate for the equity duration proxy (default: 0.08).
    pub duration_discount_rate: f64,
    /// Discount rate for the implied revenue growth solve (default: 0.07).
    pub revenue_discount_rate: f64,
    /// Terminal growth for the implied revenue growth solve (default: 0.02).
    pub terminal_growth: f64,
    /// Horizon over which implied revenue growth compounds (default: 5).
    pub projection_years: u32,
    /// Margin used when no sector matches (default: 0.10).
    pub default_target_margin: f64,
    /// Ordered sector margin table.
    pub sector_margins: Vec<SectorMargin>,
    /// Award the Piotroski dilution point without share data (default: true).
    pub assume_no_dilution: bool,
}

impl Default for ValuationAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.01,
            market_risk_premium: 0.06,
            duration_discount_rate: 0.08,
            revenue_discount_rate: 0.07,
            terminal_growth: 0.02,
            projection_years: 5,
            default_target_margin: DEFAULT_TARGET_MARGIN,
            sector_margins: SECTOR_MARGINS
                .iter()
                .map(|(pattern, margin)| SectorMargin {
                    pattern: (*pattern).to_string(),
                    margin: *margin,
                })
                .collect(),
            assume_no_dilution: true,
        }
    }
}

/// Thresholds for the character tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagThresholds {
    /// Highest beta that still counts as low volatility (default: 1.0).
    pub safety_max_beta: f64,
    /// Minimum free cash flow / total assets for a cash cow (default: 0.05).
    pub cash_cow_min_fcf_to_assets: f64,
    /// Minimum gross profitability for quality growth (default: 0.10).
    pub quality_min_gross_profitability: f64,
    /// Minimum F-Score for the institutional tag (default: 7).
    pub institutional_min_f_score: u8,
    /// Minimum absolute reality gap for high volatility (default: 30.0).
    pub high_volatility_min_gap: f64,
    /// Maximum F-Score for high volatility (default: 4).
    pub high_volatility_max_f_score: u8,
    /// Minimum F-Score for a silent improver coming out of deterioration (default: 6).
    pub silent_improver_min_f_score: u8,
    /// Minimum F-Score for a silent improver without history (default: 7).
    pub silent_improver_min_f_score_no_history: u8,
    /// Interest coverage below which a distressed company is a zombie (default: 1.0).
    pub zombie_max_interest_coverage: f64,
    /// Accruals ratio above which accounting risk is flagged (default: 0.15).
    pub accounting_max_accruals: f64,
}

impl Default for TagThresholds {
    fn default() -> Self {
        Self {
            safety_max_beta: 1.0,
            cash_cow_min_fcf_to_assets: 0.05,
            quality_min_gross_profitability: 0.10,
            institutional_min_f_score: 7,
            high_volatility_min_gap: 30.0,
            high_volatility_max_f_score: 4,
            silent_improver_min_f_score: 6,
            silent_improver_min_f_score_no_history: 7,
            zombie_max_interest_coverage: 1.0,
            accounting_max_accruals: ACCRUALS_RISK_THRESHOLD,
        }
    }
}

/// Complete engine configuration.
///
/// # Example
///
/// ```
/// use diagnosis_engine::{EngineConfig, TagThresholds};
///
/// let config = EngineConfig::default().with_tags(TagThresholds {
///     safety_max_beta: 0.8,
///     ..Default::default()
/// });
/// assert_eq!(config.valuation.risk_free_rate, 0.01);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Valuation assumptions.
    pub valuation: ValuationAssumptions,
    /// Tag thresholds.
    pub tags: TagThresholds,
}

impl EngineConfig {
    /// Replaces the valuation assumptions.
    #[must_use]
    pub fn with_valuation(mut self, valuation: ValuationAssumptions) -> Self {
        self.valuation = valuation;
        self
    }

    /// Replaces the tag thresholds.
    #[must_use]
    pub fn with_tags(mut self, tags: TagThresholds) -> Self {
        self.tags = tags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_copied_in_order() {
        let valuation = ValuationAssumptions::default();
        assert_eq!(valuation.sector_margins.len(), SECTOR_MARGINS.len());
        assert_eq!(valuation.sector_margins[0].pattern, "Pharmaceutical");
        assert_eq!(valuation.sector_margins[0].margin, 0.20);
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"valuation": {"risk_free_rate": 0.02}}"#).unwrap();
        assert_eq!(config.valuation.risk_free_rate, 0.02);
        assert_eq!(config.valuation.market_risk_premium, 0.06);
        assert_eq!(config.tags, TagThresholds::default());
    }
}
