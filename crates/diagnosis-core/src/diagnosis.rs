//! Diagnosis output types.
//!
//! This module defines the values produced by one analysis pass:
//!
//! - [`RatioSet`] - Every derived ratio and score
//! - [`CorporateState`], [`ExpectationStructure`], [`RiskAssessment`] - Classifications
//! - [`CharacterTags`] - Eleven independent boolean tags
//! - [`Verdict`] - Final label and rationale
//! - [`DiagnosisResult`] - All of the above for one company-period
//! - [`AnalysisRecord`] - The persisted form, keyed by symbol and period

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Symbol;

/// Altman Z-Score zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltmanZone {
    /// Z below 1.81: high bankruptcy risk.
    Distress,
    /// Z in [1.81, 2.99): caution.
    Grey,
    /// Z at or above 2.99.
    Safe,
}

impl AltmanZone {
    /// Returns the zone name ("distress", "grey", "safe").
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Distress => "distress",
            Self::Grey => "grey",
            Self::Safe => "safe",
        }
    }
}

impl fmt::Display for AltmanZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative state of the company.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorporateState {
    /// Altman zone is distress.
    #[serde(rename = "Financial Distress")]
    FinancialDistress,
    /// Weak Piotroski score.
    Deteriorating,
    /// Strong score and positive free cash flow.
    #[serde(rename = "Cash Generator")]
    CashGenerator,
    /// Strong score while still burning cash.
    #[serde(rename = "High Growth")]
    HighGrowth,
    /// Nothing decisive.
    Neutral,
}

impl CorporateState {
    /// Returns the display label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialDistress => "Financial Distress",
            Self::Deteriorating => "Deteriorating",
            Self::CashGenerator => "Cash Generator",
            Self::HighGrowth => "High Growth",
            Self::Neutral => "Neutral",
        }
    }

    /// Returns true for the two healthy states.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::CashGenerator | Self::HighGrowth)
    }
}

impl fmt::Display for CorporateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the market's priced-in growth relates to realized growth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpectationStructure {
    /// Valuation rests on revenue growth alone while cash flow is negative.
    #[serde(rename = "Single Engine")]
    SingleEngine,
    /// Implied growth far above realized growth.
    Overheated,
    /// Implied growth below realized growth.
    Underestimated,
    /// Implied growth moderately above realized growth.
    Optimistic,
    /// Implied and realized growth roughly agree.
    Reasonable,
}

impl ExpectationStructure {
    /// Returns the display label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleEngine => "Single Engine",
            Self::Overheated => "Overheated",
            Self::Underestimated => "Underestimated",
            Self::Optimistic => "Optimistic",
            Self::Reasonable => "Reasonable",
        }
    }
}

impl fmt::Display for ExpectationStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level, ordered from lowest to highest.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RiskLevel {
    /// No risk factor found.
    #[default]
    Low,
    /// Earnings quality concerns only.
    Medium,
    /// Weak fundamentals.
    High,
    /// Bankruptcy risk.
    Critical,
}

impl RiskLevel {
    /// Returns the display label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level together with the ordered reasons that produced it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Overall level.
    pub level: RiskLevel,
    /// Risk factors in the order they were detected.
    pub factors: Vec<String>,
}

/// Character tag identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Safe Altman zone with low volatility.
    #[serde(rename = "tag_safety_shield")]
    SafetyShield,
    /// Strong free cash flow relative to assets.
    #[serde(rename = "tag_cash_cow")]
    CashCow,
    /// High profitability with improving margins.
    #[serde(rename = "tag_quality_growth")]
    QualityGrowth,
    /// High F-Score with a stable Z-Score.
    #[serde(rename = "tag_institutional")]
    Institutional,
    /// Valuation rests on a single growth engine.
    #[serde(rename = "tag_single_engine")]
    SingleEngine,
    /// Large expectation gap with weak fundamentals.
    #[serde(rename = "tag_high_volatility")]
    HighVolatility,
    /// Recovering fundamentals not yet priced in.
    #[serde(rename = "tag_silent_improver")]
    SilentImprover,
    /// Profit sign flip after weakness.
    #[serde(rename = "tag_turnaround")]
    Turnaround,
    /// Persisting distress.
    #[serde(rename = "tag_zombie")]
    Zombie,
    /// Earnings not backed by cash.
    #[serde(rename = "tag_accounting_risk")]
    AccountingRisk,
    /// Overheated expectations on a risky balance sheet.
    #[serde(rename = "tag_fragile")]
    Fragile,
}

impl Tag {
    /// All tags in their canonical order.
    pub const ALL: [Self; 11] = [
        Self::SafetyShield,
        Self::CashCow,
        Self::QualityGrowth,
        Self::Institutional,
        Self::SingleEngine,
        Self::HighVolatility,
        Self::SilentImprover,
        Self::Turnaround,
        Self::Zombie,
        Self::AccountingRisk,
        Self::Fragile,
    ];

    /// Returns the tag key (e.g. "tag_zombie").
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SafetyShield => "tag_safety_shield",
            Self::CashCow => "tag_cash_cow",
            Self::QualityGrowth => "tag_quality_growth",
            Self::Institutional => "tag_institutional",
            Self::SingleEngine => "tag_single_engine",
            Self::HighVolatility => "tag_high_volatility",
            Self::SilentImprover => "tag_silent_improver",
            Self::Turnaround => "tag_turnaround",
            Self::Zombie => "tag_zombie",
            Self::AccountingRisk => "tag_accounting_risk",
            Self::Fragile => "tag_fragile",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eleven independent character tags of one diagnosis.
///
/// Tags are not mutually exclusive; contradictory-looking combinations
/// are kept as detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterTags {
    /// See [`Tag::SafetyShield`].
    pub tag_safety_shield: bool,
    /// See [`Tag::CashCow`].
    pub tag_cash_cow: bool,
    /// See [`Tag::QualityGrowth`].
    pub tag_quality_growth: bool,
    /// See [`Tag::Institutional`].
    pub tag_institutional: bool,
    /// See [`Tag::SingleEngine`].
    pub tag_single_engine: bool,
    /// See [`Tag::HighVolatility`].
    pub tag_high_volatility: bool,
    /// See [`Tag::SilentImprover`].
    pub tag_silent_improver: bool,
    /// See [`Tag::Turnaround`].
    pub tag_turnaround: bool,
    /// See [`Tag::Zombie`].
    pub tag_zombie: bool,
    /// See [`Tag::AccountingRisk`].
    pub tag_accounting_risk: bool,
    /// See [`Tag::Fragile`].
    pub tag_fragile: bool,
}

impl CharacterTags {
    /// Returns whether `tag` is set.
    #[must_use]
    pub const fn has(&self, tag: Tag) -> bool {
        match tag {
            Tag::SafetyShield => self.tag_safety_shield,
            Tag::CashCow => self.tag_cash_cow,
            Tag::QualityGrowth => self.tag_quality_growth,
            Tag::Institutional => self.tag_institutional,
            Tag::SingleEngine => self.tag_single_engine,
            Tag::HighVolatility => self.tag_high_volatility,
            Tag::SilentImprover => self.tag_silent_improver,
            Tag::Turnaround => self.tag_turnaround,
            Tag::Zombie => self.tag_zombie,
            Tag::AccountingRisk => self.tag_accounting_risk,
            Tag::Fragile => self.tag_fragile,
        }
    }

    /// Returns true if any of `tags` is set.
    #[must_use]
    pub fn any(&self, tags: &[Tag]) -> bool {
        tags.iter().any(|tag| self.has(*tag))
    }

    /// Returns the set tags in canonical order.
    #[must_use]
    pub fn active(&self) -> Vec<Tag> {
        Tag::ALL.into_iter().filter(|tag| self.has(*tag)).collect()
    }

    /// Builds a tag set with exactly the given tags set.
    #[must_use]
    pub fn from_tags(tags: &[Tag]) -> Self {
        Self {
            tag_safety_shield: tags.contains(&Tag::SafetyShield),
            tag_cash_cow: tags.contains(&Tag::CashCow),
            tag_quality_growth: tags.contains(&Tag::QualityGrowth),
            tag_institutional: tags.contains(&Tag::Institutional),
            tag_single_engine: tags.contains(&Tag::SingleEngine),
            tag_high_volatility: tags.contains(&Tag::HighVolatility),
            tag_silent_improver: tags.contains(&Tag::SilentImprover),
            tag_turnaround: tags.contains(&Tag::Turnaround),
            tag_zombie: tags.contains(&Tag::Zombie),
            tag_accounting_risk: tags.contains(&Tag::AccountingRisk),
            tag_fragile: tags.contains(&Tag::Fragile),
        }
    }
}

/// Final recommendation label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinalLabel {
    /// Critical risk.
    Avoid,
    /// Deteriorating fundamentals.
    Sell,
    /// Healthy and underestimated.
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    /// Expectations run ahead of results.
    Watch,
    /// Speculative buy on a single growth engine.
    #[serde(rename = "Buy (Spec)")]
    BuySpec,
    /// Healthy with manageable risk.
    Buy,
    /// No decisive signal.
    Hold,
}

impl FinalLabel {
    /// Returns the display label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Avoid => "Avoid",
            Self::Sell => "Sell",
            Self::StrongBuy => "Strong Buy",
            Self::Watch => "Watch",
            Self::BuySpec => "Buy (Spec)",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
        }
    }
}

impl fmt::Display for FinalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final label with its rationale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Recommendation label.
    pub final_label: FinalLabel,
    /// Whether the label counts as a buy.
    pub is_good_buy: bool,
    /// Rationale fragments joined by a full-width period.
    pub summary: String,
}

/// Dupont decomposition of return on equity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DupontBreakdown {
    /// Net income / revenue.
    pub net_profit_margin: f64,
    /// Revenue / total assets.
    pub asset_turnover: f64,
    /// Total assets / total equity.
    pub financial_leverage: f64,
    /// Net income / total equity.
    pub roe: f64,
}

/// Every ratio derived for one company-period.
///
/// `None` means the ratio is undefined for the inputs, never zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    /// Altman Z-Score.
    pub z_score: Option<f64>,
    /// Zone of the Z-Score.
    pub altman_zone: Option<AltmanZone>,
    /// Piotroski F-Score (0-9).
    pub f_score: u8,
    /// Reasons for each awarded F-Score point.
    pub f_score_reasons: Vec<String>,
    /// EBIT / interest expense.
    pub interest_coverage: Option<f64>,
    /// Sloan accruals ratio.
    pub accruals_ratio: f64,
    /// Operating cash flow / net income.
    pub earnings_quality: Option<f64>,
    /// Change in net operating working capital over total assets.
    pub delta_noa: Option<f64>,
    /// Inventory growth minus revenue growth.
    pub inventory_quality: Option<f64>,
    /// Operating income / total assets.
    pub gross_profitability: f64,
    /// Operating cash flow / total assets.
    pub cash_based_operating_profitability: f64,
    /// Return on incremental invested capital.
    pub roiic: Option<f64>,
    /// Net capex over operating cash flow.
    pub reinvestment_rate: Option<f64>,
    /// ROE decomposition.
    pub dupont: Option<DupontBreakdown>,
    /// Growth implied by free cash flow yield, in percent.
    pub implied_growth_rate_fcf: Option<f64>,
    /// Equity duration proxy in years.
    pub equity_duration: Option<f64>,
    /// Steady-state margin assumed for the sector.
    pub target_margin: f64,
    /// Revenue growth implied by the price-to-sales ratio, in percent.
    pub implied_growth_rate_revenue: Option<f64>,
    /// Realized year-over-year revenue growth, in percent.
    pub actual_revenue_growth: Option<f64>,
    /// Implied minus realized revenue growth.
    pub expectation_gap: Option<f64>,
}

/// Output of one analysis pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// Derived ratios.
    pub ratios: RatioSet,
    /// Corporate state.
    pub state: CorporateState,
    /// Expectation structure.
    pub expectation_structure: ExpectationStructure,
    /// Risk level and factors.
    pub risk: RiskAssessment,
    /// Character tags.
    pub tags: CharacterTags,
    /// Final label and rationale.
    pub verdict: Verdict,
}

/// Persisted diagnosis of one stock for one reporting period.
///
/// A newer period supersedes older records; records are never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Analyzed symbol.
    pub symbol: Symbol,
    /// End date of the analyzed period.
    pub period_end: NaiveDate,
    /// Date the analysis ran.
    pub analyzed_on: NaiveDate,
    /// Price used for the analysis.
    pub stock_price: f64,
    /// Market capitalization used for the analysis.
    pub market_cap: f64,
    /// The diagnosis.
    pub diagnosis: DiagnosisResult,
}
