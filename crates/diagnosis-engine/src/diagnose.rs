//! Corporate state, expectation structure and risk classification.
//!
//! All three classifiers are total: every combination of inputs, including
//! undefined ratios, maps to exactly one label.

use diagnosis_core::{AltmanZone, CorporateState, ExpectationStructure, RiskAssessment, RiskLevel};

use crate::config::{
    ACCRUALS_RISK_THRESHOLD, F_SCORE_STRONG, F_SCORE_WEAK, GAP_OPTIMISTIC, GAP_OVERHEATED,
    GAP_UNDERESTIMATED, SINGLE_ENGINE_MIN_IMPLIED_GROWTH,
};

/// Risk factor recorded for a distress-zone Z-Score.
pub const FACTOR_BANKRUPTCY: &str = "Bankruptcy Risk";
/// Risk factor recorded for a weak F-Score.
pub const FACTOR_WEAK_FUNDAMENTALS: &str = "Weak Fundamentals";
/// Risk factor recorded for high accruals.
pub const FACTOR_LOW_EARNINGS_QUALITY: &str = "Low Earnings Quality";

/// Classifies the corporate state.
///
/// Checked in order:
/// 1. Distress zone: Financial Distress
/// 2. F-Score <= 3: Deteriorating
/// 3. F-Score >= 5: Cash Generator with positive FCF, otherwise High Growth
/// 4. Otherwise: Neutral
///
/// An undefined zone never counts as distress.
#[must_use]
pub fn diagnose_corporate_state(
    f_score: u8,
    zone: Option<AltmanZone>,
    has_fcf: bool,
) -> CorporateState {
    if zone == Some(AltmanZone::Distress) {
        CorporateState::FinancialDistress
    } else if f_score <= F_SCORE_WEAK {
        CorporateState::Deteriorating
    } else if f_score >= F_SCORE_STRONG {
        if has_fcf {
            CorporateState::CashGenerator
        } else {
            CorporateState::HighGrowth
        }
    } else {
        CorporateState::Neutral
    }
}

/// Classifies how market expectations relate to realized growth.
///
/// A cash-burning company priced for more than 25% revenue growth is a
/// single engine regardless of the gap. Branches whose operand is `None`
/// are skipped.
#[must_use]
pub fn diagnose_expectation(
    gap: Option<f64>,
    implied_revenue_growth: Option<f64>,
    has_fcf: bool,
) -> ExpectationStructure {
    if !has_fcf
        && implied_revenue_growth.is_some_and(|g| g > SINGLE_ENGINE_MIN_IMPLIED_GROWTH)
    {
        return ExpectationStructure::SingleEngine;
    }

    match gap {
        Some(gap) if gap > GAP_OVERHEATED => ExpectationStructure::Overheated,
        Some(gap) if gap < GAP_UNDERESTIMATED => ExpectationStructure::Underestimated,
        Some(gap) if gap > GAP_OPTIMISTIC => ExpectationStructure::Optimistic,
        _ => ExpectationStructure::Reasonable,
    }
}

/// Collects risk factors and the resulting level.
///
/// The level only escalates: a later, milder factor never lowers it.
#[must_use]
pub fn assess_risks(zone: Option<AltmanZone>, f_score: u8, accruals_ratio: f64) -> RiskAssessment {
    let mut risk = RiskAssessment::default();

    if zone == Some(AltmanZone::Distress) {
        risk.factors.push(FACTOR_BANKRUPTCY.to_string());
        risk.level = RiskLevel::Critical;
    }

    if f_score <= F_SCORE_WEAK {
        risk.factors.push(FACTOR_WEAK_FUNDAMENTALS.to_string());
        risk.level = risk.level.max(RiskLevel::High);
    }

    if accruals_ratio > ACCRUALS_RISK_THRESHOLD {
        risk.factors.push(FACTOR_LOW_EARNINGS_QUALITY.to_string());
        risk.level = risk.level.max(RiskLevel::Medium);
    }

    risk
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corporate_state_order() {
        // Distress wins over a strong score
        assert_eq!(
            diagnose_corporate_state(9, Some(AltmanZone::Distress), true),
            CorporateState::FinancialDistress
        );
        assert_eq!(
            diagnose_corporate_state(3, Some(AltmanZone::Safe), true),
            CorporateState::Deteriorating
        );
        assert_eq!(
            diagnose_corporate_state(5, Some(AltmanZone::Grey), true),
            CorporateState::CashGenerator
        );
        assert_eq!(
            diagnose_corporate_state(5, Some(AltmanZone::Grey), false),
            CorporateState::HighGrowth
        );
        assert_eq!(
            diagnose_corporate_state(4, Some(AltmanZone::Safe), true),
            CorporateState::Neutral
        );
    }

    #[test]
    fn test_missing_zone_is_not_distress() {
        assert_eq!(
            diagnose_corporate_state(7, None, true),
            CorporateState::CashGenerator
        );
        // Insufficient data still reads as deteriorating
        assert_eq!(
            diagnose_corporate_state(0, None, false),
            CorporateState::Deteriorating
        );
    }

    #[test]
    fn test_single_engine_takes_precedence() {
        assert_eq!(
            diagnose_expectation(Some(-50.0), Some(30.0), false),
            ExpectationStructure::SingleEngine
        );
        assert_eq!(
            diagnose_expectation(None, Some(25.5), false),
            ExpectationStructure::SingleEngine
        );
        // Positive FCF disables the single engine branch
        assert_eq!(
            diagnose_expectation(Some(-50.0), Some(30.0), true),
            ExpectationStructure::Underestimated
        );
        assert_eq!(
            diagnose_expectation(Some(0.0), Some(25.0), false),
            ExpectationStructure::Reasonable
        );
    }

    #[test]
    fn test_expectation_gap_bands() {
        let classify = |gap| diagnose_expectation(Some(gap), None, true);
        assert_eq!(classify(20.1), ExpectationStructure::Overheated);
        assert_eq!(classify(20.0), ExpectationStructure::Optimistic);
        assert_eq!(classify(10.1), ExpectationStructure::Optimistic);
        assert_eq!(classify(10.0), ExpectationStructure::Reasonable);
        assert_eq!(classify(-10.0), ExpectationStructure::Reasonable);
        assert_eq!(classify(-10.1), ExpectationStructure::Underestimated);
        assert_eq!(
            diagnose_expectation(None, None, false),
            ExpectationStructure::Reasonable
        );
    }

    #[test]
    fn test_risk_escalates_only() {
        let risk = assess_risks(Some(AltmanZone::Distress), 2, 0.3);
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(
            risk.factors,
            vec![
                FACTOR_BANKRUPTCY.to_string(),
                FACTOR_WEAK_FUNDAMENTALS.to_string(),
                FACTOR_LOW_EARNINGS_QUALITY.to_string(),
            ]
        );

        let risk = assess_risks(Some(AltmanZone::Safe), 3, 0.3);
        assert_eq!(risk.level, RiskLevel::High);
        assert_eq!(risk.factors.len(), 2);
    }

    #[test]
    fn test_risk_levels() {
        let risk = assess_risks(Some(AltmanZone::Safe), 8, 0.0);
        assert_eq!(risk.level, RiskLevel::Low);
        assert!(risk.factors.is_empty());

        let risk = assess_risks(None, 8, 0.16);
        assert_eq!(risk.level, RiskLevel::Medium);
        assert_eq!(risk.factors, vec![FACTOR_LOW_EARNINGS_QUALITY.to_string()]);

        // Exactly at the threshold is not a risk
        assert_eq!(assess_risks(None, 8, 0.15).level, RiskLevel::Low);
    }
}
