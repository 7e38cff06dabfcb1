//! The full analysis pipeline.

use diagnosis_core::{DiagnosisResult, RatioSet};
use tracing::debug;

use crate::config::{EngineConfig, ValuationAssumptions};
use crate::diagnose::{assess_risks, diagnose_corporate_state, diagnose_expectation};
use crate::input::MetricsInput;
use crate::ratios;
use crate::tags::{TagContext, TagHistory, detect_tags};
use crate::verdict::resolve_verdict;

/// Computes every ratio for one company-period.
#[must_use]
pub fn compute_ratios(input: &MetricsInput, valuation: &ValuationAssumptions) -> RatioSet {
    let z_score = ratios::altman_z_score(input);
    let f_score = ratios::piotroski_f_score(input, valuation);
    let implied_growth_rate_revenue = ratios::implied_revenue_growth(input, valuation);
    let actual_revenue_growth = ratios::actual_revenue_growth(input);

    RatioSet {
        z_score,
        altman_zone: z_score.map(ratios::classify_altman_zone),
        f_score: f_score.score,
        f_score_reasons: f_score.reasons,
        interest_coverage: ratios::interest_coverage(input),
        accruals_ratio: ratios::accruals_ratio(input),
        earnings_quality: ratios::earnings_quality(input),
        delta_noa: ratios::delta_noa(input),
        inventory_quality: ratios::inventory_quality(input),
        gross_profitability: ratios::gross_profitability(input),
        cash_based_operating_profitability: ratios::cash_based_operating_profitability(input),
        roiic: ratios::roiic(input),
        reinvestment_rate: ratios::reinvestment_rate(input),
        dupont: ratios::dupont_breakdown(input),
        implied_growth_rate_fcf: ratios::implied_growth_rate(input, valuation),
        equity_duration: ratios::equity_duration_proxy(input, valuation),
        target_margin: ratios::target_margin(
            &input.sector,
            &valuation.sector_margins,
            valuation.default_target_margin,
        ),
        implied_growth_rate_revenue,
        actual_revenue_growth,
        expectation_gap: ratios::reality_gap(implied_growth_rate_revenue, actual_revenue_growth),
    }
}

/// Runs ratios, classification, tags and verdict for one company-period.
///
/// Pure and deterministic: identical inputs always produce identical
/// results. `history` is the previous diagnosis of the same stock, if any.
#[must_use]
pub fn analyze(
    input: &MetricsInput,
    config: &EngineConfig,
    history: Option<&TagHistory>,
) -> DiagnosisResult {
    let ratios = compute_ratios(input, &config.valuation);
    let has_fcf = input.has_fcf();

    let state = diagnose_corporate_state(ratios.f_score, ratios.altman_zone, has_fcf);
    let expectation_structure = diagnose_expectation(
        ratios.expectation_gap,
        ratios.implied_growth_rate_revenue,
        has_fcf,
    );
    let risk = assess_risks(ratios.altman_zone, ratios.f_score, ratios.accruals_ratio);

    let tags = detect_tags(
        &TagContext {
            input,
            ratios: &ratios,
            state,
            expectation: expectation_structure,
            risk_level: risk.level,
            history,
        },
        &config.tags,
    );
    let verdict = resolve_verdict(state, expectation_structure, &risk, &tags);

    debug!(
        z_score = ?ratios.z_score,
        f_score = ratios.f_score,
        state = %state,
        expectation = %expectation_structure,
        risk = %risk.level,
        label = %verdict.final_label,
        "Diagnosis complete"
    );

    DiagnosisResult {
        ratios,
        state,
        expectation_structure,
        risk,
        tags,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PriorPeriod;
    use diagnosis_core::{
        AltmanZone, CorporateState, ExpectationStructure, FinalLabel, RiskLevel, Tag,
    };

    fn healthy() -> MetricsInput {
        MetricsInput {
            revenue: 1000.0,
            operating_income: 150.0,
            net_income: 80.0,
            ebit: 160.0,
            interest_expense: 10.0,
            depreciation: 30.0,
            total_assets: 900.0,
            total_equity: 500.0,
            current_assets: 500.0,
            current_liabilities: 300.0,
            inventory: 100.0,
            retained_earnings: 200.0,
            long_term_debt: 100.0,
            operating_cf: 140.0,
            investing_cf: -50.0,
            capex: 50.0,
            ..Default::default()
        }
        .with_market(1500.0, 1200.0, 0.9)
        .with_prior(PriorPeriod {
            revenue: 900.0,
            operating_income: 120.0,
            net_income: 60.0,
            total_assets: 850.0,
            current_assets: 450.0,
            current_liabilities: 300.0,
            inventory: 95.0,
            long_term_debt: 120.0,
        })
    }

    #[test]
    fn test_healthy_company() {
        let result = analyze(&healthy(), &EngineConfig::default(), None);

        assert_eq!(result.ratios.altman_zone, Some(AltmanZone::Safe));
        assert_eq!(result.ratios.f_score, 9);
        assert_eq!(result.state, CorporateState::CashGenerator);
        // Implied revenue growth is negative against 11% realized growth
        assert_eq!(
            result.expectation_structure,
            ExpectationStructure::Underestimated
        );
        assert_eq!(result.risk.level, RiskLevel::Low);
        assert_eq!(result.verdict.final_label, FinalLabel::StrongBuy);
        assert!(result.verdict.is_good_buy);
        assert!(result.tags.has(Tag::SafetyShield));
        assert!(result.tags.has(Tag::CashCow));
        assert!(result.tags.has(Tag::Institutional));
        assert!(result.tags.has(Tag::SilentImprover));
        assert!(!result.tags.has(Tag::Zombie));
    }

    #[test]
    fn test_distressed_company() {
        let input = MetricsInput {
            revenue: 200.0,
            operating_income: -30.0,
            net_income: -60.0,
            ebit: -30.0,
            interest_expense: 40.0,
            total_assets: 1000.0,
            current_assets: 100.0,
            current_liabilities: 400.0,
            retained_earnings: -300.0,
            long_term_debt: 500.0,
            operating_cf: -20.0,
            investing_cf: -10.0,
            ..Default::default()
        }
        .with_market(10.0, 50.0, 1.6);

        let result = analyze(&input, &EngineConfig::default(), None);

        assert_eq!(result.ratios.altman_zone, Some(AltmanZone::Distress));
        assert_eq!(result.state, CorporateState::FinancialDistress);
        assert_eq!(result.risk.level, RiskLevel::Critical);
        assert_eq!(result.verdict.final_label, FinalLabel::Avoid);
        assert!(result.tags.has(Tag::Zombie));
        assert!(result.verdict.summary.contains("Zombie warning"));
    }

    #[test]
    fn test_empty_input_is_total() {
        let result = analyze(&MetricsInput::default(), &EngineConfig::default(), None);

        assert_eq!(result.ratios.z_score, None);
        assert_eq!(result.ratios.altman_zone, None);
        assert_eq!(result.ratios.f_score, 0);
        assert_eq!(result.ratios.f_score_reasons, vec!["insufficient data"]);
        assert_eq!(result.ratios.implied_growth_rate_revenue, None);
        assert_eq!(result.ratios.expectation_gap, None);
        assert_eq!(result.ratios.target_margin, 0.10);
        assert_eq!(result.state, CorporateState::Deteriorating);
        assert_eq!(result.verdict.final_label, FinalLabel::Sell);
    }

    #[test]
    fn test_history_changes_tags_only() {
        let input = healthy();
        let config = EngineConfig::default();
        let history = TagHistory {
            previous_state: Some(CorporateState::CashGenerator),
            previous_zone: Some(AltmanZone::Safe),
        };

        let fresh = analyze(&input, &config, None);
        let followed = analyze(&input, &config, Some(&history));

        assert_eq!(fresh.ratios, followed.ratios);
        assert_eq!(fresh.state, followed.state);
        assert!(fresh.tags.tag_silent_improver);
        assert!(!followed.tags.tag_silent_improver);
    }

    #[test]
    fn test_idempotent() {
        let input = healthy();
        let config = EngineConfig::default();

        let first = serde_json::to_string(&analyze(&input, &config, None)).unwrap();
        let second = serde_json::to_string(&analyze(&input, &config, None)).unwrap();
        assert_eq!(first, second);
    }
}
