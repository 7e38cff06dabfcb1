//! Character tag detection.
//!
//! Tags are independent heuristics layered on top of the ratios and
//! classifications. Two of them (silent improver, zombie) also look at the
//! previous diagnosis of the same stock, which the caller supplies as a
//! [`TagHistory`]; the detector itself never reads storage.

use diagnosis_core::{
    AltmanZone, AnalysisRecord, CharacterTags, CorporateState, ExpectationStructure, RatioSet,
    RiskLevel,
};
use serde::{Deserialize, Serialize};

use crate::config::TagThresholds;
use crate::input::MetricsInput;
use crate::ratios::operating_margin_improved;

/// State carried over from the previous diagnosis of the same stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHistory {
    /// Corporate state of the previous diagnosis.
    pub previous_state: Option<CorporateState>,
    /// Altman zone of the previous diagnosis.
    pub previous_zone: Option<AltmanZone>,
}

impl TagHistory {
    /// Extracts the history from a stored analysis record.
    #[must_use]
    pub const fn from_record(record: &AnalysisRecord) -> Self {
        Self {
            previous_state: Some(record.diagnosis.state),
            previous_zone: record.diagnosis.ratios.altman_zone,
        }
    }
}

/// Everything the detector reads for one company-period.
#[derive(Debug, Clone, Copy)]
pub struct TagContext<'a> {
    /// Normalised input.
    pub input: &'a MetricsInput,
    /// Ratios computed from `input`.
    pub ratios: &'a RatioSet,
    /// Corporate state.
    pub state: CorporateState,
    /// Expectation structure.
    pub expectation: ExpectationStructure,
    /// Overall risk level.
    pub risk_level: RiskLevel,
    /// Previous diagnosis, if any.
    pub history: Option<&'a TagHistory>,
}

/// Evaluates all eleven tags.
#[must_use]
pub fn detect_tags(ctx: &TagContext<'_>, thresholds: &TagThresholds) -> CharacterTags {
    let input = ctx.input;
    let ratios = ctx.ratios;
    let zone = ratios.altman_zone;

    let fcf_to_assets = if input.total_assets == 0.0 {
        0.0
    } else {
        input.free_cash_flow() / input.total_assets
    };

    let steady = matches!(
        ctx.state,
        CorporateState::Neutral | CorporateState::CashGenerator
    );
    let silent_improver = match ctx.history {
        Some(history) => {
            history.previous_state == Some(CorporateState::Deteriorating)
                && steady
                && ratios.f_score >= thresholds.silent_improver_min_f_score
        }
        None => {
            steady
                && ratios.f_score >= thresholds.silent_improver_min_f_score_no_history
                && ctx.expectation == ExpectationStructure::Underestimated
        }
    };

    let reference_zone = ctx
        .history
        .and_then(|history| history.previous_zone)
        .or(zone);
    let turnaround = input
        .prior
        .as_ref()
        .is_some_and(|prior| prior.net_income <= 0.0)
        && input.net_income > 0.0
        && matches!(
            reference_zone,
            Some(AltmanZone::Distress | AltmanZone::Grey)
        );

    let persistent_distress = ctx
        .history
        .is_some_and(|history| history.previous_zone == Some(AltmanZone::Distress));
    let uncovered_interest = ratios
        .interest_coverage
        .is_some_and(|coverage| coverage < thresholds.zombie_max_interest_coverage);

    CharacterTags {
        tag_safety_shield: zone == Some(AltmanZone::Safe) && input.beta <= thresholds.safety_max_beta,
        tag_cash_cow: fcf_to_assets >= thresholds.cash_cow_min_fcf_to_assets,
        tag_quality_growth: ratios.gross_profitability >= thresholds.quality_min_gross_profitability
            && operating_margin_improved(input),
        tag_institutional: ratios.f_score >= thresholds.institutional_min_f_score
            && matches!(zone, Some(AltmanZone::Safe | AltmanZone::Grey)),
        tag_single_engine: ctx.expectation == ExpectationStructure::SingleEngine,
        tag_high_volatility: ratios
            .expectation_gap
            .is_some_and(|gap| gap.abs() >= thresholds.high_volatility_min_gap)
            && ratios.f_score <= thresholds.high_volatility_max_f_score,
        tag_silent_improver: silent_improver,
        tag_turnaround: turnaround,
        tag_zombie: zone == Some(AltmanZone::Distress) && (persistent_distress || uncovered_interest),
        tag_accounting_risk: ratios.accruals_ratio > thresholds.accounting_max_accruals
            || (input.operating_cf < 0.0 && input.net_income > 0.0),
        tag_fragile: ctx.expectation == ExpectationStructure::Overheated
            && ctx.risk_level >= RiskLevel::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PriorPeriod;
    use diagnosis_core::Tag;

    fn context<'a>(
        input: &'a MetricsInput,
        ratios: &'a RatioSet,
        history: Option<&'a TagHistory>,
    ) -> TagContext<'a> {
        TagContext {
            input,
            ratios,
            state: CorporateState::Neutral,
            expectation: ExpectationStructure::Reasonable,
            risk_level: RiskLevel::Low,
            history,
        }
    }

    fn ratios(zone: Option<AltmanZone>, f_score: u8) -> RatioSet {
        RatioSet {
            altman_zone: zone,
            f_score,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input_sets_no_tags() {
        let input = MetricsInput::default();
        let ratios = RatioSet::default();
        let tags = detect_tags(&context(&input, &ratios, None), &TagThresholds::default());
        assert!(tags.active().is_empty());
    }

    #[test]
    fn test_safety_shield_respects_beta() {
        let input = MetricsInput::default();
        let ratios = ratios(Some(AltmanZone::Safe), 5);
        let thresholds = TagThresholds::default();
        assert!(detect_tags(&context(&input, &ratios, None), &thresholds).tag_safety_shield);

        let volatile = input.clone().with_market(0.0, 0.0, 1.4);
        assert!(!detect_tags(&context(&volatile, &ratios, None), &thresholds).tag_safety_shield);

        let relaxed = TagThresholds {
            safety_max_beta: 1.5,
            ..Default::default()
        };
        assert!(detect_tags(&context(&volatile, &ratios, None), &relaxed).tag_safety_shield);
    }

    #[test]
    fn test_cash_cow_and_institutional() {
        let input = MetricsInput {
            total_assets: 1000.0,
            operating_cf: 120.0,
            investing_cf: -40.0,
            ..Default::default()
        };
        let ratios = ratios(Some(AltmanZone::Grey), 7);
        let tags = detect_tags(&context(&input, &ratios, None), &TagThresholds::default());
        assert!(tags.tag_cash_cow);
        assert!(tags.tag_institutional);
        assert!(!tags.tag_safety_shield);
    }

    #[test]
    fn test_quality_growth_needs_margin_improvement() {
        let prior = PriorPeriod {
            revenue: 1000.0,
            operating_income: 100.0,
            ..Default::default()
        };
        let input = MetricsInput {
            revenue: 1000.0,
            operating_income: 150.0,
            total_assets: 1000.0,
            ..Default::default()
        };
        let ratios = RatioSet {
            gross_profitability: 0.15,
            ..Default::default()
        };
        let thresholds = TagThresholds::default();

        assert!(!detect_tags(&context(&input, &ratios, None), &thresholds).tag_quality_growth);
        let with_prior = input.with_prior(prior);
        assert!(detect_tags(&context(&with_prior, &ratios, None), &thresholds).tag_quality_growth);
    }

    #[test]
    fn test_turnaround_uses_previous_zone() {
        let input = MetricsInput {
            net_income: 50.0,
            ..Default::default()
        }
        .with_prior(PriorPeriod {
            net_income: -20.0,
            ..Default::default()
        });
        let safe_now = ratios(Some(AltmanZone::Safe), 5);
        let thresholds = TagThresholds::default();

        assert!(!detect_tags(&context(&input, &safe_now, None), &thresholds).tag_turnaround);

        let history = TagHistory {
            previous_state: Some(CorporateState::Deteriorating),
            previous_zone: Some(AltmanZone::Distress),
        };
        assert!(
            detect_tags(&context(&input, &safe_now, Some(&history)), &thresholds).tag_turnaround
        );

        let grey_now = ratios(Some(AltmanZone::Grey), 5);
        assert!(detect_tags(&context(&input, &grey_now, None), &thresholds).tag_turnaround);
    }

    #[test]
    fn test_zombie() {
        let input = MetricsInput::default();
        let thresholds = TagThresholds::default();

        let mut distressed = ratios(Some(AltmanZone::Distress), 2);
        assert!(!detect_tags(&context(&input, &distressed, None), &thresholds).tag_zombie);

        distressed.interest_coverage = Some(0.4);
        assert!(detect_tags(&context(&input, &distressed, None), &thresholds).tag_zombie);

        distressed.interest_coverage = None;
        let history = TagHistory {
            previous_state: Some(CorporateState::FinancialDistress),
            previous_zone: Some(AltmanZone::Distress),
        };
        assert!(detect_tags(&context(&input, &distressed, Some(&history)), &thresholds).tag_zombie);
    }

    #[test]
    fn test_silent_improver() {
        let input = MetricsInput::default();
        let thresholds = TagThresholds::default();
        let ratios = ratios(Some(AltmanZone::Grey), 6);
        let history = TagHistory {
            previous_state: Some(CorporateState::Deteriorating),
            previous_zone: Some(AltmanZone::Grey),
        };

        let mut ctx = context(&input, &ratios, Some(&history));
        ctx.state = CorporateState::CashGenerator;
        assert!(detect_tags(&ctx, &thresholds).tag_silent_improver);

        ctx.state = CorporateState::HighGrowth;
        assert!(!detect_tags(&ctx, &thresholds).tag_silent_improver);

        // Without history the bar is higher and needs an underestimated price
        let strong = RatioSet {
            f_score: 7,
            ..ratios.clone()
        };
        let mut ctx = context(&input, &strong, None);
        ctx.state = CorporateState::Neutral;
        assert!(!detect_tags(&ctx, &thresholds).tag_silent_improver);
        ctx.expectation = ExpectationStructure::Underestimated;
        assert!(detect_tags(&ctx, &thresholds).tag_silent_improver);
    }

    #[test]
    fn test_accounting_risk_and_fragile() {
        let input = MetricsInput {
            net_income: 10.0,
            operating_cf: -5.0,
            ..Default::default()
        };
        let ratios = RatioSet::default();
        let mut ctx = context(&input, &ratios, None);
        ctx.expectation = ExpectationStructure::Overheated;
        ctx.risk_level = RiskLevel::Critical;

        let tags = detect_tags(&ctx, &TagThresholds::default());
        assert!(tags.tag_accounting_risk);
        assert!(tags.tag_fragile);

        ctx.risk_level = RiskLevel::Medium;
        assert!(!detect_tags(&ctx, &TagThresholds::default()).tag_fragile);
    }

    #[test]
    fn test_contradictory_tags_coexist() {
        let input = MetricsInput {
            total_assets: 100.0,
            operating_cf: 20.0,
            ..Default::default()
        };
        let ratios = RatioSet {
            altman_zone: Some(AltmanZone::Distress),
            interest_coverage: Some(0.5),
            expectation_gap: Some(-45.0),
            ..Default::default()
        };
        let tags = detect_tags(&context(&input, &ratios, None), &TagThresholds::default());
        assert!(tags.has(Tag::CashCow));
        assert!(tags.has(Tag::Zombie));
        assert!(tags.has(Tag::HighVolatility));
    }
}
