//! Final label resolution.

use diagnosis_core::{
    CharacterTags, CorporateState, ExpectationStructure, FinalLabel, RiskAssessment, RiskLevel,
    Verdict,
};

/// Separator between summary fragments.
pub const SUMMARY_SEPARATOR: &str = "。";

const NOTE_SAFETY_SHIELD: &str = "Safety shield: strong balance sheet with low volatility";
const NOTE_ZOMBIE: &str = "Zombie warning: earnings do not cover the cost of capital";

/// Resolves the final label.
///
/// Rules are checked in a fixed order and the first match wins:
///
/// | # | Condition | Label |
/// |---|-----------|-------|
/// | 1 | risk Critical | Avoid |
/// | 2 | state Deteriorating | Sell |
/// | 3 | healthy state and Underestimated | Strong Buy |
/// | 4 | Overheated or Optimistic | Watch |
/// | 5 | High Growth, Single Engine, risk Low | Buy (Spec) |
/// | 6 | healthy state and risk not High | Buy |
/// | 7 | otherwise | Hold |
///
/// The safety shield and zombie tags append annotations to the summary.
#[must_use]
pub fn resolve_verdict(
    state: CorporateState,
    expectation: ExpectationStructure,
    risk: &RiskAssessment,
    tags: &CharacterTags,
) -> Verdict {
    let (final_label, is_good_buy, reason) = if risk.level == RiskLevel::Critical {
        (
            FinalLabel::Avoid,
            false,
            format!("Avoid: critical risk detected ({})", risk.factors.join(", ")),
        )
    } else if state == CorporateState::Deteriorating {
        (
            FinalLabel::Sell,
            false,
            "Sell: fundamentals are deteriorating".to_string(),
        )
    } else if state.is_healthy() && expectation == ExpectationStructure::Underestimated {
        (
            FinalLabel::StrongBuy,
            true,
            format!("Strong Buy: {state} priced below its realized growth"),
        )
    } else if matches!(
        expectation,
        ExpectationStructure::Overheated | ExpectationStructure::Optimistic
    ) {
        (
            FinalLabel::Watch,
            false,
            format!("Watch: market expectations run ahead of results ({expectation})"),
        )
    } else if state == CorporateState::HighGrowth
        && expectation == ExpectationStructure::SingleEngine
        && risk.level == RiskLevel::Low
    {
        (
            FinalLabel::BuySpec,
            true,
            "Speculative buy: growth carried by a single engine with low balance-sheet risk"
                .to_string(),
        )
    } else if state.is_healthy() && risk.level != RiskLevel::High {
        (
            FinalLabel::Buy,
            true,
            format!("Buy: {state} with manageable risk ({})", risk.level),
        )
    } else {
        (FinalLabel::Hold, false, "Hold: no decisive signal".to_string())
    };

    let mut fragments = vec![reason];
    if tags.tag_safety_shield {
        fragments.push(NOTE_SAFETY_SHIELD.to_string());
    }
    if tags.tag_zombie {
        fragments.push(NOTE_ZOMBIE.to_string());
    }

    Verdict {
        final_label,
        is_good_buy,
        summary: fragments.join(SUMMARY_SEPARATOR),
    }
}
