//! Fundamental ratios and scores.
//!
//! Every function here is a pure map from a [`MetricsInput`] (and, where
//! noted, valuation assumptions) to one ratio. A zero or missing denominator
//! yields `None`; a handful of ratios documented below default to `0.0`
//! instead because a zero there is a meaningful neutral value.

use diagnosis_core::{AltmanZone, DupontBreakdown};

use crate::config::{
    EQUITY_DURATION_CAP, SectorMargin, ValuationAssumptions, Z_DISTRESS_THRESHOLD,
    Z_SAFE_THRESHOLD,
};
use crate::input::MetricsInput;

/// Reason recorded when the F-Score cannot be computed.
pub const INSUFFICIENT_DATA: &str = "insufficient data";

// =============================================================================
// Safety & risk
// =============================================================================

/// Altman Z-Score.
///
/// ```text
/// Z = 1.2*A + 1.4*B + 3.3*C + 0.6*D + 1.0*E
/// where:
///   A = (Current Assets - Current Liabilities) / Total Assets
///   B = Retained Earnings / Total Assets
///   C = EBIT / Total Assets
///   D = Market Cap / (Long-Term Debt + Current Liabilities), 0 if that sum <= 0
///   E = Revenue / Total Assets
/// ```
///
/// Returns `None` when total assets or current liabilities are zero.
#[must_use]
pub fn altman_z_score(input: &MetricsInput) -> Option<f64> {
    if input.total_assets == 0.0 || input.current_liabilities == 0.0 {
        return None;
    }

    let working_capital = input.current_assets - input.current_liabilities;
    let total_liabilities = input.long_term_debt + input.current_liabilities;

    let a = working_capital / input.total_assets;
    let b = input.retained_earnings / input.total_assets;
    let c = input.ebit / input.total_assets;
    let d = if total_liabilities > 0.0 {
        input.market_cap / total_liabilities
    } else {
        0.0
    };
    let e = input.revenue / input.total_assets;

    Some(1.2 * a + 1.4 * b + 3.3 * c + 0.6 * d + 1.0 * e)
}

/// Classifies a Z-Score into its zone.
///
/// - Z < 1.81: distress
/// - 1.81 <= Z < 2.99: grey
/// - Z >= 2.99: safe
#[must_use]
pub fn classify_altman_zone(z: f64) -> AltmanZone {
    if z < Z_DISTRESS_THRESHOLD {
        AltmanZone::Distress
    } else if z < Z_SAFE_THRESHOLD {
        AltmanZone::Grey
    } else {
        AltmanZone::Safe
    }
}

/// Interest coverage: EBIT / |interest expense|.
///
/// Returns `None` when there is no interest expense to measure against.
#[must_use]
pub fn interest_coverage(input: &MetricsInput) -> Option<f64> {
    let interest = input.interest_expense.abs();
    if interest == 0.0 {
        return None;
    }
    Some(input.ebit / interest)
}

// =============================================================================
// Quality of earnings
// =============================================================================

/// Sloan accruals ratio: (Net Income - Operating CF) / Total Assets.
///
/// High positive values mean profit is running ahead of cash. Defaults to
/// `0.0` when total assets are zero.
#[must_use]
pub fn accruals_ratio(input: &MetricsInput) -> f64 {
    if input.total_assets == 0.0 {
        return 0.0;
    }
    (input.net_income - input.operating_cf) / input.total_assets
}

/// Earnings quality: Operating CF / Net Income.
#[must_use]
pub fn earnings_quality(input: &MetricsInput) -> Option<f64> {
    if input.net_income == 0.0 {
        return None;
    }
    Some(input.operating_cf / input.net_income)
}

/// Change in net operating working capital, scaled by total assets.
///
/// Detects growth manufactured by piling up working capital.
#[must_use]
pub fn delta_noa(input: &MetricsInput) -> Option<f64> {
    let prior = input.prior.as_ref()?;
    if input.total_assets == 0.0 {
        return None;
    }

    let noa = input.current_assets - input.current_liabilities;
    let prev_noa = prior.current_assets - prior.current_liabilities;
    Some((noa - prev_noa) / input.total_assets)
}

/// Inventory quality index: inventory growth minus revenue growth.
///
/// Both growth rates are fractional period-over-period changes.
#[must_use]
pub fn inventory_quality(input: &MetricsInput) -> Option<f64> {
    let prior = input.prior.as_ref()?;
    if prior.inventory == 0.0 || prior.revenue == 0.0 {
        return None;
    }

    let inventory_growth = (input.inventory - prior.inventory) / prior.inventory;
    let revenue_growth = (input.revenue - prior.revenue) / prior.revenue;
    Some(inventory_growth - revenue_growth)
}

// =============================================================================
// Quality of growth & structure
// =============================================================================

/// Gross profitability proxy: Operating Income / Total Assets.
///
/// Defaults to `0.0` when total assets are zero.
#[must_use]
pub fn gross_profitability(input: &MetricsInput) -> f64 {
    if input.total_assets == 0.0 {
        return 0.0;
    }
    input.operating_income / input.total_assets
}

/// Cash-based operating profitability: Operating CF / Total Assets.
///
/// Defaults to `0.0` when total assets are zero.
#[must_use]
pub fn cash_based_operating_profitability(input: &MetricsInput) -> f64 {
    if input.total_assets == 0.0 {
        return 0.0;
    }
    input.operating_cf / input.total_assets
}

/// Return on incremental invested capital: ΔOperating Income / ΔTotal Assets.
///
/// Returns `None` without a prior period or when assets did not grow.
#[must_use]
pub fn roiic(input: &MetricsInput) -> Option<f64> {
    let prior = input.prior.as_ref()?;

    let delta_operating_income = input.operating_income - prior.operating_income;
    let delta_invested_capital = input.total_assets - prior.total_assets;
    if delta_invested_capital <= 0.0 {
        return None;
    }
    Some(delta_operating_income / delta_invested_capital)
}

/// Reinvestment rate: (|CapEx| - |Depreciation|) / Operating CF.
///
/// Above 1.0 the company invests more than it earns in cash; below 0 it is
/// shrinking its asset base.
#[must_use]
pub fn reinvestment_rate(input: &MetricsInput) -> Option<f64> {
    if input.operating_cf == 0.0 {
        return None;
    }
    Some((input.capex.abs() - input.depreciation.abs()) / input.operating_cf)
}

/// Dupont decomposition of ROE.
///
/// Returns `None` if total equity, total assets or revenue is zero.
#[must_use]
pub fn dupont_breakdown(input: &MetricsInput) -> Option<DupontBreakdown> {
    if input.total_equity == 0.0 || input.total_assets == 0.0 || input.revenue == 0.0 {
        return None;
    }

    Some(DupontBreakdown {
        net_profit_margin: input.net_income / input.revenue,
        asset_turnover: input.revenue / input.total_assets,
        financial_leverage: input.total_assets / input.total_equity,
        roe: input.net_income / input.total_equity,
    })
}

// =============================================================================
// Expectations
// =============================================================================

/// Growth rate (%) priced in by the free cash flow yield.
///
/// ```text
/// cost_of_equity = risk_free_rate + beta * market_risk_premium
/// g = cost_of_equity - FCF / Market Cap
/// ```
///
/// Returns `None` for a non-positive market cap or free cash flow.
#[must_use]
pub fn implied_growth_rate(input: &MetricsInput, assumptions: &ValuationAssumptions) -> Option<f64> {
    if input.market_cap <= 0.0 {
        return None;
    }

    let cost_of_equity = assumptions.risk_free_rate + input.beta * assumptions.market_risk_premium;
    let fcf = input.free_cash_flow();
    if fcf <= 0.0 {
        return None;
    }

    let g = cost_of_equity - fcf / input.market_cap;
    Some(g * 100.0)
}

/// Equity duration proxy: 1 / (discount rate - implied growth).
///
/// Returns [`EQUITY_DURATION_CAP`] when implied growth reaches the discount
/// rate, and `None` when implied growth is undefined.
#[must_use]
pub fn equity_duration_proxy(
    input: &MetricsInput,
    assumptions: &ValuationAssumptions,
) -> Option<f64> {
    let implied = implied_growth_rate(input, assumptions)?;
    let g = implied / 100.0;
    let discount_rate = assumptions.duration_discount_rate;
    if discount_rate <= g {
        return Some(EQUITY_DURATION_CAP);
    }
    Some(1.0 / (discount_rate - g))
}

/// Steady-state FCF margin for a sector.
///
/// Scans `table` in order and returns the margin of the first pattern
/// contained in `sector`, or `default` when nothing matches.
#[must_use]
pub fn target_margin(sector: &str, table: &[SectorMargin], default: f64) -> f64 {
    table
        .iter()
        .find(|entry| sector.contains(entry.pattern.as_str()))
        .map_or(default, |entry| entry.margin)
}

/// Revenue growth (%) priced in by the price-to-sales ratio.
///
/// Solves `(1 + g)^n = PSR * (r - g_terminal) / target_margin` for `g`.
/// A negative base yields `0.0`; a non-finite root yields `None`.
#[must_use]
pub fn implied_revenue_growth(
    input: &MetricsInput,
    assumptions: &ValuationAssumptions,
) -> Option<f64> {
    if input.revenue <= 0.0 || input.market_cap <= 0.0 {
        return None;
    }

    let margin = target_margin(
        &input.sector,
        &assumptions.sector_margins,
        assumptions.default_target_margin,
    );
    if margin <= 0.0 || assumptions.projection_years == 0 {
        return None;
    }

    let psr = input.market_cap / input.revenue;
    let spread = assumptions.revenue_discount_rate - assumptions.terminal_growth;
    let base = psr * spread / margin;
    if base < 0.0 {
        return Some(0.0);
    }

    let root = base.powf(1.0 / f64::from(assumptions.projection_years));
    if !root.is_finite() {
        return None;
    }
    let growth = (root - 1.0) * 100.0;
    growth.is_finite().then_some(growth)
}

/// Realized year-over-year revenue growth (%).
#[must_use]
pub fn actual_revenue_growth(input: &MetricsInput) -> Option<f64> {
    let prior = input.prior.as_ref()?;
    if prior.revenue == 0.0 {
        return None;
    }
    Some((input.revenue - prior.revenue) / prior.revenue * 100.0)
}

/// Reality gap: implied minus realized growth.
///
/// `None` whenever either side is `None`; a missing side is never read as zero.
#[must_use]
pub fn reality_gap(implied: Option<f64>, actual: Option<f64>) -> Option<f64> {
    Some(implied? - actual?)
}

// =============================================================================
// Composite
// =============================================================================

/// Piotroski F-Score with the reason for each awarded point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiotroskiScore {
    /// Score from 0 to 9.
    pub score: u8,
    /// One reason per awarded point, in award order.
    pub reasons: Vec<String>,
}

/// Piotroski F-Score (0-9).
///
/// Points, in order:
/// 1. Net income positive
/// 2. Operating cash flow positive
/// 3. ROA improved
/// 4. Operating cash flow exceeds net income
/// 5. Long-term debt / assets did not increase
/// 6. Current ratio improved
/// 7. No dilution (assumed when `assume_no_dilution` is set; no per-share data)
/// 8. Operating margin improved
/// 9. Asset turnover improved
///
/// Without a prior period the score is 0 with a single
/// [`INSUFFICIENT_DATA`] reason.
#[must_use]
pub fn piotroski_f_score(
    input: &MetricsInput,
    assumptions: &ValuationAssumptions,
) -> PiotroskiScore {
    let Some(prior) = input.prior.as_ref() else {
        return PiotroskiScore {
            score: 0,
            reasons: vec![INSUFFICIENT_DATA.to_string()],
        };
    };

    let roa = ratio_or_zero(input.net_income, input.total_assets);
    let prev_roa = ratio_or_zero(prior.net_income, prior.total_assets);
    let leverage = ratio_or_zero(input.long_term_debt, input.total_assets);
    let prev_leverage = ratio_or_zero(prior.long_term_debt, prior.total_assets);
    let current_ratio = ratio_or_zero(input.current_assets, input.current_liabilities);
    let prev_current_ratio = ratio_or_zero(prior.current_assets, prior.current_liabilities);
    let margin = ratio_or_zero(input.operating_income, input.revenue);
    let prev_margin = ratio_or_zero(prior.operating_income, prior.revenue);
    let turnover = ratio_or_zero(input.revenue, input.total_assets);
    let prev_turnover = ratio_or_zero(prior.revenue, prior.total_assets);

    let checks = [
        (input.net_income > 0.0, "Positive net income"),
        (input.operating_cf > 0.0, "Positive operating cash flow"),
        (roa > prev_roa, "ROA improved"),
        (
            input.operating_cf > input.net_income,
            "Operating cash flow exceeds net income",
        ),
        (leverage <= prev_leverage, "Leverage did not increase"),
        (current_ratio > prev_current_ratio, "Current ratio improved"),
        (assumptions.assume_no_dilution, "No dilution (assumed)"),
        (margin > prev_margin, "Operating margin improved"),
        (turnover > prev_turnover, "Asset turnover improved"),
    ];

    let reasons: Vec<String> = checks
        .iter()
        .filter(|(passed, _)| *passed)
        .map(|(_, reason)| (*reason).to_string())
        .collect();

    PiotroskiScore {
        score: reasons.len() as u8,
        reasons,
    }
}

/// Returns true when the operating margin improved over the prior period.
///
/// `false` without a prior period.
#[must_use]
pub fn operating_margin_improved(input: &MetricsInput) -> bool {
    input.prior.as_ref().is_some_and(|prior| {
        ratio_or_zero(input.operating_income, input.revenue)
            > ratio_or_zero(prior.operating_income, prior.revenue)
    })
}

/// Division used inside composite scores, where a zero denominator
/// contributes a neutral zero.
fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
