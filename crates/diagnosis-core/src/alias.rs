//! Ordered alias resolution for raw provider line items.
//!
//! Data providers label the same line item differently across companies and
//! even across periods of the same company ("Total Revenue" vs "Operating
//! Revenue"). Each statement field therefore carries a prioritised list of
//! acceptable keys; the first key that is present with a non-NaN value wins.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::error::{DiagnosisError, Result};
use crate::period::PeriodType;
use crate::types::{FinancialStatement, Symbol};

/// Raw line items of one period, keyed by the provider's label.
pub type LineItems = HashMap<String, f64>;

/// Returns the value of the first candidate key present in `items`.
///
/// NaN values count as missing, so resolution moves on to the next alias.
/// Returns `None` when no candidate resolves.
#[must_use]
pub fn resolve_alias(items: &LineItems, candidates: &[&str]) -> Option<f64> {
    candidates
        .iter()
        .filter_map(|key| items.get(*key))
        .copied()
        .find(|value| !value.is_nan())
}

/// Get the accepted provider labels for a statement field, in priority order.
///
/// Returns `None` for unknown field names.
#[must_use]
pub fn line_item_aliases(field: &str) -> Option<&'static [&'static str]> {
    let aliases: &'static [&'static str] = match field {
        // Income statement
        "revenue" => &["Total Revenue", "Operating Revenue", "Revenue"],
        "operating_income" => &["Operating Income", "Total Operating Income As Reported"],
        "net_income" => &[
            "Net Income",
            "Net Income Common Stockholders",
            "Net Income From Continuing Operation Net Minority Interest",
        ],
        "ebit" => &["EBIT", "Operating Income"],
        "interest_expense" => &["Interest Expense", "Interest Expense Non Operating"],
        "depreciation" => &[
            "Reconciled Depreciation",
            "Depreciation And Amortization",
            "Depreciation",
        ],

        // Balance sheet
        "total_assets" => &["Total Assets"],
        "stockholders_equity" => &[
            "Stockholders Equity",
            "Common Stock Equity",
            "Total Equity Gross Minority Interest",
        ],
        "current_assets" => &["Current Assets", "Total Current Assets"],
        "current_liabilities" => &["Current Liabilities", "Total Current Liabilities"],
        "inventory" => &["Inventory", "Inventories"],
        "retained_earnings" => &["Retained Earnings"],
        "long_term_debt" => &[
            "Long Term Debt",
            "Long Term Debt And Capital Lease Obligation",
        ],

        // Cash flow statement
        "operating_cash_flow" => &[
            "Operating Cash Flow",
            "Cash Flow From Continuing Operating Activities",
        ],
        "investing_cash_flow" => &[
            "Investing Cash Flow",
            "Cash Flow From Continuing Investing Activities",
        ],
        "financing_cash_flow" => &[
            "Financing Cash Flow",
            "Cash Flow From Continuing Financing Activities",
        ],
        "capital_expenditures" => &["Capital Expenditure", "Purchase Of PPE"],

        _ => return None,
    };
    Some(aliases)
}

/// Resolves a field through its alias list.
fn resolve_field(items: &LineItems, field: &str) -> Option<f64> {
    line_item_aliases(field).and_then(|aliases| resolve_alias(items, aliases))
}

/// Resolves a field that the caller requires, failing with
/// [`DiagnosisError::MissingInput`] when no alias is present.
pub fn require_field(items: &LineItems, symbol: &Symbol, field: &'static str) -> Result<f64> {
    resolve_field(items, field).ok_or_else(|| DiagnosisError::MissingInput {
        symbol: symbol.to_string(),
        field,
    })
}

impl FinancialStatement {
    /// Builds a statement from a provider row, resolving every field through
    /// its alias list.
    ///
    /// Fields with no resolvable alias are left as `None`.
    #[must_use]
    pub fn from_line_items(
        symbol: Symbol,
        period_end: NaiveDate,
        period_type: PeriodType,
        items: &LineItems,
    ) -> Self {
        let mut stmt = Self::new(symbol, period_end, period_type);

        stmt.revenue = resolve_field(items, "revenue");
        stmt.operating_income = resolve_field(items, "operating_income");
        stmt.net_income = resolve_field(items, "net_income");
        stmt.ebit = resolve_field(items, "ebit");
        stmt.interest_expense = resolve_field(items, "interest_expense");
        stmt.depreciation = resolve_field(items, "depreciation");

        stmt.total_assets = resolve_field(items, "total_assets");
        stmt.stockholders_equity = resolve_field(items, "stockholders_equity");
        stmt.current_assets = resolve_field(items, "current_assets");
        stmt.current_liabilities = resolve_field(items, "current_liabilities");
        stmt.inventory = resolve_field(items, "inventory");
        stmt.retained_earnings = resolve_field(items, "retained_earnings");
        stmt.long_term_debt = resolve_field(items, "long_term_debt");

        stmt.operating_cash_flow = resolve_field(items, "operating_cash_flow");
        stmt.investing_cash_flow = resolve_field(items, "investing_cash_flow");
        stmt.financing_cash_flow = resolve_field(items, "financing_cash_flow");
        stmt.capital_expenditures = resolve_field(items, "capital_expenditures");

        stmt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(&str, f64)]) -> LineItems {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_first_alias_wins() {
        let row = items(&[("Operating Revenue", 90.0), ("Total Revenue", 100.0)]);
        assert_eq!(
            resolve_alias(&row, &["Total Revenue", "Operating Revenue"]),
            Some(100.0)
        );
    }

    #[test]
    fn test_nan_falls_through_to_next_alias() {
        let row = items(&[("Total Revenue", f64::NAN), ("Operating Revenue", 90.0)]);
        assert_eq!(
            resolve_alias(&row, &["Total Revenue", "Operating Revenue"]),
            Some(90.0)
        );
    }

    #[test]
    fn test_not_found() {
        let row = items(&[("Net Income", 5.0)]);
        assert_eq!(resolve_alias(&row, &["Total Revenue"]), None);
        assert_eq!(resolve_alias(&row, &[]), None);
    }

    #[test]
    fn test_line_item_aliases() {
        assert!(line_item_aliases("revenue").is_some());
        assert!(line_item_aliases("capital_expenditures").is_some());
        assert!(line_item_aliases("nonexistent_field").is_none());
    }

    #[test]
    fn test_from_line_items() {
        let row = items(&[
            ("Total Revenue", 1000.0),
            ("Operating Income", 150.0),
            ("Net Income Common Stockholders", 80.0),
            ("Total Assets", 900.0),
            ("Capital Expenditure", -40.0),
            ("Retained Earnings", f64::NAN),
        ]);
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let stmt =
            FinancialStatement::from_line_items(Symbol::new("7203"), date, PeriodType::Annual, &row);

        assert_eq!(stmt.revenue, Some(1000.0));
        assert_eq!(stmt.net_income, Some(80.0));
        // EBIT falls back to operating income
        assert_eq!(stmt.ebit, Some(150.0));
        assert_eq!(stmt.capital_expenditures, Some(-40.0));
        assert_eq!(stmt.retained_earnings, None);
        assert_eq!(stmt.inventory, None);
    }

    #[test]
    fn test_require_field() {
        let row = items(&[("Total Assets", 900.0)]);
        let symbol = Symbol::new("7203");
        assert_eq!(require_field(&row, &symbol, "total_assets").unwrap(), 900.0);
        assert!(matches!(
            require_field(&row, &symbol, "revenue"),
            Err(DiagnosisError::MissingInput {
                field: "revenue",
                ..
            })
        ));
    }
}
