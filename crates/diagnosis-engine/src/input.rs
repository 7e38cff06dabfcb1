//! Engine input: one company-period plus its prior period and market data.

use diagnosis_core::{FinancialStatement, MarketData};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SECTOR;

/// Prior-period figures needed for year-over-year comparisons.
///
/// The prior period is either fully present or absent; partial prior data
/// is not representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorPeriod {
    /// Prior revenue.
    pub revenue: f64,
    /// Prior operating income.
    pub operating_income: f64,
    /// Prior net income.
    pub net_income: f64,
    /// Prior total assets.
    pub total_assets: f64,
    /// Prior current assets.
    pub current_assets: f64,
    /// Prior current liabilities.
    pub current_liabilities: f64,
    /// Prior inventory.
    pub inventory: f64,
    /// Prior long-term debt.
    pub long_term_debt: f64,
}

impl PriorPeriod {
    /// Normalises a statement, treating missing line items as zero.
    #[must_use]
    pub fn from_statement(stmt: &FinancialStatement) -> Self {
        Self {
            revenue: stmt.revenue.unwrap_or(0.0),
            operating_income: stmt.operating_income.unwrap_or(0.0),
            net_income: stmt.net_income.unwrap_or(0.0),
            total_assets: stmt.total_assets.unwrap_or(0.0),
            current_assets: stmt.current_assets.unwrap_or(0.0),
            current_liabilities: stmt.current_liabilities.unwrap_or(0.0),
            inventory: stmt.inventory.unwrap_or(0.0),
            long_term_debt: stmt.long_term_debt.unwrap_or(0.0),
        }
    }
}

/// Immutable snapshot of the figures one analysis pass needs.
///
/// Current-period fields are always present; callers normalise missing
/// source values to `0.0` (see [`MetricsInput::from_statements`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsInput {
    // Income statement
    /// Revenue.
    pub revenue: f64,
    /// Operating income.
    pub operating_income: f64,
    /// Net income.
    pub net_income: f64,
    /// Earnings before interest and taxes.
    pub ebit: f64,
    /// Interest expense as a magnitude.
    pub interest_expense: f64,
    /// Depreciation as a magnitude.
    pub depreciation: f64,

    // Balance sheet
    /// Total assets.
    pub total_assets: f64,
    /// Total (stockholders') equity.
    pub total_equity: f64,
    /// Current assets.
    pub current_assets: f64,
    /// Current liabilities.
    pub current_liabilities: f64,
    /// Inventory.
    pub inventory: f64,
    /// Retained earnings.
    pub retained_earnings: f64,
    /// Long-term debt.
    pub long_term_debt: f64,

    // Cash flow
    /// Operating cash flow.
    pub operating_cf: f64,
    /// Investing cash flow.
    pub investing_cf: f64,
    /// Capital expenditure as a magnitude.
    pub capex: f64,

    // Market
    /// Stock price (default 0).
    pub stock_price: f64,
    /// Market capitalization (default 0).
    pub market_cap: f64,
    /// Beta (default 1.0).
    pub beta: f64,

    /// Prior period, if available.
    pub prior: Option<PriorPeriod>,

    /// Sector name, used only to pick a target margin.
    pub sector: String,
}

impl Default for MetricsInput {
    fn default() -> Self {
        Self {
            revenue: 0.0,
            operating_income: 0.0,
            net_income: 0.0,
            ebit: 0.0,
            interest_expense: 0.0,
            depreciation: 0.0,
            total_assets: 0.0,
            total_equity: 0.0,
            current_assets: 0.0,
            current_liabilities: 0.0,
            inventory: 0.0,
            retained_earnings: 0.0,
            long_term_debt: 0.0,
            operating_cf: 0.0,
            investing_cf: 0.0,
            capex: 0.0,
            stock_price: 0.0,
            market_cap: 0.0,
            beta: 1.0,
            prior: None,
            sector: DEFAULT_SECTOR.to_string(),
        }
    }
}

impl MetricsInput {
    /// Assembles an input from two adjacent statements and a market quote.
    ///
    /// Missing line items become `0.0`; capex, interest and depreciation are
    /// stored as magnitudes since providers report them with either sign.
    #[must_use]
    pub fn from_statements(
        current: &FinancialStatement,
        prior: Option<&FinancialStatement>,
        market: Option<&MarketData>,
        sector: Option<&str>,
    ) -> Self {
        let mut input = Self {
            revenue: current.revenue.unwrap_or(0.0),
            operating_income: current.operating_income.unwrap_or(0.0),
            net_income: current.net_income.unwrap_or(0.0),
            ebit: current.ebit.unwrap_or(0.0),
            interest_expense: current.interest_expense.unwrap_or(0.0).abs(),
            depreciation: current.depreciation.unwrap_or(0.0).abs(),
            total_assets: current.total_assets.unwrap_or(0.0),
            total_equity: current.stockholders_equity.unwrap_or(0.0),
            current_assets: current.current_assets.unwrap_or(0.0),
            current_liabilities: current.current_liabilities.unwrap_or(0.0),
            inventory: current.inventory.unwrap_or(0.0),
            retained_earnings: current.retained_earnings.unwrap_or(0.0),
            long_term_debt: current.long_term_debt.unwrap_or(0.0),
            operating_cf: current.operating_cash_flow.unwrap_or(0.0),
            investing_cf: current.investing_cash_flow.unwrap_or(0.0),
            capex: current.capital_expenditures.unwrap_or(0.0).abs(),
            prior: prior.map(PriorPeriod::from_statement),
            ..Self::default()
        };

        if let Some(quote) = market {
            input.stock_price = quote.stock_price.unwrap_or(0.0);
            input.market_cap = quote.market_cap.unwrap_or(0.0);
            input.beta = quote.beta.unwrap_or(1.0);
        }
        if let Some(sector) = sector {
            input.sector = sector.to_string();
        }
        input
    }

    /// Sets the prior period.
    #[must_use]
    pub fn with_prior(mut self, prior: PriorPeriod) -> Self {
        self.prior = Some(prior);
        self
    }

    /// Sets price, market capitalization and beta.
    #[must_use]
    pub fn with_market(mut self, stock_price: f64, market_cap: f64, beta: f64) -> Self {
        self.stock_price = stock_price;
        self.market_cap = market_cap;
        self.beta = beta;
        self
    }

    /// Sets the sector name.
    #[must_use]
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = sector.into();
        self
    }

    /// Free cash flow: operating plus investing cash flow.
    #[must_use]
    pub fn free_cash_flow(&self) -> f64 {
        self.operating_cf + self.investing_cf
    }

    /// Returns true when free cash flow is positive.
    #[must_use]
    pub fn has_fcf(&self) -> bool {
        self.free_cash_flow() > 0.0
    }
}
