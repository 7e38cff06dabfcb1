//! Core data types for fundamental diagnosis.
//!
//! This module defines the data structures exchanged with collaborators:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`FinancialStatement`] - One reporting period of raw line items
//! - [`MarketData`] - Point-in-time price, market cap and beta
//! - [`CompanyInfo`] - Company reference information
//! - [`PortfolioItem`] - A held position
//! - [`FetchLog`] - Per-ticker record of a fetch-and-analyze attempt

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::period::PeriodType;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Raw financial statement data for one reporting period.
///
/// Fields are `None` when the provider did not report them. Conversion into
/// engine input normalises missing values to zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    /// Stock symbol.
    pub symbol: Symbol,
    /// End date of the reporting period.
    pub period_end: NaiveDate,
    /// Type of period (annual or quarterly).
    pub period_type: PeriodType,
    /// Fiscal year.
    pub fiscal_year: Option<i32>,
    /// Fiscal quarter (1-4).
    pub fiscal_quarter: Option<i32>,

    // Income Statement
    /// Total revenue.
    pub revenue: Option<f64>,
    /// Operating income.
    pub operating_income: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
    /// Earnings before interest and taxes.
    pub ebit: Option<f64>,
    /// Interest expense.
    pub interest_expense: Option<f64>,
    /// Depreciation and amortization.
    pub depreciation: Option<f64>,

    // Balance Sheet
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Stockholders' equity.
    pub stockholders_equity: Option<f64>,
    /// Current assets.
    pub current_assets: Option<f64>,
    /// Current liabilities.
    pub current_liabilities: Option<f64>,
    /// Inventory.
    pub inventory: Option<f64>,
    /// Retained earnings.
    pub retained_earnings: Option<f64>,
    /// Long-term debt.
    pub long_term_debt: Option<f64>,

    // Cash Flow Statement
    /// Operating cash flow.
    pub operating_cash_flow: Option<f64>,
    /// Investing cash flow.
    pub investing_cash_flow: Option<f64>,
    /// Financing cash flow.
    pub financing_cash_flow: Option<f64>,
    /// Capital expenditures.
    pub capital_expenditures: Option<f64>,
}

impl FinancialStatement {
    /// Creates a new financial statement with required fields.
    #[must_use]
    pub fn new(symbol: Symbol, period_end: NaiveDate, period_type: PeriodType) -> Self {
        Self {
            symbol,
            period_end,
            period_type,
            ..Default::default()
        }
    }

    /// Sets the fiscal year.
    #[must_use]
    pub const fn with_fiscal_year(mut self, fiscal_year: i32) -> Self {
        self.fiscal_year = Some(fiscal_year);
        self
    }
}

/// Point-in-time market data for a symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Date of the quote.
    pub date: NaiveDate,
    /// Last traded price.
    pub stock_price: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Beta coefficient.
    pub beta: Option<f64>,
}

impl MarketData {
    /// Creates new market data with required fields.
    #[must_use]
    pub fn new(symbol: Symbol, date: NaiveDate) -> Self {
        Self {
            symbol,
            date,
            ..Default::default()
        }
    }

    /// Sets the price and market capitalization.
    #[must_use]
    pub const fn with_quote(mut self, stock_price: f64, market_cap: f64) -> Self {
        self.stock_price = Some(stock_price);
        self.market_cap = Some(market_cap);
        self
    }

    /// Sets the beta coefficient.
    #[must_use]
    pub const fn with_beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }
}

/// Company reference information.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Company name.
    pub name: String,
    /// Listing market or segment.
    pub market: Option<String>,
    /// Business sector.
    pub sector: Option<String>,
    /// Business description.
    pub description: Option<String>,
}

impl CompanyInfo {
    /// Creates new company info with required fields.
    #[must_use]
    pub fn new(symbol: Symbol, name: impl Into<String>) -> Self {
        Self {
            symbol,
            name: name.into(),
            market: None,
            sector: None,
            description: None,
        }
    }

    /// Sets the listing market.
    #[must_use]
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    /// Sets the business sector.
    #[must_use]
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Sets the business description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A position held in a portfolio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioItem {
    /// Held symbol.
    pub symbol: Symbol,
    /// Number of shares held.
    pub quantity: f64,
    /// Average acquisition price per share.
    pub average_price: f64,
}

impl PortfolioItem {
    /// Creates a new portfolio item.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>, quantity: f64, average_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            average_price,
        }
    }
}

/// Status of a fetch-and-analyze attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    /// The attempt is in progress.
    Fetching,
    /// The attempt completed and a result was stored.
    Success,
    /// The attempt failed.
    Failure,
}

impl FetchStatus {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "FETCHING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }

    /// Returns true once the attempt has finished.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl FromStr for FetchStatus {
    type Err = crate::error::DiagnosisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FETCHING" => Ok(Self::Fetching),
            "SUCCESS" => Ok(Self::Success),
            "FAILURE" => Ok(Self::Failure),
            _ => Err(crate::error::DiagnosisError::Parse(format!(
                "Invalid fetch status: {}",
                s
            ))),
        }
    }
}

/// Append-only record of one fetch-and-analyze attempt for a ticker.
///
/// The only permitted mutation is the single transition from
/// [`FetchStatus::Fetching`] to a terminal status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchLog {
    /// Store-assigned identifier.
    pub id: i64,
    /// Ticker being processed.
    pub symbol: Symbol,
    /// Current status.
    pub status: FetchStatus,
    /// Error message for failures.
    pub message: Option<String>,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// When the attempt finished.
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::new("aapl");
        assert_eq!(symbol.as_str(), "AAPL");
        assert_eq!(Symbol::from("7203").to_string(), "7203");
    }

    #[test]
    fn test_market_data_builder() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 29).unwrap();
        let quote = MarketData::new(Symbol::new("7203"), date)
            .with_quote(3500.0, 5.7e13)
            .with_beta(0.8);
        assert_eq!(quote.stock_price, Some(3500.0));
        assert_eq!(quote.market_cap, Some(5.7e13));
        assert_eq!(quote.beta, Some(0.8));
    }

    #[test]
    fn test_fetch_status_round_trip() {
        for status in [
            FetchStatus::Fetching,
            FetchStatus::Success,
            FetchStatus::Failure,
        ] {
            assert_eq!(status.as_str().parse::<FetchStatus>().unwrap(), status);
        }
        assert!(!FetchStatus::Fetching.is_terminal());
        assert!(FetchStatus::Failure.is_terminal());
    }
}
