//! Provider traits for fetching fundamental data.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`FundamentalDataProvider`] - Financial statements and market data
//! - [`ReferenceDataProvider`] - Company metadata and the tradable universe

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    period::PeriodType,
    types::{CompanyInfo, FinancialStatement, MarketData, Symbol},
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider.
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for fundamental financial data.
///
/// Implementations resolve raw line items through ordered aliases
/// (see [`crate::alias`]) and leave unresolvable fields as `None`.
#[async_trait]
pub trait FundamentalDataProvider: DataProvider {
    /// Fetches financial statements for a symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The stock symbol
    /// * `period_type` - Annual or Quarterly
    /// * `limit` - Maximum number of periods to return (most recent first)
    async fn fetch_financials(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: Option<usize>,
    ) -> Result<Vec<FinancialStatement>>;

    /// Fetches the current price, market capitalization and beta.
    async fn fetch_market_data(&self, symbol: &Symbol) -> Result<MarketData>;
}

/// Provider for reference/metadata.
#[async_trait]
pub trait ReferenceDataProvider: DataProvider {
    /// Fetches company information for a symbol.
    async fn company_info(&self, symbol: &Symbol) -> Result<CompanyInfo>;

    /// Fetches the master list of tradable instruments.
    async fn universe(&self) -> Result<Vec<CompanyInfo>>;
}
