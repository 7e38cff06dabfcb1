//! Store trait for persisting statements and analysis results.
//!
//! This module defines the [`AnalysisStore`] trait that provides a unified
//! interface over the relational entities around the engine: stocks,
//! financial statements, analysis records, portfolios and fetch logs.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    diagnosis::AnalysisRecord,
    error::Result,
    period::PeriodType,
    types::{CompanyInfo, FetchLog, FetchStatus, FinancialStatement, PortfolioItem, Symbol},
};

/// Trait for persisting and reading back diagnosis data.
///
/// Writes have upsert semantics on their natural keys so that re-running an
/// analysis replaces the earlier row instead of duplicating it.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Inserts or updates a stock's reference data.
    async fn put_stock(&self, info: &CompanyInfo) -> Result<()>;

    /// Retrieves a stock's reference data.
    ///
    /// Returns `Ok(None)` if the stock is unknown.
    async fn get_stock(&self, symbol: &Symbol) -> Result<Option<CompanyInfo>>;

    /// Lists every known symbol in ascending order.
    async fn list_symbols(&self) -> Result<Vec<Symbol>>;

    /// Upserts financial statements keyed by (symbol, period_end, period_type).
    async fn put_financials(&self, statements: &[FinancialStatement]) -> Result<()>;

    /// Retrieves up to `limit` statements for a symbol, most recent first.
    async fn recent_financials(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: usize,
    ) -> Result<Vec<FinancialStatement>>;

    /// Upserts an analysis record keyed by (symbol, period_end).
    async fn put_analysis(&self, record: &AnalysisRecord) -> Result<()>;

    /// Retrieves the most recent analysis record for a symbol.
    ///
    /// Records are ordered by analysis date, then period end.
    async fn latest_analysis(&self, symbol: &Symbol) -> Result<Option<AnalysisRecord>>;

    /// Retrieves the record with the latest period ending strictly before
    /// `period_end`.
    async fn analysis_before(
        &self,
        symbol: &Symbol,
        period_end: NaiveDate,
    ) -> Result<Option<AnalysisRecord>>;

    /// Inserts or replaces a position in a portfolio.
    async fn put_portfolio_item(&self, portfolio: &str, item: &PortfolioItem) -> Result<()>;

    /// Lists the positions of a portfolio.
    async fn portfolio_items(&self, portfolio: &str) -> Result<Vec<PortfolioItem>>;

    /// Opens a fetch log in [`FetchStatus::Fetching`] and returns its id.
    async fn start_fetch(&self, symbol: &Symbol) -> Result<i64>;

    /// Moves a fetch log to a terminal status.
    ///
    /// Fails with `InvalidParameter` if the log is unknown, already
    /// finished, or `status` is not terminal.
    async fn finish_fetch(&self, id: i64, status: FetchStatus, message: Option<String>)
    -> Result<()>;

    /// Lists the fetch logs of a symbol, oldest first.
    async fn fetch_logs(&self, symbol: &Symbol) -> Result<Vec<FetchLog>>;
}
