//! In-memory store implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diagnosis_core::{
    AnalysisRecord, AnalysisStore, CompanyInfo, DiagnosisError, FetchLog, FetchStatus,
    FinancialStatement, PeriodType, PortfolioItem, Result, Symbol,
};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Key for financial statement entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FinancialsKey {
    symbol: Symbol,
    period_type: PeriodType,
}

/// Simple in-memory store for testing and development.
///
/// Data is stored in `RwLock`-protected maps and is lost when the store is
/// dropped. Values are cloned on get/put operations.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    stocks: RwLock<BTreeMap<Symbol, CompanyInfo>>,
    financials: RwLock<HashMap<FinancialsKey, BTreeMap<NaiveDate, FinancialStatement>>>,
    analyses: RwLock<HashMap<Symbol, BTreeMap<NaiveDate, AnalysisRecord>>>,
    portfolios: RwLock<HashMap<String, Vec<PortfolioItem>>>,
    fetch_logs: RwLock<Vec<FetchLog>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for InMemoryStore {
    #[instrument(skip(self, info), fields(symbol = %info.symbol))]
    async fn put_stock(&self, info: &CompanyInfo) -> Result<()> {
        self.stocks
            .write()
            .await
            .insert(info.symbol.clone(), info.clone());
        debug!("Stored stock");
        Ok(())
    }

    async fn get_stock(&self, symbol: &Symbol) -> Result<Option<CompanyInfo>> {
        Ok(self.stocks.read().await.get(symbol).cloned())
    }

    async fn list_symbols(&self) -> Result<Vec<Symbol>> {
        Ok(self.stocks.read().await.keys().cloned().collect())
    }

    #[instrument(skip(self, statements), fields(count = statements.len()))]
    async fn put_financials(&self, statements: &[FinancialStatement]) -> Result<()> {
        let mut store = self.financials.write().await;
        for stmt in statements {
            let key = FinancialsKey {
                symbol: stmt.symbol.clone(),
                period_type: stmt.period_type,
            };
            store
                .entry(key)
                .or_default()
                .insert(stmt.period_end, stmt.clone());
        }
        debug!("Stored {} financial statements", statements.len());
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn recent_financials(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: usize,
    ) -> Result<Vec<FinancialStatement>> {
        let key = FinancialsKey {
            symbol: symbol.clone(),
            period_type,
        };
        let store = self.financials.read().await;
        Ok(store
            .get(&key)
            .map(|periods| periods.values().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    #[instrument(skip(self, record), fields(symbol = %record.symbol, period_end = %record.period_end))]
    async fn put_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        self.analyses
            .write()
            .await
            .entry(record.symbol.clone())
            .or_default()
            .insert(record.period_end, record.clone());
        debug!("Stored analysis");
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn latest_analysis(&self, symbol: &Symbol) -> Result<Option<AnalysisRecord>> {
        let store = self.analyses.read().await;
        Ok(store.get(symbol).and_then(|records| {
            records
                .values()
                .max_by_key(|r| (r.analyzed_on, r.period_end))
                .cloned()
        }))
    }

    #[instrument(skip(self), fields(symbol = %symbol, period_end = %period_end))]
    async fn analysis_before(
        &self,
        symbol: &Symbol,
        period_end: NaiveDate,
    ) -> Result<Option<AnalysisRecord>> {
        let store = self.analyses.read().await;
        Ok(store
            .get(symbol)
            .and_then(|records| records.range(..period_end).next_back())
            .map(|(_, record)| record.clone()))
    }

    #[instrument(skip(self, item), fields(portfolio = %portfolio, symbol = %item.symbol))]
    async fn put_portfolio_item(&self, portfolio: &str, item: &PortfolioItem) -> Result<()> {
        let mut store = self.portfolios.write().await;
        let items = store.entry(portfolio.to_string()).or_default();
        match items.iter_mut().find(|existing| existing.symbol == item.symbol) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(())
    }

    async fn portfolio_items(&self, portfolio: &str) -> Result<Vec<PortfolioItem>> {
        Ok(self
            .portfolios
            .read()
            .await
            .get(portfolio)
            .cloned()
            .unwrap_or_default())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn start_fetch(&self, symbol: &Symbol) -> Result<i64> {
        let mut logs = self.fetch_logs.write().await;
        let id = logs.len() as i64 + 1;
        logs.push(FetchLog {
            id,
            symbol: symbol.clone(),
            status: FetchStatus::Fetching,
            message: None,
            started_at: Utc::now(),
            finished_at: None,
        });
        debug!(id, "Fetch started");
        Ok(id)
    }

    #[instrument(skip(self, message))]
    async fn finish_fetch(
        &self,
        id: i64,
        status: FetchStatus,
        message: Option<String>,
    ) -> Result<()> {
        if !status.is_terminal() {
            return Err(DiagnosisError::InvalidParameter(format!(
                "Fetch log {id} cannot move to {}",
                status.as_str()
            )));
        }

        let mut logs = self.fetch_logs.write().await;
        let log = logs
            .iter_mut()
            .find(|log| log.id == id)
            .ok_or_else(|| DiagnosisError::InvalidParameter(format!("Unknown fetch log {id}")))?;
        if log.status.is_terminal() {
            return Err(DiagnosisError::InvalidParameter(format!(
                "Fetch log {id} already finished as {}",
                log.status.as_str()
            )));
        }

        log.status = status;
        log.message = message;
        log.finished_at = Some(Utc::now());
        debug!(status = status.as_str(), "Fetch finished");
        Ok(())
    }

    async fn fetch_logs(&self, symbol: &Symbol) -> Result<Vec<FetchLog>> {
        Ok(self
            .fetch_logs
            .read()
            .await
            .iter()
            .filter(|log| &log.symbol == symbol)
            .cloned()
            .collect())
    }
}
