//! Fetch, analyze and persist stock diagnoses.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use diagnosis_core::{
    AnalysisRecord, AnalysisStore, DiagnosisError, FundamentalDataProvider, PeriodType,
    ReferenceDataProvider, Result, Symbol,
};
use diagnosis_engine::{EngineConfig, MetricsInput, TagHistory, analyze};
use diagnosis_portfolio::{ExposureConfig, PortfolioReport, analyze_portfolio};

/// Number of annual periods an analysis needs: current and prior.
const PERIODS_PER_ANALYSIS: usize = 2;

/// Drives the diagnosis engine over provider data and a store.
///
/// The `Analyzer` fetches the two most recent annual statements and a market
/// quote for a symbol, runs the engine with the previous diagnosis as tag
/// history, and upserts the resulting [`AnalysisRecord`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use diagnosis::{Analyzer, InMemoryStore, Symbol};
///
/// let analyzer = Analyzer::new(Arc::new(my_provider), Arc::new(InMemoryStore::new()));
/// let record = analyzer.analyze_symbol(&Symbol::new("7203")).await?;
/// println!("{}", record.diagnosis.verdict.final_label);
/// ```
pub struct Analyzer {
    provider: Arc<dyn FundamentalDataProvider>,
    reference: Option<Arc<dyn ReferenceDataProvider>>,
    store: Arc<dyn AnalysisStore>,
    config: EngineConfig,
    exposure: ExposureConfig,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("provider", &self.provider.name())
            .field("reference", &self.reference.as_ref().map(|p| p.name()))
            .field("config", &self.config)
            .field("exposure", &self.exposure)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Create an analyzer with the default engine configuration.
    #[must_use]
    pub fn new(provider: Arc<dyn FundamentalDataProvider>, store: Arc<dyn AnalysisStore>) -> Self {
        Self {
            provider,
            reference: None,
            store,
            config: EngineConfig::default(),
            exposure: ExposureConfig::default(),
        }
    }

    /// Set the reference data provider used to look up sectors.
    #[must_use]
    pub fn with_reference(mut self, reference: Arc<dyn ReferenceDataProvider>) -> Self {
        debug!(provider = reference.name(), "Registering reference provider");
        self.reference = Some(reference);
        self
    }

    /// Set the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the portfolio aggregation configuration.
    #[must_use]
    pub fn with_exposure(mut self, exposure: ExposureConfig) -> Self {
        self.exposure = exposure;
        self
    }

    /// The store results are written to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn AnalysisStore> {
        &self.store
    }

    /// Fetch, analyze and persist one symbol.
    ///
    /// # Errors
    /// Returns `DataNotAvailable` when the provider has no statements, and
    /// propagates provider and store errors.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn analyze_symbol(&self, symbol: &Symbol) -> Result<AnalysisRecord> {
        let mut statements = self
            .provider
            .fetch_financials(symbol, PeriodType::Annual, Some(PERIODS_PER_ANALYSIS))
            .await?;
        // Most recent first, one statement per period
        statements.sort_by(|a, b| b.period_end.cmp(&a.period_end));
        statements.dedup_by_key(|stmt| stmt.period_end);
        let Some(current) = statements.first() else {
            return Err(DiagnosisError::DataNotAvailable {
                symbol: symbol.to_string(),
                detail: "no annual statements".to_string(),
            });
        };
        self.store.put_financials(&statements).await?;

        let market = self.provider.fetch_market_data(symbol).await?;
        let sector = self.resolve_sector(symbol).await?;

        let history = self
            .store
            .analysis_before(symbol, current.period_end)
            .await?
            .map(|previous| TagHistory::from_record(&previous));

        let input = MetricsInput::from_statements(
            current,
            statements.get(1),
            Some(&market),
            sector.as_deref(),
        );
        let diagnosis = analyze(&input, &self.config, history.as_ref());

        let record = AnalysisRecord {
            symbol: symbol.clone(),
            period_end: current.period_end,
            analyzed_on: Utc::now().date_naive(),
            stock_price: input.stock_price,
            market_cap: input.market_cap,
            diagnosis,
        };
        self.store.put_analysis(&record).await?;

        info!(
            period_end = %record.period_end,
            label = %record.diagnosis.verdict.final_label,
            state = %record.diagnosis.state,
            "Analysis stored"
        );
        Ok(record)
    }

    /// Look up the sector, preferring the reference provider over the store.
    ///
    /// A reference lookup failure falls back to the stored stock.
    async fn resolve_sector(&self, symbol: &Symbol) -> Result<Option<String>> {
        if let Some(reference) = &self.reference {
            match reference.company_info(symbol).await {
                Ok(info) => {
                    self.store.put_stock(&info).await?;
                    return Ok(info.sector);
                }
                Err(e) => {
                    warn!(
                        provider = reference.name(),
                        error = %e,
                        "Reference lookup failed, using stored stock"
                    );
                }
            }
        }

        Ok(self
            .store
            .get_stock(symbol)
            .await?
            .and_then(|info| info.sector))
    }

    /// Load the master list of instruments from the reference provider.
    ///
    /// Returns the number of stocks stored.
    ///
    /// # Errors
    /// Returns `ProviderNotConfigured` without a reference provider.
    #[instrument(skip(self))]
    pub async fn sync_universe(&self) -> Result<usize> {
        let reference = self.reference.as_ref().ok_or_else(|| {
            DiagnosisError::ProviderNotConfigured("No reference provider registered".to_string())
        })?;

        let universe = reference.universe().await?;
        for info in &universe {
            self.store.put_stock(info).await?;
        }

        info!(count = universe.len(), "Universe synchronized");
        Ok(universe.len())
    }

    /// Build the exposure report of a portfolio from the latest diagnoses.
    ///
    /// Recomputed on every call.
    ///
    /// # Errors
    /// Propagates store errors.
    #[instrument(skip(self), fields(portfolio = %portfolio))]
    pub async fn portfolio_report(&self, portfolio: &str) -> Result<PortfolioReport> {
        let items = self.store.portfolio_items(portfolio).await?;

        let mut latest = HashMap::with_capacity(items.len());
        for item in &items {
            if latest.contains_key(&item.symbol) {
                continue;
            }
            if let Some(record) = self.store.latest_analysis(&item.symbol).await? {
                latest.insert(item.symbol.clone(), record);
            }
        }

        let report = analyze_portfolio(&items, &latest, &self.exposure);
        debug!(
            health_score = report.health_score,
            total_value = report.total_value,
            "Portfolio report built"
        );
        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use diagnosis_core::{
        AltmanZone, CharacterTags, CompanyInfo, CorporateState, DataProvider, DiagnosisResult,
        ExpectationStructure, FinalLabel, FinancialStatement, MarketData, PortfolioItem,
        RatioSet, RiskAssessment, Tag, Verdict,
    };
    use diagnosis_store::InMemoryStore;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider serving fixed statements, with an optional number of
    /// network failures before each symbol succeeds.
    #[derive(Debug, Default)]
    pub(crate) struct FixtureProvider {
        statements: HashMap<Symbol, Vec<FinancialStatement>>,
        quotes: HashMap<Symbol, MarketData>,
        companies: HashMap<Symbol, CompanyInfo>,
        failures: Mutex<HashMap<Symbol, usize>>,
        pub(crate) calls: AtomicUsize,
    }

    impl FixtureProvider {
        pub(crate) fn with_company(mut self, symbol: &str, sector: &str, healthy: bool) -> Self {
            let symbol = Symbol::new(symbol);
            let (current, prior) = if healthy {
                (statement(&symbol, 2024, 1000.0, 80.0), statement(&symbol, 2023, 900.0, 60.0))
            } else {
                (statement(&symbol, 2024, 600.0, -50.0), statement(&symbol, 2023, 900.0, 30.0))
            };
            let date = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
            self.quotes.insert(
                symbol.clone(),
                MarketData::new(symbol.clone(), date)
                    .with_quote(1500.0, 1200.0)
                    .with_beta(0.9),
            );
            self.companies.insert(
                symbol.clone(),
                CompanyInfo::new(symbol.clone(), format!("Company {symbol}")).with_sector(sector),
            );
            self.statements.insert(symbol, vec![current, prior]);
            self
        }

        /// Serve every symbol's statements oldest first.
        pub(crate) fn oldest_first(mut self) -> Self {
            for statements in self.statements.values_mut() {
                statements.reverse();
            }
            self
        }

        pub(crate) fn with_failures(self, symbol: &str, count: usize) -> Self {
            self.failures
                .lock()
                .unwrap()
                .insert(Symbol::new(symbol), count);
            self
        }
    }

    fn statement(symbol: &Symbol, year: i32, revenue: f64, net_income: f64) -> FinancialStatement {
        let date = NaiveDate::from_ymd_opt(year, 3, 31).unwrap();
        let mut stmt = FinancialStatement::new(symbol.clone(), date, PeriodType::Annual)
            .with_fiscal_year(year);
        let scale = revenue / 1000.0;
        stmt.revenue = Some(revenue);
        stmt.operating_income = Some(net_income * 1.8);
        stmt.net_income = Some(net_income);
        stmt.ebit = Some(net_income * 2.0);
        stmt.interest_expense = Some(-10.0);
        stmt.total_assets = Some(900.0 * scale);
        stmt.stockholders_equity = Some(500.0 * scale);
        stmt.current_assets = Some(500.0 * scale);
        stmt.current_liabilities = Some(300.0);
        stmt.retained_earnings = Some(200.0 * scale);
        stmt.long_term_debt = Some(100.0);
        stmt.operating_cash_flow = Some(net_income * 1.7);
        stmt.investing_cash_flow = Some(-50.0);
        stmt.capital_expenditures = Some(-50.0);
        stmt
    }

    impl DataProvider for FixtureProvider {
        fn name(&self) -> &str {
            "fixture"
        }

        fn description(&self) -> &str {
            "Static statements for tests"
        }
    }

    #[async_trait]
    impl FundamentalDataProvider for FixtureProvider {
        async fn fetch_financials(
            &self,
            symbol: &Symbol,
            _period_type: PeriodType,
            limit: Option<usize>,
        ) -> Result<Vec<FinancialStatement>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(remaining) = self.failures.lock().unwrap().get_mut(symbol)
                && *remaining > 0
            {
                *remaining -= 1;
                return Err(DiagnosisError::Network("connection reset".to_string()));
            }

            let statements = self.statements.get(symbol).cloned().unwrap_or_default();
            Ok(match limit {
                Some(n) => statements.into_iter().take(n).collect(),
                None => statements,
            })
        }

        async fn fetch_market_data(&self, symbol: &Symbol) -> Result<MarketData> {
            self.quotes
                .get(symbol)
                .cloned()
                .ok_or_else(|| DiagnosisError::SymbolNotFound(symbol.to_string()))
        }
    }

    #[async_trait]
    impl ReferenceDataProvider for FixtureProvider {
        async fn company_info(&self, symbol: &Symbol) -> Result<CompanyInfo> {
            self.companies
                .get(symbol)
                .cloned()
                .ok_or_else(|| DiagnosisError::SymbolNotFound(symbol.to_string()))
        }

        async fn universe(&self) -> Result<Vec<CompanyInfo>> {
            let mut companies: Vec<_> = self.companies.values().cloned().collect();
            companies.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            Ok(companies)
        }
    }

    pub(crate) fn analyzer(provider: FixtureProvider) -> (Analyzer, Arc<InMemoryStore>) {
        let provider = Arc::new(provider);
        let store = Arc::new(InMemoryStore::new());
        let analyzer =
            Analyzer::new(provider.clone(), store.clone()).with_reference(provider);
        (analyzer, store)
    }

    #[tokio::test]
    async fn test_analyze_symbol_persists_record() {
        let (analyzer, store) =
            analyzer(FixtureProvider::default().with_company("7203", "Machinery", true));
        let symbol = Symbol::new("7203");

        let record = analyzer.analyze_symbol(&symbol).await.unwrap();
        assert_eq!(record.period_end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(record.stock_price, 1500.0);
        assert_eq!(record.diagnosis.ratios.target_margin, 0.08);
        assert!(record.diagnosis.ratios.f_score > 0);

        let stored = store.latest_analysis(&symbol).await.unwrap().unwrap();
        assert_eq!(stored, record);
        let statements = store
            .recent_financials(&symbol, PeriodType::Annual, 5)
            .await
            .unwrap();
        assert_eq!(statements.len(), 2);
        let stock = store.get_stock(&symbol).await.unwrap().unwrap();
        assert_eq!(stock.sector.as_deref(), Some("Machinery"));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let (analyzer, _store) =
            analyzer(FixtureProvider::default().with_company("7203", "Machinery", true));
        let symbol = Symbol::new("7203");

        let first = analyzer.analyze_symbol(&symbol).await.unwrap();
        let second = analyzer.analyze_symbol(&symbol).await.unwrap();
        assert_eq!(first.diagnosis, second.diagnosis);
    }

    #[tokio::test]
    async fn test_rerun_keeps_earlier_period_history() {
        let (analyzer, store) =
            analyzer(FixtureProvider::default().with_company("7203", "Wholesale Trade", true));
        let symbol = Symbol::new("7203");
        let period_2023 = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
        store
            .put_analysis(&AnalysisRecord {
                symbol: symbol.clone(),
                period_end: period_2023,
                analyzed_on: period_2023,
                stock_price: 900.0,
                market_cap: 800.0,
                diagnosis: DiagnosisResult {
                    ratios: RatioSet {
                        altman_zone: Some(AltmanZone::Distress),
                        ..Default::default()
                    },
                    state: CorporateState::Deteriorating,
                    expectation_structure: ExpectationStructure::Reasonable,
                    risk: RiskAssessment::default(),
                    tags: CharacterTags::default(),
                    verdict: Verdict {
                        final_label: FinalLabel::Sell,
                        is_good_buy: false,
                        summary: String::new(),
                    },
                },
            })
            .await
            .unwrap();

        let first = analyzer.analyze_symbol(&symbol).await.unwrap();
        let second = analyzer.analyze_symbol(&symbol).await.unwrap();
        assert!(first.diagnosis.tags.has(Tag::SilentImprover));
        assert_eq!(first.diagnosis, second.diagnosis);
    }

    #[tokio::test]
    async fn test_statement_order_from_provider_is_ignored() {
        let (newest_first, _) =
            analyzer(FixtureProvider::default().with_company("7203", "Machinery", true));
        let (oldest_first, _) = analyzer(
            FixtureProvider::default()
                .with_company("7203", "Machinery", true)
                .oldest_first(),
        );
        let symbol = Symbol::new("7203");

        let expected = newest_first.analyze_symbol(&symbol).await.unwrap();
        let record = oldest_first.analyze_symbol(&symbol).await.unwrap();
        assert_eq!(record.period_end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(record.diagnosis, expected.diagnosis);
    }

    #[tokio::test]
    async fn test_missing_statements() {
        let (analyzer, _store) = analyzer(FixtureProvider::default());
        let err = analyzer
            .analyze_symbol(&Symbol::new("0000"))
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::DataNotAvailable { .. }));
    }

    #[tokio::test]
    async fn test_sync_universe() {
        let (analyzer, store) = analyzer(
            FixtureProvider::default()
                .with_company("7203", "Machinery", true)
                .with_company("6758", "Electric Appliances", true),
        );
        assert_eq!(analyzer.sync_universe().await.unwrap(), 2);
        assert_eq!(store.list_symbols().await.unwrap().len(), 2);

        let bare = Analyzer::new(
            Arc::new(FixtureProvider::default()),
            Arc::new(InMemoryStore::new()),
        );
        assert!(matches!(
            bare.sync_universe().await,
            Err(DiagnosisError::ProviderNotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_portfolio_report() {
        let (analyzer, store) = analyzer(
            FixtureProvider::default()
                .with_company("7203", "Machinery", true)
                .with_company("9999", "Retail Trade", false),
        );
        analyzer.analyze_symbol(&Symbol::new("7203")).await.unwrap();
        let weak = analyzer.analyze_symbol(&Symbol::new("9999")).await.unwrap();
        assert_ne!(weak.diagnosis.verdict.final_label, FinalLabel::StrongBuy);

        store
            .put_portfolio_item("main", &PortfolioItem::new("7203", 100.0, 1000.0))
            .await
            .unwrap();
        store
            .put_portfolio_item("main", &PortfolioItem::new("9999", 100.0, 2000.0))
            .await
            .unwrap();
        store
            .put_portfolio_item("main", &PortfolioItem::new("1234", 10.0, 500.0))
            .await
            .unwrap();

        let report = analyzer.portfolio_report("main").await.unwrap();
        assert_eq!(report.total_value, 300_000.0);
        assert_eq!(report.holdings.len(), 2);
        assert_eq!(report.excluded, vec![Symbol::new("1234")]);
        assert!(report.health_score <= 100);
        let sum: f64 = report.category_exposure.values().sum();
        assert!((sum - 100.0).abs() < 1e-9);

        let empty = analyzer.portfolio_report("nothing").await.unwrap();
        assert_eq!(empty.health_score, 0);
    }
}
