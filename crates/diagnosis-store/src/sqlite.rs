//! SQLite-based store implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diagnosis_core::{
    AnalysisRecord, AnalysisStore, CompanyInfo, DiagnosisError, FetchLog, FetchStatus,
    FinancialStatement, PeriodType, PortfolioItem, Result, Symbol,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

/// SQLite-based store for statements, analyses, portfolios and fetch logs.
///
/// Key columns are stored as plain values so they can be indexed; full
/// records are kept as JSON in `data_json` columns. All writes are upserts
/// on the natural key of the table.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| DiagnosisError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DiagnosisError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DiagnosisError::Store(e.to_string()))
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS stocks (
                symbol TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                market TEXT,
                sector TEXT,
                description TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS financials (
                symbol TEXT NOT NULL,
                period_end TEXT NOT NULL,
                period_type TEXT NOT NULL,
                fiscal_year INTEGER,
                fiscal_quarter INTEGER,
                data_json TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                PRIMARY KEY (symbol, period_end, period_type)
            );

            CREATE TABLE IF NOT EXISTS analyses (
                symbol TEXT NOT NULL,
                period_end TEXT NOT NULL,
                analyzed_on TEXT NOT NULL,
                stock_price REAL NOT NULL,
                market_cap REAL NOT NULL,
                final_label TEXT NOT NULL,
                data_json TEXT NOT NULL,
                PRIMARY KEY (symbol, period_end)
            );

            CREATE INDEX IF NOT EXISTS idx_analyses_symbol_analyzed_on
            ON analyses(symbol, analyzed_on);

            CREATE TABLE IF NOT EXISTS portfolio_items (
                portfolio TEXT NOT NULL,
                symbol TEXT NOT NULL,
                quantity REAL NOT NULL,
                average_price REAL NOT NULL,
                PRIMARY KEY (portfolio, symbol)
            );

            CREATE TABLE IF NOT EXISTS fetch_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                status TEXT NOT NULL,
                message TEXT,
                started_at TEXT NOT NULL,
                finished_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_fetch_logs_symbol
            ON fetch_logs(symbol);",
        )
        .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        debug!("SQLite store schema initialized");
        Ok(())
    }
}

/// Parse an RFC 3339 timestamp column.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DiagnosisError::Parse(format!("Invalid timestamp {s}: {e}")))
}

/// Raw fetch log row before parsing.
type FetchLogRow = (i64, String, String, Option<String>, String, Option<String>);

fn fetch_log_row(row: &Row<'_>) -> rusqlite::Result<FetchLogRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn parse_fetch_log(row: FetchLogRow) -> Result<FetchLog> {
    let (id, symbol, status, message, started_at, finished_at) = row;
    Ok(FetchLog {
        id,
        symbol: Symbol::new(symbol),
        status: status.parse()?,
        message,
        started_at: parse_timestamp(&started_at)?,
        finished_at: finished_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

#[async_trait]
impl AnalysisStore for SqliteStore {
    #[instrument(skip(self, info), fields(symbol = %info.symbol))]
    async fn put_stock(&self, info: &CompanyInfo) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO stocks
             (symbol, name, market, sector, description, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                info.symbol.as_str(),
                info.name,
                info.market,
                info.sector,
                info.description,
                updated_at
            ],
        )
        .map_err(|e| DiagnosisError::Store(e.to_string()))?;
        debug!("Stored stock");
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn get_stock(&self, symbol: &Symbol) -> Result<Option<CompanyInfo>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT name, market, sector, description FROM stocks WHERE symbol = ?1",
            params![symbol.as_str()],
            |row| {
                Ok(CompanyInfo {
                    symbol: symbol.clone(),
                    name: row.get(0)?,
                    market: row.get(1)?,
                    sector: row.get(2)?,
                    description: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(|e| DiagnosisError::Store(e.to_string()))
    }

    async fn list_symbols(&self) -> Result<Vec<Symbol>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT symbol FROM stocks ORDER BY symbol ASC")
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        rows.map(|row| {
            row.map(Symbol::new)
                .map_err(|e| DiagnosisError::Store(e.to_string()))
        })
        .collect()
    }

    #[instrument(skip(self, statements), fields(count = statements.len()))]
    async fn put_financials(&self, statements: &[FinancialStatement]) -> Result<()> {
        let stored_at = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        for stmt in statements {
            let data_json =
                serde_json::to_string(stmt).map_err(|e| DiagnosisError::Parse(e.to_string()))?;
            tx.execute(
                "INSERT OR REPLACE INTO financials
                 (symbol, period_end, period_type, fiscal_year, fiscal_quarter, data_json, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    stmt.symbol.as_str(),
                    stmt.period_end.to_string(),
                    stmt.period_type.code(),
                    stmt.fiscal_year,
                    stmt.fiscal_quarter,
                    data_json,
                    stored_at
                ],
            )
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;
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
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT data_json FROM financials
                 WHERE symbol = ?1 AND period_type = ?2
                 ORDER BY period_end DESC
                 LIMIT ?3",
            )
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(
                params![symbol.as_str(), period_type.code(), limit],
                |row| row.get::<_, String>(0),
            )
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        let mut statements = Vec::new();
        for row in rows {
            let json = row.map_err(|e| DiagnosisError::Store(e.to_string()))?;
            let statement: FinancialStatement =
                serde_json::from_str(&json).map_err(|e| DiagnosisError::Parse(e.to_string()))?;
            statements.push(statement);
        }

        debug!("Found {} stored statements", statements.len());
        Ok(statements)
    }

    #[instrument(skip(self, record), fields(symbol = %record.symbol, period_end = %record.period_end))]
    async fn put_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        let data_json =
            serde_json::to_string(record).map_err(|e| DiagnosisError::Parse(e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO analyses
             (symbol, period_end, analyzed_on, stock_price, market_cap, final_label, data_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.symbol.as_str(),
                record.period_end.to_string(),
                record.analyzed_on.to_string(),
                record.stock_price,
                record.market_cap,
                record.diagnosis.verdict.final_label.as_str(),
                data_json
            ],
        )
        .map_err(|e| DiagnosisError::Store(e.to_string()))?;
        debug!("Stored analysis");
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn latest_analysis(&self, symbol: &Symbol) -> Result<Option<AnalysisRecord>> {
        let conn = self.lock()?;
        let json = conn
            .query_row(
                "SELECT data_json FROM analyses
                 WHERE symbol = ?1
                 ORDER BY analyzed_on DESC, period_end DESC
                 LIMIT 1",
                params![symbol.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        json.map(|json| {
            serde_json::from_str(&json).map_err(|e| DiagnosisError::Parse(e.to_string()))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(symbol = %symbol, period_end = %period_end))]
    async fn analysis_before(
        &self,
        symbol: &Symbol,
        period_end: NaiveDate,
    ) -> Result<Option<AnalysisRecord>> {
        let conn = self.lock()?;
        // ISO dates compare correctly as text
        let json = conn
            .query_row(
                "SELECT data_json FROM analyses
                 WHERE symbol = ?1 AND period_end < ?2
                 ORDER BY period_end DESC
                 LIMIT 1",
                params![symbol.as_str(), period_end.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        json.map(|json| {
            serde_json::from_str(&json).map_err(|e| DiagnosisError::Parse(e.to_string()))
        })
        .transpose()
    }

    #[instrument(skip(self, item), fields(portfolio = %portfolio, symbol = %item.symbol))]
    async fn put_portfolio_item(&self, portfolio: &str, item: &PortfolioItem) -> Result<()> {
        let conn = self.lock()?;
        // Update in place so the position keeps its original order
        conn.execute(
            "INSERT INTO portfolio_items (portfolio, symbol, quantity, average_price)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(portfolio, symbol)
             DO UPDATE SET quantity = excluded.quantity, average_price = excluded.average_price",
            params![portfolio, item.symbol.as_str(), item.quantity, item.average_price],
        )
        .map_err(|e| DiagnosisError::Store(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self), fields(portfolio = %portfolio))]
    async fn portfolio_items(&self, portfolio: &str) -> Result<Vec<PortfolioItem>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, quantity, average_price FROM portfolio_items
                 WHERE portfolio = ?1
                 ORDER BY rowid ASC",
            )
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![portfolio], |row| {
                Ok(PortfolioItem::new(
                    row.get::<_, String>(0)?,
                    row.get(1)?,
                    row.get(2)?,
                ))
            })
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        rows.map(|row| row.map_err(|e| DiagnosisError::Store(e.to_string())))
            .collect()
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn start_fetch(&self, symbol: &Symbol) -> Result<i64> {
        let started_at = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO fetch_logs (symbol, status, started_at) VALUES (?1, ?2, ?3)",
            params![symbol.as_str(), FetchStatus::Fetching.as_str(), started_at],
        )
        .map_err(|e| DiagnosisError::Store(e.to_string()))?;
        let id = conn.last_insert_rowid();
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

        let finished_at = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE fetch_logs SET status = ?1, message = ?2, finished_at = ?3
                 WHERE id = ?4 AND status = ?5",
                params![
                    status.as_str(),
                    message,
                    finished_at,
                    id,
                    FetchStatus::Fetching.as_str()
                ],
            )
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        if updated == 0 {
            let current = conn
                .query_row(
                    "SELECT status FROM fetch_logs WHERE id = ?1",
                    params![id],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|e| DiagnosisError::Store(e.to_string()))?;
            return Err(DiagnosisError::InvalidParameter(match current {
                Some(current) => format!("Fetch log {id} already finished as {current}"),
                None => format!("Unknown fetch log {id}"),
            }));
        }

        debug!(status = status.as_str(), "Fetch finished");
        Ok(())
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    async fn fetch_logs(&self, symbol: &Symbol) -> Result<Vec<FetchLog>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, symbol, status, message, started_at, finished_at
                 FROM fetch_logs WHERE symbol = ?1 ORDER BY id ASC",
            )
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![symbol.as_str()], fetch_log_row)
            .map_err(|e| DiagnosisError::Store(e.to_string()))?;

        let mut logs = Vec::new();
        for row in rows {
            let row = row.map_err(|e| DiagnosisError::Store(e.to_string()))?;
            logs.push(parse_fetch_log(row)?);
        }
        Ok(logs)
    }
}
