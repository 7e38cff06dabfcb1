//! Concurrent fetch-and-analyze over many symbols.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use diagnosis_core::{AnalysisRecord, FetchStatus, Result, Symbol};

use crate::analyzer::Analyzer;

/// Worker pool and retry settings for batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Symbols processed concurrently (default: 4).
    pub workers: usize,
    /// Retries after the first attempt for retryable errors (default: 2).
    pub max_retries: u32,
    /// Fixed delay between attempts (default: 1s).
    pub retry_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl BatchConfig {
    /// Set the number of workers.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Symbols analyzed successfully, sorted.
    pub succeeded: Vec<Symbol>,
    /// Failed symbols with their last error, sorted by symbol.
    pub failed: Vec<(Symbol, String)>,
}

impl BatchSummary {
    /// Number of symbols processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

impl Analyzer {
    /// Analyze many symbols on a fixed-size worker pool.
    ///
    /// Each symbol gets a fetch log that moves from `FETCHING` to `SUCCESS`
    /// or `FAILURE`. Network and rate-limit errors are retried after a fixed
    /// delay; other errors fail the symbol immediately. One symbol failing
    /// never stops the batch.
    #[instrument(skip(self, symbols, config), fields(count = symbols.len(), workers = config.workers))]
    pub async fn analyze_batch(&self, symbols: &[Symbol], config: &BatchConfig) -> BatchSummary {
        let total = symbols.len();
        let mut results = stream::iter(symbols.iter().cloned())
            .map(|symbol| async move {
                let result = self.process_logged(&symbol, config).await;
                (symbol, result)
            })
            .buffer_unordered(config.workers.max(1));

        let mut summary = BatchSummary::default();
        let mut processed = 0;
        while let Some((symbol, result)) = results.next().await {
            processed += 1;
            match result {
                Ok(record) => {
                    info!(
                        symbol = %symbol,
                        label = %record.diagnosis.verdict.final_label,
                        "{}/{} analyzed",
                        processed,
                        total
                    );
                    summary.succeeded.push(symbol);
                }
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "{}/{} failed", processed, total);
                    summary.failed.push((symbol, e.to_string()));
                }
            }
        }

        summary.succeeded.sort();
        summary.failed.sort_by(|a, b| a.0.cmp(&b.0));
        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "Batch completed"
        );
        summary
    }

    /// Analyze every stock known to the store.
    ///
    /// # Errors
    /// Returns an error if the symbol list cannot be read.
    pub async fn analyze_all(&self, config: &BatchConfig) -> Result<BatchSummary> {
        let symbols = self.store().list_symbols().await?;
        Ok(self.analyze_batch(&symbols, config).await)
    }

    /// One symbol wrapped in its fetch log.
    async fn process_logged(&self, symbol: &Symbol, config: &BatchConfig) -> Result<AnalysisRecord> {
        let log_id = self.store().start_fetch(symbol).await?;
        let result = self.process_with_retry(symbol, config).await;

        let (status, message) = match &result {
            Ok(_) => (FetchStatus::Success, None),
            Err(e) => (FetchStatus::Failure, Some(e.to_string())),
        };
        if let Err(e) = self.store().finish_fetch(log_id, status, message).await {
            warn!(symbol = %symbol, error = %e, "Failed to close fetch log");
        }
        result
    }

    async fn process_with_retry(
        &self,
        symbol: &Symbol,
        config: &BatchConfig,
    ) -> Result<AnalysisRecord> {
        let mut attempt = 0;
        loop {
            match self.analyze_symbol(symbol).await {
                Err(e) if e.is_retryable() && attempt < config.max_retries => {
                    attempt += 1;
                    warn!(
                        symbol = %symbol,
                        error = %e,
                        attempt,
                        "Retryable error, retrying"
                    );
                    sleep(config.retry_delay).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::tests::{FixtureProvider, analyzer};
    use diagnosis_core::AnalysisStore;
    use std::sync::atomic::Ordering;

    fn fast() -> BatchConfig {
        BatchConfig::default()
            .with_workers(2)
            .with_retries(2, Duration::from_millis(1))
    }

    #[test]
    fn test_batch_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_retries, 2);
    }

    #[tokio::test]
    async fn test_batch_mixed_results() {
        let (analyzer, store) = analyzer(
            FixtureProvider::default()
                .with_company("7203", "Machinery", true)
                .with_company("6758", "Electric Appliances", true),
        );
        let symbols = vec![Symbol::new("7203"), Symbol::new("0000"), Symbol::new("6758")];

        let summary = analyzer.analyze_batch(&symbols, &fast()).await;
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.succeeded, vec![Symbol::new("6758"), Symbol::new("7203")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, Symbol::new("0000"));

        let logs = store.fetch_logs(&Symbol::new("7203")).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, FetchStatus::Success);

        let logs = store.fetch_logs(&Symbol::new("0000")).await.unwrap();
        assert_eq!(logs[0].status, FetchStatus::Failure);
        assert!(logs[0].message.is_some());
    }

    #[tokio::test]
    async fn test_batch_retries_network_errors() {
        let provider = FixtureProvider::default()
            .with_company("7203", "Machinery", true)
            .with_failures("7203", 2);
        let (analyzer, _store) = analyzer(provider);

        let summary = analyzer.analyze_batch(&[Symbol::new("7203")], &fast()).await;
        assert_eq!(summary.succeeded, vec![Symbol::new("7203")]);
    }

    #[tokio::test]
    async fn test_batch_gives_up_after_max_retries() {
        let provider = FixtureProvider::default()
            .with_company("7203", "Machinery", true)
            .with_failures("7203", 5);
        let provider = std::sync::Arc::new(provider);
        let store = std::sync::Arc::new(diagnosis_store::InMemoryStore::new());
        let analyzer = Analyzer::new(provider.clone(), store.clone());

        let summary = analyzer.analyze_batch(&[Symbol::new("7203")], &fast()).await;
        assert!(summary.succeeded.is_empty());
        assert!(summary.failed[0].1.contains("Network error"));
        // First attempt plus two retries
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

        let logs = store.fetch_logs(&Symbol::new("7203")).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, FetchStatus::Failure);
    }

    #[tokio::test]
    async fn test_analyze_all_uses_stored_universe() {
        let (analyzer, _store) = analyzer(
            FixtureProvider::default()
                .with_company("7203", "Machinery", true)
                .with_company("6758", "Electric Appliances", true),
        );
        analyzer.sync_universe().await.unwrap();

        let summary = analyzer.analyze_all(&fast()).await.unwrap();
        assert_eq!(summary.succeeded.len(), 2);
        assert!(summary.failed.is_empty());
    }
}
