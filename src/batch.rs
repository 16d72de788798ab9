// =============================================================================
// Batch Runner — fetch, analyse and collect a list of symbols
// =============================================================================
//
// Per symbol:
//   1. wait for a request slot (RateLimiter)
//   2. fetch history; on a retryable error sleep `backoff` and try again, up
//      to `max_attempts` in total.  NotFound fails immediately.
//   3. run the analysis pipeline
//
// One symbol failing never stops the batch; it is recorded in `failed`.
// Company-info lookups go through the same limiter and retry loop.
// =============================================================================

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::{analyze, AnalyzedSymbol};
use crate::provider::{CompanyInfo, DataProvider, ProviderError, RateLimiter};
use crate::returns::format_compact;
use crate::signals::MissingValuePolicy;
use crate::types::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 2000,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSymbol {
    pub symbol: String,
    pub attempts: u32,
    pub reason: String,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    /// Sorted by symbol.
    pub results: Vec<AnalyzedSymbol>,
    /// Sorted by symbol.
    pub failed: Vec<FailedSymbol>,
    pub elapsed: Duration,
}

pub struct BatchRunner {
    provider: Arc<dyn DataProvider>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    policy: MissingValuePolicy,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self {
            provider,
            limiter: RateLimiter::default(),
            retry: RetryPolicy::default(),
            policy: MissingValuePolicy::default(),
            concurrency: 1,
        }
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self, symbols: &[String], period: Period) -> BatchOutcome {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let total = symbols.len();
        info!(%run_id, total, %period, concurrency = self.concurrency, "batch started");

        let done = AtomicUsize::new(0);
        let done = &done;

        let outcomes: Vec<Result<AnalyzedSymbol, FailedSymbol>> = stream::iter(symbols)
            .map(|symbol| async move {
                let outcome = self.process(symbol, period).await;
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                let per_symbol = started.elapsed().as_secs_f64() / finished as f64;
                let remaining_min = per_symbol * (total - finished) as f64 / 60.0;
                info!(
                    %run_id,
                    symbol = %symbol,
                    progress = %format!("{finished}/{total}"),
                    eta_min = %format!("{remaining_min:.1}"),
                    ok = outcome.is_ok(),
                    "symbol processed"
                );
                outcome
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut results = Vec::new();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(analyzed) => results.push(analyzed),
                Err(failure) => failed.push(failure),
            }
        }
        results.sort_by(|a, b| a.result.symbol.cmp(&b.result.symbol));
        failed.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let elapsed = started.elapsed();
        let limits = self.limiter.snapshot();
        info!(
            %run_id,
            analysed = results.len(),
            failed = failed.len(),
            requests = limits.requests,
            delayed = limits.delayed,
            elapsed_s = elapsed.as_secs(),
            "batch finished"
        );

        BatchOutcome {
            run_id,
            results,
            failed,
            elapsed,
        }
    }

    /// Fundamentals for `symbol`, spaced and retried like history requests.
    pub async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, FailedSymbol> {
        self.fetch_with_retry(symbol, "company info", || self.provider.fetch_company_info(symbol))
            .await
            .map(|(info, _)| info)
    }

    /// Run `request` under the limiter until it succeeds, fails permanently
    /// or runs out of attempts.  Returns the value and the attempts used.
    async fn fetch_with_retry<T, F, Fut>(
        &self,
        symbol: &str,
        what: &str,
        mut request: F,
    ) -> Result<(T, u32), FailedSymbol>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.retry.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.limiter.acquire().await;
            match request().await {
                Ok(value) => return Ok((value, attempt)),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        symbol,
                        what,
                        attempt,
                        max_attempts,
                        error = %e,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(self.retry.backoff()).await;
                }
                Err(e) => {
                    error!(symbol, what, attempts = attempt, error = %e, "fetch failed");
                    return Err(FailedSymbol {
                        symbol: symbol.to_string(),
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn process(&self, symbol: &str, period: Period) -> Result<AnalyzedSymbol, FailedSymbol> {
        let (series, attempt) = self
            .fetch_with_retry(symbol, "history", || self.provider.fetch_history(symbol, period))
            .await?;

        match analyze(symbol, series, self.policy) {
            Ok(analyzed) => {
                let r = &analyzed.result;
                info!(
                    symbol,
                    price = %format!("{:.2}", r.last_price),
                    volume = %format_compact(r.last_volume as f64),
                    recommendation = %r.recommendation.label,
                    confidence = %format!("{:.1}", r.recommendation.confidence),
                    "analysis complete"
                );
                Ok(analyzed)
            }
            Err(e) => {
                error!(symbol, error = %e, "analysis failed");
                Err(FailedSymbol {
                    symbol: symbol.to_string(),
                    attempts: attempt,
                    reason: e.to_string(),
                })
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::series_from_closes;
    use crate::types::PriceSeries;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};

    /// Replays scripted responses per symbol; once a script runs out the
    /// last response repeats.
    #[derive(Default)]
    struct MockProvider {
        scripts: Mutex<HashMap<String, VecDeque<Result<PriceSeries, ProviderError>>>>,
        calls: Mutex<HashMap<String, u32>>,
        /// Transport errors returned before company info succeeds.
        info_failures: Mutex<u32>,
        info_calls: Mutex<u32>,
    }

    impl MockProvider {
        fn script(self, symbol: &str, responses: Vec<Result<PriceSeries, ProviderError>>) -> Self {
            self.scripts.lock().insert(symbol.to_string(), responses.into());
            self
        }

        fn failing_info(self, failures: u32) -> Self {
            *self.info_failures.lock() = failures;
            self
        }

        fn calls(&self, symbol: &str) -> u32 {
            self.calls.lock().get(symbol).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl DataProvider for MockProvider {
        async fn fetch_history(&self, symbol: &str, _period: Period) -> Result<PriceSeries, ProviderError> {
            *self.calls.lock().entry(symbol.to_string()).or_default() += 1;
            let mut scripts = self.scripts.lock();
            let script = scripts.get_mut(symbol).ok_or_else(|| ProviderError::NotFound {
                symbol: symbol.to_string(),
            })?;
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }

        async fn fetch_company_info(&self, symbol: &str) -> Result<CompanyInfo, ProviderError> {
            *self.info_calls.lock() += 1;
            let mut failures = self.info_failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(transport());
            }
            Ok(CompanyInfo {
                symbol: symbol.to_string(),
                fields: Vec::new(),
            })
        }
    }

    fn year() -> PriceSeries {
        let closes: Vec<f64> = (0..252)
            .map(|i| 100.0 + i as f64 * 0.1 + (i as f64 * 0.4).sin() * 2.0)
            .collect();
        series_from_closes(&closes)
    }

    fn transport() -> ProviderError {
        ProviderError::Transport("connection reset".into())
    }

    fn runner(provider: Arc<MockProvider>) -> BatchRunner {
        BatchRunner::new(provider)
            .with_limiter(RateLimiter::from_millis(0))
            .with_retry(RetryPolicy {
                max_attempts: 3,
                backoff_ms: 0,
            })
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn results_are_sorted_by_symbol() {
        let provider = Arc::new(
            MockProvider::default()
                .script("MSFT", vec![Ok(year())])
                .script("AAPL", vec![Ok(year())]),
        );
        let outcome = runner(provider).run(&symbols(&["MSFT", "AAPL"]), Period::OneYear).await;
        let names: Vec<&str> = outcome.results.iter().map(|r| r.result.symbol.as_str()).collect();
        assert_eq!(names, vec!["AAPL", "MSFT"]);
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn transient_error_is_retried() {
        let provider = Arc::new(MockProvider::default().script("NVDA", vec![Err(transport()), Ok(year())]));
        let outcome = runner(provider.clone()).run(&symbols(&["NVDA"]), Period::OneYear).await;
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(provider.calls("NVDA"), 2);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let provider = Arc::new(MockProvider::default());
        let outcome = runner(provider.clone()).run(&symbols(&["NOPE"]), Period::OneYear).await;
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].attempts, 1);
        assert_eq!(provider.calls("NOPE"), 1);
    }

    #[tokio::test]
    async fn persistent_error_uses_every_attempt() {
        let provider = Arc::new(MockProvider::default().script("TSLA", vec![Err(transport())]));
        let outcome = runner(provider.clone())
            .run(&symbols(&["TSLA", "WMT"]), Period::SixMonths)
            .await;
        assert_eq!(outcome.failed.len(), 2);
        let tsla = &outcome.failed[0];
        assert_eq!(tsla.symbol, "TSLA");
        assert_eq!(tsla.attempts, 3);
        assert!(tsla.reason.contains("connection reset"));
        assert_eq!(provider.calls("TSLA"), 3);
    }

    #[tokio::test]
    async fn strict_policy_fails_short_history() {
        let short = series_from_closes(&(0..60).map(|i| 50.0 + (i as f64).sin()).collect::<Vec<_>>());
        let provider = Arc::new(MockProvider::default().script("V", vec![Ok(short)]));
        let outcome = runner(provider.clone())
            .with_policy(MissingValuePolicy::Strict)
            .run(&symbols(&["V"]), Period::ThreeMonths)
            .await;
        assert_eq!(outcome.failed.len(), 1);
        assert!(outcome.failed[0].reason.contains("Long_Term_Trend"));
        assert_eq!(provider.calls("V"), 1);
    }

    #[tokio::test]
    async fn concurrency_does_not_change_outcome() {
        let list = ["A", "B", "C", "D", "E"];
        let mut provider = MockProvider::default();
        for s in list {
            provider = provider.script(s, vec![Ok(year())]);
        }
        let outcome = runner(Arc::new(provider))
            .with_concurrency(4)
            .run(&symbols(&list), Period::OneYear)
            .await;
        let names: Vec<&str> = outcome.results.iter().map(|r| r.result.symbol.as_str()).collect();
        assert_eq!(names, list.to_vec());
    }

    #[tokio::test]
    async fn company_info_goes_through_limiter() {
        let provider = Arc::new(MockProvider::default());
        let batch = runner(provider.clone());
        for symbol in ["JPM", "V", "WMT"] {
            let info = batch.company_info(symbol).await.unwrap();
            assert_eq!(info.symbol, symbol);
        }
        assert_eq!(batch.limiter.snapshot().requests, 3);
        assert_eq!(*provider.info_calls.lock(), 3);
    }

    #[tokio::test]
    async fn company_info_is_spaced() {
        let provider = Arc::new(MockProvider::default());
        let runner = BatchRunner::new(provider).with_limiter(RateLimiter::from_millis(40));
        let start = std::time::Instant::now();
        runner.company_info("JPM").await.unwrap();
        runner.company_info("V").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(runner.limiter.snapshot().delayed, 1);
    }

    #[tokio::test]
    async fn company_info_is_retried() {
        let provider = Arc::new(MockProvider::default().failing_info(2));
        let batch = runner(provider.clone());
        let info = batch.company_info("KO").await.unwrap();
        assert_eq!(info.symbol, "KO");
        assert_eq!(*provider.info_calls.lock(), 3);
        assert_eq!(batch.limiter.snapshot().requests, 3);

        let provider = Arc::new(MockProvider::default().failing_info(5));
        let failed = runner(provider).company_info("KO").await.unwrap_err();
        assert_eq!(failed.attempts, 3);
        assert!(failed.reason.contains("connection reset"));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let retry = RetryPolicy {
            max_attempts: 0,
            backoff_ms: 10,
        };
        assert_eq!(retry.attempts(), 1);
        assert_eq!(retry.backoff(), Duration::from_millis(10));
    }
}
