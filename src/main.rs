// =============================================================================
// Equity Scan — Main Entry Point
// =============================================================================
//
// Runs one batch: load config, fetch and analyse every symbol, export the
// per-symbol files and the stamped report tables, then log the rankings.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod batch;
mod config;
mod export;
mod indicators;
mod provider;
mod report;
mod returns;
mod signals;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::AnalysisResult;
use crate::batch::BatchRunner;
use crate::config::{ScanConfig, DEFAULT_CONFIG_PATH};
use crate::export::{export_stamp, read_summary, Exporter};
use crate::provider::{DataProvider, RateLimiter, YahooProvider};
use crate::report::Report;

/// Company names for the top Buy-class symbols, logged with the rankings.
async fn log_top_buys(runner: &BatchRunner, report: &Report) {
    for entry in &report.rankings.top_buy {
        match runner.company_info(&entry.symbol).await {
            Ok(info) => {
                let name = info
                    .get("longName")
                    .and_then(|v| v.as_str())
                    .unwrap_or("N/A");
                let sector = info.get("sector").and_then(|v| v.as_str()).unwrap_or("N/A");
                info!(
                    symbol = %entry.symbol,
                    name,
                    sector,
                    recommendation = %entry.recommendation,
                    confidence = %format!("{:.1}", entry.confidence),
                    "top buy"
                );
            }
            Err(failed) => warn!(
                symbol = %entry.symbol,
                attempts = failed.attempts,
                reason = %failed.reason,
                "company info unavailable"
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Equity Scan — Technical Analysis Batch           ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = ScanConfig::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let defaults = ScanConfig::default();
        if !std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
            if let Err(e) = defaults.save(DEFAULT_CONFIG_PATH) {
                warn!(error = %e, "Failed to write default config");
            }
        }
        defaults
    });
    config.apply_env()?;

    if config.symbols.is_empty() {
        warn!("No symbols configured, nothing to do");
        return Ok(());
    }

    info!(
        symbols = ?config.symbols,
        period = %config.period,
        output_dir = %config.output_dir.display(),
        "Configured scan"
    );

    // ── 2. Provider & runner ─────────────────────────────────────────────
    let provider: Arc<dyn DataProvider> =
        Arc::new(YahooProvider::new().context("failed to create Yahoo provider")?);

    let runner = BatchRunner::new(provider)
        .with_limiter(RateLimiter::from_millis(config.request_delay_ms))
        .with_retry(config.retry)
        .with_policy(config.missing_value_policy)
        .with_concurrency(config.concurrency);

    // ── 3. Run ───────────────────────────────────────────────────────────
    let outcome = runner.run(&config.symbols, config.period).await;

    for failed in &outcome.failed {
        error!(
            symbol = %failed.symbol,
            attempts = failed.attempts,
            reason = %failed.reason,
            "Symbol failed"
        );
    }

    if outcome.results.is_empty() {
        warn!(run_id = %outcome.run_id, "No symbol could be analysed, skipping report");
        return Ok(());
    }

    // ── 4. Export ────────────────────────────────────────────────────────
    let exporter = Exporter::new(&config.output_dir);

    if config.export_per_symbol {
        for analyzed in &outcome.results {
            if let Err(e) = exporter.write_symbol(analyzed) {
                error!(symbol = %analyzed.result.symbol, error = %e, "Per-symbol export failed");
            }
        }
    }

    let now = chrono::Local::now();
    let results: Vec<AnalysisResult> = outcome.results.iter().map(|a| a.result.clone()).collect();
    let report = Report::build(&results, config.top_n, now.date_naive());
    let files = exporter
        .write_report(&report, &export_stamp(now))
        .context("failed to write batch report")?;
    let written = read_summary(&files.summary).context("failed to read back summary table")?;
    info!(
        rows = written.len(),
        summary = %files.summary.display(),
        signals = %files.signals.display(),
        technical = %files.technical.display(),
        rankings = %files.rankings.display(),
        "Report tables written"
    );

    // ── 5. Summary ───────────────────────────────────────────────────────
    for (i, ranked) in report.rankings.highest_rsi.iter().enumerate() {
        info!(rank = i + 1, symbol = %ranked.symbol, rsi = %format!("{:.2}", ranked.value), "Highest RSI");
    }
    log_top_buys(&runner, &report).await;
    for entry in &report.rankings.top_sell {
        info!(
            symbol = %entry.symbol,
            recommendation = %entry.recommendation,
            confidence = %format!("{:.1}", entry.confidence),
            "top sell"
        );
    }

    info!(
        run_id = %outcome.run_id,
        analysed = outcome.results.len(),
        failed = outcome.failed.len(),
        elapsed_s = outcome.elapsed.as_secs(),
        "Scan complete"
    );

    Ok(())
}
