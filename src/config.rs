// =============================================================================
// Scan Configuration — symbols, period and batch knobs with atomic save
// =============================================================================
//
// Loaded from `scan_config.json`.  Every field carries a serde default so a
// partial (or empty) file is valid.  A few fields can be overridden from the
// environment (after `.env` is loaded):
//
//   SCAN_SYMBOLS     comma-separated list, e.g. "AAPL,MSFT"
//   SCAN_PERIOD      1d 5d 1mo 3mo 6mo 1y 2y 5y 10y ytd max
//   SCAN_OUTPUT_DIR  export directory
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batch::RetryPolicy;
use crate::report::DEFAULT_TOP_N;
use crate::signals::MissingValuePolicy;
use crate::types::Period;

pub const DEFAULT_CONFIG_PATH: &str = "scan_config.json";

fn default_true() -> bool {
    true
}

fn default_symbols() -> Vec<String> {
    ["AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA", "JPM", "V", "WMT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_concurrency() -> usize {
    1
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    #[serde(default)]
    pub period: Period,

    /// Directory for every exported file; created on first write.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// Minimum spacing between provider requests.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Symbols analysed at the same time.  1 keeps the run serial.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Length of each ranking table.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub missing_value_policy: MissingValuePolicy,

    /// Write `<SYM>_technical_data.csv` and `<SYM>_analysis_summary.csv`.
    #[serde(default = "default_true")]
    pub export_per_symbol: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            period: Period::default(),
            output_dir: default_output_dir(),
            retry: RetryPolicy::default(),
            request_delay_ms: default_request_delay_ms(),
            concurrency: default_concurrency(),
            top_n: default_top_n(),
            missing_value_policy: MissingValuePolicy::default(),
            export_per_symbol: true,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error; the caller decides whether to fall back.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scan config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scan config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = config.symbols.len(),
            period = %config.period,
            "scan config loaded"
        );

        Ok(config)
    }

    /// Persist to `path` atomically (write `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise scan config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "scan config saved (atomic)");
        Ok(())
    }

    /// Apply `SCAN_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = get("SCAN_SYMBOLS") {
            let symbols: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            info!(count = symbols.len(), "symbols overridden from SCAN_SYMBOLS");
            self.symbols = symbols;
        }

        if let Some(raw) = get("SCAN_PERIOD") {
            self.period = raw.parse::<Period>().context("invalid SCAN_PERIOD")?;
            info!(period = %self.period, "period overridden from SCAN_PERIOD");
        }

        if let Some(raw) = get("SCAN_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(raw.trim());
            info!(dir = %self.output_dir.display(), "output dir overridden from SCAN_OUTPUT_DIR");
        }

        Ok(())
    }
}
