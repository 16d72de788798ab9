// =============================================================================
// Symbol Analyzer — indicators -> signals -> recommendation for one symbol
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::indicators::bollinger::percent_b;
use crate::indicators::rolling::last_defined;
use crate::indicators::IndicatorSet;
use crate::signals::{classify, score, MissingValuePolicy, ScoredRecommendation, SignalError, SignalSet};
use crate::types::PriceSeries;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no price history for {symbol}")]
    EmptySeries { symbol: String },
    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// Finished per-symbol result.  Latest indicator values are `None` when the
/// series was too short to define them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub last_price: f64,
    pub last_volume: u64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub stochastic_k: Option<f64>,
    pub mfi: Option<f64>,
    pub atr: Option<f64>,
    pub roc: Option<f64>,
    pub bollinger_pct_b: Option<f64>,
    pub technical_strength: Option<f64>,
    pub signals: SignalSet,
    pub recommendation: ScoredRecommendation,
}

/// Result together with the data it was derived from, kept for export.
#[derive(Debug, Clone)]
pub struct AnalyzedSymbol {
    pub result: AnalysisResult,
    pub series: PriceSeries,
    pub indicators: IndicatorSet,
}

pub fn analyze(
    symbol: &str,
    series: PriceSeries,
    policy: MissingValuePolicy,
) -> Result<AnalyzedSymbol, AnalysisError> {
    let last = series
        .last()
        .cloned()
        .ok_or_else(|| AnalysisError::EmptySeries {
            symbol: symbol.to_string(),
        })?;

    let indicators = IndicatorSet::compute(&series);
    let signals = classify(&series, &indicators, policy)?;
    let missing = signals.missing();
    if !missing.is_empty() {
        debug!(symbol, ?missing, "signals left unknown");
    }

    let rsi = last_defined(&indicators.rsi);
    let recommendation = score(&signals, rsi.unwrap_or(f64::NAN));
    if recommendation.degraded {
        warn!(symbol, reason = %recommendation.reasoning_text(), "degraded recommendation");
    }

    let pct_b = match (last_defined(&indicators.bb_upper), last_defined(&indicators.bb_lower)) {
        (Some(upper), Some(lower)) => Some(percent_b(last.close, upper, lower)).filter(|v| v.is_finite()),
        _ => None,
    };

    let result = AnalysisResult {
        symbol: symbol.to_string(),
        as_of: last.date,
        last_price: last.close,
        last_volume: last.volume,
        rsi,
        macd: last_defined(&indicators.macd),
        stochastic_k: last_defined(&indicators.stochastic_k),
        mfi: last_defined(&indicators.mfi),
        atr: last_defined(&indicators.atr),
        roc: last_defined(&indicators.roc),
        bollinger_pct_b: pct_b,
        technical_strength: signals.technical_strength(),
        signals,
        recommendation,
    };

    debug!(
        symbol,
        label = %result.recommendation.label,
        confidence = result.recommendation.confidence,
        "symbol analysed"
    );

    Ok(AnalyzedSymbol {
        result,
        series,
        indicators,
    })
}
