// =============================================================================
// Average True Range (ATR) — simple rolling mean
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// The first bar has no previous close, so its TR is just H - L.
// ATR is the simple `period`-bar rolling mean of TR.
//
// Default period: 14
// =============================================================================

use super::rolling::rolling_mean;
use crate::types::PriceBar;

/// True range for every bar, aligned with `bars`.
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let hl = bar.high - bar.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev_close) => {
                    let hc = (bar.high - prev_close).abs();
                    let lc = (bar.low - prev_close).abs();
                    hl.max(hc).max(lc)
                }
                None => hl,
            }
        })
        .collect()
}

/// ATR series aligned with `bars`; the first `period - 1` positions are NaN.
pub fn calculate_atr(bars: &[PriceBar], period: usize) -> Vec<f64> {
    rolling_mean(&true_range(bars), period)
}

/// ATR expressed as a percentage of `close`; NaN when either is undefined.
pub fn atr_pct(atr: f64, close: f64) -> f64 {
    super::rolling::ratio(atr, close) * 100.0
}
