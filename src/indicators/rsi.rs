// =============================================================================
// Relative Strength Index (RSI) — simple rolling averages
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.  The first
//          bar has no delta and contributes a zero gain and a zero loss.
// Step 2 — avg_gain / avg_loss = simple rolling mean over `period` bars
//          (no Wilder smoothing).
// Step 3 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// A zero average loss leaves RS undefined and the bar is NaN, including the
// flat-market case where both averages are zero.
// =============================================================================

use super::rolling::{diff, rolling_mean, strength_index};

/// Compute the full RSI series for the given `closes` and `period`.
///
/// The output is aligned with `closes`; the first `period - 1` positions are
/// NaN.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let deltas = diff(closes);

    // NaN deltas (the first bar) fall through both comparisons and count as 0.
    let gains: Vec<f64> = deltas.iter().map(|&d| if d > 0.0 { d } else { 0.0 }).collect();
    let losses: Vec<f64> = deltas.iter().map(|&d| if d < 0.0 { -d } else { 0.0 }).collect();

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| strength_index(g, l))
        .collect()
}
