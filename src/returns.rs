// =============================================================================
// Returns & volatility
// =============================================================================
//
//   daily      r_t = close_t / close_{t-1} - 1              (NaN at t = 0)
//   cumulative g_t = prod(1 + r_1 .. r_t) = close_t / close_0 (growth factor)
//   volatility v_t = sample_std(r, window) * sqrt(252)
//
// Cumulative is a growth factor (1.0 = flat) and shares the NaN on bar 0.

use crate::indicators::rolling::{ratio, rolling_std};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const VOLATILITY_WINDOW: usize = 30;

pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    for i in 1..closes.len() {
        out[i] = ratio(closes[i], closes[i - 1]) - 1.0;
    }
    out
}

pub fn cumulative_returns(daily: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    daily
        .iter()
        .map(|r| {
            if r.is_finite() {
                growth *= 1.0 + r;
                growth
            } else {
                f64::NAN
            }
        })
        .collect()
}

pub fn rolling_volatility(daily: &[f64], window: usize) -> Vec<f64> {
    let annualization = TRADING_DAYS_PER_YEAR.sqrt();
    rolling_std(daily, window)
        .into_iter()
        .map(|s| s * annualization)
        .collect()
}

/// Short human form for log lines: 1.23B, 4.50M, 7.00K, 12.34.
pub fn format_compact(value: f64) -> String {
    let magnitude = value.abs();
    if !value.is_finite() {
        "N/A".to_string()
    } else if magnitude >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if magnitude >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if magnitude >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}
