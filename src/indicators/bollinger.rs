// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the rolling *sample* standard
// deviation of close over the same window.
//
// %B locates the close inside the envelope:
//   %B = (close - lower) / (upper - lower)

use super::rolling::{ratio, rolling_mean, rolling_std};

/// Band series aligned with the input closes.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// Positions before the window fills are NaN in all three bands.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let middle = rolling_mean(closes, period);
    let std_dev = rolling_std(closes, period);

    let upper = middle.iter().zip(&std_dev).map(|(m, s)| m + num_std * s).collect();
    let lower = middle.iter().zip(&std_dev).map(|(m, s)| m - num_std * s).collect();

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

/// %B position of `close` inside the bands; NaN when the bands collapse.
pub fn percent_b(close: f64, upper: f64, lower: f64) -> f64 {
    ratio(close - lower, upper - lower)
}
