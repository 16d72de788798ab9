// =============================================================================
// MACD — Moving Average Convergence Divergence
// =============================================================================
//
//   MACD   = EMA(close, fast) - EMA(close, slow)
//   Signal = EMA(MACD, signal)
//
// Standard parameters are 12 / 26 / 9.  Both EMAs are seeded with the first
// close, so MACD is defined from bar 0.
// =============================================================================

use super::ema::calculate_ema;

/// MACD line and its signal line, both aligned with the input closes.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal = calculate_ema(&macd, signal);
    MacdSeries { macd, signal }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_constant_series_is_zero() {
        let out = calculate_macd(&[57.25; 120], 12, 26, 9);
        assert_eq!(out.macd.len(), 120);
        assert!(out.macd.iter().all(|&v| v == 0.0));
        assert!(out.signal.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let out = calculate_macd(&closes, 12, 26, 9);
        let last = *out.macd.last().unwrap();
        let sig = *out.signal.last().unwrap();
        assert!(last > 0.0);
        // Signal lags the accelerating-then-flat MACD from below.
        assert!(last > sig);
    }

    #[test]
    fn macd_first_bar_is_zero() {
        let out = calculate_macd(&[10.0, 12.0, 11.0], 12, 26, 9);
        assert_eq!(out.macd[0], 0.0);
        assert_eq!(out.signal[0], 0.0);
    }
}
