// =============================================================================
// Stochastic Oscillator (%K / %D)
// =============================================================================
//
//   %K = 100 * (close - lowest low_n) / (highest high_n - lowest low_n)
//   %D = SMA(%K, 3)
//
// A window where the highest high equals the lowest low has no range and
// %K is NaN for that bar.

use super::rolling::{ratio, rolling_max, rolling_mean, rolling_min};
use crate::types::PriceBar;

#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn calculate_stochastic(bars: &[PriceBar], k_period: usize, d_period: usize) -> StochasticSeries {
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low_min = rolling_min(&lows, k_period);
    let high_max = rolling_max(&highs, k_period);

    let k: Vec<f64> = bars
        .iter()
        .zip(low_min.iter().zip(&high_max))
        .map(|(bar, (&lo, &hi))| 100.0 * ratio(bar.close - lo, hi - lo))
        .collect();
    let d = rolling_mean(&k, d_period);

    StochasticSeries { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::series_from_closes;

    #[test]
    fn stochastic_close_at_top_of_range() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64 * 2.0).collect();
        let series = series_from_closes(&closes);
        let out = calculate_stochastic(series.bars(), 14, 3);
        assert!(out.k[12].is_nan());
        // close = 40, low_min = 14 - 1 = 13, high_max = 41
        let expected = 100.0 * (40.0 - 13.0) / (41.0 - 13.0);
        assert!((out.k[19] - expected).abs() < 1e-10);
    }

    #[test]
    fn percent_d_lags_two_more_bars() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64).sin() * 5.0).collect();
        let out = calculate_stochastic(series_from_closes(&closes).bars(), 14, 3);
        assert!(out.k[13].is_finite());
        assert!(out.d[14].is_nan());
        assert!(out.d[15].is_finite());
        let mean = (out.k[13] + out.k[14] + out.k[15]) / 3.0;
        assert!((out.d[15] - mean).abs() < 1e-10);
    }

    #[test]
    fn stochastic_zero_range_is_undefined() {
        let bars: Vec<PriceBar> = series_from_closes(&[10.0; 20])
            .bars()
            .iter()
            .cloned()
            .map(|mut b| {
                b.high = b.close;
                b.low = b.close;
                b
            })
            .collect();
        let out = calculate_stochastic(&bars, 14, 3);
        assert!(out.k.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn stochastic_stays_in_range() {
        let closes: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.4).sin() * 8.0).collect();
        let out = calculate_stochastic(series_from_closes(&closes).bars(), 14, 3);
        for &v in out.k.iter().filter(|v| v.is_finite()) {
            assert!((0.0..=100.0).contains(&v));
        }
    }
}
