// Relative Vigor Index: mean(close - open, n) / mean(high - low, n).

use super::rolling::{ratio, rolling_mean};
use crate::types::PriceBar;

pub fn calculate_rvi(bars: &[PriceBar], period: usize) -> Vec<f64> {
    let body: Vec<f64> = bars.iter().map(|b| b.close - b.open).collect();
    let range: Vec<f64> = bars.iter().map(|b| b.high - b.low).collect();
    let body_mean = rolling_mean(&body, period);
    let range_mean = rolling_mean(&range, period);
    body_mean
        .iter()
        .zip(&range_mean)
        .map(|(&b, &r)| ratio(b, r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::series_from_closes;

    #[test]
    fn rvi_bullish_bodies_are_positive() {
        let bars: Vec<PriceBar> = series_from_closes(&[20.0; 12])
            .bars()
            .iter()
            .cloned()
            .map(|mut b| {
                b.open = b.close - 0.5;
                b
            })
            .collect();
        let rvi = calculate_rvi(&bars, 10);
        assert!(rvi[8].is_nan());
        // body 0.5 over range 2.0
        assert!((rvi[11] - 0.25).abs() < 1e-12);
    }
}
