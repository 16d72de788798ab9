// =============================================================================
// Money Flow Index (MFI) — volume-weighted RSI analogue
// =============================================================================
//
//   typical    = (H + L + C) / 3
//   money flow = typical * volume
//   positive   = money flow where typical > previous typical, else 0
//   negative   = money flow where typical < previous typical, else 0
//   MFI        = 100 - 100 / (1 + sum(positive, n) / sum(negative, n))
//
// The first bar has no previous typical price and contributes to neither
// side.  A window without any negative flow leaves MFI undefined.

use super::rolling::{rolling_sum, strength_index};
use crate::types::PriceBar;

pub fn typical_price(bar: &PriceBar) -> f64 {
    (bar.high + bar.low + bar.close) / 3.0
}

pub fn calculate_mfi(bars: &[PriceBar], period: usize) -> Vec<f64> {
    let typical: Vec<f64> = bars.iter().map(typical_price).collect();

    let mut positive = vec![0.0; bars.len()];
    let mut negative = vec![0.0; bars.len()];
    for i in 1..bars.len() {
        let flow = typical[i] * bars[i].volume as f64;
        if typical[i] > typical[i - 1] {
            positive[i] = flow;
        } else if typical[i] < typical[i - 1] {
            negative[i] = flow;
        }
    }

    let pos_sum = rolling_sum(&positive, period);
    let neg_sum = rolling_sum(&negative, period);

    pos_sum
        .iter()
        .zip(&neg_sum)
        .map(|(&p, &n)| strength_index(p, n))
        .collect()
}
