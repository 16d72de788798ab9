// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
//   OBV_t = OBV_{t-1} + sign(close_t - close_{t-1}) * volume_t
//
// The first bar has no prior close and contributes zero, so OBV starts at 0
// and is defined at every bar.

use crate::types::PriceBar;

pub fn calculate_obv(bars: &[PriceBar]) -> Vec<f64> {
    let mut total = 0.0;
    let mut result = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            let change = bar.close - bars[i - 1].close;
            // f64::signum maps 0.0 to 1.0, which would count flat bars.
            let direction = if change > 0.0 {
                1.0
            } else if change < 0.0 {
                -1.0
            } else {
                0.0
            };
            total += direction * bar.volume as f64;
        }
        result.push(total);
    }
    result
}
