// =============================================================================
// Rate of Change (ROC) — Momentum Indicator
// =============================================================================
//
// ROC measures the percentage change in price over a look-back period:
//   ROC = ((close - close_n) / close_n) * 100
//
// Positive ROC indicates upward momentum; negative indicates downward.

use super::rolling::{ratio, shift};

/// Calculate the Rate of Change aligned with `closes`.
///
/// The first `period` positions are NaN, as is any bar whose reference close
/// is zero.
pub fn calculate_roc(closes: &[f64], period: usize) -> Vec<f64> {
    let reference = shift(closes, period);
    closes
        .iter()
        .zip(&reference)
        .map(|(&c, &r)| ratio(c - r, r) * 100.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roc_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let roc = calculate_roc(&closes, 10);
        assert_eq!(roc.len(), 20);
        assert!(roc[..10].iter().all(|v| v.is_nan()));
        // From 1 to 11: ROC = (11-1)/1 * 100 = 1000%
        assert!((roc[10] - 1000.0).abs() < 1e-10);
    }

    #[test]
    fn roc_insufficient_data() {
        assert!(calculate_roc(&[1.0, 2.0, 3.0], 10).iter().all(|v| v.is_nan()));
    }
}
