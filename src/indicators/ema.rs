// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   alpha  = 2 / (span + 1)
//   EMA_0  = x_0
//   EMA_t  = x_t * alpha + EMA_{t-1} * (1 - alpha)
//
// The recursion is seeded with the first observation and carries no bias
// adjustment, so every position from the first defined input onward has a
// value.  This is what makes MACD defined from the very first bar.
// =============================================================================

/// Compute the EMA series for `values` with the given `span`.
///
/// The output is aligned 1:1 with the input.
///
/// # Edge cases
/// - `span == 0` => all NaN
/// - Leading NaN inputs stay NaN until the first defined value, which seeds
///   the recursion.
/// - A NaN after seeding carries the previous EMA forward unchanged.
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    for (i, &x) in values.iter().enumerate() {
        let next = match (prev, x.is_nan()) {
            (None, true) => continue,
            (None, false) => x,
            (Some(p), true) => p,
            (Some(p), false) => x * alpha + p * (1.0 - alpha),
        };
        result[i] = next;
        prev = Some(next);
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_span_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let ema = calculate_ema(&[10.0, 20.0], 3);
        assert_eq!(ema[0], 10.0);
        // alpha = 0.5 => 20 * 0.5 + 10 * 0.5
        assert!((ema[1] - 15.0).abs() < 1e-12);
    }

    #[test]
    fn ema_known_values() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let ema = calculate_ema(&closes, 5);
        assert_eq!(ema.len(), closes.len());

        let alpha = 2.0 / 6.0;
        let mut expected = closes[0];
        for (i, &c) in closes.iter().enumerate().skip(1) {
            expected = c * alpha + expected * (1.0 - alpha);
            assert!((ema[i] - expected).abs() < 1e-10, "got {}, expected {expected}", ema[i]);
        }
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let ema = calculate_ema(&[42.0; 50], 12);
        assert!(ema.iter().all(|&v| v == 42.0));
    }

    #[test]
    fn ema_leading_nan_then_seed() {
        let ema = calculate_ema(&[f64::NAN, f64::NAN, 4.0, 4.0], 3);
        assert!(ema[0].is_nan());
        assert!(ema[1].is_nan());
        assert_eq!(ema[2], 4.0);
        assert_eq!(ema[3], 4.0);
    }

    #[test]
    fn ema_carries_over_gap() {
        let ema = calculate_ema(&[2.0, f64::NAN, 2.0], 3);
        assert_eq!(ema, vec![2.0, 2.0, 2.0]);
    }
}
