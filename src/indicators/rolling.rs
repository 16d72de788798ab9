// =============================================================================
// Rolling-window primitives
// =============================================================================
//
// Every helper returns a vector the same length as its input.  Positions
// whose trailing window is not yet full, or whose window contains a NaN, are
// NaN.  Indicators compose these helpers so that insufficient history always
// shows up as leading NaNs and never as an error.
// =============================================================================

/// Apply `f` to every full trailing window of `window` values.
fn rolling_apply(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[end - 1] = f(slice);
    }
    out
}

/// Simple trailing mean.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum())
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Sample (n - 1) standard deviation over the trailing window.
///
/// A window of one value has no sample deviation and yields NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        if w.len() < 2 {
            return f64::NAN;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

/// Value `periods` bars earlier; the first `periods` positions are NaN.
pub fn shift(values: &[f64], periods: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in periods..values.len() {
        out[i] = values[i - periods];
    }
    out
}

/// First difference; position 0 is NaN.
pub fn diff(values: &[f64]) -> Vec<f64> {
    let prev = shift(values, 1);
    values.iter().zip(&prev).map(|(v, p)| v - p).collect()
}

/// `num / den`, or NaN when the denominator is zero or either side is
/// undefined.
pub fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 || !num.is_finite() || !den.is_finite() {
        f64::NAN
    } else {
        num / den
    }
}

/// The `100 - 100 / (1 + up/down)` transform shared by RSI and MFI.
pub fn strength_index(up: f64, down: f64) -> f64 {
    let rs = ratio(up, down);
    if rs.is_nan() {
        f64::NAN
    } else {
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// Latest value of a series, if it exists and is defined.
pub fn last_defined(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|v| v.is_finite())
}
