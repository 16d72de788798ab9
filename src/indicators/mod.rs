// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicator battery used by the
// analysis engine.  Every series is aligned 1:1 with its source price series;
// insufficient history and zero denominators both surface as NaN so callers
// are forced to handle undefined values at the point where they read them.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod mfi;
pub mod obv;
pub mod roc;
pub mod rolling;
pub mod rsi;
pub mod rvi;
pub mod stochastic;

use tracing::debug;

use crate::types::PriceSeries;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const SMA_SHORT: usize = 20;
pub const SMA_MEDIUM: usize = 50;
pub const SMA_LONG: usize = 200;
pub const BB_PERIOD: usize = 20;
pub const BB_STD: f64 = 2.0;
pub const STOCH_K_PERIOD: usize = 14;
pub const STOCH_D_PERIOD: usize = 3;
pub const ATR_PERIOD: usize = 14;
pub const ROC_PERIOD: usize = 10;
pub const MFI_PERIOD: usize = 14;
pub const RVI_PERIOD: usize = 10;

/// Every derived series for one price series.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub sma_20: Vec<f64>,
    pub sma_50: Vec<f64>,
    pub sma_200: Vec<f64>,
    pub bb_middle: Vec<f64>,
    pub bb_upper: Vec<f64>,
    pub bb_lower: Vec<f64>,
    pub stochastic_k: Vec<f64>,
    pub stochastic_d: Vec<f64>,
    pub atr: Vec<f64>,
    pub obv: Vec<f64>,
    pub roc: Vec<f64>,
    pub mfi: Vec<f64>,
    pub rvi: Vec<f64>,
}

impl IndicatorSet {
    /// Compute the full battery for `series`.
    pub fn compute(series: &PriceSeries) -> Self {
        let bars = series.bars();
        let closes = series.closes();

        let macd = macd::calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let bb = bollinger::calculate_bollinger(&closes, BB_PERIOD, BB_STD);
        let stoch = stochastic::calculate_stochastic(bars, STOCH_K_PERIOD, STOCH_D_PERIOD);

        let set = Self {
            rsi: rsi::calculate_rsi(&closes, RSI_PERIOD),
            macd: macd.macd,
            macd_signal: macd.signal,
            sma_20: rolling::rolling_mean(&closes, SMA_SHORT),
            sma_50: rolling::rolling_mean(&closes, SMA_MEDIUM),
            sma_200: rolling::rolling_mean(&closes, SMA_LONG),
            bb_middle: bb.middle,
            bb_upper: bb.upper,
            bb_lower: bb.lower,
            stochastic_k: stoch.k,
            stochastic_d: stoch.d,
            atr: atr::calculate_atr(bars, ATR_PERIOD),
            obv: obv::calculate_obv(bars),
            roc: roc::calculate_roc(&closes, ROC_PERIOD),
            mfi: mfi::calculate_mfi(bars, MFI_PERIOD),
            rvi: rvi::calculate_rvi(bars, RVI_PERIOD),
        };

        debug!(
            bars = series.len(),
            defined_sma_200 = set.sma_200.iter().filter(|v| v.is_finite()).count(),
            "indicator set computed"
        );
        set
    }

    /// `(column name, series)` pairs in export order.
    pub fn columns(&self) -> [(&'static str, &[f64]); 16] {
        [
            ("RSI", self.rsi.as_slice()),
            ("MACD", self.macd.as_slice()),
            ("Signal_Line", self.macd_signal.as_slice()),
            ("SMA_20", self.sma_20.as_slice()),
            ("SMA_50", self.sma_50.as_slice()),
            ("SMA_200", self.sma_200.as_slice()),
            ("BB_middle", self.bb_middle.as_slice()),
            ("BB_upper", self.bb_upper.as_slice()),
            ("BB_lower", self.bb_lower.as_slice()),
            ("Stochastic_K", self.stochastic_k.as_slice()),
            ("Stochastic_D", self.stochastic_d.as_slice()),
            ("ATR", self.atr.as_slice()),
            ("OBV", self.obv.as_slice()),
            ("ROC", self.roc.as_slice()),
            ("MFI", self.mfi.as_slice()),
            ("RVI", self.rvi.as_slice()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::series_from_closes;

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + i as f64 * 0.05 + (i as f64 * 0.3).sin() * 3.0)
            .collect()
    }

    #[test]
    fn every_series_matches_input_length() {
        for n in [0, 1, 5, 30, 250] {
            let set = IndicatorSet::compute(&series_from_closes(&wavy(n)));
            for (name, col) in set.columns() {
                assert_eq!(col.len(), n, "{name} has wrong length for n={n}");
            }
        }
    }

    #[test]
    fn short_series_leaves_long_windows_undefined() {
        let set = IndicatorSet::compute(&series_from_closes(&wavy(60)));
        assert!(set.sma_200.iter().all(|v| v.is_nan()));
        assert!(set.sma_50[59].is_finite());
        assert!(set.rsi[59].is_finite());
    }

    #[test]
    fn full_year_defines_latest_values() {
        let set = IndicatorSet::compute(&series_from_closes(&wavy(252)));
        for (name, col) in set.columns() {
            assert!(col[251].is_finite(), "{name} undefined on the last bar");
        }
    }

    #[test]
    fn macd_of_constant_series_is_zero_everywhere() {
        let set = IndicatorSet::compute(&series_from_closes(&[75.0; 40]));
        assert!(set.macd.iter().all(|&v| v == 0.0));
    }
}
