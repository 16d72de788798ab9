// =============================================================================
// Signal Classifier — latest indicator values to categorical signals
// =============================================================================
//
// Reads the final bar of each indicator series (and the bar before it for the
// volume trend) and maps it onto a fixed label alphabet:
//
//   RSI              >70 Overbought   <30 Oversold   else Neutral
//   MACD             MACD > Signal => Buy, else Sell
//   Long_Term_Trend  close > SMA200 => Bullish, else Bearish
//   Stochastic %K    >80 Overbought   <20 Oversold   else Neutral
//   MFI              >80 Overbought   <20 Oversold   else Neutral
//   Bollinger        close > upper / close < lower / else within
//   Volume_Trend     OBV(t) > OBV(t-1) => Increasing, else Decreasing
//   Volatility       ATR% > 2 High   < 1 Low   else Moderate
//
// An undefined input makes that one classification fail.  What happens next
// is chosen by the caller through `MissingValuePolicy`.
// =============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::indicators::atr::atr_pct;
use crate::indicators::rolling::last_defined;
use crate::indicators::IndicatorSet;
use crate::types::PriceSeries;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const STOCH_OVERBOUGHT: f64 = 80.0;
pub const STOCH_OVERSOLD: f64 = 20.0;
pub const MFI_OVERBOUGHT: f64 = 80.0;
pub const MFI_OVERSOLD: f64 = 20.0;
pub const VOLATILITY_HIGH_PCT: f64 = 2.0;
pub const VOLATILITY_LOW_PCT: f64 = 1.0;

// =============================================================================
// Label alphabets
// =============================================================================

/// Oscillator zone shared by RSI, Stochastic and MFI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl ZoneSignal {
    /// Strict comparisons: a value exactly on a threshold is Neutral.
    pub fn from_value(value: f64, overbought: f64, oversold: f64) -> Self {
        if value > overbought {
            Self::Overbought
        } else if value < oversold {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overbought => "Overbought",
            Self::Oversold => "Oversold",
            Self::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdSignal {
    Buy,
    Sell,
}

impl MacdSignal {
    pub fn label(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendSignal {
    Bullish,
    Bearish,
}

impl TrendSignal {
    pub fn label(self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandSignal {
    #[serde(rename = "Above Upper Band")]
    AboveUpper,
    #[serde(rename = "Below Lower Band")]
    BelowLower,
    #[serde(rename = "Within Bands")]
    Within,
}

impl BandSignal {
    pub fn label(self) -> &'static str {
        match self {
            Self::AboveUpper => "Above Upper Band",
            Self::BelowLower => "Below Lower Band",
            Self::Within => "Within Bands",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
}

impl VolumeTrend {
    pub fn label(self) -> &'static str {
        match self {
            Self::Increasing => "Increasing",
            Self::Decreasing => "Decreasing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volatility {
    High,
    Low,
    Moderate,
}

impl Volatility {
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
        }
    }
}

// =============================================================================
// SignalSet
// =============================================================================

/// Name of each classified indicator, as used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKey {
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "Long_Term_Trend")]
    LongTermTrend,
    Stochastic,
    #[serde(rename = "MFI")]
    Mfi,
    Bollinger,
    #[serde(rename = "Volume_Trend")]
    VolumeTrend,
    Volatility,
}

impl SignalKey {
    pub const ALL: [SignalKey; 8] = [
        Self::Rsi,
        Self::Macd,
        Self::LongTermTrend,
        Self::Stochastic,
        Self::Mfi,
        Self::Bollinger,
        Self::VolumeTrend,
        Self::Volatility,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::LongTermTrend => "Long_Term_Trend",
            Self::Stochastic => "Stochastic",
            Self::Mfi => "MFI",
            Self::Bollinger => "Bollinger",
            Self::VolumeTrend => "Volume_Trend",
            Self::Volatility => "Volatility",
        }
    }
}

impl std::fmt::Display for SignalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One label per classified indicator.  `None` marks a signal whose backing
/// indicator was undefined and that the caller chose to keep as unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    pub rsi: Option<ZoneSignal>,
    pub macd: Option<MacdSignal>,
    pub long_term_trend: Option<TrendSignal>,
    pub stochastic: Option<ZoneSignal>,
    pub mfi: Option<ZoneSignal>,
    pub bollinger: Option<BandSignal>,
    pub volume_trend: Option<VolumeTrend>,
    pub volatility: Option<Volatility>,
}

impl SignalSet {
    /// Label for `key`, or `None` when unknown.
    pub fn label(&self, key: SignalKey) -> Option<&'static str> {
        match key {
            SignalKey::Rsi => self.rsi.map(ZoneSignal::label),
            SignalKey::Macd => self.macd.map(MacdSignal::label),
            SignalKey::LongTermTrend => self.long_term_trend.map(TrendSignal::label),
            SignalKey::Stochastic => self.stochastic.map(ZoneSignal::label),
            SignalKey::Mfi => self.mfi.map(ZoneSignal::label),
            SignalKey::Bollinger => self.bollinger.map(BandSignal::label),
            SignalKey::VolumeTrend => self.volume_trend.map(VolumeTrend::label),
            SignalKey::Volatility => self.volatility.map(Volatility::label),
        }
    }

    /// Every key in report order with its label.
    pub fn entries(&self) -> [(SignalKey, Option<&'static str>); 8] {
        SignalKey::ALL.map(|k| (k, self.label(k)))
    }

    pub fn missing(&self) -> Vec<SignalKey> {
        SignalKey::ALL
            .into_iter()
            .filter(|k| self.label(*k).is_none())
            .collect()
    }

    /// Share of known signals that read bullish (Buy, Bullish, Increasing),
    /// as a percentage.  `None` when no signal is known.
    pub fn technical_strength(&self) -> Option<f64> {
        let known: Vec<&str> = self.entries().iter().filter_map(|(_, l)| *l).collect();
        if known.is_empty() {
            return None;
        }
        let bullish = known
            .iter()
            .filter(|l| matches!(**l, "Buy" | "Bullish" | "Increasing"))
            .count();
        Some(bullish as f64 / known.len() as f64 * 100.0)
    }
}

// =============================================================================
// Classification
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("latest value for {indicator} is undefined")]
    MissingIndicatorValue { indicator: SignalKey },
}

/// What to do when a signal's backing indicator is undefined on the last bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Fail the whole classification with `MissingIndicatorValue`.
    Strict,
    /// Keep the signal as unknown and log it.
    #[default]
    Lenient,
}

/// Second-to-last defined pair of a series: `(previous, latest)`.
fn last_two(values: &[f64]) -> Option<(f64, f64)> {
    match values {
        [.., prev, last] if prev.is_finite() && last.is_finite() => Some((*prev, *last)),
        _ => None,
    }
}

fn resolve<T>(
    key: SignalKey,
    value: Option<T>,
    policy: MissingValuePolicy,
) -> Result<Option<T>, SignalError> {
    match (value, policy) {
        (Some(v), _) => Ok(Some(v)),
        (None, MissingValuePolicy::Strict) => {
            Err(SignalError::MissingIndicatorValue { indicator: key })
        }
        (None, MissingValuePolicy::Lenient) => {
            warn!(indicator = %key, "indicator undefined on last bar, signal left unknown");
            Ok(None)
        }
    }
}

/// Classify the latest bar of `indicators` computed from `series`.
pub fn classify(
    series: &PriceSeries,
    indicators: &IndicatorSet,
    policy: MissingValuePolicy,
) -> Result<SignalSet, SignalError> {
    let close = series.last().map(|b| b.close);

    let rsi = last_defined(&indicators.rsi)
        .map(|v| ZoneSignal::from_value(v, RSI_OVERBOUGHT, RSI_OVERSOLD));

    let macd = match (last_defined(&indicators.macd), last_defined(&indicators.macd_signal)) {
        (Some(m), Some(s)) => Some(if m > s { MacdSignal::Buy } else { MacdSignal::Sell }),
        _ => None,
    };

    let long_term_trend = match (close, last_defined(&indicators.sma_200)) {
        (Some(c), Some(sma)) => Some(if c > sma {
            TrendSignal::Bullish
        } else {
            TrendSignal::Bearish
        }),
        _ => None,
    };

    let stochastic = last_defined(&indicators.stochastic_k)
        .map(|v| ZoneSignal::from_value(v, STOCH_OVERBOUGHT, STOCH_OVERSOLD));

    let mfi = last_defined(&indicators.mfi)
        .map(|v| ZoneSignal::from_value(v, MFI_OVERBOUGHT, MFI_OVERSOLD));

    let bollinger = match (
        close,
        last_defined(&indicators.bb_upper),
        last_defined(&indicators.bb_lower),
    ) {
        (Some(c), Some(upper), Some(lower)) => Some(if c > upper {
            BandSignal::AboveUpper
        } else if c < lower {
            BandSignal::BelowLower
        } else {
            BandSignal::Within
        }),
        _ => None,
    };

    let volume_trend = last_two(&indicators.obv).map(|(prev, last)| {
        if last > prev {
            VolumeTrend::Increasing
        } else {
            VolumeTrend::Decreasing
        }
    });

    let volatility = match (last_defined(&indicators.atr), close) {
        (Some(atr), Some(c)) => {
            let pct = atr_pct(atr, c);
            if pct.is_nan() {
                None
            } else if pct > VOLATILITY_HIGH_PCT {
                Some(Volatility::High)
            } else if pct < VOLATILITY_LOW_PCT {
                Some(Volatility::Low)
            } else {
                Some(Volatility::Moderate)
            }
        }
        _ => None,
    };

    Ok(SignalSet {
        rsi: resolve(SignalKey::Rsi, rsi, policy)?,
        macd: resolve(SignalKey::Macd, macd, policy)?,
        long_term_trend: resolve(SignalKey::LongTermTrend, long_term_trend, policy)?,
        stochastic: resolve(SignalKey::Stochastic, stochastic, policy)?,
        mfi: resolve(SignalKey::Mfi, mfi, policy)?,
        bollinger: resolve(SignalKey::Bollinger, bollinger, policy)?,
        volume_trend: resolve(SignalKey::VolumeTrend, volume_trend, policy)?,
        volatility: resolve(SignalKey::Volatility, volatility, policy)?,
    })
}
