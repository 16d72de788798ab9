// =============================================================================
// Weighted Recommendation Scorer — fixed six-factor heuristic
// =============================================================================
//
//   Factor            Weight   Favorable           Partial              Else
//   Long-term trend   30       Bullish       30    -                    0
//   RSI (raw value)   15       < 30          15    30..=70 => 7.5       0
//   MACD              20       Buy           20    -                    0
//   Volume trend      15       Increasing    15    -                    0
//   Bollinger         10       Below Lower   10    Within => 5          0
//   Stochastic        10       Oversold      10    Neutral => 5         0
//
// Oversold readings score as bullish (a mean-reversion read).  Each factor is
// an explicit label -> points match so the table stays auditable.
//
// confidence = 100 * achieved / TOTAL_WEIGHT, never renormalised over the
// factors that happen to be available.  A missing factor input produces the
// degraded Hold / 50 result instead of a partial score.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classifier::{
    BandSignal, MacdSignal, SignalSet, TrendSignal, VolumeTrend, ZoneSignal, RSI_OVERBOUGHT,
    RSI_OVERSOLD,
};

pub const TOTAL_WEIGHT: f64 = 100.0;
pub const DEGRADED_CONFIDENCE: f64 = 50.0;
pub const REASON_SEPARATOR: &str = " | ";

// =============================================================================
// Labels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl Recommendation {
    /// Top-down band lookup; each lower bound is inclusive.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 80.0 {
            Self::StrongBuy
        } else if confidence >= 60.0 {
            Self::Buy
        } else if confidence >= 40.0 {
            Self::Hold
        } else if confidence >= 20.0 {
            Self::Sell
        } else {
            Self::StrongSell
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Sell => "Sell",
            Self::StrongSell => "Strong Sell",
        }
    }

    pub fn is_buy_class(self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    pub fn is_sell_class(self) -> bool {
        matches!(self, Self::StrongSell | Self::Sell)
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Factor table
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Factor {
    LongTermTrend,
    Rsi,
    Macd,
    VolumeTrend,
    Bollinger,
    Stochastic,
}

impl Factor {
    pub const ALL: [Factor; 6] = [
        Self::LongTermTrend,
        Self::Rsi,
        Self::Macd,
        Self::VolumeTrend,
        Self::Bollinger,
        Self::Stochastic,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Self::LongTermTrend => 30.0,
            Self::Rsi => 15.0,
            Self::Macd => 20.0,
            Self::VolumeTrend => 15.0,
            Self::Bollinger => 10.0,
            Self::Stochastic => 10.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LongTermTrend => "Long-term trend",
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::VolumeTrend => "Volume trend",
            Self::Bollinger => "Bollinger position",
            Self::Stochastic => "Stochastic",
        }
    }
}

/// Points earned by one factor and the sentence explaining them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    pub weight: f64,
    pub points: f64,
    pub reason: String,
}

impl FactorScore {
    fn new(factor: Factor, points: f64, reason: impl Into<String>) -> Self {
        Self {
            factor,
            weight: factor.weight(),
            points,
            reason: reason.into(),
        }
    }
}

pub fn score_trend(signal: TrendSignal) -> FactorScore {
    match signal {
        TrendSignal::Bullish => FactorScore::new(Factor::LongTermTrend, 30.0, "Long-term trend is bullish"),
        TrendSignal::Bearish => FactorScore::new(Factor::LongTermTrend, 0.0, "Long-term trend is bearish"),
    }
}

pub fn score_rsi(rsi: f64) -> FactorScore {
    match ZoneSignal::from_value(rsi, RSI_OVERBOUGHT, RSI_OVERSOLD) {
        ZoneSignal::Oversold => FactorScore::new(
            Factor::Rsi,
            15.0,
            format!("RSI ({rsi:.2}) indicates oversold conditions"),
        ),
        ZoneSignal::Overbought => FactorScore::new(
            Factor::Rsi,
            0.0,
            format!("RSI ({rsi:.2}) indicates overbought conditions"),
        ),
        ZoneSignal::Neutral => {
            FactorScore::new(Factor::Rsi, 7.5, format!("RSI ({rsi:.2}) is neutral"))
        }
    }
}

pub fn score_macd(signal: MacdSignal) -> FactorScore {
    match signal {
        MacdSignal::Buy => FactorScore::new(Factor::Macd, 20.0, "MACD shows bullish crossover"),
        MacdSignal::Sell => FactorScore::new(Factor::Macd, 0.0, "MACD shows bearish crossover"),
    }
}

pub fn score_volume(trend: VolumeTrend) -> FactorScore {
    match trend {
        VolumeTrend::Increasing => FactorScore::new(Factor::VolumeTrend, 15.0, "Volume is trending up"),
        VolumeTrend::Decreasing => FactorScore::new(Factor::VolumeTrend, 0.0, "Volume is trending down"),
    }
}

pub fn score_bollinger(signal: BandSignal) -> FactorScore {
    match signal {
        BandSignal::BelowLower => FactorScore::new(
            Factor::Bollinger,
            10.0,
            "Price below lower Bollinger Band suggests oversold",
        ),
        BandSignal::Within => FactorScore::new(Factor::Bollinger, 5.0, "Price within Bollinger Bands"),
        BandSignal::AboveUpper => FactorScore::new(
            Factor::Bollinger,
            0.0,
            "Price above upper Bollinger Band suggests overbought",
        ),
    }
}

pub fn score_stochastic(signal: ZoneSignal) -> FactorScore {
    match signal {
        ZoneSignal::Oversold => FactorScore::new(
            Factor::Stochastic,
            10.0,
            "Stochastic indicates oversold conditions",
        ),
        ZoneSignal::Neutral => FactorScore::new(Factor::Stochastic, 5.0, "Stochastic is neutral"),
        ZoneSignal::Overbought => FactorScore::new(
            Factor::Stochastic,
            0.0,
            "Stochastic indicates overbought conditions",
        ),
    }
}

// =============================================================================
// Scoring
// =============================================================================

/// Result of the weighted scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecommendation {
    pub label: Recommendation,
    pub confidence: f64,
    /// One sentence per factor in table order.
    pub reasoning: Vec<String>,
    pub factors: Vec<FactorScore>,
    /// Set when a factor input was missing and the neutral fallback was used.
    pub degraded: bool,
}

impl ScoredRecommendation {
    fn degraded(missing: &[Factor]) -> Self {
        let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
        Self {
            label: Recommendation::Hold,
            confidence: DEGRADED_CONFIDENCE,
            reasoning: vec![format!("Error in analysis: missing {}", names.join(", "))],
            factors: Vec::new(),
            degraded: true,
        }
    }

    /// Reasoning joined for single-cell display.
    pub fn reasoning_text(&self) -> String {
        self.reasoning.join(REASON_SEPARATOR)
    }
}

/// Score `signals` together with the latest raw RSI value.
pub fn score(signals: &SignalSet, rsi: f64) -> ScoredRecommendation {
    let rsi = Some(rsi).filter(|v| v.is_finite());

    let factors = match (
        signals.long_term_trend,
        rsi,
        signals.macd,
        signals.volume_trend,
        signals.bollinger,
        signals.stochastic,
    ) {
        (Some(trend), Some(rsi), Some(macd), Some(volume), Some(bands), Some(stoch)) => vec![
            score_trend(trend),
            score_rsi(rsi),
            score_macd(macd),
            score_volume(volume),
            score_bollinger(bands),
            score_stochastic(stoch),
        ],
        (trend, rsi, macd, volume, bands, stoch) => {
            let present = [
                trend.is_some(),
                rsi.is_some(),
                macd.is_some(),
                volume.is_some(),
                bands.is_some(),
                stoch.is_some(),
            ];
            let missing: Vec<Factor> = Factor::ALL
                .into_iter()
                .zip(present)
                .filter_map(|(f, ok)| (!ok).then_some(f))
                .collect();
            warn!(missing = ?missing, "scoring input incomplete, returning degraded recommendation");
            return ScoredRecommendation::degraded(&missing);
        }
    };

    let achieved: f64 = factors.iter().map(|f| f.points).sum();
    let confidence = achieved / TOTAL_WEIGHT * 100.0;
    let label = Recommendation::from_confidence(confidence);

    debug!(achieved, confidence, label = %label, "recommendation scored");

    ScoredRecommendation {
        label,
        confidence,
        reasoning: factors.iter().map(|f| f.reason.clone()).collect(),
        factors,
        degraded: false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::classifier::Volatility;

    fn signals(trend: TrendSignal, macd: MacdSignal, volume: VolumeTrend, bands: BandSignal, stoch: ZoneSignal) -> SignalSet {
        SignalSet {
            rsi: Some(ZoneSignal::Neutral),
            macd: Some(macd),
            long_term_trend: Some(trend),
            stochastic: Some(stoch),
            mfi: Some(ZoneSignal::Neutral),
            bollinger: Some(bands),
            volume_trend: Some(volume),
            volatility: Some(Volatility::Moderate),
        }
    }

    fn neutral() -> SignalSet {
        signals(
            TrendSignal::Bearish,
            MacdSignal::Sell,
            VolumeTrend::Decreasing,
            BandSignal::Within,
            ZoneSignal::Neutral,
        )
    }

    #[test]
    fn weights_total_one_hundred() {
        let total: f64 = Factor::ALL.iter().map(|f| f.weight()).sum();
        assert_eq!(total, TOTAL_WEIGHT);
    }

    #[test]
    fn every_factor_caps_at_its_weight() {
        assert_eq!(score_trend(TrendSignal::Bullish).points, Factor::LongTermTrend.weight());
        assert_eq!(score_rsi(10.0).points, Factor::Rsi.weight());
        assert_eq!(score_macd(MacdSignal::Buy).points, Factor::Macd.weight());
        assert_eq!(score_volume(VolumeTrend::Increasing).points, Factor::VolumeTrend.weight());
        assert_eq!(score_bollinger(BandSignal::BelowLower).points, Factor::Bollinger.weight());
        assert_eq!(score_stochastic(ZoneSignal::Oversold).points, Factor::Stochastic.weight());
    }

    #[test]
    fn rsi_factor_is_contrarian() {
        assert_eq!(score_rsi(25.0).points, 15.0);
        assert_eq!(score_rsi(50.0).points, 7.5);
        assert_eq!(score_rsi(30.0).points, 7.5);
        assert_eq!(score_rsi(70.0).points, 7.5);
        assert_eq!(score_rsi(75.0).points, 0.0);
        assert_eq!(score_rsi(25.0).reason, "RSI (25.00) indicates oversold conditions");
    }

    #[test]
    fn partial_points_for_middle_labels() {
        assert_eq!(score_bollinger(BandSignal::Within).points, 5.0);
        assert_eq!(score_bollinger(BandSignal::AboveUpper).points, 0.0);
        assert_eq!(score_stochastic(ZoneSignal::Neutral).points, 5.0);
        assert_eq!(score_stochastic(ZoneSignal::Overbought).points, 0.0);
    }

    #[test]
    fn neutral_baseline_is_sell() {
        // 7.5 (RSI) + 5 (bands) + 5 (stochastic)
        let r = score(&neutral(), 50.0);
        assert!((r.confidence - 17.5).abs() < 1e-12);
        assert_eq!(r.label, Recommendation::StrongSell);
        assert!(!r.degraded);
    }

    #[test]
    fn bullish_trend_adds_exactly_thirty() {
        let base = score(&neutral(), 50.0);
        let mut flipped = neutral();
        flipped.long_term_trend = Some(TrendSignal::Bullish);
        let up = score(&flipped, 50.0);
        assert!((up.confidence - base.confidence - 30.0).abs() < 1e-12);
    }

    #[test]
    fn confidence_monotone_in_favorable_flips() {
        let mut s = neutral();
        let mut last = score(&s, 50.0).confidence;

        s.macd = Some(MacdSignal::Buy);
        let c = score(&s, 50.0).confidence;
        assert!(c >= last);
        last = c;

        s.volume_trend = Some(VolumeTrend::Increasing);
        let c = score(&s, 50.0).confidence;
        assert!(c >= last);
        last = c;

        s.bollinger = Some(BandSignal::BelowLower);
        let c = score(&s, 50.0).confidence;
        assert!(c >= last);
        last = c;

        let c = score(&s, 20.0).confidence;
        assert!(c >= last);
    }

    #[test]
    fn all_favorable_is_strong_buy_at_100() {
        let s = signals(
            TrendSignal::Bullish,
            MacdSignal::Buy,
            VolumeTrend::Increasing,
            BandSignal::BelowLower,
            ZoneSignal::Oversold,
        );
        let r = score(&s, 12.0);
        assert_eq!(r.confidence, 100.0);
        assert_eq!(r.label, Recommendation::StrongBuy);
        assert_eq!(r.reasoning.len(), 6);
    }

    #[test]
    fn all_unfavorable_is_zero() {
        let s = signals(
            TrendSignal::Bearish,
            MacdSignal::Sell,
            VolumeTrend::Decreasing,
            BandSignal::AboveUpper,
            ZoneSignal::Overbought,
        );
        let r = score(&s, 88.0);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.label, Recommendation::StrongSell);
    }

    #[test]
    fn label_bands() {
        assert_eq!(Recommendation::from_confidence(85.0), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_confidence(80.0), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_confidence(60.0), Recommendation::Buy);
        assert_eq!(Recommendation::from_confidence(45.0), Recommendation::Hold);
        assert_eq!(Recommendation::from_confidence(40.0), Recommendation::Hold);
        assert_eq!(Recommendation::from_confidence(25.0), Recommendation::Sell);
        assert_eq!(Recommendation::from_confidence(20.0), Recommendation::Sell);
        assert_eq!(Recommendation::from_confidence(10.0), Recommendation::StrongSell);
        assert_eq!(Recommendation::from_confidence(19.999), Recommendation::StrongSell);
    }

    #[test]
    fn reasoning_follows_table_order() {
        let r = score(&neutral(), 50.0);
        assert_eq!(
            r.reasoning_text(),
            "Long-term trend is bearish | RSI (50.00) is neutral | MACD shows bearish crossover | \
             Volume is trending down | Price within Bollinger Bands | Stochastic is neutral"
        );
    }

    #[test]
    fn missing_signal_degrades() {
        let mut s = neutral();
        s.long_term_trend = None;
        let r = score(&s, 50.0);
        assert!(r.degraded);
        assert_eq!(r.label, Recommendation::Hold);
        assert_eq!(r.confidence, DEGRADED_CONFIDENCE);
        assert_eq!(r.reasoning, vec!["Error in analysis: missing Long-term trend".to_string()]);
        assert!(r.factors.is_empty());
    }

    #[test]
    fn undefined_rsi_degrades() {
        let r = score(&neutral(), f64::NAN);
        assert!(r.degraded);
        assert_eq!(r.reasoning_text(), "Error in analysis: missing RSI");
    }

    #[test]
    fn unscored_signals_do_not_matter() {
        let mut s = neutral();
        s.mfi = None;
        s.volatility = None;
        assert!(!score(&s, 50.0).degraded);
    }

    #[test]
    fn buy_and_sell_classes() {
        assert!(Recommendation::StrongBuy.is_buy_class());
        assert!(Recommendation::Buy.is_buy_class());
        assert!(!Recommendation::Hold.is_buy_class());
        assert!(!Recommendation::Hold.is_sell_class());
        assert!(Recommendation::Sell.is_sell_class());
        assert!(Recommendation::StrongSell.is_sell_class());
    }
}
