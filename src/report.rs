// =============================================================================
// Report Aggregator — cross-sectional rows and rankings
// =============================================================================
//
// Consumes finished per-symbol results in caller order.  Every ranking is a
// stable sort, so equal values keep that order.  Non-finite or unknown values
// never enter a numeric ranking.
// =============================================================================

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::signals::{Recommendation, SignalKey};

pub const DEFAULT_TOP_N: usize = 10;
const NOT_AVAILABLE: &str = "N/A";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Last Price")]
    pub last_price: f64,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Analysis Date")]
    pub analysis_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "RSI")]
    pub rsi: String,
    #[serde(rename = "MACD")]
    pub macd: String,
    #[serde(rename = "Long_Term_Trend")]
    pub long_term_trend: String,
    #[serde(rename = "Stochastic")]
    pub stochastic: String,
    #[serde(rename = "MFI")]
    pub mfi: String,
    #[serde(rename = "Bollinger")]
    pub bollinger: String,
    #[serde(rename = "Volume_Trend")]
    pub volume_trend: String,
    #[serde(rename = "Volatility")]
    pub volatility: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Recommendation")]
    pub recommendation: Recommendation,
    #[serde(rename = "Confidence Score")]
    pub confidence: String,
    #[serde(rename = "Analysis Reasoning")]
    pub reasoning: String,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Technical Strength")]
    pub technical_strength: String,
    #[serde(rename = "RSI Status")]
    pub rsi_status: String,
    #[serde(rename = "MACD Signal")]
    pub macd_signal: String,
    #[serde(rename = "Trend")]
    pub trend: String,
    #[serde(rename = "Volume Trend")]
    pub volume_trend: String,
    #[serde(rename = "Volatility")]
    pub volatility: String,
}

fn label_or_na(result: &AnalysisResult, key: SignalKey) -> String {
    result.signals.label(key).unwrap_or(NOT_AVAILABLE).to_string()
}

fn percent_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.1}%"))
}

impl SummaryRow {
    pub fn from_result(result: &AnalysisResult, analysis_date: NaiveDate) -> Self {
        Self {
            symbol: result.symbol.clone(),
            last_price: result.last_price,
            rsi: result.rsi,
            macd: result.macd,
            volume: result.last_volume,
            analysis_date,
        }
    }
}

impl SignalRow {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            symbol: result.symbol.clone(),
            rsi: label_or_na(result, SignalKey::Rsi),
            macd: label_or_na(result, SignalKey::Macd),
            long_term_trend: label_or_na(result, SignalKey::LongTermTrend),
            stochastic: label_or_na(result, SignalKey::Stochastic),
            mfi: label_or_na(result, SignalKey::Mfi),
            bollinger: label_or_na(result, SignalKey::Bollinger),
            volume_trend: label_or_na(result, SignalKey::VolumeTrend),
            volatility: label_or_na(result, SignalKey::Volatility),
        }
    }
}

impl TechnicalRow {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let rec = &result.recommendation;
        Self {
            symbol: result.symbol.clone(),
            price: result.last_price,
            recommendation: rec.label,
            confidence: format!("{:.1}%", rec.confidence),
            reasoning: rec.reasoning_text(),
            rsi: result.rsi,
            macd: result.macd,
            volume: result.last_volume,
            technical_strength: percent_or_na(result.technical_strength),
            rsi_status: label_or_na(result, SignalKey::Rsi),
            macd_signal: label_or_na(result, SignalKey::Macd),
            trend: label_or_na(result, SignalKey::LongTermTrend),
            volume_trend: label_or_na(result, SignalKey::VolumeTrend),
            volatility: label_or_na(result, SignalKey::Volatility),
        }
    }
}

// =============================================================================
// Rankings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedValue {
    pub symbol: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecommendation {
    pub symbol: String,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rankings {
    pub highest_rsi: Vec<RankedValue>,
    pub lowest_rsi: Vec<RankedValue>,
    pub highest_macd: Vec<RankedValue>,
    pub highest_volume: Vec<RankedValue>,
    pub top_buy: Vec<RankedRecommendation>,
    pub top_sell: Vec<RankedRecommendation>,
}

/// Flattened ranking entry for a single CSV table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    #[serde(rename = "Ranking")]
    pub ranking: &'static str,
    #[serde(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Recommendation")]
    pub recommendation: Option<Recommendation>,
}

#[derive(Clone, Copy)]
enum Direction {
    Descending,
    Ascending,
}

fn rank_by<F>(results: &[AnalysisResult], top_n: usize, dir: Direction, value: F) -> Vec<RankedValue>
where
    F: Fn(&AnalysisResult) -> Option<f64>,
{
    let mut ranked: Vec<RankedValue> = results
        .iter()
        .filter_map(|r| {
            value(r)
                .filter(|v| v.is_finite())
                .map(|v| RankedValue {
                    symbol: r.symbol.clone(),
                    value: v,
                })
        })
        .collect();
    // Values are finite here, so partial_cmp never fails.
    ranked.sort_by(|a, b| {
        let ord = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
        match dir {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
    ranked.truncate(top_n);
    ranked
}

fn rank_recommendations<P>(
    results: &[AnalysisResult],
    top_n: usize,
    dir: Direction,
    keep: P,
) -> Vec<RankedRecommendation>
where
    P: Fn(Recommendation) -> bool,
{
    let mut ranked: Vec<RankedRecommendation> = results
        .iter()
        .filter(|r| keep(r.recommendation.label))
        .map(|r| RankedRecommendation {
            symbol: r.symbol.clone(),
            recommendation: r.recommendation.label,
            confidence: r.recommendation.confidence,
            price: r.last_price,
        })
        .collect();
    ranked.sort_by(|a, b| {
        let ord = a.confidence.partial_cmp(&b.confidence).unwrap_or(Ordering::Equal);
        match dir {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
    ranked.truncate(top_n);
    ranked
}

impl Rankings {
    pub fn build(results: &[AnalysisResult], top_n: usize) -> Self {
        Self {
            highest_rsi: rank_by(results, top_n, Direction::Descending, |r| r.rsi),
            lowest_rsi: rank_by(results, top_n, Direction::Ascending, |r| r.rsi),
            highest_macd: rank_by(results, top_n, Direction::Descending, |r| r.macd),
            highest_volume: rank_by(results, top_n, Direction::Descending, |r| {
                Some(r.last_volume as f64)
            }),
            top_buy: rank_recommendations(results, top_n, Direction::Descending, |l| {
                l.is_buy_class()
            }),
            top_sell: rank_recommendations(results, top_n, Direction::Ascending, |l| {
                l.is_sell_class()
            }),
        }
    }

    pub fn rows(&self) -> Vec<RankingRow> {
        let numeric = [
            ("Highest RSI", &self.highest_rsi),
            ("Lowest RSI", &self.lowest_rsi),
            ("Highest MACD", &self.highest_macd),
            ("Highest Volume", &self.highest_volume),
        ];
        let recs = [
            ("Top Buy Recommendations", &self.top_buy),
            ("Top Sell Recommendations", &self.top_sell),
        ];

        let mut rows = Vec::new();
        for (ranking, entries) in numeric {
            rows.extend(entries.iter().enumerate().map(|(i, e)| RankingRow {
                ranking,
                rank: i + 1,
                symbol: e.symbol.clone(),
                value: e.value,
                recommendation: None,
            }));
        }
        for (ranking, entries) in recs {
            rows.extend(entries.iter().enumerate().map(|(i, e)| RankingRow {
                ranking,
                rank: i + 1,
                symbol: e.symbol.clone(),
                value: e.confidence,
                recommendation: Some(e.recommendation),
            }));
        }
        rows
    }
}

// =============================================================================
// Report
// =============================================================================

/// Everything written for one batch.  Row tables are sorted by symbol.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub analysis_date: NaiveDate,
    pub summary: Vec<SummaryRow>,
    pub signals: Vec<SignalRow>,
    pub technical: Vec<TechnicalRow>,
    pub rankings: Rankings,
}

impl Report {
    pub fn build(results: &[AnalysisResult], top_n: usize, analysis_date: NaiveDate) -> Self {
        let mut sorted: Vec<&AnalysisResult> = results.iter().collect();
        sorted.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        Self {
            analysis_date,
            summary: sorted
                .iter()
                .map(|r| SummaryRow::from_result(r, analysis_date))
                .collect(),
            signals: sorted.iter().map(|r| SignalRow::from_result(r)).collect(),
            technical: sorted.iter().map(|r| TechnicalRow::from_result(r)).collect(),
            rankings: Rankings::build(results, top_n),
        }
    }
}
