// =============================================================================
// CSV Exporter
// =============================================================================
//
// Writes per-symbol detail files and the per-batch report tables into an
// explicit output directory.  Undefined numeric values are written as empty
// cells so they read back as missing rather than as a sentinel.
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::AnalyzedSymbol;
use crate::report::{Report, SummaryRow};
use crate::returns::{cumulative_returns, daily_returns, rolling_volatility, VOLATILITY_WINDOW};

/// File stamp used in batch report names, e.g. `20240701_1530`.
pub fn export_stamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M").to_string()
}

fn cell(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

fn opt_cell(value: Option<f64>) -> String {
    value.map(cell).unwrap_or_default()
}

/// Paths of the four batch tables.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub summary: PathBuf,
    pub signals: PathBuf,
    pub technical: PathBuf,
    pub rankings: PathBuf,
}

pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn prepare(&self, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("failed to create output directory {}", self.output_dir.display())
        })?;
        Ok(self.output_dir.join(file_name))
    }

    fn write_rows<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<PathBuf> {
        let path = self.prepare(file_name)?;
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("failed to write row to {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;
        debug!(path = %path.display(), rows = rows.len(), "csv written");
        Ok(path)
    }

    /// `<SYM>_technical_data.csv`: one row per bar with every indicator
    /// column plus returns and annualised volatility.
    pub fn write_technical_data(&self, analyzed: &AnalyzedSymbol) -> Result<PathBuf> {
        let symbol = &analyzed.result.symbol;
        let path = self.prepare(&format!("{symbol}_technical_data.csv"))?;
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let columns = analyzed.indicators.columns();
        let mut header = vec!["Date", "Open", "High", "Low", "Close", "Volume"];
        header.extend(columns.iter().map(|(name, _)| *name));
        header.extend(["Daily_Return", "Cumulative_Return", "Volatility"]);
        writer.write_record(&header)?;

        let daily = daily_returns(&analyzed.series.closes());
        let cumulative = cumulative_returns(&daily);
        let volatility = rolling_volatility(&daily, VOLATILITY_WINDOW);

        for (i, bar) in analyzed.series.bars().iter().enumerate() {
            let mut record = vec![
                bar.date.to_string(),
                cell(bar.open),
                cell(bar.high),
                cell(bar.low),
                cell(bar.close),
                bar.volume.to_string(),
            ];
            record.extend(columns.iter().map(|(_, series)| cell(series[i])));
            record.extend([cell(daily[i]), cell(cumulative[i]), cell(volatility[i])]);
            writer
                .write_record(&record)
                .with_context(|| format!("failed to write bar {i} to {}", path.display()))?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// `<SYM>_analysis_summary.csv`: Metric,Value pairs for the latest bar.
    pub fn write_analysis_summary(&self, analyzed: &AnalyzedSymbol) -> Result<PathBuf> {
        let r = &analyzed.result;
        let path = self.prepare(&format!("{}_analysis_summary.csv", r.symbol))?;
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let mut metrics: Vec<(String, String)> = vec![
            ("as_of".into(), r.as_of.to_string()),
            ("last_price".into(), cell(r.last_price)),
            ("volume".into(), r.last_volume.to_string()),
            ("rsi".into(), opt_cell(r.rsi)),
            ("macd".into(), opt_cell(r.macd)),
            ("stochastic_k".into(), opt_cell(r.stochastic_k)),
            ("mfi".into(), opt_cell(r.mfi)),
            ("atr".into(), opt_cell(r.atr)),
            ("roc".into(), opt_cell(r.roc)),
            ("bollinger_pct_b".into(), opt_cell(r.bollinger_pct_b)),
            ("technical_strength".into(), opt_cell(r.technical_strength)),
            ("recommendation".into(), r.recommendation.label.to_string()),
            ("confidence".into(), cell(r.recommendation.confidence)),
            ("reasoning".into(), r.recommendation.reasoning_text()),
        ];
        metrics.extend(r.signals.entries().iter().map(|(key, label)| {
            (format!("signal_{key}"), label.unwrap_or("N/A").to_string())
        }));

        writer.write_record(["Metric", "Value"])?;
        for (metric, value) in &metrics {
            writer.write_record([metric, value])?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_symbol(&self, analyzed: &AnalyzedSymbol) -> Result<()> {
        self.write_technical_data(analyzed)?;
        self.write_analysis_summary(analyzed)?;
        info!(symbol = %analyzed.result.symbol, "symbol data exported");
        Ok(())
    }

    /// Write the four batch tables, each stamped with `stamp`.
    pub fn write_report(&self, report: &Report, stamp: &str) -> Result<ReportFiles> {
        let files = ReportFiles {
            summary: self.write_rows(&format!("summary_{stamp}.csv"), &report.summary)?,
            signals: self.write_rows(&format!("signals_{stamp}.csv"), &report.signals)?,
            technical: self.write_rows(&format!("technical_{stamp}.csv"), &report.technical)?,
            rankings: self.write_rows(&format!("rankings_{stamp}.csv"), &report.rankings.rows())?,
        };
        info!(
            dir = %self.output_dir.display(),
            symbols = report.summary.len(),
            "batch report written"
        );
        Ok(files)
    }
}

/// Read a summary table written by [`Exporter::write_report`].
pub fn read_summary(path: &Path) -> Result<Vec<SummaryRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<SummaryRow>, csv::Error>>()
        .with_context(|| format!("failed to parse summary rows from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::report::tests::result;
    use crate::report::DEFAULT_TOP_N;
    use crate::signals::{MissingValuePolicy, Recommendation};
    use crate::types::test_support::series_from_closes;
    use chrono::{NaiveDate, TimeZone};
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    #[test]
    fn summary_round_trip_preserves_values() {
        let dir = tempdir().unwrap();
        let mut a = result("AAPL", Some(61.234_567_891), Recommendation::Buy, 62.5);
        a.last_price = 187.123_456_789;
        a.macd = Some(-0.000_123_456);
        let b = result("NVDA", None, Recommendation::Hold, 50.0);
        let report = Report::build(&[a.clone(), b], DEFAULT_TOP_N, date());

        let exporter = Exporter::new(dir.path().join("out"));
        let files = exporter.write_report(&report, "20240701_0930").unwrap();
        let rows = read_summary(&files.summary).unwrap();

        assert_eq!(rows, report.summary);
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(rows[0].last_price, a.last_price);
        assert_eq!(rows[0].rsi, a.rsi);
        assert_eq!(rows[0].macd, a.macd);
        assert_eq!(rows[1].rsi, None);
    }

    #[test]
    fn report_files_are_stamped() {
        let dir = tempdir().unwrap();
        let report = Report::build(
            &[result("V", Some(40.0), Recommendation::Sell, 30.0)],
            DEFAULT_TOP_N,
            date(),
        );
        let files = Exporter::new(dir.path()).write_report(&report, "stamp").unwrap();
        for path in [&files.summary, &files.signals, &files.technical, &files.rankings] {
            assert!(path.exists(), "{} missing", path.display());
        }
        assert!(files.rankings.ends_with("rankings_stamp.csv"));
        let technical = fs::read_to_string(&files.technical).unwrap();
        assert!(technical.starts_with("Symbol,Price,Recommendation,Confidence Score"));
        assert!(technical.contains("Sell,30.0%"));
    }

    #[test]
    fn technical_data_has_one_row_per_bar() {
        let dir = tempdir().unwrap();
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.5).sin()).collect();
        let analyzed = analyze("JPM", series_from_closes(&closes), MissingValuePolicy::Lenient).unwrap();
        let exporter = Exporter::new(dir.path());
        let path = exporter.write_technical_data(&analyzed).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 6 + 16 + 3);
        assert_eq!(&headers[6], "RSI");
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 40);
        // SMA_200 never defined on 40 bars
        let sma_200 = headers.iter().position(|h| h == "SMA_200").unwrap();
        assert!(records.iter().all(|r| r[sma_200].is_empty()));
        assert_eq!(&records[0][0], "2024-01-01");
    }

    #[test]
    fn analysis_summary_lists_metrics() {
        let dir = tempdir().unwrap();
        let closes: Vec<f64> = (0..30).map(|i| 20.0 + i as f64 * 0.1).collect();
        let analyzed = analyze("WMT", series_from_closes(&closes), MissingValuePolicy::Lenient).unwrap();
        let path = Exporter::new(dir.path()).write_analysis_summary(&analyzed).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Metric,Value\n"));
        assert!(text.contains("recommendation,Hold"));
        assert!(text.contains("signal_Long_Term_Trend,N/A"));
    }

    #[test]
    fn stamp_format() {
        let now = Local.with_ymd_and_hms(2024, 7, 1, 15, 30, 0).unwrap();
        assert_eq!(export_stamp(now), "20240701_1530");
    }
}
