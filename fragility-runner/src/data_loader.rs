//! Input loading for the monitor.
//!
//! Three file-backed providers read CSV tables, and a synthetic provider
//! generates deterministic data for development. [`load_inputs`] pulls all
//! three tables through the provider traits and applies the degradation
//! policy:
//! 1. Price provider failure → error (the run cannot continue)
//! 2. Macro provider failure → warn, empty macro table (drawdown proxy takes over)
//! 3. Filing provider failure → warn, no filings (narrative components undefined)
//!
//! Synthetic data is a developer-only debug mode. Results produced on
//! synthetic data are tagged.

use chrono::{Datelike, Duration, NaiveDate};
use fragility_core::data::{
    DataError, DataSource, FilingDataProvider, FilingSignals, MacroData, MacroDataProvider,
    MarketData, MarketDataProvider,
};
use fragility_core::domain::{FilingSignal, Frame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::MonitorConfig;

/// Every input table for one run.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub prices: Frame,
    pub macro_series: Frame,
    pub filings: Vec<FilingSignal>,
    /// Source per table (`prices`, `macro`, `filings`).
    pub sources: BTreeMap<String, DataSource>,
    /// BLAKE3 over all three tables.
    pub dataset_hash: String,
    /// Whether any table is synthetic.
    pub has_synthetic: bool,
}

/// Fetch all three tables for `config` through the given providers.
pub fn load_inputs(
    config: &MonitorConfig,
    market: &dyn MarketDataProvider,
    macro_provider: &dyn MacroDataProvider,
    filing_provider: &dyn FilingDataProvider,
) -> Result<LoadedData, DataError> {
    let MarketData { prices, source } = market.fetch_prices(&config.all_tickers())?;
    tracing::info!(
        provider = market.name(),
        rows = prices.nrows(),
        tickers = prices.columns.len(),
        "loaded prices"
    );
    let mut sources = BTreeMap::from([("prices".to_string(), source)]);

    let macro_series = match macro_provider.fetch_series(&config.macro_series.series) {
        Ok(MacroData { series, source }) => {
            tracing::info!(
                provider = macro_provider.name(),
                rows = series.nrows(),
                series = series.columns.len(),
                "loaded macro series"
            );
            sources.insert("macro".into(), source);
            series
        }
        Err(e) => {
            tracing::warn!(provider = macro_provider.name(), error = %e, "macro data unavailable");
            Frame::default()
        }
    };

    let filings = match filing_provider.fetch_signals(&config.market.ai_tickers) {
        Ok(FilingSignals { metrics, source }) => {
            tracing::info!(
                provider = filing_provider.name(),
                filings = metrics.len(),
                "loaded filing signals"
            );
            sources.insert("filings".into(), source);
            metrics
        }
        Err(e) => {
            tracing::warn!(provider = filing_provider.name(), error = %e, "filing signals unavailable");
            Vec::new()
        }
    };

    let has_synthetic = sources.values().any(|s| *s == DataSource::Synthetic);
    if has_synthetic {
        tracing::warn!("synthetic data in use; results are tagged as synthetic");
    }
    let dataset_hash = compute_dataset_hash(&prices, &macro_series, &filings);

    Ok(LoadedData {
        prices,
        macro_series,
        filings,
        sources,
        dataset_hash,
        has_synthetic,
    })
}

/// Compute a deterministic BLAKE3 hash over every input table.
///
/// Columns are hashed in name order and filings in their given order, so the
/// hash only depends on content.
pub fn compute_dataset_hash(prices: &Frame, macro_series: &Frame, filings: &[FilingSignal]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (tag, frame) in [("prices", prices), ("macro", macro_series)] {
        hasher.update(tag.as_bytes());
        for date in &frame.index {
            hasher.update(date.to_string().as_bytes());
        }
        for (name, values) in &frame.columns {
            hasher.update(name.as_bytes());
            for v in values {
                hasher.update(&v.to_le_bytes());
            }
        }
    }
    hasher.update(b"filings");
    for f in filings {
        hasher.update(f.date.to_string().as_bytes());
        hasher.update(f.ticker.as_bytes());
        hasher.update(&f.ai_density.to_le_bytes());
        hasher.update(&f.pricing_pressure.to_le_bytes());
        hasher.update(&f.risk_language.to_le_bytes());
        hasher.update(&f.efficiency_transform_ratio.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ─── CSV providers ──────────────────────────────────────────────────

/// Wide price table: `date,<ticker>,<ticker>,...`. Empty cells are undefined.
#[derive(Debug, Clone)]
pub struct CsvMarketProvider {
    pub path: PathBuf,
}

/// Wide macro table: `date,<series>,...`. A column may be named by its engine
/// name (`hy_spread`) or by its provider series id (`BAMLH0A0HYM2`).
#[derive(Debug, Clone)]
pub struct CsvMacroProvider {
    pub path: PathBuf,
}

/// Long filing table:
/// `date,ticker,ai_density,pricing_pressure,risk_language,efficiency_transform_ratio`.
#[derive(Debug, Clone)]
pub struct CsvFilingProvider {
    pub path: PathBuf,
}

impl MarketDataProvider for CsvMarketProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_prices(&self, tickers: &[String]) -> Result<MarketData, DataError> {
        let table = read_wide_csv(&self.path)?;
        let names: Vec<&str> = tickers.iter().map(String::as_str).collect();
        Ok(MarketData {
            prices: table.select(&names),
            source: DataSource::CsvImport,
        })
    }
}

impl MacroDataProvider for CsvMacroProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_series(&self, series: &BTreeMap<String, String>) -> Result<MacroData, DataError> {
        let table = read_wide_csv(&self.path)?;
        let mut out = Frame::new(table.index.clone());
        for (engine_name, series_id) in series {
            let values = table
                .values(engine_name)
                .or_else(|| table.values(series_id));
            if let Some(values) = values {
                out.insert(engine_name.as_str(), values.to_vec());
            }
        }
        Ok(MacroData {
            series: out.drop_all_undefined_rows(),
            source: DataSource::CsvImport,
        })
    }
}

impl FilingDataProvider for CsvFilingProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_signals(&self, tickers: &[String]) -> Result<FilingSignals, DataError> {
        let mut reader = open_csv(&self.path)?;
        let source_name = self.path.display().to_string();
        let mut metrics = Vec::new();
        for (row, record) in reader.deserialize::<FilingSignal>().enumerate() {
            let filing = record.map_err(|e| DataError::Parse {
                source_name: source_name.clone(),
                row: row + 1,
                message: e.to_string(),
            })?;
            if tickers.contains(&filing.ticker) {
                metrics.push(filing);
            }
        }
        metrics.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
        Ok(FilingSignals {
            metrics,
            source: DataSource::CsvImport,
        })
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, DataError> {
    if !path.exists() {
        return Err(DataError::SourceNotFound(path.display().to_string()));
    }
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Read a `date,<col>,...` table into a frame.
fn read_wide_csv(path: &Path) -> Result<Frame, DataError> {
    let mut reader = open_csv(path)?;
    let source_name = path.display().to_string();
    let parse_error = |row: usize, message: String| DataError::Parse {
        source_name: source_name.clone(),
        row,
        message,
    };

    let headers = reader
        .headers()
        .map_err(|e| parse_error(0, e.to_string()))?
        .clone();
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut observations = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let row = i + 1;
        let record = record.map_err(|e| parse_error(row, e.to_string()))?;
        let date_field = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d")
            .map_err(|e| parse_error(row, format!("bad date '{date_field}': {e}")))?;
        for (name, cell) in columns.iter().zip(record.iter().skip(1)) {
            let value = parse_cell(cell).map_err(|message| parse_error(row, message))?;
            observations.push((date, name.clone(), value));
        }
    }
    Ok(Frame::from_observations(observations))
}

/// Empty and `NaN`-like cells are undefined.
fn parse_cell(cell: &str) -> Result<f64, String> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell == "." {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .map_err(|e| format!("bad number '{cell}': {e}"))
}

// ─── Synthetic provider ─────────────────────────────────────────────

/// Deterministic synthetic inputs for development.
///
/// Prices are weekday random walks seeded from the ticker name; filings are
/// quarterly with seeded metrics; the macro table is empty so the drawdown
/// proxy is exercised.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_prices(&self, tickers: &[String]) -> Result<MarketData, DataError> {
        let mut observations = Vec::new();
        for ticker in tickers {
            for (date, close) in generate_synthetic_closes(ticker, self.start, self.end) {
                observations.push((date, ticker.clone(), close));
            }
        }
        Ok(MarketData {
            prices: Frame::from_observations(observations),
            source: DataSource::Synthetic,
        })
    }
}

impl MacroDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_series(&self, _series: &BTreeMap<String, String>) -> Result<MacroData, DataError> {
        Ok(MacroData {
            series: Frame::default(),
            source: DataSource::Synthetic,
        })
    }
}

impl FilingDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_signals(&self, tickers: &[String]) -> Result<FilingSignals, DataError> {
        let mut metrics: Vec<FilingSignal> = tickers
            .iter()
            .flat_map(|t| generate_synthetic_filings(t, self.start, self.end))
            .collect();
        metrics.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
        Ok(FilingSignals {
            metrics,
            source: DataSource::Synthetic,
        })
    }
}

fn seeded_rng(key: &str) -> StdRng {
    let seed: [u8; 32] = *blake3::hash(key.as_bytes()).as_bytes();
    StdRng::from_seed(seed)
}

/// Weekday random walk from 100.0.
fn generate_synthetic_closes(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, f64)> {
    let mut rng = seeded_rng(ticker);
    let mut closes = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += Duration::days(1);
            continue;
        }
        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        price *= 1.0 + daily_return;
        closes.push((current, price));
        current += Duration::days(1);
    }
    closes
}

/// One filing per quarter, 45 days after each quarter start.
fn generate_synthetic_filings(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<FilingSignal> {
    let mut rng = seeded_rng(&format!("filings:{ticker}"));
    let mut filings = Vec::new();
    let mut quarter_start = NaiveDate::from_ymd_opt(start.year(), 1, 1).unwrap_or(start);
    while quarter_start <= end {
        let date = quarter_start + Duration::days(45);
        if date >= start && date <= end {
            filings.push(FilingSignal {
                date,
                ticker: ticker.to_string(),
                ai_density: rng.gen_range(0.5..5.0),
                pricing_pressure: rng.gen_range(0.0..2.0),
                risk_language: rng.gen_range(0.0..3.0),
                efficiency_transform_ratio: rng.gen_range(0.5..2.0),
            });
        }
        quarter_start = next_quarter(quarter_start);
    }
    filings
}

fn next_quarter(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() >= 10 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 3)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date + Duration::days(91))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn csv_prices_select_requested_tickers() {
        let file = write_temp("date,NVDA,SPY,XOM\n2024-01-02,500,470,100\n2024-01-03,,472,101\n");
        let provider = CsvMarketProvider {
            path: file.path().to_path_buf(),
        };
        let data = provider.fetch_prices(&tickers(&["NVDA", "SPY", "AMD"])).unwrap();
        assert_eq!(data.prices.column_names(), vec!["NVDA", "SPY"]);
        assert_eq!(data.prices.index, vec![d(2024, 1, 2), d(2024, 1, 3)]);
        assert!(data.prices.values("NVDA").unwrap()[1].is_nan());
        assert_eq!(data.source, DataSource::CsvImport);
    }

    #[test]
    fn csv_bad_number_reports_row() {
        let file = write_temp("date,NVDA\n2024-01-02,abc\n");
        let provider = CsvMarketProvider {
            path: file.path().to_path_buf(),
        };
        let err = provider.fetch_prices(&tickers(&["NVDA"])).unwrap_err();
        assert!(matches!(err, DataError::Parse { row: 1, .. }));
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let provider = CsvMarketProvider {
            path: PathBuf::from("/nonexistent/prices.csv"),
        };
        assert!(matches!(
            provider.fetch_prices(&tickers(&["NVDA"])),
            Err(DataError::SourceNotFound(_))
        ));
    }

    #[test]
    fn csv_macro_accepts_series_ids() {
        let file = write_temp("date,BAMLH0A0HYM2,vix\n2024-01-02,3.5,13\n2024-01-03,3.6,\n");
        let provider = CsvMacroProvider {
            path: file.path().to_path_buf(),
        };
        let series = BTreeMap::from([
            ("hy_spread".to_string(), "BAMLH0A0HYM2".to_string()),
            ("vix".to_string(), "VIXCLS".to_string()),
        ]);
        let data = provider.fetch_series(&series).unwrap();
        assert_eq!(data.series.values("hy_spread").unwrap(), &[3.5, 3.6]);
        assert!(data.series.values("vix").unwrap()[1].is_nan());
    }

    #[test]
    fn csv_filings_filter_and_sort() {
        let file = write_temp(
            "date,ticker,ai_density,pricing_pressure,risk_language,efficiency_transform_ratio\n\
             2024-05-01,NVDA,2.0,0.5,1.0,1.2\n\
             2024-02-01,MSFT,1.5,0.2,0.8,0.9\n\
             2024-02-01,XOM,0.1,0.1,0.1,0.1\n",
        );
        let provider = CsvFilingProvider {
            path: file.path().to_path_buf(),
        };
        let data = provider.fetch_signals(&tickers(&["NVDA", "MSFT"])).unwrap();
        assert_eq!(data.metrics.len(), 2);
        assert_eq!(data.metrics[0].ticker, "MSFT");
        assert_eq!(data.metrics[1].date, d(2024, 5, 1));
    }

    #[test]
    fn csv_filings_blank_metric_is_undefined() {
        let file = write_temp(
            "date,ticker,ai_density,pricing_pressure,risk_language,efficiency_transform_ratio\n\
             2024-02-01,NVDA,2.0,,1.0,1.2\n\
             2024-05-01,NVDA,2.5,0.4,1.1,1.3\n",
        );
        let provider = CsvFilingProvider {
            path: file.path().to_path_buf(),
        };
        let data = provider.fetch_signals(&tickers(&["NVDA"])).unwrap();
        assert_eq!(data.metrics.len(), 2);
        assert!(data.metrics[0].pricing_pressure.is_nan());
        assert_eq!(data.metrics[0].ai_density, 2.0);
        assert_eq!(data.metrics[1].pricing_pressure, 0.4);
    }

    #[test]
    fn synthetic_data_is_deterministic() {
        let a = generate_synthetic_closes("SPY", d(2024, 1, 1), d(2024, 1, 31));
        let b = generate_synthetic_closes("SPY", d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(a, b);
        // Weekdays only
        assert!(a.iter().all(|(date, _)| date.weekday().num_days_from_monday() < 5));
    }

    #[test]
    fn different_tickers_get_different_synthetic_data() {
        let spy = generate_synthetic_closes("SPY", d(2024, 1, 1), d(2024, 1, 31));
        let qqq = generate_synthetic_closes("QQQ", d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(spy.len(), qqq.len());
        assert_ne!(spy[0].1, qqq[0].1);
    }

    #[test]
    fn synthetic_filings_are_quarterly() {
        let filings = generate_synthetic_filings("NVDA", d(2023, 1, 1), d(2023, 12, 31));
        let dates: Vec<NaiveDate> = filings.iter().map(|f| f.date).collect();
        assert_eq!(
            dates,
            vec![d(2023, 2, 15), d(2023, 5, 16), d(2023, 8, 15), d(2023, 11, 15)]
        );
    }

    #[test]
    fn dataset_hash_is_content_addressed() {
        let provider = SyntheticProvider::new(d(2024, 1, 1), d(2024, 3, 31));
        let prices = provider.fetch_prices(&tickers(&["NVDA", "SPY"])).unwrap().prices;
        let h1 = compute_dataset_hash(&prices, &Frame::default(), &[]);
        let h2 = compute_dataset_hash(&prices, &Frame::default(), &[]);
        assert_eq!(h1, h2);

        let mut changed = prices.clone();
        if let Some(col) = changed.columns.get_mut("NVDA") {
            col[0] += 1.0;
        }
        assert_ne!(h1, compute_dataset_hash(&changed, &Frame::default(), &[]));
    }

    #[test]
    fn failing_side_providers_degrade() {
        let config = MonitorConfig::default();
        let synthetic = SyntheticProvider::new(d(2024, 1, 1), d(2024, 3, 31));
        let missing_macro = CsvMacroProvider {
            path: PathBuf::from("/nonexistent/macro.csv"),
        };
        let missing_filings = CsvFilingProvider {
            path: PathBuf::from("/nonexistent/filings.csv"),
        };
        let loaded = load_inputs(&config, &synthetic, &missing_macro, &missing_filings).unwrap();
        assert!(loaded.macro_series.columns.is_empty());
        assert!(loaded.filings.is_empty());
        assert!(loaded.has_synthetic);
        assert!(!loaded.sources.contains_key("macro"));
    }
}
