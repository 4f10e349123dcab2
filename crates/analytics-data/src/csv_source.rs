//! Offline provider backed by a directory of CSV files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use analytics_core::error::ProviderError;
use analytics_core::traits::MarketDataProvider;
use analytics_core::types::{Bar, BarSeries, Interval, Metadata, Period, SymbolMatch};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp", alias = "Datetime")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Serves `{SYMBOL}.csv` files from a directory.
///
/// The requested period is applied relative to the newest bar in the file;
/// the interval is taken as-is from the file. Metadata comes from an
/// optional `{SYMBOL}.json` next to the CSV.
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    /// Create a provider over an existing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(ProviderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("data directory {} does not exist", dir.display()),
            )));
        }
        Ok(Self { dir })
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol.to_uppercase()))
    }

    /// Symbols available in the directory, sorted.
    pub fn symbols(&self) -> Result<Vec<String>, ProviderError> {
        let mut symbols: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()? != "csv" {
                    return None;
                }
                Some(path.file_stem()?.to_string_lossy().to_uppercase())
            })
            .collect();
        symbols.sort();
        Ok(symbols)
    }

    /// Load bars from a specific path.
    fn load_from_path(path: &Path) -> Result<Vec<Bar>, ProviderError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let mut bars = Vec::new();

        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| ProviderError::Parse(e.to_string()))?;

            let timestamp = parse_timestamp(&record.date)?;

            bars.push(Bar::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ));
        }

        // Sort by timestamp
        bars.sort_by_key(|b| b.timestamp);

        Ok(bars)
    }

    fn load(&self, symbol: &str) -> Result<Vec<Bar>, ProviderError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        debug!(path = %path.display(), "Loading CSV bars");
        Self::load_from_path(&path)
    }
}

/// Keep the bars within `period` of the newest one.
fn trim_to_period(bars: Vec<Bar>, period: Period) -> Vec<Bar> {
    let (Some(days), Some(last)) = (period.approx_days(), bars.last()) else {
        return bars;
    };
    let cutoff = last.timestamp - Duration::days(days).num_milliseconds();
    bars.into_iter().filter(|b| b.timestamp > cutoff).collect()
}

/// Parse various timestamp formats.
fn parse_timestamp(date_str: &str) -> Result<i64, ProviderError> {
    let formats = [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d-%m-%Y",
    ];

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }

    // Try parsing as Unix timestamp
    if let Ok(ts) = date_str.parse::<i64>() {
        // Assume milliseconds if > 10 digits
        if ts > 10_000_000_000 {
            return Ok(ts);
        } else {
            return Ok(ts * 1000);
        }
    }

    Err(ProviderError::Parse(format!(
        "Could not parse date: {}",
        date_str
    )))
}

#[async_trait]
impl MarketDataProvider for CsvProvider {
    async fn history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<BarSeries, ProviderError> {
        let bars = trim_to_period(self.load(symbol)?, period);
        Ok(BarSeries::new(symbol, period, interval, bars))
    }

    async fn metadata(&self, symbol: &str) -> Result<Metadata, ProviderError> {
        let path = self.dir.join(format!("{}.json", symbol.to_uppercase()));
        if !path.exists() {
            return Ok(Metadata::new());
        }
        let text = std::fs::read_to_string(&path)?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Parse(e.to_string()))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>, ProviderError> {
        let needle = query.to_uppercase();
        Ok(self
            .symbols()?
            .into_iter()
            .filter(|s| s.contains(&needle))
            .take(limit)
            .map(|s| SymbolMatch {
                name: s.clone(),
                symbol: s,
                exchange: None,
                kind: Some("EQUITY".to_string()),
            })
            .collect())
    }

    async fn batch_daily_history(
        &self,
        symbols: &[String],
        period: Period,
    ) -> Result<BTreeMap<String, BarSeries>, ProviderError> {
        let mut out = BTreeMap::new();
        for symbol in symbols {
            match self.history(symbol, period, Interval::Daily).await {
                Ok(series) if !series.is_empty() => {
                    out.insert(symbol.clone(), series);
                }
                Ok(_) | Err(ProviderError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("analytics-csv-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_csv(dir: &Path, symbol: &str, rows: &[&str]) {
        let mut file = std::fs::File::create(dir.join(format!("{}.csv", symbol))).unwrap();
        writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
    }

    #[test]
    fn test_parse_timestamp() {
        // Test various formats
        assert!(parse_timestamp("2024-01-15").is_ok());
        assert!(parse_timestamp("2024-01-15 10:30:00").is_ok());
        assert!(parse_timestamp("2024-01-15T10:30:00Z").is_ok());
        assert!(parse_timestamp("1705312800000").is_ok()); // Unix ms
        assert!(parse_timestamp("1705312800").is_ok()); // Unix sec
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn test_history_and_search() {
        let dir = temp_dir("history");
        write_csv(
            &dir,
            "AAPL",
            &[
                "2024-01-03,101,102,100,101.5,1200",
                "2024-01-02,100,101,99,100.5,1000",
            ],
        );
        write_csv(&dir, "MSFT", &["2024-01-02,300,301,299,300.5,500"]);

        let provider = CsvProvider::new(&dir).unwrap();

        let series = provider.history("aapl", Period::Max, Interval::Daily).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![100.5, 101.5]);

        let matches = provider.search("ms", 8).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].symbol, "MSFT");

        let missing = provider.history("NOPE", Period::Max, Interval::Daily).await;
        assert!(matches!(missing, Err(ProviderError::NotFound(_))));

        let batch = provider
            .batch_daily_history(&["AAPL".to_string(), "NOPE".to_string()], Period::Max)
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);

        assert!(provider.metadata("AAPL").await.unwrap().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_trim_to_period() {
        let day = 86_400_000;
        let bars: Vec<Bar> = (0..10).map(|i| Bar::new(i * day, 1.0, 1.0, 1.0, 1.0, 1.0)).collect();

        assert_eq!(trim_to_period(bars.clone(), Period::Day5).len(), 5);
        assert_eq!(trim_to_period(bars, Period::Max).len(), 10);
    }

    #[test]
    fn test_missing_directory() {
        assert!(CsvProvider::new("/definitely/not/here").is_err());
    }
}
