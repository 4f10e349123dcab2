//! Quote, company, search, overview and comparison payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Descriptive key/value bag returned by the upstream metadata call.
///
/// Keys follow the upstream naming (`shortName`, `marketCap`, `trailingPE`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.get(key).map_or(false, |v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0
            .get(key)
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Latest price snapshot for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub ticker: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub prev_close: f64,
    pub volume: u64,
    pub market_cap: Option<u64>,
    pub pe_ratio: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Company profile; everything except the name is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub ticker: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_pe: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_52_high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_52_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_volume: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

impl CompanyInfo {
    /// Bare profile used when upstream has nothing useful.
    pub fn unknown(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            ..Default::default()
        }
    }

    /// Build a profile from an upstream metadata bag.
    ///
    /// Returns the bare profile when the bag has no `shortName`.
    pub fn from_metadata(ticker: &str, meta: &Metadata) -> Self {
        if !meta.contains("shortName") {
            return Self::unknown(ticker);
        }
        Self {
            ticker: ticker.to_string(),
            name: meta
                .get_str("longName")
                .or_else(|| meta.get_str("shortName"))
                .unwrap_or_else(|| ticker.to_string()),
            sector: meta.get_str("sector"),
            industry: meta.get_str("industry"),
            country: meta.get_str("country"),
            website: meta.get_str("website"),
            description: meta.get_str("longBusinessSummary"),
            employees: meta.get_u64("fullTimeEmployees"),
            market_cap: meta.get_u64("marketCap"),
            pe_ratio: meta.get_f64("trailingPE"),
            forward_pe: meta.get_f64("forwardPE"),
            dividend_yield: meta.get_f64("dividendYield"),
            beta: meta.get_f64("beta"),
            week_52_high: meta.get_f64("fiftyTwoWeekHigh"),
            week_52_low: meta.get_f64("fiftyTwoWeekLow"),
            avg_volume: meta.get_u64("averageVolume"),
            exchange: meta.get_str("exchange"),
        }
    }
}

/// Candidate returned by a symbol search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Day-over-day move of one symbol in the market overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_pct: f64,
    pub volume: u64,
}

/// Fixed index and mega-cap baskets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketOverview {
    pub indices: Vec<Mover>,
    pub mega_cap: Vec<Mover>,
}

/// One date of the normalised comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub date: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Return and volatility summary for one compared symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub return_pct: f64,
    pub volatility_pct: f64,
    pub start: f64,
    pub end: f64,
    pub high: f64,
    pub low: f64,
}

/// Multi-symbol comparison over a common period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub tickers: Vec<String>,
    pub period: String,
    pub chart: Vec<ComparisonPoint>,
    pub correlation: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    pub performance: BTreeMap<String, PerformanceStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Metadata {
        match value {
            Value::Object(map) => Metadata(map),
            _ => Metadata::new(),
        }
    }

    #[test]
    fn test_company_info_prefers_long_name() {
        let meta = bag(json!({
            "shortName": "Apple",
            "longName": "Apple Inc.",
            "sector": "Technology",
            "marketCap": 3.1e12,
            "trailingPE": 31.2,
            "fullTimeEmployees": 161000
        }));
        let info = CompanyInfo::from_metadata("AAPL", &meta);
        assert_eq!(info.name, "Apple Inc.");
        assert_eq!(info.sector.as_deref(), Some("Technology"));
        assert_eq!(info.market_cap, Some(3_100_000_000_000));
        assert_eq!(info.pe_ratio, Some(31.2));
        assert_eq!(info.employees, Some(161000));
    }

    #[test]
    fn test_company_info_without_short_name() {
        let meta = bag(json!({ "longName": "Something" }));
        assert_eq!(CompanyInfo::from_metadata("XYZ", &meta), CompanyInfo::unknown("XYZ"));
    }

    #[test]
    fn test_unknown_info_serializes_compactly() {
        let value = serde_json::to_value(CompanyInfo::unknown("XYZ")).unwrap();
        assert_eq!(value, json!({ "ticker": "XYZ", "name": "XYZ" }));
    }

    #[test]
    fn test_comparison_point_flattens() {
        let mut values = BTreeMap::new();
        values.insert("AAPL".to_string(), 101.5);
        let point = ComparisonPoint { date: "2024-01-02".into(), values };
        let value = serde_json::to_value(point).unwrap();
        assert_eq!(value, json!({ "date": "2024-01-02", "AAPL": 101.5 }));
    }
}
