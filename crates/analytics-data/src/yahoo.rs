//! Yahoo Finance HTTP provider.

use std::collections::BTreeMap;
use std::time::Duration;

use analytics_core::error::ProviderError;
use analytics_core::traits::MarketDataProvider;
use analytics_core::types::{Bar, BarSeries, Interval, Metadata, Period, SymbolMatch};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const DEFAULT_CHART_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_SEARCH_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

/// Default pause between the per-symbol requests of a batch.
pub const DEFAULT_BATCH_GAP: Duration = Duration::from_millis(250);

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile,defaultKeyStatistics";

/// Yahoo endpoints and client settings.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub chart_url: String,
    pub search_url: String,
    /// Visited once to obtain the session cookie the crumb is bound to
    pub cookie_url: String,
    pub timeout: Duration,
    pub batch_gap: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            chart_url: DEFAULT_CHART_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            timeout: Duration::from_secs(15),
            batch_gap: DEFAULT_BATCH_GAP,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<serde_json::Map<String, Value>>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    #[serde(default)]
    symbol: String,
    longname: Option<String>,
    shortname: Option<String>,
    exchange: Option<String>,
    #[serde(rename = "quoteType")]
    quote_type: Option<String>,
}

/// Market data from the public Yahoo Finance endpoints.
///
/// quoteSummary requires a crumb tied to a session cookie. Both are obtained
/// on first use, kept for the lifetime of the provider and refreshed once
/// when Yahoo rejects them.
pub struct YahooProvider {
    config: YahooConfig,
    client: Client,
    crumb: Mutex<Option<String>>,
}

impl YahooProvider {
    /// Create a provider with the given endpoints.
    pub fn new(config: YahooConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            config,
            client,
            crumb: Mutex::new(None),
        })
    }

    /// Current crumb, fetching a new one when absent or when `refresh` is set.
    async fn crumb(&self, refresh: bool) -> Result<String, ProviderError> {
        let mut slot = self.crumb.lock().await;
        if !refresh {
            if let Some(crumb) = slot.as_ref() {
                return Ok(crumb.clone());
            }
        }

        // Only the Set-Cookie header matters here; the page itself answers 404.
        self.client
            .get(&self.config.cookie_url)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let url = format!("{}/v1/test/getcrumb", self.config.chart_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        let crumb = check_status(resp, "crumb")
            .await?
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?
            .trim()
            .to_string();

        if crumb.is_empty() || crumb.contains(char::is_whitespace) {
            return Err(ProviderError::Parse(format!("unusable crumb: {:?}", crumb)));
        }

        debug!(refresh, "Obtained Yahoo crumb");
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    /// One quoteSummary call. `Ok(None)` means the crumb was rejected.
    async fn summary(&self, symbol: &str, crumb: &str) -> Result<Option<SummaryEnvelope>, ProviderError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.config.chart_url, symbol);
        let params = [
            ("modules", SUMMARY_MODULES.to_string()),
            ("crumb", crumb.to_string()),
        ];

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;
        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Ok(None);
        }

        let envelope = check_status(resp, symbol)
            .await?
            .json::<SummaryEnvelope>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(Some(envelope))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
        symbol: &str,
    ) -> Result<T, ProviderError> {
        debug!(url, symbol, "Yahoo request");
        let resp = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let resp = check_status(resp, symbol).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

async fn check_status(resp: Response, symbol: &str) -> Result<Response, ProviderError> {
    match resp.status() {
        status if status.is_success() => Ok(resp),
        StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited),
        StatusCode::NOT_FOUND => Err(ProviderError::NotFound(symbol.to_string())),
        status => {
            let text = resp.text().await.unwrap_or_default();
            Err(ProviderError::Http(format!("{}: {}", status, text)))
        }
    }
}

fn yahoo_error(err: YahooError, symbol: &str) -> ProviderError {
    if err.code.eq_ignore_ascii_case("Not Found") {
        ProviderError::NotFound(symbol.to_string())
    } else {
        ProviderError::Http(format!(
            "{}: {}",
            err.code,
            err.description.unwrap_or_default()
        ))
    }
}

/// Convert a chart payload into a bar series.
///
/// Rows with any missing OHLC value are dropped; a missing volume becomes 0.
fn parse_chart(
    envelope: ChartEnvelope,
    symbol: &str,
    period: Period,
    interval: Interval,
) -> Result<BarSeries, ProviderError> {
    if let Some(err) = envelope.chart.error {
        return Err(yahoo_error(err, symbol));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(BarSeries::new(symbol, period, interval, Vec::new()));
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();

    let bars = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            Some(Bar::new(
                ts * 1000,
                at(&quote.open, i)?,
                at(&quote.high, i)?,
                at(&quote.low, i)?,
                at(&quote.close, i)?,
                at(&quote.volume, i).unwrap_or(0.0),
            ))
        })
        .collect();

    Ok(BarSeries::new(symbol, period, interval, bars))
}

/// Flatten quoteSummary modules into one bag, unwrapping `{raw, fmt}` values.
fn flatten_summary(modules: serde_json::Map<String, Value>) -> Metadata {
    let mut meta = Metadata::new();

    for (_, module) in modules {
        let Value::Object(fields) = module else {
            continue;
        };
        for (key, value) in fields {
            let value = match value {
                Value::Object(mut inner) => match inner.remove("raw") {
                    Some(raw) => raw,
                    None => continue,
                },
                Value::Array(_) | Value::Null => continue,
                scalar => scalar,
            };
            if key == "exchangeName" {
                meta.insert("exchange", value.clone());
            }
            meta.insert(key, value);
        }
    }

    meta
}

fn to_match(quote: SearchQuote) -> SymbolMatch {
    SymbolMatch {
        name: quote
            .longname
            .or(quote.shortname)
            .unwrap_or_else(|| "N/A".to_string()),
        symbol: quote.symbol,
        exchange: quote.exchange,
        kind: quote.quote_type,
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn history(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<BarSeries, ProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.config.chart_url, symbol);
        let params = [
            ("range", period.to_string()),
            ("interval", interval.to_string()),
            ("includePrePost", "false".to_string()),
        ];

        let envelope: ChartEnvelope = self.get_json(&url, &params, symbol).await?;
        parse_chart(envelope, symbol, period, interval)
    }

    async fn metadata(&self, symbol: &str) -> Result<Metadata, ProviderError> {
        let crumb = self.crumb(false).await?;
        let envelope = match self.summary(symbol, &crumb).await? {
            Some(envelope) => envelope,
            None => {
                debug!(symbol, "Crumb rejected, refreshing");
                let crumb = self.crumb(true).await?;
                self.summary(symbol, &crumb).await?.ok_or_else(|| {
                    ProviderError::Http("quoteSummary rejected a fresh crumb".to_string())
                })?
            }
        };

        if let Some(err) = envelope.quote_summary.error {
            return Err(yahoo_error(err, symbol));
        }

        let modules = envelope
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .unwrap_or_default();
        Ok(flatten_summary(modules))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>, ProviderError> {
        let url = format!("{}/v1/finance/search", self.config.search_url);
        let params = [
            ("q", query.to_string()),
            ("quotesCount", limit.to_string()),
            ("newsCount", "0".to_string()),
        ];

        let envelope: SearchEnvelope = self.get_json(&url, &params, query).await?;
        Ok(envelope.quotes.into_iter().take(limit).map(to_match).collect())
    }

    async fn batch_daily_history(
        &self,
        symbols: &[String],
        period: Period,
    ) -> Result<BTreeMap<String, BarSeries>, ProviderError> {
        let mut out = BTreeMap::new();

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.config.batch_gap.is_zero() {
                tokio::time::sleep(self.config.batch_gap).await;
            }
            match self.history(symbol, period, Interval::Daily).await {
                Ok(series) if !series.is_empty() => {
                    out.insert(symbol.clone(), series);
                }
                Ok(_) | Err(ProviderError::NotFound(_)) => {
                    warn!(symbol = %symbol, "No daily history in batch");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> ChartEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_chart_drops_incomplete_rows() {
        let payload = envelope(json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AAPL" },
                    "timestamp": [1700000000, 1700000060, 1700000120],
                    "indicators": { "quote": [{
                        "open":   [1.0, null, 3.0],
                        "high":   [1.5, 2.5, 3.5],
                        "low":    [0.5, 1.5, 2.5],
                        "close":  [1.2, 2.2, 3.2],
                        "volume": [100, 200, null]
                    }]}
                }],
                "error": null
            }
        }));

        let series = parse_chart(payload, "AAPL", Period::Day1, Interval::Minute1).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].timestamp, 1_700_000_000_000);
        assert_eq!(series.bars()[1].close, 3.2);
        assert_eq!(series.bars()[1].volume, 0.0);
    }

    #[test]
    fn test_parse_chart_not_found() {
        let payload = envelope(json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }));

        let err = parse_chart(payload, "NOPE", Period::Month1, Interval::Daily).unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(ref s) if s == "NOPE"));
    }

    #[test]
    fn test_parse_chart_without_timestamps_is_empty() {
        let payload = envelope(json!({
            "chart": {
                "result": [{ "indicators": { "quote": [{}] } }],
                "error": null
            }
        }));

        let series = parse_chart(payload, "AAPL", Period::Day1, Interval::Minute5).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_flatten_summary() {
        let modules = json!({
            "price": {
                "shortName": "Apple Inc.",
                "exchangeName": "NasdaqGS",
                "marketCap": { "raw": 3000000000000u64, "fmt": "3T" }
            },
            "summaryDetail": {
                "trailingPE": { "raw": 30.5, "fmt": "30.50" },
                "dividendYield": {},
                "maxAge": 1
            },
            "assetProfile": {
                "sector": "Technology",
                "companyOfficers": []
            }
        });
        let Value::Object(map) = modules else { unreachable!() };

        let meta = flatten_summary(map);

        assert_eq!(meta.get_str("shortName").as_deref(), Some("Apple Inc."));
        assert_eq!(meta.get_str("exchange").as_deref(), Some("NasdaqGS"));
        assert_eq!(meta.get_u64("marketCap"), Some(3_000_000_000_000));
        assert_eq!(meta.get_f64("trailingPE"), Some(30.5));
        assert!(!meta.contains("dividendYield"));
        assert!(!meta.contains("companyOfficers"));
        assert_eq!(meta.get_str("sector").as_deref(), Some("Technology"));
    }

    mod fake {
        use std::collections::HashMap;
        use std::net::SocketAddr;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        use axum::extract::{Path, Query, State};
        use axum::http::{header, StatusCode};
        use axum::response::{IntoResponse, Response};
        use axum::routing::get;
        use axum::{Json, Router};
        use serde_json::json;

        /// Local stand-in for the Yahoo endpoints. Only the second crumb it
        /// hands out is accepted by quoteSummary.
        #[derive(Clone, Default)]
        pub struct FakeYahoo {
            pub crumbs: Arc<AtomicUsize>,
            pub summaries: Arc<AtomicUsize>,
        }

        async fn crumb(State(server): State<FakeYahoo>) -> String {
            let n = server.crumbs.fetch_add(1, Ordering::SeqCst) + 1;
            format!("crumb{}", n)
        }

        async fn summary(
            State(server): State<FakeYahoo>,
            Path(symbol): Path<String>,
            Query(params): Query<HashMap<String, String>>,
        ) -> Response {
            server.summaries.fetch_add(1, Ordering::SeqCst);
            if params.get("crumb").map(String::as_str) != Some("crumb2") {
                let body = json!({ "finance": { "error": { "code": "Unauthorized", "description": "Invalid Crumb" } } });
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
            Json(json!({
                "quoteSummary": {
                    "result": [{ "price": { "shortName": symbol, "marketCap": { "raw": 5000, "fmt": "5K" } } }],
                    "error": null
                }
            }))
            .into_response()
        }

        async fn chart() -> Json<serde_json::Value> {
            Json(json!({
                "chart": {
                    "result": [{
                        "timestamp": [1700000000],
                        "indicators": { "quote": [{
                            "open": [1.0], "high": [1.0], "low": [1.0], "close": [1.0], "volume": [10]
                        }]}
                    }],
                    "error": null
                }
            }))
        }

        pub async fn spawn() -> (FakeYahoo, SocketAddr) {
            let server = FakeYahoo::default();
            let app = Router::new()
                .route(
                    "/cookie",
                    get(|| async { (StatusCode::NOT_FOUND, [(header::SET_COOKIE, "A3=session; Path=/")]) }),
                )
                .route("/v1/test/getcrumb", get(crumb))
                .route("/v10/finance/quoteSummary/:symbol", get(summary))
                .route("/v8/finance/chart/:symbol", get(chart))
                .with_state(server.clone());

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            (server, addr)
        }
    }

    fn local_provider(addr: std::net::SocketAddr, batch_gap: Duration) -> YahooProvider {
        let base = format!("http://{}", addr);
        YahooProvider::new(YahooConfig {
            chart_url: base.clone(),
            search_url: base.clone(),
            cookie_url: format!("{}/cookie", base),
            timeout: Duration::from_secs(5),
            batch_gap,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_metadata_refreshes_rejected_crumb_once() {
        use std::sync::atomic::Ordering;

        let (server, addr) = fake::spawn().await;
        let provider = local_provider(addr, Duration::ZERO);

        let meta = provider.metadata("ACME").await.unwrap();
        assert_eq!(meta.get_str("shortName").as_deref(), Some("ACME"));
        assert_eq!(meta.get_u64("marketCap"), Some(5000));
        assert_eq!(server.crumbs.load(Ordering::SeqCst), 2);
        assert_eq!(server.summaries.load(Ordering::SeqCst), 2);

        // The accepted crumb is reused.
        provider.metadata("ACME").await.unwrap();
        assert_eq!(server.crumbs.load(Ordering::SeqCst), 2);
        assert_eq!(server.summaries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_batch_spaces_out_requests() {
        let (_server, addr) = fake::spawn().await;
        let provider = local_provider(addr, Duration::from_millis(60));
        let symbols: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();

        let started = std::time::Instant::now();
        let batch = provider.batch_daily_history(&symbols, Period::Day5).await.unwrap();

        assert_eq!(batch.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn test_search_match_name_fallbacks() {
        let quote = SearchQuote {
            symbol: "TSLA".into(),
            longname: None,
            shortname: Some("Tesla".into()),
            exchange: Some("NMS".into()),
            quote_type: Some("EQUITY".into()),
        };
        let m = to_match(quote);
        assert_eq!(m.name, "Tesla");
        assert_eq!(m.kind.as_deref(), Some("EQUITY"));

        let bare = SearchQuote {
            symbol: "X".into(),
            longname: None,
            shortname: None,
            exchange: None,
            quote_type: None,
        };
        assert_eq!(to_match(bare).name, "N/A");
    }
}
