//! REST handlers.

use analytics_core::error::FetchError;
use analytics_core::types::{
    CompanyInfo, ComparisonReport, EnrichedBar, IndicatorValues, Interval, MarketOverview, Period,
    QuoteSnapshot, SignalReport, SymbolMatch,
};
use analytics_core::{round_dp, round_opt};
use analytics_indicators::FibonacciLevels;
use analytics_monitor::HealthReport;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Most symbols a comparison accepts.
pub const MAX_COMPARE: usize = 10;

fn default_chart_period() -> String {
    "1d".to_string()
}

fn default_chart_interval() -> String {
    "5m".to_string()
}

fn default_signal_period() -> String {
    "1mo".to_string()
}

fn default_daily() -> String {
    "1d".to_string()
}

fn default_long_period() -> String {
    "3mo".to_string()
}

fn default_limit() -> usize {
    8
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    #[serde(default = "default_chart_period")]
    period: String,
    #[serde(default = "default_chart_interval")]
    interval: String,
}

#[derive(Debug, Deserialize)]
pub struct SignalQuery {
    #[serde(default = "default_signal_period")]
    period: String,
    #[serde(default = "default_daily")]
    interval: String,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    #[serde(default = "default_long_period")]
    period: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    tickers: String,
    #[serde(default = "default_long_period")]
    period: String,
}

fn parse_period(raw: &str) -> Result<Period, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

fn parse_interval(raw: &str) -> Result<Interval, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

/// One chart point.
#[derive(Debug, Serialize)]
pub struct ChartPoint {
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub indicators: IndicatorValues,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub ticker: String,
    pub period: Period,
    pub interval: Interval,
    pub points: usize,
    pub data: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
pub struct FibonacciResponse {
    pub ticker: String,
    pub period: Period,
    #[serde(flatten)]
    pub levels: FibonacciLevels,
}

#[derive(Debug, Serialize)]
pub struct LegacyPoint {
    pub time: String,
    pub price: f64,
    pub volume: u64,
    pub rsi: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LegacyResponse {
    pub ticker: String,
    pub data: Vec<LegacyPoint>,
}

/// Indicator values at display precision.
fn rounded(values: &IndicatorValues) -> IndicatorValues {
    IndicatorValues {
        rsi_14: round_opt(values.rsi_14, 2),
        sma_20: round_opt(values.sma_20, 2),
        sma_50: round_opt(values.sma_50, 2),
        ema_12: round_opt(values.ema_12, 2),
        ema_26: round_opt(values.ema_26, 2),
        macd: round_opt(values.macd, 4),
        macd_signal: round_opt(values.macd_signal, 4),
        macd_histogram: round_opt(values.macd_histogram, 4),
        bb_upper: round_opt(values.bb_upper, 2),
        bb_middle: round_opt(values.bb_middle, 2),
        bb_lower: round_opt(values.bb_lower, 2),
        vwap: round_opt(values.vwap, 2),
        atr_14: round_opt(values.atr_14, 4),
        stoch_k: round_opt(values.stoch_k, 2),
        stoch_d: round_opt(values.stoch_d, 2),
        obv: round_opt(values.obv, 0),
    }
}

fn chart_point(row: &EnrichedBar, interval: Interval) -> ChartPoint {
    let format = if interval.is_intraday() { "%H:%M" } else { "%Y-%m-%d" };
    ChartPoint {
        time: row.bar.datetime().format(format).to_string(),
        open: round_dp(row.bar.open, 2),
        high: round_dp(row.bar.high, 2),
        low: round_dp(row.bar.low, 2),
        close: round_dp(row.bar.close, 2),
        volume: row.bar.volume.max(0.0) as u64,
        indicators: rounded(&row.indicators),
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.monitor.report(
        state.fetcher.cache().size(),
        state.broadcaster.connection_count(),
    ))
}

pub async fn chart(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartResponse>, ApiError> {
    let ticker = ticker.to_uppercase();
    let period = parse_period(&query.period)?;
    let interval = parse_interval(&query.interval)?;

    let series = state.fetcher.enriched(&ticker, period, interval).await?;
    let data: Vec<ChartPoint> = series.rows.iter().map(|row| chart_point(row, interval)).collect();

    Ok(Json(ChartResponse {
        ticker,
        period,
        interval,
        points: data.len(),
        data,
    }))
}

pub async fn quote(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<QuoteSnapshot>, ApiError> {
    let quote = state.fetcher.quote(&ticker.to_uppercase()).await?;
    Ok(Json(quote.as_ref().clone()))
}

pub async fn info(State(state): State<AppState>, Path(ticker): Path<String>) -> Json<CompanyInfo> {
    let info = state.fetcher.company_info(&ticker.to_uppercase()).await;
    Json(info.as_ref().clone())
}

pub async fn signals(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<SignalQuery>,
) -> Result<Json<SignalReport>, ApiError> {
    let ticker = ticker.to_uppercase();
    let period = parse_period(&query.period)?;
    let interval = parse_interval(&query.interval)?;

    let series = state.fetcher.enriched(&ticker, period, interval).await?;
    Ok(Json(state.signals.report(&ticker, &series)))
}

pub async fn fibonacci(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<FibonacciResponse>, ApiError> {
    let ticker = ticker.to_uppercase();
    let period = parse_period(&query.period)?;

    let series = state.fetcher.enriched(&ticker, period, Interval::Daily).await?;
    let (Some(high), Some(low)) = (series.highest_high(), series.lowest_low()) else {
        return Err(FetchError::NotFound(ticker).into());
    };

    Ok(Json(FibonacciResponse {
        ticker,
        period,
        levels: FibonacciLevels::from_range(high, low),
    }))
}

pub async fn legacy(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<LegacyResponse>, ApiError> {
    let ticker = ticker.to_uppercase();
    let series = state.fetcher.enriched(&ticker, Period::Day1, Interval::Minute1).await?;

    let data = series
        .rows
        .iter()
        .map(|row| LegacyPoint {
            time: row.bar.datetime().format("%H:%M").to_string(),
            price: round_dp(row.bar.close, 2),
            volume: row.bar.volume.max(0.0) as u64,
            rsi: round_opt(row.indicators.rsi_14, 2),
        })
        .collect();

    Ok(Json(LegacyResponse { ticker, data }))
}

pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<SymbolMatch>> {
    let results = state.fetcher.search(&query, params.limit).await;
    Json(results.as_ref().clone())
}

/// Upper-cased, de-blanked symbols of a comma separated list.
fn parse_tickers(raw: &str) -> Result<Vec<String>, ApiError> {
    let symbols: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect();

    if symbols.len() < 2 {
        return Err(ApiError::BadRequest("Need at least 2 tickers".to_string()));
    }
    if symbols.len() > MAX_COMPARE {
        return Err(ApiError::BadRequest(format!("Max {} tickers", MAX_COMPARE)));
    }
    Ok(symbols)
}

pub async fn compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let symbols = parse_tickers(&query.tickers)?;
    let period = parse_period(&query.period)?;

    match state.fetcher.compare(&symbols, period).await {
        Ok(report) => Ok(Json(report)),
        Err(FetchError::NotFound(_)) => Err(ApiError::NotFound("No data".to_string())),
        Err(e) => Err(e.into()),
    }
}

pub async fn market_overview(State(state): State<AppState>) -> Json<MarketOverview> {
    let overview = state.fetcher.market_overview().await;
    Json(overview.as_ref().clone())
}
