//! Yahoo Finance chart endpoint client.
//!
//! Uses the v8 chart API with explicit `period1`/`period2` timestamps, since
//! the endpoint's own `range` values do not include every period we offer.

use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;
use crate::fetch::{Bar, MarketDataProvider, Period, PriceSeries};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
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
struct ChartError {
    code: String,
    description: String,
}

/// Daily price history from Yahoo Finance
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn with_settings(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(YahooProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Chart URL for daily bars covering `period` and ending at `end`
    pub fn chart_url(&self, ticker: &str, period: Period, end: DateTime<Utc>) -> String {
        let start = end - Duration::days(period.days());
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            ticker,
            start.timestamp(),
            end.timestamp()
        )
    }
}

impl MarketDataProvider for YahooProvider {
    fn history(&self, ticker: &str, period: Period) -> Result<PriceSeries> {
        let url = self.chart_url(ticker, period, Utc::now());
        debug!(%url, "requesting chart");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            // Unknown tickers come back as 404 with a chart.error payload
            if let Ok(parsed) = serde_json::from_str::<ChartResponse>(&body) {
                if let Some(err) = parsed.chart.error {
                    return Err(crate::Error::Provider(
                        format!("{}: {} ({})", ticker, err.description, err.code)
                    ));
                }
            }
            return Err(crate::Error::Provider(
                format!("{}: HTTP {}", ticker, status)
            ));
        }

        parse_chart(ticker, period, &body)
    }
}

/// Turn a chart payload into a price series.
/// Bars without a close are dropped; a repeated date keeps the later bar.
pub fn parse_chart(ticker: &str, period: Period, body: &str) -> Result<PriceSeries> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        return Err(crate::Error::Provider(
            format!("{}: {} ({})", ticker, err.description, err.code)
        ));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| crate::Error::Provider(format!("{}: empty chart result", ticker)))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut bars: Vec<Bar> = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(close) = value_at(&quote.close, i) else {
            continue;
        };
        let Some(local) = DateTime::from_timestamp(ts + offset, 0) else {
            continue;
        };
        let date = local.date_naive();

        if bars.last().map(|b| b.date) == Some(date) {
            bars.pop();
        }

        bars.push(Bar {
            date,
            open: value_at(&quote.open, i),
            high: value_at(&quote.high, i),
            low: value_at(&quote.low, i),
            close,
            volume: value_at(&quote.volume, i),
        });
    }

    PriceSeries::from_bars(ticker, period, &bars)
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}
