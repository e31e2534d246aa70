use chrono::NaiveDate;
use clap::ValueEnum;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use crate::Result;

pub const DATE_COL: &str = "Date";
pub const CLOSE_COL: &str = "Close";

/// Numeric columns of a price series, in output order after `Date`
pub const VALUE_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];

/// Look-back window for historical prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[value(name = "1mo")]
    #[serde(rename = "1mo")]
    OneMonth,
    #[value(name = "3mo")]
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[value(name = "6mo")]
    #[serde(rename = "6mo")]
    SixMonths,
    #[value(name = "1y")]
    #[serde(rename = "1y")]
    OneYear,
    #[value(name = "3y")]
    #[serde(rename = "3y")]
    ThreeYears,
    #[value(name = "5y")]
    #[serde(rename = "5y")]
    FiveYears,
    #[value(name = "10y")]
    #[serde(rename = "10y")]
    TenYears,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::ThreeYears => "3y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
        }
    }

    /// Calendar days covered by the period
    pub fn days(&self) -> i64 {
        match self {
            Period::OneMonth => 30,
            Period::ThreeMonths => 91,
            Period::SixMonths => 182,
            Period::OneYear => 365,
            Period::ThreeYears => 1095,
            Period::FiveYears => 1826,
            Period::TenYears => 3652,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One daily bar as delivered by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

/// Date-ordered daily prices for one ticker over one period.
///
/// `data` always has the columns `Date` (ISO string) followed by
/// `Open`, `High`, `Low`, `Close`, `Volume` as `f64`. It may have zero rows.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub ticker: String,
    pub period: Period,
    pub data: DataFrame,
}

impl PriceSeries {
    pub fn new(ticker: &str, period: Period, data: DataFrame) -> Self {
        PriceSeries {
            ticker: ticker.to_string(),
            period,
            data,
        }
    }

    pub fn empty(ticker: &str, period: Period) -> Self {
        Self::new(ticker, period, DataFrame::empty_with_schema(&price_schema()))
    }

    pub fn from_bars(ticker: &str, period: Period, bars: &[Bar]) -> Result<Self> {
        let dates: Vec<String> = bars
            .iter()
            .map(|b| b.date.format("%Y-%m-%d").to_string())
            .collect();

        let data = DataFrame::new(vec![
            Column::new(DATE_COL.into(), dates),
            Column::new("Open".into(), bars.iter().map(|b| b.open).collect::<Vec<_>>()),
            Column::new("High".into(), bars.iter().map(|b| b.high).collect::<Vec<_>>()),
            Column::new("Low".into(), bars.iter().map(|b| b.low).collect::<Vec<_>>()),
            Column::new(CLOSE_COL.into(), bars.iter().map(|b| b.close).collect::<Vec<_>>()),
            Column::new("Volume".into(), bars.iter().map(|b| b.volume).collect::<Vec<_>>()),
        ])?;

        Ok(Self::new(ticker, period, data))
    }

    pub fn len(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    pub fn closes(&self) -> Result<Vec<Option<f64>>> {
        Ok(self.data.column(CLOSE_COL)?.f64()?.into_iter().collect())
    }

    pub fn dates(&self) -> Result<Vec<String>> {
        Ok(self
            .data
            .column(DATE_COL)?
            .str()?
            .into_iter()
            .map(|d| d.unwrap_or_default().to_string())
            .collect())
    }
}

pub fn price_schema() -> Schema {
    let mut fields = vec![Field::new(DATE_COL.into(), DataType::String)];
    fields.extend(
        VALUE_COLUMNS
            .iter()
            .map(|name| Field::new((*name).into(), DataType::Float64)),
    );
    Schema::from_iter(fields)
}

/// Source of historical daily prices
pub trait MarketDataProvider {
    fn history(&self, ticker: &str, period: Period) -> Result<PriceSeries>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn history(&self, ticker: &str, period: Period) -> Result<PriceSeries> {
        (**self).history(ticker, period)
    }
}

/// Memoizes provider results per (ticker, period).
///
/// Provider failures come back as an empty series and are not cached.
pub struct CachedFetcher<P> {
    provider: P,
    cache: HashMap<(String, Period), PriceSeries>,
}

impl<P: MarketDataProvider> CachedFetcher<P> {
    pub fn new(provider: P) -> Self {
        CachedFetcher {
            provider,
            cache: HashMap::new(),
        }
    }

    pub fn fetch(&mut self, ticker: &str, period: Period) -> PriceSeries {
        let key = (ticker.to_string(), period);
        if let Some(series) = self.cache.get(&key) {
            debug!(ticker, %period, "price cache hit");
            return series.clone();
        }

        match self.provider.history(ticker, period) {
            Ok(series) => {
                info!(ticker, %period, rows = series.len(), "fetched price history");
                self.cache.insert(key, series.clone());
                series
            }
            Err(err) => {
                warn!(ticker, %period, error = %err, "no market data, skipping");
                PriceSeries::empty(ticker, period)
            }
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

/// Offline provider reading `<dir>/<TICKER>.csv`
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(crate::Error::Other(
                format!("Data directory does not exist: {}", dir.display())
            ));
        }
        Ok(CsvDirProvider { dir })
    }
}

impl MarketDataProvider for CsvDirProvider {
    fn history(&self, ticker: &str, period: Period) -> Result<PriceSeries> {
        let path = self.dir.join(format!("{}.csv", ticker));
        if !path.is_file() {
            debug!(path = %path.display(), "no price file");
            return Ok(PriceSeries::empty(ticker, period));
        }

        let df = crate::io::load_price_csv(&path)?;
        let df = crate::io::trim_to_window(&df, period.days())?;
        Ok(PriceSeries::new(ticker, period, df))
    }
}
