use polars::prelude::DataFrame;
use std::collections::HashSet;
use tracing::{debug, warn};
use crate::analysis::{self, ProjectionRow, RankingRow, StatisticsRow};
use crate::catalog::{Catalog, EtfRecord};
use crate::fetch::{CachedFetcher, MarketDataProvider, Period, PriceSeries};
use crate::Result;

/// Most ETFs that can be selected at once
pub const MAX_SELECTIONS: usize = 5;

/// Number of trailing closes shown in the price summary
pub const RECENT_ROWS: usize = 5;

/// What the user picked for one dashboard run
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub etfs: Vec<String>,
    pub period: Period,
    pub investment: f64,
}

impl Selection {
    /// Repeated names are dropped, keeping the first occurrence, before the
    /// selection limit is checked.
    pub fn new(etfs: Vec<String>, period: Period, investment: f64) -> Result<Self> {
        let mut seen = HashSet::new();
        let etfs: Vec<String> = etfs
            .into_iter()
            .filter(|name| {
                let first = seen.insert(name.clone());
                if !first {
                    warn!(etf = %name, "selected more than once, ignoring repeat");
                }
                first
            })
            .collect();

        if etfs.len() > MAX_SELECTIONS {
            return Err(crate::Error::Other(
                format!("At most {} ETFs can be selected, got {}", MAX_SELECTIONS, etfs.len())
            ));
        }

        if !investment.is_finite() || investment < 0.0 {
            return Err(crate::Error::Other(
                format!("Investment amount must be a non-negative number, got {}", investment)
            ));
        }

        Ok(Selection {
            etfs,
            period,
            investment,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.etfs.is_empty()
    }
}

/// Close price overview standing in for the price chart
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub etf_name: String,
    pub ticker: String,
    pub rows: usize,
    pub first_date: String,
    pub last_date: String,
    pub first_close: Option<f64>,
    pub last_close: Option<f64>,
    pub min_close: Option<f64>,
    pub max_close: Option<f64>,
    pub recent: Vec<(String, Option<f64>)>,
}

impl PriceSummary {
    pub fn from_series(etf_name: &str, series: &PriceSeries) -> Result<Self> {
        let dates = series.dates()?;
        let closes = series.closes()?;
        let defined = || closes.iter().flatten().copied();

        let start = dates.len().saturating_sub(RECENT_ROWS);
        let recent = dates[start..]
            .iter()
            .cloned()
            .zip(closes[start..].iter().copied())
            .collect();

        Ok(PriceSummary {
            etf_name: etf_name.to_string(),
            ticker: series.ticker.clone(),
            rows: series.len(),
            first_date: dates.first().cloned().unwrap_or_default(),
            last_date: dates.last().cloned().unwrap_or_default(),
            first_close: closes.first().copied().flatten(),
            last_close: closes.last().copied().flatten(),
            min_close: defined().reduce(f64::min),
            max_close: defined().reduce(f64::max),
            recent,
        })
    }
}

/// One dashboard session: the catalog plus a memoizing fetcher.
///
/// Each tab method resolves the selection on its own, so no tab depends on
/// another having run. ETFs without data are left out of every table.
pub struct Dashboard<P> {
    catalog: Catalog,
    fetcher: CachedFetcher<P>,
}

impl<P: MarketDataProvider> Dashboard<P> {
    pub fn new(catalog: Catalog, provider: P) -> Self {
        Dashboard {
            catalog,
            fetcher: CachedFetcher::new(provider),
        }
    }

    pub fn fetcher(&self) -> &CachedFetcher<P> {
        &self.fetcher
    }

    /// Catalog records for the selected names, in selection order
    pub fn details(&self, selection: &Selection) -> Vec<EtfRecord> {
        selection
            .etfs
            .iter()
            .filter_map(|name| {
                let record = self.catalog.get(name);
                if record.is_none() {
                    warn!(etf = %name, "not in catalog, skipping");
                }
                record.cloned()
            })
            .collect()
    }

    /// Fetch every selected ETF, keeping only those with data
    fn load(&mut self, selection: &Selection) -> Vec<(String, PriceSeries)> {
        let mut loaded = Vec::with_capacity(selection.etfs.len());
        for record in self.details(selection) {
            let series = self.fetcher.fetch(&record.ticker, selection.period);
            if series.is_empty() {
                debug!(etf = %record.name, ticker = %record.ticker, "empty series, skipping");
                continue;
            }
            loaded.push((record.name, series));
        }
        loaded
    }

    pub fn price_summaries(&mut self, selection: &Selection) -> Result<Vec<PriceSummary>> {
        let loaded = self.load(selection);
        analysis::compare_etfs(&loaded, PriceSummary::from_series)
    }

    pub fn statistics(&mut self, selection: &Selection) -> Result<Vec<StatisticsRow>> {
        let loaded = self.load(selection);
        analysis::compare_etfs(&loaded, analysis::statistics)
    }

    /// Money projections; empty unless an investment amount above zero was given
    pub fn projections(&mut self, selection: &Selection) -> Result<Vec<ProjectionRow>> {
        if selection.investment <= 0.0 {
            return Ok(Vec::new());
        }
        let investment = selection.investment;
        let loaded = self.load(selection);
        analysis::compare_etfs(&loaded, |name, series| {
            analysis::projection(name, series, investment)
        })
    }

    pub fn ranking(&mut self, selection: &Selection) -> Result<Vec<RankingRow>> {
        let loaded = self.load(selection);
        let rows = analysis::compare_etfs(&loaded, |name, series| {
            Ok(RankingRow {
                etf_name: name.to_string(),
                mean_annual_return: analysis::mean_annual_return(series)?,
            })
        })?;
        Ok(analysis::rank_by_annual_return(rows))
    }

    /// All selected series tagged with their ETF name and stacked in
    /// selection order. `None` when no ETF has data.
    pub fn export_frame(&mut self, selection: &Selection) -> Result<Option<DataFrame>> {
        let frames = self
            .load(selection)
            .iter()
            .map(|(name, series)| crate::io::tag_with_etf(&series.data, name))
            .collect::<Result<Vec<_>>>()?;
        crate::io::concat_frames(frames)
    }

    /// CSV payload of `export_frame`
    pub fn export_csv(&mut self, selection: &Selection) -> Result<Option<Vec<u8>>> {
        match self.export_frame(selection)? {
            Some(df) => Ok(Some(crate::io::to_csv_bytes(&df)?)),
            None => Ok(None),
        }
    }
}
