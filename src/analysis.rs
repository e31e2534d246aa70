use polars::prelude::*;
use rayon::prelude::*;
use crate::fetch::{PriceSeries, CLOSE_COL};
use crate::Result;

/// Trading days in a month and in a year
pub const MONTHLY_LAG: usize = 21;
pub const ANNUAL_LAG: usize = 252;

pub const MONTHLY_RETURN_COL: &str = "monthly_return";
pub const ANNUAL_RETURN_COL: &str = "annual_return";

/// Maximum rows kept by the ranking
pub const TOP_N: usize = 10;

/// Percentage change over `lag` samples.
///
/// Missing values are forward-filled first, so a gap counts as an unchanged
/// price. The first `lag` entries, entries before the first value and any
/// entry whose base is zero are `None`.
pub fn pct_change(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    let filled: Vec<Option<f64>> = values
        .iter()
        .scan(None, |last, v| {
            if v.is_some() {
                *last = *v;
            }
            Some(*last)
        })
        .collect();

    (0..filled.len())
        .map(|i| {
            if lag == 0 || i < lag {
                return None;
            }
            match (filled[i - lag], filled[i]) {
                (Some(p), Some(c)) if p != 0.0 => Some((c - p) / p),
                _ => None,
            }
        })
        .collect()
}

/// Copy of the series' frame with `monthly_return` and `annual_return` added
pub fn with_returns(series: &PriceSeries) -> Result<DataFrame> {
    let closes = series.closes()?;
    let mut result = series.data.clone();
    result.with_column(Series::new(MONTHLY_RETURN_COL.into(), pct_change(&closes, MONTHLY_LAG)))?;
    result.with_column(Series::new(ANNUAL_RETURN_COL.into(), pct_change(&closes, ANNUAL_LAG)))?;
    Ok(result)
}

/// Mean of the non-null values
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    values.iter().copied().collect::<Float64Chunked>().mean()
}

/// Sample standard deviation (ddof = 1) of the non-null values
pub fn sample_std(values: &[Option<f64>]) -> Option<f64> {
    values
        .iter()
        .copied()
        .collect::<Float64Chunked>()
        .std(1)
        .filter(|s| !s.is_nan())
}

/// Mean return per unit of standard deviation. Undefined when std is zero.
///
/// No risk-free rate and no annualization; this is also what gets reported
/// as the Sharpe ratio.
pub fn reward_risk_ratio(mean: Option<f64>, std: Option<f64>) -> Option<f64> {
    match (mean, std) {
        (Some(m), Some(s)) if s != 0.0 => Some(m / s),
        _ => None,
    }
}

/// Largest peak-to-trough fall of the closes, as a fraction of the peak
pub fn calculate_max_drawdown(df: &DataFrame, price_col: &str) -> Result<f64> {
    let prices = df.column(price_col)?.f64()?;

    let mut peak = f64::MIN;
    let mut max_dd = 0.0;

    for price in prices.into_iter().flatten() {
        if price > peak {
            peak = price;
        }
        if peak > 0.0 {
            let drawdown = (peak - price) / peak;
            if drawdown > max_dd {
                max_dd = drawdown;
            }
        }
    }

    Ok(max_dd)
}

/// Growth from the first to the last close
pub fn total_return(closes: &[Option<f64>]) -> Option<f64> {
    let first = closes.iter().flatten().next()?;
    let last = closes.iter().flatten().last()?;
    if *first == 0.0 {
        return None;
    }
    Some(last / first - 1.0)
}

/// Risk statistics for one ETF
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRow {
    pub etf_name: String,
    pub mean_daily_return: Option<f64>,
    pub daily_std: Option<f64>,
    pub reward_risk_ratio: Option<f64>,
    pub total_return: Option<f64>,
    pub max_drawdown: f64,
}

pub fn statistics(etf_name: &str, series: &PriceSeries) -> Result<StatisticsRow> {
    let closes = series.closes()?;
    let daily = pct_change(&closes, 1);

    let mean_daily_return = mean(&daily);
    let daily_std = sample_std(&daily);

    Ok(StatisticsRow {
        etf_name: etf_name.to_string(),
        mean_daily_return,
        daily_std,
        reward_risk_ratio: reward_risk_ratio(mean_daily_return, daily_std),
        total_return: total_return(&closes),
        max_drawdown: calculate_max_drawdown(&series.data, CLOSE_COL)?,
    })
}

/// Mean monthly and annual returns with the money they project to
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRow {
    pub etf_name: String,
    pub mean_monthly_return: Option<f64>,
    pub mean_annual_return: Option<f64>,
    pub monthly_value: Option<f64>,
    pub annual_value: Option<f64>,
}

/// Linear projection `investment * (1 + mean_return)`
pub fn project(investment: f64, mean_return: Option<f64>) -> Option<f64> {
    mean_return.map(|r| investment * (1.0 + r))
}

pub fn projection(etf_name: &str, series: &PriceSeries, investment: f64) -> Result<ProjectionRow> {
    let returns = with_returns(series)?;
    let mean_monthly_return = returns.column(MONTHLY_RETURN_COL)?.f64()?.mean();
    let mean_annual_return = returns.column(ANNUAL_RETURN_COL)?.f64()?.mean();

    Ok(ProjectionRow {
        etf_name: etf_name.to_string(),
        mean_monthly_return,
        mean_annual_return,
        monthly_value: project(investment, mean_monthly_return),
        annual_value: project(investment, mean_annual_return),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub etf_name: String,
    pub mean_annual_return: Option<f64>,
}

pub fn mean_annual_return(series: &PriceSeries) -> Result<Option<f64>> {
    Ok(mean(&pct_change(&series.closes()?, ANNUAL_LAG)))
}

/// Sort descending by mean annual return and keep the first `TOP_N`.
/// Stable on ties; undefined returns go last.
pub fn rank_by_annual_return(mut rows: Vec<RankingRow>) -> Vec<RankingRow> {
    rows.sort_by(|a, b| match (a.mean_annual_return, b.mean_annual_return) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    rows.truncate(TOP_N);
    rows
}

/// Apply `metric_fn` to every (name, series) pair in parallel, keeping input order
pub fn compare_etfs<T, F>(inputs: &[(String, PriceSeries)], metric_fn: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&str, &PriceSeries) -> Result<T> + Sync,
{
    inputs
        .par_iter()
        .map(|(name, series)| metric_fn(name, series))
        .collect()
}
