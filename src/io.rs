use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::fetch::{CLOSE_COL, DATE_COL, VALUE_COLUMNS};
use crate::Result;

/// Column added to exported rows naming the originating ETF
pub const ETF_COL: &str = "ETF";

/// Default download name and content type of the combined export
pub const EXPORT_FILE_NAME: &str = "Datos_Etfs.csv";
pub const EXPORT_MIME: &str = "text/csv";

/// Load a CSV file as-is
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;

    Ok(df)
}

/// Load a daily price CSV into the price series layout.
///
/// Requires `Date` and `Close`; `Open`, `High`, `Low` and `Volume` become
/// null columns when absent. Timestamps such as `2024-01-02 00:00:00-05:00`
/// are cut down to the date.
pub fn load_price_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    let raw = load_csv(path)?;
    let n = raw.height();

    let date_col = raw
        .column(DATE_COL)
        .map_err(|_| crate::Error::Parse(format!("{}: missing Date column", path.display())))?
        .cast(&DataType::String)?;
    let dates: Vec<Option<String>> = date_col
        .str()?
        .into_iter()
        .map(|d| d.map(|s| s.chars().take(10).collect()))
        .collect();

    let mut columns = vec![Column::new(DATE_COL.into(), dates)];
    for name in VALUE_COLUMNS {
        let column = match raw.column(name) {
            Ok(col) => col.cast(&DataType::Float64)?,
            Err(_) if name == CLOSE_COL => {
                return Err(crate::Error::Parse(
                    format!("{}: missing Close column", path.display())
                ));
            }
            Err(_) => Column::full_null(name.into(), n, &DataType::Float64),
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

/// Keep the rows dated within `days` calendar days of the latest date
pub fn trim_to_window(df: &DataFrame, days: i64) -> Result<DataFrame> {
    let dates = df.column(DATE_COL)?.str()?;

    let Some(last) = dates.into_iter().flatten().max() else {
        return Ok(df.clone());
    };
    let last = NaiveDate::parse_from_str(last, "%Y-%m-%d")
        .map_err(|e| crate::Error::Parse(format!("Invalid date '{}': {}", last, e)))?;
    let cutoff = (last - Duration::days(days)).format("%Y-%m-%d").to_string();

    let mask: BooleanChunked = dates
        .into_iter()
        .map(|d| d.map(|d| d > cutoff.as_str()))
        .collect();

    Ok(df.filter(&mask)?)
}

/// Append an `ETF` column holding `etf_name` on every row
pub fn tag_with_etf(df: &DataFrame, etf_name: &str) -> Result<DataFrame> {
    let mut tagged = df.clone();
    let etf_col = Column::new(ETF_COL.into(), vec![etf_name; df.height()]);
    tagged.with_column(etf_col)?;
    Ok(tagged)
}

/// Vertically concatenate frames in order. `None` when there is nothing to join.
pub fn concat_frames(frames: Vec<DataFrame>) -> Result<Option<DataFrame>> {
    let mut frames = frames.into_iter();
    let Some(mut combined) = frames.next() else {
        return Ok(None);
    };

    for df in frames {
        combined.vstack_mut(&df)?;
    }

    Ok(Some(combined))
}

/// Serialize a frame to UTF-8 CSV with a header row
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df.clone())?;

    Ok(buf)
}

/// Save DataFrame to CSV file
pub fn save_csv<P: AsRef<Path>>(df: &DataFrame, path: P) -> Result<()> {
    std::fs::write(path, to_csv_bytes(df)?)?;
    Ok(())
}

/// Save DataFrame to a Parquet file
pub fn save_parquet<P: AsRef<Path>>(df: &DataFrame, path: P) -> Result<()> {
    let file = std::fs::File::create(path)?;
    ParquetWriter::new(file).finish(&mut df.clone())?;
    Ok(())
}

/// Write `df` to `path` as CSV, or Parquet for a `.parquet` extension.
///
/// A path without extension gets `.csv`. Existing files are only replaced
/// with `force`; otherwise nothing is written and an error is returned.
pub fn export_dataframe<P: AsRef<Path>>(df: &DataFrame, path: P, force: bool) -> Result<PathBuf> {
    let mut path = path.as_ref().to_path_buf();
    if path.extension().is_none() {
        path.set_extension("csv");
    }

    if path.exists() && !force {
        return Err(crate::Error::Other(
            format!("{} already exists, use --force to overwrite", path.display())
        ));
    }

    let is_parquet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("parquet"));

    if is_parquet {
        save_parquet(df, &path)?;
    } else {
        save_csv(df, &path)?;
    }
    debug!(path = %path.display(), rows = df.height(), "export written");

    Ok(path)
}
