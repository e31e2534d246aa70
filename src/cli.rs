use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use crate::fetch::Period;

/// Dashboard section to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Every section; the CSV is only written when --output is given
    #[default]
    All,
    /// Name, description and ticker of each selected ETF
    Details,
    /// Closing price overview
    Prices,
    /// Mean daily return, daily risk and reward/risk ratio
    Stats,
    /// Monthly and annual returns projected on the investment amount
    Returns,
    /// Top 10 by mean annual return
    Top,
    /// Write the combined price history as CSV (or Parquet)
    Export,
    /// List the ETF catalog
    Catalog,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ETF name from the catalog (repeatable, at most 5)
    #[arg(short = 'e', long = "etf")]
    pub etfs: Vec<String>,

    /// Period of price history
    #[arg(short, long, value_enum)]
    pub period: Option<Period>,

    /// Initial investment amount used for return projections
    #[arg(short = 'a', long)]
    pub investment: Option<f64>,

    /// Section to render (all, details, prices, stats, returns, top, export, catalog)
    #[arg(short = 'f', long, value_enum, default_value_t = Tab::All)]
    pub function: Tab,

    /// Output file for the export (defaults to Datos_Etfs.csv for -f export)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Catalog CSV file with name,description,ticker columns
    #[arg(long)]
    pub catalog: Option<String>,

    /// Read prices from {TICKER}.csv files in this directory instead of Yahoo Finance
    #[arg(short = 'd', long)]
    pub data_dir: Option<String>,

    /// Configuration file (TOML)
    #[arg(short = 'c', long)]
    pub config: Option<String>,

    /// Force overwrite of existing output files
    #[arg(long)]
    pub force: bool,

    /// Verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}
