use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use crate::Result;

/// A single ETF that can be selected in the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtfRecord {
    pub name: String,
    pub description: String,
    pub ticker: String,
}

impl EtfRecord {
    pub fn new(name: &str, description: &str, ticker: &str) -> Self {
        EtfRecord {
            name: name.to_string(),
            description: description.to_string(),
            ticker: ticker.to_string(),
        }
    }
}

/// Built-in catalog: (name, description, ticker)
const BUILTIN_ETFS: &[(&str, &str, &str)] = &[
    ("SPDR S&P 500 ETF Trust", "Tracks the S&P 500 index of large-cap US equities.", "SPY"),
    ("Invesco QQQ Trust", "Tracks the Nasdaq-100 index of the largest non-financial Nasdaq companies.", "QQQ"),
    ("iShares Russell 2000 ETF", "Exposure to US small-cap equities through the Russell 2000 index.", "IWM"),
    ("Vanguard Total Stock Market ETF", "Broad exposure to the entire US equity market.", "VTI"),
    ("Vanguard FTSE Developed Markets ETF", "Large, mid and small-cap stocks in developed markets outside the US.", "VEA"),
    ("iShares MSCI Emerging Markets ETF", "Large and mid-cap stocks across emerging markets.", "EEM"),
    ("iShares MSCI Mexico ETF", "Exposure to large and mid-cap Mexican equities.", "EWW"),
    ("iShares Core U.S. Aggregate Bond ETF", "Investment-grade US bonds across treasuries, corporates and MBS.", "AGG"),
    ("iShares 20+ Year Treasury Bond ETF", "US Treasury bonds with remaining maturities over twenty years.", "TLT"),
    ("iShares iBoxx $ High Yield Corporate Bond ETF", "US dollar denominated high-yield corporate bonds.", "HYG"),
    ("SPDR Gold Shares", "Tracks the price of gold bullion.", "GLD"),
    ("iShares Silver Trust", "Tracks the price of silver bullion.", "SLV"),
    ("Vanguard Real Estate ETF", "US real estate investment trusts and real estate companies.", "VNQ"),
    ("Technology Select Sector SPDR Fund", "Technology companies in the S&P 500.", "XLK"),
    ("Financial Select Sector SPDR Fund", "Financial services companies in the S&P 500.", "XLF"),
    ("Energy Select Sector SPDR Fund", "Energy companies in the S&P 500.", "XLE"),
    ("Health Care Select Sector SPDR Fund", "Health care companies in the S&P 500.", "XLV"),
    ("Vanguard Dividend Appreciation ETF", "US companies with a record of growing dividends.", "VIG"),
    ("ARK Innovation ETF", "Actively managed companies focused on disruptive innovation.", "ARKK"),
    ("iShares Global Clean Energy ETF", "Global companies in the clean energy sector.", "ICLN"),
];

/// Ordered ETF catalog with lookup by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<EtfRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from records, keeping their order.
    /// Names must be unique.
    pub fn from_records(records: Vec<EtfRecord>) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.name.clone(), i).is_some() {
                return Err(crate::Error::Parse(
                    format!("Duplicate ETF name in catalog: {}", record.name)
                ));
            }
        }
        Ok(Catalog { records, index })
    }

    /// The catalog shipped with the binary
    pub fn builtin() -> Self {
        let records = BUILTIN_ETFS
            .iter()
            .map(|(name, description, ticker)| EtfRecord::new(name, description, ticker))
            .collect::<Vec<_>>();
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        Catalog { records, index }
    }

    /// Load a catalog from a CSV file with a `name,description,ticker` header
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let records = reader
            .deserialize::<EtfRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if records.is_empty() {
            return Err(crate::Error::Parse(
                format!("Catalog file has no entries: {}", path.as_ref().display())
            ));
        }

        Self::from_records(records)
    }

    pub fn get(&self, name: &str) -> Option<&EtfRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EtfRecord> {
        self.records.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
