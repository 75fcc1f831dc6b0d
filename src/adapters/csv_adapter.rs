//! CSV market data adapter.
//!
//! Reads four files from one directory:
//!
//! | file          | columns                            |
//! |---------------|------------------------------------|
//! | listings.csv  | `name,quantity,price,timestamp`    |
//! | prices.csv    | `name,timestamp,price`             |
//! | indexes.csv   | `index,kind,stock`                 |
//! | holdings.csv  | `portfolio,stock,shares`           |
//!
//! Only the listings file is required.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::domain::config_validation::{
    DEFAULT_HOLDINGS_FILE, DEFAULT_INDEXES_FILE, DEFAULT_LISTINGS_FILE, DEFAULT_PRICES_FILE,
};
use crate::domain::error::StockexError;
use crate::domain::market_data::{Holding, IndexMembership, Listing, PriceTick};
use crate::domain::timestamp::parse_timestamp;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;

#[derive(Debug, Deserialize)]
struct ListingRow {
    name: String,
    quantity: i64,
    price: String,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    name: String,
    timestamp: String,
    price: String,
}

#[derive(Debug, Deserialize)]
struct IndexRow {
    index: String,
    kind: String,
    #[serde(default)]
    stock: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HoldingRow {
    portfolio: String,
    #[serde(default)]
    stock: Option<String>,
    #[serde(default)]
    shares: Option<i64>,
}

pub struct CsvMarketAdapter {
    base_path: PathBuf,
    listings: String,
    prices: String,
    indexes: String,
    holdings: String,
}

impl CsvMarketAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            listings: DEFAULT_LISTINGS_FILE.to_string(),
            prices: DEFAULT_PRICES_FILE.to_string(),
            indexes: DEFAULT_INDEXES_FILE.to_string(),
            holdings: DEFAULT_HOLDINGS_FILE.to_string(),
        }
    }

    /// Builds the adapter from the `[market]` section. A relative `data_dir`
    /// is resolved against `config_dir`.
    pub fn from_config(config: &dyn ConfigPort, config_dir: &Path) -> Result<Self, StockexError> {
        let data_dir = config
            .get_string("market", "data_dir")
            .ok_or_else(|| StockexError::ConfigMissing {
                section: "market".into(),
                key: "data_dir".into(),
            })?;
        Ok(Self {
            base_path: config_dir.join(data_dir.trim()),
            listings: config.get_string_or("market", "listings", DEFAULT_LISTINGS_FILE),
            prices: config.get_string_or("market", "prices", DEFAULT_PRICES_FILE),
            indexes: config.get_string_or("market", "indexes", DEFAULT_INDEXES_FILE),
            holdings: config.get_string_or("market", "holdings", DEFAULT_HOLDINGS_FILE),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn read_rows<T: DeserializeOwned>(&self, file: &str, required: bool) -> Result<Vec<T>, StockexError> {
        let path = self.base_path.join(file);
        if !path.exists() {
            if required {
                return Err(StockexError::MarketData {
                    source_name: path.display().to_string(),
                    reason: "file not found".into(),
                });
            }
            debug!(path = %path.display(), "optional market file absent");
            return Ok(Vec::new());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| data_error(&path, e))?;

        let mut rows = Vec::new();
        for (i, result) in rdr.deserialize().enumerate() {
            let row: T = result.map_err(|e| data_error(&path, format!("row {}: {e}", i + 1)))?;
            rows.push(row);
        }
        debug!(path = %path.display(), rows = rows.len(), "read market file");
        Ok(rows)
    }

    fn path_of(&self, file: &str) -> PathBuf {
        self.base_path.join(file)
    }
}

fn data_error(path: &Path, reason: impl ToString) -> StockexError {
    StockexError::MarketData {
        source_name: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn parse_price(path: &Path, row: usize, raw: &str) -> Result<Decimal, StockexError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| data_error(path, format!("row {row}: invalid price '{raw}': {e}")))
}

fn parse_time(path: &Path, row: usize, raw: &str) -> Result<chrono::NaiveDateTime, StockexError> {
    parse_timestamp(raw).map_err(|e| data_error(path, format!("row {row}: {e}")))
}

/// Empty cells become `None`.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl MarketDataPort for CsvMarketAdapter {
    fn fetch_listings(&self) -> Result<Vec<Listing>, StockexError> {
        let path = self.path_of(&self.listings);
        self.read_rows::<ListingRow>(&self.listings, true)?
            .into_iter()
            .enumerate()
            .map(|(i, row)| -> Result<Listing, StockexError> {
                Ok(Listing {
                    price: parse_price(&path, i + 1, &row.price)?,
                    timestamp: parse_time(&path, i + 1, &row.timestamp)?,
                    name: row.name,
                    quantity: row.quantity,
                })
            })
            .collect()
    }

    fn fetch_prices(&self) -> Result<Vec<PriceTick>, StockexError> {
        let path = self.path_of(&self.prices);
        self.read_rows::<PriceRow>(&self.prices, false)?
            .into_iter()
            .enumerate()
            .map(|(i, row)| -> Result<PriceTick, StockexError> {
                Ok(PriceTick {
                    timestamp: parse_time(&path, i + 1, &row.timestamp)?,
                    price: parse_price(&path, i + 1, &row.price)?,
                    name: row.name,
                })
            })
            .collect()
    }

    fn fetch_indices(&self) -> Result<Vec<IndexMembership>, StockexError> {
        Ok(self
            .read_rows::<IndexRow>(&self.indexes, false)?
            .into_iter()
            .map(|row| IndexMembership {
                index: row.index,
                kind: row.kind,
                stock: non_blank(row.stock),
            })
            .collect())
    }

    fn fetch_holdings(&self) -> Result<Vec<Holding>, StockexError> {
        Ok(self
            .read_rows::<HoldingRow>(&self.holdings, false)?
            .into_iter()
            .map(|row| Holding {
                portfolio: row.portfolio,
                stock: non_blank(row.stock),
                shares: row.shares.unwrap_or(0),
            })
            .collect())
    }
}
