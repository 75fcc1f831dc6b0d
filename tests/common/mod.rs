#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use stockex::domain::error::StockexError;
use stockex::domain::market_data::{Holding, IndexMembership, Listing, PriceTick};
use stockex::ports::market_data_port::MarketDataPort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct MockMarketDataPort {
    pub listings: Vec<Listing>,
    pub prices: Vec<PriceTick>,
    pub indices: Vec<IndexMembership>,
    pub holdings: Vec<Holding>,
    pub fail_prices: Option<String>,
}

impl MockMarketDataPort {
    pub fn new() -> Self {
        Self {
            listings: Vec::new(),
            prices: Vec::new(),
            indices: Vec::new(),
            holdings: Vec::new(),
            fail_prices: None,
        }
    }

    pub fn with_listing(mut self, name: &str, quantity: i64, price: Decimal, at: NaiveDateTime) -> Self {
        self.listings.push(Listing {
            name: name.to_string(),
            quantity,
            price,
            timestamp: at,
        });
        self
    }

    pub fn with_price(mut self, name: &str, at: NaiveDateTime, price: Decimal) -> Self {
        self.prices.push(PriceTick {
            name: name.to_string(),
            timestamp: at,
            price,
        });
        self
    }

    pub fn with_index(mut self, index: &str, kind: &str, stock: Option<&str>) -> Self {
        self.indices.push(IndexMembership {
            index: index.to_string(),
            kind: kind.to_string(),
            stock: stock.map(String::from),
        });
        self
    }

    pub fn with_holding(mut self, portfolio: &str, stock: &str, shares: i64) -> Self {
        self.holdings.push(Holding {
            portfolio: portfolio.to_string(),
            stock: Some(stock.to_string()),
            shares,
        });
        self
    }

    pub fn with_price_error(mut self, reason: &str) -> Self {
        self.fail_prices = Some(reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketDataPort {
    fn fetch_listings(&self) -> Result<Vec<Listing>, StockexError> {
        Ok(self.listings.clone())
    }

    fn fetch_prices(&self) -> Result<Vec<PriceTick>, StockexError> {
        if let Some(reason) = &self.fail_prices {
            return Err(StockexError::MarketData {
                source_name: "mock prices".to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.prices.clone())
    }

    fn fetch_indices(&self) -> Result<Vec<IndexMembership>, StockexError> {
        Ok(self.indices.clone())
    }

    fn fetch_holdings(&self) -> Result<Vec<Holding>, StockexError> {
        Ok(self.holdings.clone())
    }
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn at_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

pub const LISTINGS_CSV: &str = "name,quantity,price,timestamp
BHP,100,10,2024-01-01
cba,50,20,2024-01-01
";

pub const PRICES_CSV: &str = "name,timestamp,price
BHP,2024-02-01,11
CBA,2024-02-01,18
BHP,2024-03-01,12.5
";

pub const INDEXES_CSV: &str = "index,kind,stock
top,weighted,BHP
top,weighted,CBA
avg,average,BHP
avg,average,CBA
";

pub const HOLDINGS_CSV: &str = "portfolio,stock,shares
alice,BHP,10
alice,CBA,5
bob,BHP,90
bob,BHP,-30
carol,,
";

/// Writes a session file and the four market files into `dir`.
pub fn write_market(dir: &Path, session_extra: &str) -> PathBuf {
    let data = dir.join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("listings.csv"), LISTINGS_CSV).unwrap();
    fs::write(data.join("prices.csv"), PRICES_CSV).unwrap();
    fs::write(data.join("indexes.csv"), INDEXES_CSV).unwrap();
    fs::write(data.join("holdings.csv"), HOLDINGS_CSV).unwrap();

    let session = dir.join("session.ini");
    fs::write(&session, format!("[market]\ndata_dir = data\n{session_extra}")).unwrap();
    session
}
