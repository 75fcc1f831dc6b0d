//! Row types a market snapshot is replayed from.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub name: String,
    pub quantity: i64,
    pub price: Decimal,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTick {
    pub name: String,
    pub timestamp: NaiveDateTime,
    pub price: Decimal,
}

/// An index definition row. `stock` is `None` for a row that only declares
/// the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMembership {
    pub index: String,
    pub kind: String,
    pub stock: Option<String>,
}

/// A holding row. Positive shares are bought from the exchange, negative
/// shares are returned to it, and `stock: None` only declares the portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub portfolio: String,
    pub stock: Option<String>,
    pub shares: i64,
}

/// Everything needed to rebuild an exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub listings: Vec<Listing>,
    pub prices: Vec<PriceTick>,
    pub indices: Vec<IndexMembership>,
    pub holdings: Vec<Holding>,
}
