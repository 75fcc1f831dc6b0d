//! Time-ordered price history of a single stock.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::error::ExchangeError;
use super::timestamp::round_timestamp;

/// Prices keyed by millisecond-rounded timestamp.
///
/// A history always holds at least one entry; it is seeded by [`PriceHistory::new`]
/// and entries are never overwritten or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    stock: String,
    prices: BTreeMap<NaiveDateTime, Decimal>,
}

impl PriceHistory {
    pub fn new(
        stock: &str,
        timestamp: NaiveDateTime,
        price: Decimal,
    ) -> Result<Self, ExchangeError> {
        ensure_positive(price)?;
        let mut prices = BTreeMap::new();
        prices.insert(round_timestamp(timestamp), price);
        Ok(Self {
            stock: stock.to_string(),
            prices,
        })
    }

    pub fn set_price(&mut self, timestamp: NaiveDateTime, price: Decimal) -> Result<(), ExchangeError> {
        ensure_positive(price)?;
        let key = round_timestamp(timestamp);
        if self.prices.contains_key(&key) {
            return Err(ExchangeError::DuplicatePrice {
                stock: self.stock.clone(),
                timestamp: key,
            });
        }
        self.prices.insert(key, price);
        Ok(())
    }

    /// Price recorded at the latest timestamp not after `timestamp`.
    pub fn price_at(&self, timestamp: NaiveDateTime) -> Result<Decimal, ExchangeError> {
        let key = round_timestamp(timestamp);
        self.prices
            .range(..=key)
            .next_back()
            .map(|(_, &price)| price)
            .ok_or_else(|| ExchangeError::NoPriceBefore {
                stock: self.stock.clone(),
                timestamp: key,
            })
    }

    pub fn initial_price(&self) -> Decimal {
        self.prices.values().next().copied().unwrap_or_default()
    }

    pub fn last_price(&self) -> Decimal {
        self.prices.values().next_back().copied().unwrap_or_default()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.prices.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.prices.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Always false once constructed; pairs with `len`.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, Decimal)> + '_ {
        self.prices.iter().map(|(&ts, &price)| (ts, price))
    }
}

fn ensure_positive(price: Decimal) -> Result<(), ExchangeError> {
    if price <= Decimal::ZERO {
        return Err(ExchangeError::invalid(format!(
            "stock price must be positive, got {price}"
        )));
    }
    Ok(())
}
