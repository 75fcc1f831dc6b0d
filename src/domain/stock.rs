//! Listed stock: identity, issued quantity and price history.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use super::error::ExchangeError;
use super::price_history::PriceHistory;

#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    name: String,
    quantity: i64,
    history: PriceHistory,
}

impl Stock {
    pub fn new(
        name: &str,
        quantity: i64,
        price: Decimal,
        timestamp: NaiveDateTime,
    ) -> Result<Self, ExchangeError> {
        if name.trim().is_empty() {
            return Err(ExchangeError::invalid("stock name must not be empty"));
        }
        if quantity <= 0 {
            return Err(ExchangeError::invalid(format!(
                "stock quantity must be positive, got {quantity}"
            )));
        }
        let history = PriceHistory::new(name, timestamp, price)?;
        Ok(Self {
            name: name.to_string(),
            quantity,
            history,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn set_price(&mut self, timestamp: NaiveDateTime, price: Decimal) -> Result<(), ExchangeError> {
        self.history.set_price(timestamp, price)
    }

    pub fn price_at(&self, timestamp: NaiveDateTime) -> Result<Decimal, ExchangeError> {
        self.history.price_at(timestamp)
    }

    pub fn initial_price(&self) -> Decimal {
        self.history.initial_price()
    }

    pub fn last_price(&self) -> Decimal {
        self.history.last_price()
    }

    /// price × issued quantity at `timestamp`
    pub fn market_value(&self, timestamp: NaiveDateTime) -> Result<Decimal, ExchangeError> {
        self.price_at(timestamp)?
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| ExchangeError::overflow(format!("market value of {}", self.name)))
    }
}
