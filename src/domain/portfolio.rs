//! Client portfolios: share counts per stock and valuation over time.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::error::ExchangeError;
use super::stock::Stock;
use super::timestamp::month_bounds;

/// `10^-7`. Starting values smaller in magnitude are treated as zero by
/// [`Portfolio::percent_change_for_month`].
pub const ZERO_VALUE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 7);

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    id: String,
    holdings: BTreeMap<String, i64>,
}

impl Portfolio {
    pub fn new(id: &str) -> Result<Self, ExchangeError> {
        if id.trim().is_empty() {
            return Err(ExchangeError::invalid("portfolio id must not be empty"));
        }
        Ok(Self {
            id: id.to_string(),
            holdings: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_stock(&mut self, stock: &str, shares: i64) -> Result<(), ExchangeError> {
        ensure_positive_shares(shares)?;
        let total = self
            .shares_of(stock)
            .checked_add(shares)
            .ok_or_else(|| ExchangeError::overflow(format!("holding of {stock} in portfolio {}", self.id)))?;
        self.holdings.insert(stock.to_string(), total);
        Ok(())
    }

    /// Removes `shares` of `stock`; the holding disappears once it reaches zero.
    pub fn remove_stock(&mut self, stock: &str, shares: i64) -> Result<(), ExchangeError> {
        ensure_positive_shares(shares)?;
        let held = self.held(stock)?;
        if shares > held {
            return Err(ExchangeError::InsufficientShares {
                stock: stock.to_string(),
                requested: shares,
                available: held,
            });
        }
        if shares == held {
            self.holdings.remove(stock);
        } else {
            self.holdings.insert(stock.to_string(), held - shares);
        }
        Ok(())
    }

    /// Drops the whole holding and returns how many shares it contained.
    pub fn remove_all(&mut self, stock: &str) -> Result<i64, ExchangeError> {
        self.holdings
            .remove(stock)
            .ok_or_else(|| self.missing(stock))
    }

    pub fn contains(&self, stock: &str) -> bool {
        self.holdings.contains_key(stock)
    }

    pub fn shares_of(&self, stock: &str) -> i64 {
        self.holdings.get(stock).copied().unwrap_or(0)
    }

    pub fn stock_count(&self) -> usize {
        self.holdings.len()
    }

    pub fn holdings(&self) -> impl Iterator<Item = (&str, i64)> {
        self.holdings.iter().map(|(name, &shares)| (name.as_str(), shares))
    }

    pub fn value_at(
        &self,
        stocks: &BTreeMap<String, Stock>,
        timestamp: NaiveDateTime,
    ) -> Result<Decimal, ExchangeError> {
        let mut value = Decimal::ZERO;
        for (name, &shares) in &self.holdings {
            let stock = stocks
                .get(name)
                .ok_or_else(|| ExchangeError::not_found("stock", name))?;
            value = Decimal::from(shares)
                .checked_mul(stock.price_at(timestamp)?)
                .and_then(|holding| value.checked_add(holding))
                .ok_or_else(|| ExchangeError::overflow(format!("value of portfolio {}", self.id)))?;
        }
        Ok(value)
    }

    /// Percent change in value from the first instant of the month to the
    /// first instant of the next one. A (near) zero starting value yields 0.
    pub fn percent_change_for_month(
        &self,
        stocks: &BTreeMap<String, Stock>,
        year: i32,
        month: u32,
    ) -> Result<Decimal, ExchangeError> {
        let (start, end) = month_bounds(year, month)?;
        let start_value = self.value_at(stocks, start)?;
        let end_value = self.value_at(stocks, end)?;

        if start_value.abs() < ZERO_VALUE_TOLERANCE {
            return Ok(Decimal::ZERO);
        }
        end_value
            .checked_sub(start_value)
            .and_then(|delta| delta.checked_div(start_value))
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| ExchangeError::overflow(format!("monthly change of portfolio {}", self.id)))
    }

    fn held(&self, stock: &str) -> Result<i64, ExchangeError> {
        self.holdings
            .get(stock)
            .copied()
            .ok_or_else(|| self.missing(stock))
    }

    fn missing(&self, stock: &str) -> ExchangeError {
        ExchangeError::NotFound {
            kind: "holding",
            name: format!("{stock} in portfolio {}", self.id),
        }
    }
}

fn ensure_positive_shares(shares: i64) -> Result<(), ExchangeError> {
    if shares <= 0 {
        return Err(ExchangeError::invalid(format!(
            "number of shares must be positive, got {shares}"
        )));
    }
    Ok(())
}
