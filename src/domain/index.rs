//! Stock indexes: a named set of member stocks valued by an average or a
//! market-weighted formula.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::error::ExchangeError;
use super::stock::Stock;

/// Decimal places index values are rounded to.
pub const INDEX_VALUE_SCALE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Average,
    Weighted,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Average => write!(f, "AVERAGE"),
            IndexKind::Weighted => write!(f, "WEIGHTED"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AVERAGE" => Ok(IndexKind::Average),
            "WEIGHTED" => Ok(IndexKind::Weighted),
            _ => Err(ExchangeError::UnknownIndexKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockIndex {
    name: String,
    kind: IndexKind,
    members: BTreeSet<String>,
}

impl StockIndex {
    pub fn new(name: &str, kind: IndexKind) -> Result<Self, ExchangeError> {
        if name.trim().is_empty() {
            return Err(ExchangeError::invalid("index name must not be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            kind,
            members: BTreeSet::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn add_stock(&mut self, stock: &str) -> Result<(), ExchangeError> {
        if self.members.contains(stock) {
            return Err(ExchangeError::AlreadyExists {
                kind: "index member",
                name: format!("{stock} in {}", self.name),
            });
        }
        self.members.insert(stock.to_string());
        Ok(())
    }

    pub fn remove_stock(&mut self, stock: &str) -> Result<(), ExchangeError> {
        if !self.members.remove(stock) {
            return Err(ExchangeError::NotFound {
                kind: "index member",
                name: format!("{stock} in {}", self.name),
            });
        }
        Ok(())
    }

    pub fn contains(&self, stock: &str) -> bool {
        self.members.contains(stock)
    }

    pub fn stock_count(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    /// Index value at `timestamp`, rounded to [`INDEX_VALUE_SCALE`] places.
    ///
    /// `exchange_value` is the summed market value of every listed stock at
    /// the same instant; only the weighted formula uses it.
    pub fn compute_value(
        &self,
        stocks: &BTreeMap<String, Stock>,
        timestamp: NaiveDateTime,
        exchange_value: Decimal,
    ) -> Result<Decimal, ExchangeError> {
        if self.members.is_empty() {
            return Ok(Decimal::ZERO);
        }

        let total = match self.kind {
            IndexKind::Average => {
                let mut sum = Decimal::ZERO;
                for stock in self.member_stocks(stocks) {
                    sum = sum
                        .checked_add(stock?.price_at(timestamp)?)
                        .ok_or_else(|| self.overflow())?;
                }
                sum.checked_div(Decimal::from(self.members.len()))
                    .ok_or_else(|| self.overflow())?
            }
            IndexKind::Weighted => {
                if exchange_value <= Decimal::ZERO {
                    return Err(ExchangeError::invalid(format!(
                        "exchange value must be positive to weight index {}",
                        self.name
                    )));
                }
                let mut sum = Decimal::ZERO;
                for stock in self.member_stocks(stocks) {
                    let stock = stock?;
                    let price = stock.price_at(timestamp)?;
                    sum = price
                        .checked_mul(Decimal::from(stock.quantity()))
                        .and_then(|value| value.checked_div(exchange_value))
                        .and_then(|share| price.checked_mul(share))
                        .and_then(|contribution| sum.checked_add(contribution))
                        .ok_or_else(|| self.overflow())?;
                }
                sum
            }
        };

        Ok(total.round_dp(INDEX_VALUE_SCALE))
    }

    fn overflow(&self) -> ExchangeError {
        ExchangeError::overflow(format!("value of index {}", self.name))
    }

    fn member_stocks<'a>(
        &'a self,
        stocks: &'a BTreeMap<String, Stock>,
    ) -> impl Iterator<Item = Result<&'a Stock, ExchangeError>> + 'a {
        self.members.iter().map(move |name| {
            stocks
                .get(name)
                .ok_or_else(|| ExchangeError::not_found("stock", name))
        })
    }
}
