//! The exchange registry: owns stocks, indexes and portfolios and enforces the
//! invariants that span them.
//!
//! Stock and index names are case-insensitive and stored upper-cased.
//! Portfolio ids are taken verbatim. Indexes and portfolios refer to stocks by
//! their normalized name only; the stocks themselves live in one registry here.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::error::ExchangeError;
use super::index::{IndexKind, StockIndex};
use super::portfolio::Portfolio;
use super::stock::Stock;
use super::timestamp::round_timestamp;

/// Canonical form of a stock or index name.
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
}

#[derive(Debug, Clone, Default)]
pub struct StockExchange {
    stocks: BTreeMap<String, Stock>,
    indices: BTreeMap<String, StockIndex>,
    portfolios: BTreeMap<String, Portfolio>,
    /// Shares of each stock currently held across all portfolios.
    sold: HashMap<String, i64>,
}

impl StockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    // --- stocks ---

    pub fn list_stock(
        &mut self,
        name: &str,
        quantity: i64,
        price: Decimal,
        timestamp: NaiveDateTime,
    ) -> Result<(), ExchangeError> {
        let key = normalize_name(name);
        if self.stocks.contains_key(&key) {
            return Err(ExchangeError::already_exists("stock", &key));
        }
        let stock = Stock::new(&key, quantity, price, round_timestamp(timestamp))?;
        debug!(stock = %key, quantity, %price, "listed stock");
        self.sold.insert(key.clone(), 0);
        self.stocks.insert(key, stock);
        Ok(())
    }

    /// Removes a stock together with every index membership and holding of it.
    pub fn delist_stock(&mut self, name: &str) -> Result<(), ExchangeError> {
        let key = normalize_name(name);
        if !self.stocks.contains_key(&key) {
            return Err(ExchangeError::not_found("stock", &key));
        }

        for index in self.indices.values_mut() {
            if index.contains(&key) {
                index.remove_stock(&key)?;
            }
        }
        for portfolio in self.portfolios.values_mut() {
            if portfolio.contains(&key) {
                portfolio.remove_all(&key)?;
            }
        }

        self.sold.remove(&key);
        self.stocks.remove(&key);
        debug!(stock = %key, "delisted stock");
        Ok(())
    }

    pub fn stock_exists(&self, name: &str) -> bool {
        self.stocks.contains_key(&normalize_name(name))
    }

    pub fn number_of_stocks(&self) -> usize {
        self.stocks.len()
    }

    pub fn stock(&self, name: &str) -> Result<&Stock, ExchangeError> {
        let key = normalize_name(name);
        self.stocks
            .get(&key)
            .ok_or_else(|| ExchangeError::not_found("stock", &key))
    }

    fn stock_mut(&mut self, name: &str) -> Result<&mut Stock, ExchangeError> {
        let key = normalize_name(name);
        self.stocks
            .get_mut(&key)
            .ok_or_else(|| ExchangeError::not_found("stock", &key))
    }

    pub fn stocks(&self) -> impl Iterator<Item = &Stock> {
        self.stocks.values()
    }

    /// Issued quantity of a stock.
    pub fn number_of_shares_in_exchange(&self, name: &str) -> Result<i64, ExchangeError> {
        Ok(self.stock(name)?.quantity())
    }

    /// Shares of a stock currently held across all portfolios.
    pub fn shares_sold(&self, name: &str) -> Result<i64, ExchangeError> {
        let stock = self.stock(name)?;
        Ok(self.sold.get(stock.name()).copied().unwrap_or(0))
    }

    pub fn shares_available(&self, name: &str) -> Result<i64, ExchangeError> {
        Ok(self.number_of_shares_in_exchange(name)? - self.shares_sold(name)?)
    }

    pub fn set_stock_price(
        &mut self,
        name: &str,
        timestamp: NaiveDateTime,
        price: Decimal,
    ) -> Result<(), ExchangeError> {
        self.stock_mut(name)?
            .set_price(round_timestamp(timestamp), price)
    }

    pub fn stock_price(&self, name: &str, timestamp: NaiveDateTime) -> Result<Decimal, ExchangeError> {
        self.stock(name)?.price_at(round_timestamp(timestamp))
    }

    pub fn initial_stock_price(&self, name: &str) -> Result<Decimal, ExchangeError> {
        Ok(self.stock(name)?.initial_price())
    }

    pub fn last_stock_price(&self, name: &str) -> Result<Decimal, ExchangeError> {
        Ok(self.stock(name)?.last_price())
    }

    /// Σ price × quantity over every listed stock. Fails if any of them has
    /// no price at `timestamp`.
    pub fn exchange_value(&self, timestamp: NaiveDateTime) -> Result<Decimal, ExchangeError> {
        let rounded = round_timestamp(timestamp);
        let mut total = Decimal::ZERO;
        for stock in self.stocks.values() {
            total = total
                .checked_add(stock.market_value(rounded)?)
                .ok_or_else(|| ExchangeError::overflow("exchange value"))?;
        }
        Ok(total)
    }

    // --- indexes ---

    pub fn create_index(&mut self, name: &str, kind: IndexKind) -> Result<(), ExchangeError> {
        let key = normalize_name(name);
        if self.indices.contains_key(&key) {
            return Err(ExchangeError::already_exists("index", &key));
        }
        let index = StockIndex::new(&key, kind)?;
        debug!(index = %key, %kind, "created index");
        self.indices.insert(key, index);
        Ok(())
    }

    pub fn create_index_from_str(&mut self, name: &str, kind: &str) -> Result<(), ExchangeError> {
        self.create_index(name, kind.parse()?)
    }

    pub fn index(&self, name: &str) -> Result<&StockIndex, ExchangeError> {
        let key = normalize_name(name);
        self.indices
            .get(&key)
            .ok_or_else(|| ExchangeError::not_found("index", &key))
    }

    fn index_mut(&mut self, name: &str) -> Result<&mut StockIndex, ExchangeError> {
        let key = normalize_name(name);
        self.indices
            .get_mut(&key)
            .ok_or_else(|| ExchangeError::not_found("index", &key))
    }

    pub fn indices(&self) -> impl Iterator<Item = &StockIndex> {
        self.indices.values()
    }

    pub fn add_stock_to_index(&mut self, index: &str, stock: &str) -> Result<(), ExchangeError> {
        let stock_key = self.stock(stock)?.name().to_string();
        self.index_mut(index)?.add_stock(&stock_key)
    }

    pub fn remove_stock_from_index(&mut self, index: &str, stock: &str) -> Result<(), ExchangeError> {
        self.index_mut(index)?.remove_stock(&normalize_name(stock))
    }

    pub fn is_stock_part_of_index(&self, index: &str, stock: &str) -> Result<bool, ExchangeError> {
        Ok(self.index(index)?.contains(&normalize_name(stock)))
    }

    pub fn index_exists(&self, name: &str) -> bool {
        self.indices.contains_key(&normalize_name(name))
    }

    pub fn number_of_indices(&self) -> usize {
        self.indices.len()
    }

    pub fn number_of_stocks_in_index(&self, name: &str) -> Result<usize, ExchangeError> {
        Ok(self.index(name)?.stock_count())
    }

    pub fn index_value(&self, name: &str, timestamp: NaiveDateTime) -> Result<Decimal, ExchangeError> {
        let index = self.index(name)?;
        let rounded = round_timestamp(timestamp);
        let exchange_value = self.exchange_value(rounded)?;
        index.compute_value(&self.stocks, rounded, exchange_value)
    }

    // --- portfolios ---

    pub fn create_portfolio(&mut self, id: &str) -> Result<(), ExchangeError> {
        if self.portfolios.contains_key(id) {
            return Err(ExchangeError::already_exists("portfolio", id));
        }
        let portfolio = Portfolio::new(id)?;
        debug!(portfolio = id, "created portfolio");
        self.portfolios.insert(id.to_string(), portfolio);
        Ok(())
    }

    pub fn portfolio(&self, id: &str) -> Result<&Portfolio, ExchangeError> {
        self.portfolios
            .get(id)
            .ok_or_else(|| ExchangeError::not_found("portfolio", id))
    }

    fn portfolio_mut(&mut self, id: &str) -> Result<&mut Portfolio, ExchangeError> {
        self.portfolios
            .get_mut(id)
            .ok_or_else(|| ExchangeError::not_found("portfolio", id))
    }

    pub fn portfolios(&self) -> impl Iterator<Item = &Portfolio> {
        self.portfolios.values()
    }

    /// Moves `shares` of a stock into a portfolio, provided the exchange still
    /// has that many unsold.
    pub fn add_stock_to_portfolio(
        &mut self,
        id: &str,
        stock: &str,
        shares: i64,
    ) -> Result<(), ExchangeError> {
        self.portfolio(id)?;
        let (key, quantity) = {
            let stock = self.stock(stock)?;
            (stock.name().to_string(), stock.quantity())
        };
        let sold = self.sold.get(&key).copied().unwrap_or(0);
        let Some(new_sold) = sold.checked_add(shares).filter(|&total| total <= quantity) else {
            return Err(ExchangeError::InsufficientShares {
                stock: key,
                requested: shares,
                available: quantity - sold,
            });
        };

        self.portfolio_mut(id)?.add_stock(&key, shares)?;
        self.sold.insert(key.clone(), new_sold);
        debug!(portfolio = id, stock = %key, shares, "added shares to portfolio");
        Ok(())
    }

    /// Takes `shares` of a stock out of a portfolio and returns them to the
    /// exchange's available pool.
    pub fn remove_stock_from_portfolio(
        &mut self,
        id: &str,
        stock: &str,
        shares: i64,
    ) -> Result<(), ExchangeError> {
        let key = normalize_name(stock);
        self.portfolio_mut(id)?.remove_stock(&key, shares)?;
        self.release(&key, shares);
        debug!(portfolio = id, stock = %key, shares, "removed shares from portfolio");
        Ok(())
    }

    /// Removes a whole holding from a portfolio, returning the released share count.
    pub fn remove_all_from_portfolio(&mut self, id: &str, stock: &str) -> Result<i64, ExchangeError> {
        let key = normalize_name(stock);
        let shares = self.portfolio_mut(id)?.remove_all(&key)?;
        self.release(&key, shares);
        debug!(portfolio = id, stock = %key, shares, "removed holding from portfolio");
        Ok(shares)
    }

    fn release(&mut self, key: &str, shares: i64) {
        if let Some(sold) = self.sold.get_mut(key) {
            *sold = (*sold - shares).max(0);
        }
    }

    pub fn portfolio_exists(&self, id: &str) -> bool {
        self.portfolios.contains_key(id)
    }

    pub fn number_of_portfolios(&self) -> usize {
        self.portfolios.len()
    }

    pub fn number_of_stocks_in_portfolio(&self, id: &str) -> Result<usize, ExchangeError> {
        Ok(self.portfolio(id)?.stock_count())
    }

    pub fn is_stock_part_of_portfolio(&self, id: &str, stock: &str) -> Result<bool, ExchangeError> {
        Ok(self.portfolio(id)?.contains(&normalize_name(stock)))
    }

    pub fn number_of_shares_in_portfolio(&self, id: &str, stock: &str) -> Result<i64, ExchangeError> {
        Ok(self.portfolio(id)?.shares_of(&normalize_name(stock)))
    }

    pub fn portfolio_value(&self, id: &str, timestamp: NaiveDateTime) -> Result<Decimal, ExchangeError> {
        self.portfolio(id)?
            .value_at(&self.stocks, round_timestamp(timestamp))
    }

    pub fn portfolio_percent_change_for_month(
        &self,
        id: &str,
        year: i32,
        month: u32,
    ) -> Result<Decimal, ExchangeError> {
        self.portfolio(id)?
            .percent_change_for_month(&self.stocks, year, month)
    }
}
