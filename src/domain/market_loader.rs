//! Rebuilds an exchange from a market snapshot.
//!
//! Rows are replayed in the order listings, prices, index definitions,
//! holdings. In strict mode the first rejected row aborts the load; in lenient
//! mode rejected rows are skipped, logged and reported.

use std::fmt;
use tracing::{info, warn};

use crate::domain::error::{ExchangeError, StockexError};
use crate::domain::exchange::StockExchange;
use crate::domain::index::IndexKind;
use crate::domain::market_data::{Holding, IndexMembership, MarketSnapshot};
use crate::ports::market_data_port::MarketDataPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Strict,
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    Listing,
    Price,
    Index,
    Holding,
}

impl fmt::Display for RowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowSource::Listing => "listings",
            RowSource::Price => "prices",
            RowSource::Index => "indexes",
            RowSource::Holding => "holdings",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub source: RowSource,
    /// 1-based position of the row within its source.
    pub row: usize,
    pub reason: ExchangeError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub listings: usize,
    pub prices: usize,
    pub index_rows: usize,
    pub holding_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    pub fn applied(&self) -> usize {
        self.listings + self.prices + self.index_rows + self.holding_rows
    }
}

pub fn load_market(
    port: &dyn MarketDataPort,
    mode: LoadMode,
) -> Result<(StockExchange, LoadReport), StockexError> {
    let snapshot = port.fetch_snapshot()?;
    let mut exchange = StockExchange::new();
    let report = apply_snapshot(&mut exchange, &snapshot, mode)?;
    Ok((exchange, report))
}

pub fn apply_snapshot(
    exchange: &mut StockExchange,
    snapshot: &MarketSnapshot,
    mode: LoadMode,
) -> Result<LoadReport, StockexError> {
    let mut report = LoadReport::default();
    let mut outcome = Outcome {
        mode,
        report: &mut report,
    };

    for (i, listing) in snapshot.listings.iter().enumerate() {
        let result = exchange.list_stock(
            &listing.name,
            listing.quantity,
            listing.price,
            listing.timestamp,
        );
        if outcome.record(RowSource::Listing, i + 1, result)? {
            outcome.report.listings += 1;
        }
    }

    for (i, tick) in snapshot.prices.iter().enumerate() {
        let result = exchange.set_stock_price(&tick.name, tick.timestamp, tick.price);
        if outcome.record(RowSource::Price, i + 1, result)? {
            outcome.report.prices += 1;
        }
    }

    for (i, row) in snapshot.indices.iter().enumerate() {
        let result = apply_index_row(exchange, row);
        if outcome.record(RowSource::Index, i + 1, result)? {
            outcome.report.index_rows += 1;
        }
    }

    for (i, row) in snapshot.holdings.iter().enumerate() {
        let result = apply_holding_row(exchange, row);
        if outcome.record(RowSource::Holding, i + 1, result)? {
            outcome.report.holding_rows += 1;
        }
    }

    info!(
        stocks = exchange.number_of_stocks(),
        indices = exchange.number_of_indices(),
        portfolios = exchange.number_of_portfolios(),
        skipped = report.skipped.len(),
        "market loaded"
    );
    Ok(report)
}

struct Outcome<'a> {
    mode: LoadMode,
    report: &'a mut LoadReport,
}

impl Outcome<'_> {
    /// `Ok(true)` when the row applied, `Ok(false)` when it was skipped.
    fn record<T>(
        &mut self,
        source: RowSource,
        row: usize,
        result: Result<T, ExchangeError>,
    ) -> Result<bool, StockexError> {
        match result {
            Ok(_) => Ok(true),
            Err(reason) => match self.mode {
                LoadMode::Strict => Err(StockexError::MarketData {
                    source_name: format!("{source} row {row}"),
                    reason: reason.to_string(),
                }),
                LoadMode::Lenient => {
                    warn!(%source, row, error = %reason, "skipping rejected row");
                    self.report.skipped.push(SkippedRow {
                        source,
                        row,
                        reason,
                    });
                    Ok(false)
                }
            },
        }
    }
}

fn apply_index_row(exchange: &mut StockExchange, row: &IndexMembership) -> Result<(), ExchangeError> {
    let kind: IndexKind = row.kind.parse()?;
    if let Some(stock) = &row.stock {
        exchange.stock(stock)?;
    }

    if exchange.index_exists(&row.index) {
        let existing = exchange.index(&row.index)?.kind();
        if existing != kind {
            return Err(ExchangeError::invalid(format!(
                "index {} is {existing}, row declares {kind}",
                row.index
            )));
        }
    } else {
        exchange.create_index(&row.index, kind)?;
    }

    match &row.stock {
        Some(stock) => exchange.add_stock_to_index(&row.index, stock),
        None => Ok(()),
    }
}

/// The portfolio is created on first sight even when the row's transfer is
/// then rejected.
fn apply_holding_row(exchange: &mut StockExchange, row: &Holding) -> Result<(), ExchangeError> {
    let transfer = match &row.stock {
        Some(stock) => {
            exchange.stock(stock)?;
            if row.shares == 0 {
                return Err(ExchangeError::invalid("number of shares must not be zero"));
            }
            let shares = row
                .shares
                .checked_abs()
                .ok_or_else(|| ExchangeError::overflow(format!("share count {}", row.shares)))?;
            Some((stock, row.shares > 0, shares))
        }
        None => None,
    };

    if !exchange.portfolio_exists(&row.portfolio) {
        exchange.create_portfolio(&row.portfolio)?;
    }

    match transfer {
        Some((stock, true, shares)) => exchange.add_stock_to_portfolio(&row.portfolio, stock, shares),
        Some((stock, false, shares)) => {
            exchange.remove_stock_from_portfolio(&row.portfolio, stock, shares)
        }
        None => Ok(()),
    }
}
