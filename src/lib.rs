//! stockex: in-memory stock exchange with listings, price histories,
//! average and weighted indexes, and client portfolios.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

pub use domain::error::{ExchangeError, StockexError};
pub use domain::exchange::StockExchange;
pub use domain::index::IndexKind;
