//! Market data access port trait.

use crate::domain::error::StockexError;
use crate::domain::market_data::{Holding, IndexMembership, Listing, MarketSnapshot, PriceTick};

pub trait MarketDataPort {
    fn fetch_listings(&self) -> Result<Vec<Listing>, StockexError>;

    fn fetch_prices(&self) -> Result<Vec<PriceTick>, StockexError>;

    fn fetch_indices(&self) -> Result<Vec<IndexMembership>, StockexError>;

    fn fetch_holdings(&self) -> Result<Vec<Holding>, StockexError>;

    /// Default implementation: fetches the four row sets in replay order.
    fn fetch_snapshot(&self) -> Result<MarketSnapshot, StockexError> {
        Ok(MarketSnapshot {
            listings: self.fetch_listings()?,
            prices: self.fetch_prices()?,
            indices: self.fetch_indices()?,
            holdings: self.fetch_holdings()?,
        })
    }
}
