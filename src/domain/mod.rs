//! Core domain types and logic.

pub mod timestamp;
pub mod price_history;
pub mod stock;
pub mod index;
pub mod portfolio;
pub mod exchange;
pub mod market_data;
pub mod market_loader;
pub mod config_validation;
pub mod error;
