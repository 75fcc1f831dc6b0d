//! Session configuration validation.
//!
//! Runs before any market file is opened.

use crate::domain::error::StockexError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTINGS_FILE: &str = "listings.csv";
pub const DEFAULT_PRICES_FILE: &str = "prices.csv";
pub const DEFAULT_INDEXES_FILE: &str = "indexes.csv";
pub const DEFAULT_HOLDINGS_FILE: &str = "holdings.csv";
pub const DEFAULT_PRECISION: i64 = 3;
pub const MAX_PRECISION: i64 = 12;

const FILE_KEYS: [&str; 4] = ["listings", "prices", "indexes", "holdings"];

pub fn validate_session_config(config: &dyn ConfigPort) -> Result<(), StockexError> {
    validate_data_dir(config)?;
    validate_file_names(config)?;
    validate_precision(config)?;
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), StockexError> {
    match config.get_string("market", "data_dir") {
        Some(dir) if !dir.trim().is_empty() => Ok(()),
        Some(_) => Err(StockexError::ConfigInvalid {
            section: "market".to_string(),
            key: "data_dir".to_string(),
            reason: "data_dir must not be empty".to_string(),
        }),
        None => Err(StockexError::ConfigMissing {
            section: "market".to_string(),
            key: "data_dir".to_string(),
        }),
    }
}

fn validate_file_names(config: &dyn ConfigPort) -> Result<(), StockexError> {
    for key in FILE_KEYS {
        if let Some(name) = config.get_string("market", key) {
            if name.trim().is_empty() {
                return Err(StockexError::ConfigInvalid {
                    section: "market".to_string(),
                    key: key.to_string(),
                    reason: format!("{key} file name must not be empty when given"),
                });
            }
        }
    }
    Ok(())
}

fn validate_precision(config: &dyn ConfigPort) -> Result<(), StockexError> {
    let Some(raw) = config.get_string("report", "precision") else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(value) if (0..=MAX_PRECISION).contains(&value) => Ok(()),
        _ => Err(StockexError::ConfigInvalid {
            section: "report".to_string(),
            key: "precision".to_string(),
            reason: format!("precision must be an integer between 0 and {MAX_PRECISION}"),
        }),
    }
}

/// Decimal places used when printing values.
pub fn report_precision(config: &dyn ConfigPort) -> u32 {
    config
        .get_int("report", "precision", DEFAULT_PRECISION)
        .clamp(0, MAX_PRECISION) as u32
}
