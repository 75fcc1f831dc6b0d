//! Domain and application error types.

use chrono::NaiveDateTime;

/// A domain violation raised by the exchange or one of its entities.
///
/// Every failing operation returns one of these before mutating any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("stock {stock} already has a price at {timestamp}")]
    DuplicatePrice {
        stock: String,
        timestamp: NaiveDateTime,
    },

    #[error("stock {stock} has no price at or before {timestamp}")]
    NoPriceBefore {
        stock: String,
        timestamp: NaiveDateTime,
    },

    #[error("not enough shares of {stock}: requested {requested}, available {available}")]
    InsufficientShares {
        stock: String,
        requested: i64,
        available: i64,
    },

    #[error("invalid date: year {year}, month {month}")]
    InvalidDate { year: i32, month: u32 },

    #[error("unrecognized index type: {0}")]
    UnknownIndexKind(String),

    #[error("{what} is out of range")]
    Overflow { what: String },
}

impl ExchangeError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ExchangeError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(what: impl Into<String>) -> Self {
        ExchangeError::Overflow { what: what.into() }
    }

    pub(crate) fn not_found(kind: &'static str, name: &str) -> Self {
        ExchangeError::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub(crate) fn already_exists(kind: &'static str, name: &str) -> Self {
        ExchangeError::AlreadyExists {
            kind,
            name: name.to_string(),
        }
    }
}

/// Top-level error type for stockex.
#[derive(Debug, thiserror::Error)]
pub enum StockexError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("market data error in {source_name}: {reason}")]
    MarketData { source_name: String, reason: String },

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StockexError> for std::process::ExitCode {
    fn from(err: &StockexError) -> Self {
        let code: u8 = match err {
            StockexError::Io(_) => 1,
            StockexError::ConfigParse { .. }
            | StockexError::ConfigMissing { .. }
            | StockexError::ConfigInvalid { .. } => 2,
            StockexError::MarketData { .. } => 3,
            StockexError::Exchange(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn exchange_error_messages() {
        let err = ExchangeError::not_found("stock", "BHP");
        assert_eq!(err.to_string(), "stock BHP not found");

        let err = ExchangeError::InsufficientShares {
            stock: "BHP".into(),
            requested: 10,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "not enough shares of BHP: requested 10, available 4"
        );
    }

    #[test]
    fn no_price_message_includes_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let err = ExchangeError::NoPriceBefore {
            stock: "CBA".into(),
            timestamp: ts,
        };
        assert_eq!(
            err.to_string(),
            "stock CBA has no price at or before 2024-01-15 09:30:00"
        );
    }

    #[test]
    fn exchange_error_converts_to_stockex_error() {
        let err: StockexError = ExchangeError::invalid("shares must be positive").into();
        assert!(matches!(err, StockexError::Exchange(ExchangeError::InvalidArgument { .. })));
        assert_eq!(err.to_string(), "invalid argument: shares must be positive");
    }
}
