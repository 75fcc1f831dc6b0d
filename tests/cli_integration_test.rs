//! CLI integration tests for session loading and report output.
//!
//! Tests cover:
//! - Session files and market directories on disk
//! - Strict and lenient loading
//! - Summary and monthly report rendering
//! - Error mapping for the run_* commands

mod common;

use common::*;
use rust_decimal_macros::dec;
use stockex::cli::{self, MonthlyRow};
use stockex::domain::error::StockexError;
use stockex::domain::market_loader::LoadMode;
use std::fs;
use tempfile::TempDir;

mod sessions {
    use super::*;

    #[test]
    fn open_session_loads_every_file() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "");
        let session = cli::open_session(&session_path).unwrap();

        assert_eq!(session.precision, 3);
        assert_eq!(session.report.listings, 2);
        assert_eq!(session.report.prices, 3);
        assert_eq!(session.report.index_rows, 4);
        assert_eq!(session.report.holding_rows, 5);

        let exchange = &session.exchange;
        assert_eq!(exchange.number_of_portfolios(), 3);
        assert_eq!(exchange.number_of_shares_in_portfolio("bob", "BHP").unwrap(), 60);
        assert_eq!(exchange.shares_sold("BHP").unwrap(), 70);
        assert_eq!(exchange.number_of_stocks_in_portfolio("carol").unwrap(), 0);
    }

    #[test]
    fn precision_comes_from_report_section() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "[report]\nprecision = 1\n");
        assert_eq!(cli::open_session(&session_path).unwrap().precision, 1);
    }

    #[test]
    fn bad_precision_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "[report]\nprecision = 40\n");
        let err = cli::open_session(&session_path).err().unwrap();
        assert!(matches!(err, StockexError::ConfigInvalid { .. }));
    }

    #[test]
    fn missing_data_dir_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let session_path = dir.path().join("session.ini");
        fs::write(&session_path, "[market]\nstrict = true\n").unwrap();
        let err = cli::open_session(&session_path).err().unwrap();
        assert!(matches!(err, StockexError::ConfigMissing { .. }));
    }

    #[test]
    fn missing_session_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(cli::run_validate(&dir.path().join("absent.ini")).is_err());
    }

    #[test]
    fn strict_session_rejects_over_allocation() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "");
        let holdings = format!("{HOLDINGS_CSV}dave,CBA,46\n");
        fs::write(dir.path().join("data").join("holdings.csv"), holdings).unwrap();

        let err = cli::open_session(&session_path).err().unwrap();
        match err {
            StockexError::MarketData { source_name, .. } => {
                assert_eq!(source_name, "holdings row 6")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lenient_session_skips_over_allocation() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "strict = false\n");
        let holdings = format!("{HOLDINGS_CSV}dave,CBA,46\n");
        fs::write(dir.path().join("data").join("holdings.csv"), holdings).unwrap();

        let session = cli::open_session(&session_path).unwrap();
        assert_eq!(session.report.skipped.len(), 1);
        assert_eq!(session.report.skipped[0].row, 6);
        assert!(session.exchange.portfolio_exists("dave"));
        assert_eq!(session.exchange.shares_available("CBA").unwrap(), 45);
    }

    #[test]
    fn load_mode_defaults_to_strict() {
        let config = stockex::adapters::file_config_adapter::FileConfigAdapter::from_string(
            "[market]\ndata_dir = data\n",
        )
        .unwrap();
        assert_eq!(cli::load_mode(&config), LoadMode::Strict);
    }
}

mod reports {
    use super::*;

    #[test]
    fn format_value_rounds_to_precision() {
        assert_eq!(cli::format_value(dec!(12.5), 3), "12.500");
        assert_eq!(cli::format_value(dec!(15.63636), 2), "15.64");
        assert_eq!(cli::format_value(dec!(7), 0), "7");
    }

    #[test]
    fn summary_lists_stocks_indexes_and_portfolios() {
        let dir = TempDir::new().unwrap();
        let session = cli::open_session(&write_market(dir.path(), "")).unwrap();

        let mut out = Vec::new();
        cli::write_summary(&session.exchange, session.precision, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("=== Stocks (2) ==="));
        assert!(text.contains(
            "BHP: issued 100, sold 70, available 30, initial 10.000, last 12.500"
        ));
        assert!(text.contains("TOP [WEIGHTED]: BHP, CBA"));
        assert!(text.contains("AVG [AVERAGE]: BHP, CBA"));
        assert!(text.contains("alice: BHP x10, CBA x5"));
        assert!(text.contains("=== Portfolios (3) ==="));
    }

    #[test]
    fn monthly_rows_cover_the_year() {
        let dir = TempDir::new().unwrap();
        let session = cli::open_session(&write_market(dir.path(), "")).unwrap();
        let (rows, failures) = cli::monthly_rows(&session.exchange, "alice", 2024).unwrap();

        assert!(failures.is_empty());
        assert_eq!(rows.len(), 12);
        // Jan 1: 10*10 + 5*20; Feb 1: 10*11 + 5*18
        assert_eq!(rows[0].start_value, dec!(200));
        assert_eq!(rows[0].end_value, dec!(200));
        assert_eq!(rows[0].percent_change, dec!(0));
        // Mar 1: 10*12.5 + 5*18
        assert_eq!(rows[1].end_value, dec!(215));
        assert_eq!(rows[1].percent_change, dec!(7.5));
    }

    #[test]
    fn months_before_listing_are_reported_as_failures() {
        let dir = TempDir::new().unwrap();
        let session = cli::open_session(&write_market(dir.path(), "")).unwrap();
        let (rows, failures) = cli::monthly_rows(&session.exchange, "alice", 2023).unwrap();
        assert!(rows.is_empty());
        assert_eq!(failures.len(), 12);
        assert_eq!(failures[0].0, 1);
    }

    #[test]
    fn monthly_rows_for_unknown_portfolio_fail() {
        let dir = TempDir::new().unwrap();
        let session = cli::open_session(&write_market(dir.path(), "")).unwrap();
        let err = cli::monthly_rows(&session.exchange, "ALICE", 2024).err().unwrap();
        assert!(matches!(err, StockexError::Exchange(_)));
    }

    #[test]
    fn monthly_csv_output() {
        let rows = vec![
            MonthlyRow {
                month: 1,
                start_value: dec!(200),
                end_value: dec!(200),
                percent_change: dec!(0),
            },
            MonthlyRow {
                month: 2,
                start_value: dec!(200),
                end_value: dec!(215),
                percent_change: dec!(7.5),
            },
        ];
        let mut out = Vec::new();
        cli::write_monthly_csv(&rows, 2, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "month,start_value,end_value,percent_change\n\
             1,200.00,200.00,0.00\n\
             2,200.00,215.00,7.50\n"
        );
    }
}

mod commands {
    use super::*;

    #[test]
    fn price_of_unknown_stock_is_an_exchange_error() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "");
        let err = cli::run_price(&session_path, "XYZ", None).unwrap_err();
        assert!(matches!(err, StockexError::Exchange(_)));
    }

    #[test]
    fn index_value_with_bad_timestamp_fails() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "");
        assert!(cli::run_index_value(&session_path, "top", "yesterday").is_err());
    }

    #[test]
    fn commands_succeed_on_valid_session() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "");
        cli::run_validate(&session_path).unwrap();
        cli::run_price(&session_path, "bhp", Some("2024-02-15")).unwrap();
        cli::run_index_value(&session_path, "avg", "2024-02-15T12:00:00").unwrap();
        cli::run_portfolio_value(&session_path, "alice", "2024-03-01").unwrap();
        cli::run_monthly_change(&session_path, "alice", 2024, 2).unwrap();
    }

    #[test]
    fn monthly_change_with_bad_month_fails() {
        let dir = TempDir::new().unwrap();
        let session_path = write_market(dir.path(), "");
        let err = cli::run_monthly_change(&session_path, "alice", 2024, 13).unwrap_err();
        assert!(matches!(err, StockexError::Exchange(_)));
    }
}
