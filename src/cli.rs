//! CLI definition and dispatch.

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvMarketAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{report_precision, validate_session_config};
use crate::domain::error::{ExchangeError, StockexError};
use crate::domain::exchange::StockExchange;
use crate::domain::market_loader::{LoadMode, LoadReport, load_market};
use crate::domain::timestamp::{month_bounds, parse_timestamp};
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "stockex", about = "In-memory stock exchange over CSV market files")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a session file and load its market
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Summarize listed stocks, indexes and portfolios
    Summary {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Price of a stock at a point in time (last price if --at is omitted)
    Price {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        stock: String,
        #[arg(long)]
        at: Option<String>,
    },
    /// Value of an index at a point in time
    IndexValue {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        index: String,
        #[arg(long)]
        at: String,
    },
    /// Value of a portfolio at a point in time
    PortfolioValue {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        portfolio: String,
        #[arg(long)]
        at: String,
    },
    /// Percent change of a portfolio's value over one month
    MonthlyChange {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        portfolio: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// CSV of a portfolio's month-by-month performance for a year
    MonthlyReport {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        portfolio: String,
        #[arg(long)]
        year: i32,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Validate { config } => run_validate(&config),
        Command::Summary { config } => run_summary(&config),
        Command::Price { config, stock, at } => run_price(&config, &stock, at.as_deref()),
        Command::IndexValue { config, index, at } => run_index_value(&config, &index, &at),
        Command::PortfolioValue {
            config,
            portfolio,
            at,
        } => run_portfolio_value(&config, &portfolio, &at),
        Command::MonthlyChange {
            config,
            portfolio,
            year,
            month,
        } => run_monthly_change(&config, &portfolio, year, month),
        Command::MonthlyReport {
            config,
            portfolio,
            year,
        } => run_monthly_report(&config, &portfolio, year),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// A loaded market plus the settings needed to present it.
pub struct Session {
    pub exchange: StockExchange,
    pub report: LoadReport,
    pub precision: u32,
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StockexError> {
    FileConfigAdapter::from_file(path).map_err(|e| StockexError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn load_mode(config: &dyn ConfigPort) -> LoadMode {
    if config.get_bool("market", "strict", true) {
        LoadMode::Strict
    } else {
        LoadMode::Lenient
    }
}

/// Reads and validates the session file, then replays its market files.
pub fn open_session(config_path: &Path) -> Result<Session, StockexError> {
    info!(config = %config_path.display(), "loading session");
    let config = load_config(config_path)?;
    validate_session_config(&config)?;

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let adapter = CsvMarketAdapter::from_config(&config, config_dir)?;
    info!(data_dir = %adapter.base_path().display(), "reading market files");

    let (exchange, report) = load_market(&adapter, load_mode(&config))?;
    Ok(Session {
        exchange,
        report,
        precision: report_precision(&config),
    })
}

pub fn format_value(value: Decimal, precision: u32) -> String {
    format!("{:.*}", precision as usize, value.round_dp(precision))
}

fn parse_at(input: &str) -> Result<NaiveDateTime, StockexError> {
    Ok(parse_timestamp(input)?)
}

pub fn run_validate(config_path: &Path) -> Result<(), StockexError> {
    let session = open_session(config_path)?;
    let report = &session.report;
    println!("listings:      {}", report.listings);
    println!("price ticks:   {}", report.prices);
    println!("index rows:    {}", report.index_rows);
    println!("holding rows:  {}", report.holding_rows);
    if !report.skipped.is_empty() {
        println!("skipped rows:  {}", report.skipped.len());
        for skipped in &report.skipped {
            eprintln!("  {} row {}: {}", skipped.source, skipped.row, skipped.reason);
        }
    }
    eprintln!("\nSession is valid.");
    Ok(())
}

pub fn run_summary(config_path: &Path) -> Result<(), StockexError> {
    let session = open_session(config_path)?;
    let mut out = io::stdout().lock();
    write_summary(&session.exchange, session.precision, &mut out)?;
    Ok(())
}

pub fn write_summary<W: Write>(
    exchange: &StockExchange,
    precision: u32,
    out: &mut W,
) -> Result<(), StockexError> {
    writeln!(out, "=== Stocks ({}) ===", exchange.number_of_stocks())?;
    for stock in exchange.stocks() {
        writeln!(
            out,
            "  {}: issued {}, sold {}, available {}, initial {}, last {}",
            stock.name(),
            stock.quantity(),
            exchange.shares_sold(stock.name())?,
            exchange.shares_available(stock.name())?,
            format_value(stock.initial_price(), precision),
            format_value(stock.last_price(), precision),
        )?;
    }

    writeln!(out, "\n=== Indexes ({}) ===", exchange.number_of_indices())?;
    for index in exchange.indices() {
        let members: Vec<&str> = index.members().collect();
        writeln!(
            out,
            "  {} [{}]: {}",
            index.name(),
            index.kind(),
            members.join(", ")
        )?;
    }

    writeln!(out, "\n=== Portfolios ({}) ===", exchange.number_of_portfolios())?;
    for portfolio in exchange.portfolios() {
        let holdings: Vec<String> = portfolio
            .holdings()
            .map(|(stock, shares)| format!("{stock} x{shares}"))
            .collect();
        writeln!(out, "  {}: {}", portfolio.id(), holdings.join(", "))?;
    }
    Ok(())
}

pub fn run_price(config_path: &Path, stock: &str, at: Option<&str>) -> Result<(), StockexError> {
    let session = open_session(config_path)?;
    let price = match at {
        Some(at) => session.exchange.stock_price(stock, parse_at(at)?)?,
        None => session.exchange.last_stock_price(stock)?,
    };
    println!("{}", format_value(price, session.precision));
    Ok(())
}

pub fn run_index_value(config_path: &Path, index: &str, at: &str) -> Result<(), StockexError> {
    let session = open_session(config_path)?;
    let value = session.exchange.index_value(index, parse_at(at)?)?;
    println!("{}", format_value(value, session.precision));
    Ok(())
}

pub fn run_portfolio_value(config_path: &Path, portfolio: &str, at: &str) -> Result<(), StockexError> {
    let session = open_session(config_path)?;
    let value = session.exchange.portfolio_value(portfolio, parse_at(at)?)?;
    println!("{}", format_value(value, session.precision));
    Ok(())
}

pub fn run_monthly_change(
    config_path: &Path,
    portfolio: &str,
    year: i32,
    month: u32,
) -> Result<(), StockexError> {
    let session = open_session(config_path)?;
    let change = session
        .exchange
        .portfolio_percent_change_for_month(portfolio, year, month)?;
    println!("{}%", format_value(change, session.precision));
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    pub month: u32,
    pub start_value: Decimal,
    pub end_value: Decimal,
    pub percent_change: Decimal,
}

/// One row per month of `year` whose valuation succeeds, plus the months
/// that could not be valued.
pub fn monthly_rows(
    exchange: &StockExchange,
    portfolio: &str,
    year: i32,
) -> Result<(Vec<MonthlyRow>, Vec<(u32, ExchangeError)>), StockexError> {
    exchange.portfolio(portfolio)?;

    let mut rows = Vec::new();
    let mut failures = Vec::new();
    for month in 1..=12 {
        let row = month_bounds(year, month).and_then(|(start, end)| {
            Ok(MonthlyRow {
                month,
                start_value: exchange.portfolio_value(portfolio, start)?,
                end_value: exchange.portfolio_value(portfolio, end)?,
                percent_change: exchange.portfolio_percent_change_for_month(portfolio, year, month)?,
            })
        });
        match row {
            Ok(row) => rows.push(row),
            Err(e) => failures.push((month, e)),
        }
    }
    Ok((rows, failures))
}

pub fn write_monthly_csv<W: Write>(
    rows: &[MonthlyRow],
    precision: u32,
    out: W,
) -> Result<(), StockexError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["month", "start_value", "end_value", "percent_change"])
        .map_err(io::Error::other)?;
    for row in rows {
        wtr.write_record([
            row.month.to_string(),
            format_value(row.start_value, precision),
            format_value(row.end_value, precision),
            format_value(row.percent_change, precision),
        ])
        .map_err(io::Error::other)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run_monthly_report(config_path: &Path, portfolio: &str, year: i32) -> Result<(), StockexError> {
    let session = open_session(config_path)?;
    let (rows, failures) = monthly_rows(&session.exchange, portfolio, year)?;
    for (month, e) in &failures {
        eprintln!("warning: skipping {year}-{month:02} ({e})");
    }
    write_monthly_csv(&rows, session.precision, io::stdout().lock())
}
