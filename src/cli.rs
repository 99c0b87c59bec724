//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::{
    parse_optional_date, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::TradesimError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::strategy::{PositionSizing, SmaCrossover};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Single-instrument trading simulator")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overriding [data] path
        #[arg(long)]
        data: Option<PathBuf>,
        /// Report directory, overriding [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the time range of a price file
    Info {
        #[arg(long)]
        data: PathBuf,
    },
}

impl Cli {
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        // A subscriber may already be installed when embedded in tests.
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

pub fn run(cli: Cli) -> ExitCode {
    cli.init_logging();

    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            dry_run,
        } => run_backtest(&config, data.as_deref(), output.as_deref(), dry_run),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data } => run_info(&data),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn load_validated_config(path: &Path) -> Result<FileConfigAdapter, TradesimError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    Ok(adapter)
}

fn run_backtest(
    config_path: &Path,
    data_override: Option<&Path>,
    output_override: Option<&Path>,
    dry_run: bool,
) -> Result<(), TradesimError> {
    let adapter = load_validated_config(config_path)?;

    let bt_config = build_backtest_config(&adapter)?;
    let strategy = build_strategy(&adapter)?;
    let data_path = resolve_data_path(data_override, &adapter)?;
    let output_dir = resolve_output_dir(output_override, &adapter);
    let ticker = adapter
        .get_string("data", "ticker")
        .unwrap_or_else(|| "UNKNOWN".to_string());

    if dry_run {
        eprintln!("Config valid: {}", config_path.display());
        eprintln!("  Ticker:   {}", ticker);
        eprintln!("  Data:     {}", data_path.display());
        eprintln!("  Strategy: {} (quantity {})", strategy.name(), strategy.sizing);
        return Ok(());
    }

    let data_port = CsvPriceAdapter::new(&data_path);
    let start_date = parse_optional_date(&adapter, "start_date")?;
    let end_date = parse_optional_date(&adapter, "end_date")?;

    let report_writer = CsvReportAdapter::new();

    let summary = run_backtest_pipeline(
        &data_port,
        &strategy,
        &bt_config,
        (start_date, end_date),
        output_dir
            .as_deref()
            .map(|dir| (dir, &report_writer as &dyn ReportPort)),
    )?;

    print_summary(&ticker, &strategy, &summary);
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TradesimError> {
    let adapter = load_validated_config(config_path)?;
    let strategy = build_strategy(&adapter)?;
    eprintln!("Config valid: {}", config_path.display());
    eprintln!("  Strategy: {}", strategy.name());
    Ok(())
}

fn run_info(data_path: &Path) -> Result<(), TradesimError> {
    let data_port = CsvPriceAdapter::new(data_path);
    match data_port.data_range()? {
        Some((first, last, count)) => {
            println!("{}: {} to {} ({} bars)", data_path.display(), first, last, count);
            Ok(())
        }
        None => Err(TradesimError::NoData {
            path: data_path.display().to_string(),
        }),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TradesimError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_cash: adapter.get_double("backtest", "initial_cash", defaults.initial_cash),
        transaction_cost: adapter.get_double(
            "backtest",
            "transaction_cost",
            defaults.transaction_cost,
        ),
        slippage: adapter.get_double("backtest", "slippage", defaults.slippage),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", defaults.risk_free_rate),
        periods_per_year: adapter.get_double(
            "backtest",
            "periods_per_year",
            defaults.periods_per_year,
        ),
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<SmaCrossover, TradesimError> {
    let defaults = SmaCrossover::default();

    let window = |key: &str, default: usize| -> Result<usize, TradesimError> {
        let value = adapter.get_int("strategy", key, default as i64);
        usize::try_from(value).map_err(|_| TradesimError::ConfigInvalid {
            section: "strategy".into(),
            key: key.into(),
            reason: format!("{} must be non-negative", key),
        })
    };

    let sizing = match adapter.get_string("strategy", "quantity") {
        None => defaults.sizing,
        Some(s) if s.trim().eq_ignore_ascii_case("all") => PositionSizing::AllCash,
        Some(s) => PositionSizing::Fixed(s.trim().parse().map_err(|_| {
            TradesimError::ConfigInvalid {
                section: "strategy".into(),
                key: "quantity".into(),
                reason: format!("not a number: {}", s),
            }
        })?),
    };

    Ok(SmaCrossover {
        short_window: window("short_window", defaults.short_window)?,
        long_window: window("long_window", defaults.long_window)?,
        sizing,
        stop_loss_pct: adapter.get_double("strategy", "stop_loss", defaults.stop_loss_pct),
        take_profit_pct: adapter.get_double("strategy", "take_profit", defaults.take_profit_pct),
    })
}

pub fn resolve_data_path(
    data_override: Option<&Path>,
    adapter: &dyn ConfigPort,
) -> Result<PathBuf, TradesimError> {
    if let Some(path) = data_override {
        return Ok(path.to_path_buf());
    }
    adapter
        .get_string("data", "path")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| TradesimError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

pub fn resolve_output_dir(
    output_override: Option<&Path>,
    adapter: &dyn ConfigPort,
) -> Option<PathBuf> {
    output_override.map(Path::to_path_buf).or_else(|| {
        adapter
            .get_string("report", "output_dir")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    })
}

/// Loads prices, runs the strategy, computes statistics and optionally hands
/// the run to a report writer.
pub fn run_backtest_pipeline(
    data_port: &dyn PriceDataPort,
    strategy: &SmaCrossover,
    bt_config: &BacktestConfig,
    date_range: (Option<chrono::NaiveDate>, Option<chrono::NaiveDate>),
    report: Option<(&Path, &dyn ReportPort)>,
) -> Result<PerformanceSummary, TradesimError> {
    let (start_date, end_date) = date_range;
    let bars = data_port.fetch_prices(start_date, end_date)?;
    if bars.len() < strategy.long_window {
        return Err(TradesimError::InsufficientData {
            bars: bars.len(),
            minimum: strategy.long_window,
        });
    }

    let result = backtest_engine::run_backtest(&bars, strategy, bt_config)?;
    let summary = PerformanceSummary::compute(&result, bt_config);

    if let Some((dir, writer)) = report {
        writer.write(&result, &summary, dir)?;
    }

    Ok(summary)
}

fn print_summary(ticker: &str, strategy: &SmaCrossover, summary: &PerformanceSummary) {
    let fmt_pct = |v: Option<f64>| match v {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "n/a".to_string(),
    };
    let fmt_ratio = |v: Option<f64>| match v {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    };

    eprintln!("\n=== {} / {} ===", ticker, strategy.name());
    eprintln!("Initial Value:    {:.2}", summary.initial_value);
    eprintln!("Final Value:      {:.2}", summary.final_value);
    eprintln!("Total Return:     {:.2}%", summary.total_return * 100.0);
    eprintln!("CAGR:             {}", fmt_pct(summary.cagr));
    eprintln!("Sharpe Ratio:     {}", fmt_ratio(summary.sharpe_ratio));
    eprintln!("Volatility:       {}", fmt_pct(summary.volatility));
    eprintln!(
        "Max Drawdown:     {}",
        summary
            .max_drawdown
            .map(|dd| format!("-{:.1}%", dd * 100.0))
            .unwrap_or_else(|| "n/a".to_string())
    );
    eprintln!(
        "Trades:           {} ({} buys, {} sells)",
        summary.total_trades, summary.buys, summary.sells
    );
    eprintln!("Fees Paid:        {:.2}", summary.total_fees);
}
