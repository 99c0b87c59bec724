//! CSV report adapter.
//!
//! Writes the trade log, the value series and the headline statistics as CSV
//! files for whatever charting or spreadsheet tool consumes them.

use crate::domain::backtest::{BacktestResult, ValuePoint};
use crate::domain::error::TradesimError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::trade::Trade;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const TRADES_FILE: &str = "trades.csv";
pub const VALUES_FILE: &str = "portfolio_value.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    pub fn write_trades<W: Write>(trades: &[Trade], out: W) -> Result<(), TradesimError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record([
            "action",
            "price",
            "effective_price",
            "quantity",
            "fee",
            "total_cost",
            "revenue",
            "remaining_cash",
        ])
        .map_err(report_error)?;

        for trade in trades {
            wtr.write_record([
                trade.action.to_string(),
                trade.price.to_string(),
                trade.effective_price.to_string(),
                trade.quantity.to_string(),
                trade.fee.to_string(),
                optional(trade.total_cost()),
                optional(trade.revenue()),
                trade.remaining_cash.to_string(),
            ])
            .map_err(report_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_values<W: Write>(values: &[ValuePoint], out: W) -> Result<(), TradesimError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(["timestamp", "close", "value", "action"])
            .map_err(report_error)?;

        for point in values {
            wtr.write_record([
                point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                point.close.to_string(),
                point.value.to_string(),
                point.action.as_signal().to_string(),
            ])
            .map_err(report_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_summary<W: Write>(
        summary: &PerformanceSummary,
        out: W,
    ) -> Result<(), TradesimError> {
        let rows = [
            ("initial_value", summary.initial_value.to_string()),
            ("final_value", summary.final_value.to_string()),
            ("total_return", summary.total_return.to_string()),
            ("years", summary.years.to_string()),
            ("cagr", optional(summary.cagr)),
            ("sharpe_ratio", optional(summary.sharpe_ratio)),
            ("volatility", optional(summary.volatility)),
            ("max_drawdown", optional(summary.max_drawdown)),
            ("total_trades", summary.total_trades.to_string()),
            ("buys", summary.buys.to_string()),
            ("sells", summary.sells.to_string()),
            ("total_fees", summary.total_fees.to_string()),
        ];

        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(["metric", "value"]).map_err(report_error)?;
        for (metric, value) in rows {
            wtr.write_record([metric, value.as_str()])
                .map_err(report_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        summary: &PerformanceSummary,
        output_dir: &Path,
    ) -> Result<(), TradesimError> {
        fs::create_dir_all(output_dir)?;

        Self::write_trades(
            result.portfolio.trade_summary(),
            fs::File::create(output_dir.join(TRADES_FILE))?,
        )?;
        Self::write_values(
            &result.value_series,
            fs::File::create(output_dir.join(VALUES_FILE))?,
        )?;
        Self::write_summary(summary, fs::File::create(output_dir.join(SUMMARY_FILE))?)?;

        info!(dir = %output_dir.display(), "report written");
        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn report_error(e: csv::Error) -> TradesimError {
    TradesimError::Report {
        reason: e.to_string(),
    }
}
