#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tradesim::domain::backtest::{BacktestConfig, BacktestResult};
use tradesim::domain::error::TradesimError;
use tradesim::domain::metrics::PerformanceSummary;
pub use tradesim::domain::price_bar::PriceBar;
use tradesim::domain::strategy::{PositionSizing, SmaCrossover};
use tradesim::ports::data_port::PriceDataPort;
use tradesim::ports::report_port::ReportPort;

pub struct MockPriceDataPort {
    pub bars: Vec<PriceBar>,
    pub error: Option<String>,
}

impl MockPriceDataPort {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars, error: None }
    }

    pub fn with_error(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_prices(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, TradesimError> {
        if let Some(reason) = &self.error {
            return Err(TradesimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.timestamp.date() >= s))
            .filter(|b| end_date.is_none_or(|e| b.timestamp.date() <= e))
            .cloned()
            .collect())
    }
}

/// Records what it was asked to write.
#[derive(Default)]
pub struct RecordingReport {
    pub written: RefCell<Vec<(PathBuf, usize, usize)>>,
}

impl ReportPort for RecordingReport {
    fn write(
        &self,
        result: &BacktestResult,
        _summary: &PerformanceSummary,
        output_dir: &Path,
    ) -> Result<(), TradesimError> {
        self.written.borrow_mut().push((
            output_dir.to_path_buf(),
            result.portfolio.trade_summary().len(),
            result.value_series.len(),
        ));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
}

/// One bar per calendar day starting 2024-01-01.
pub fn daily_bars(closes: &[f64]) -> Vec<PriceBar> {
    let start = midnight(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::new(start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Up-trend, down-trend, up-trend: two full crossover cycles for 2/4 windows.
pub fn wave_closes() -> Vec<f64> {
    let mut closes = Vec::new();
    closes.extend((0..10).map(|i| 100.0 + i as f64 * 2.0));
    closes.extend((0..10).map(|i| 118.0 - i as f64 * 3.0));
    closes.extend((0..10).map(|i| 91.0 + i as f64 * 2.5));
    closes.extend((0..10).map(|i| 113.5 - i as f64 * 2.0));
    closes
}

pub fn fast_strategy(quantity: f64) -> SmaCrossover {
    SmaCrossover {
        short_window: 2,
        long_window: 4,
        sizing: PositionSizing::Fixed(quantity),
        stop_loss_pct: 0.0,
        take_profit_pct: 0.0,
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_cash: 100_000.0,
        transaction_cost: 0.001,
        slippage: 0.001,
        risk_free_rate: 0.02,
        periods_per_year: 252.0,
    }
}
