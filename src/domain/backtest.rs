//! Backtest driver: feeds a price series through the crossover strategy into a
//! portfolio and records the resulting value series.
//!
//! BacktestConfig carries the run parameters; nothing here reads global state.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use super::error::TradesimError;
use super::metrics::{DEFAULT_RISK_FREE_RATE, TRADING_DAYS_PER_YEAR};
use super::portfolio::{DEFAULT_SLIPPAGE, DEFAULT_TRANSACTION_COST, Portfolio, TradeOutcome};
use super::price_bar::{PriceBar, validate_series};
use super::sma::sma_of_bars;
use super::strategy::{Action, PositionSizing, PositionState, Signal, SmaCrossover};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub transaction_cost: f64,
    pub slippage: f64,
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 100_000.0,
            transaction_cost: DEFAULT_TRANSACTION_COST,
            slippage: DEFAULT_SLIPPAGE,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

/// Portfolio value after the decision on one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePoint {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub value: f64,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub value_series: Vec<ValuePoint>,
    pub final_value: f64,
    /// Signals the portfolio could not act on (unaffordable buys).
    pub skipped_signals: usize,
}

impl BacktestResult {
    pub fn values(&self) -> Vec<f64> {
        self.value_series.iter().map(|p| p.value).collect()
    }
}

/// Runs the strategy over `bars`. Bars before the long average is defined are
/// not evaluated and do not appear in the value series.
pub fn run_backtest(
    bars: &[PriceBar],
    strategy: &SmaCrossover,
    config: &BacktestConfig,
) -> Result<BacktestResult, TradesimError> {
    validate_series(bars)?;
    if strategy.short_window == 0 || strategy.short_window >= strategy.long_window {
        return Err(TradesimError::validation(
            "short_window",
            format!(
                "must be positive and below long_window ({} vs {})",
                strategy.short_window, strategy.long_window
            ),
        ));
    }
    if bars.len() < strategy.long_window {
        return Err(TradesimError::InsufficientData {
            bars: bars.len(),
            minimum: strategy.long_window,
        });
    }

    let mut portfolio =
        Portfolio::with_costs(config.initial_cash, config.transaction_cost, config.slippage)?;
    let sma_short = sma_of_bars(bars, strategy.short_window);
    let sma_long = sma_of_bars(bars, strategy.long_window);

    info!(
        strategy = %strategy.name(),
        bars = bars.len(),
        initial_cash = config.initial_cash,
        "running backtest"
    );

    let mut state = PositionState::default();
    let mut value_series = Vec::with_capacity(bars.len());
    let mut skipped_signals = 0usize;

    for (i, bar) in bars.iter().enumerate() {
        let (Some(short), Some(long)) = (sma_short[i], sma_long[i]) else {
            continue;
        };

        let action = match strategy.decide(short, long, bar.close, &mut state) {
            Signal::Enter => {
                let quantity = match strategy.sizing {
                    PositionSizing::Fixed(quantity) => quantity,
                    PositionSizing::AllCash => portfolio.max_affordable_quantity(bar.close)?,
                };
                let outcome = if quantity > 0.0 {
                    portfolio.buy(bar.close, quantity)?
                } else {
                    TradeOutcome::InsufficientFunds {
                        required: bar.close,
                        available: portfolio.cash(),
                    }
                };
                match outcome {
                    TradeOutcome::Executed(_) => {
                        state.on_entry(bar.close);
                        Action::Buy
                    }
                    other => {
                        warn!(timestamp = %bar.timestamp, outcome = ?other, "buy signal skipped");
                        skipped_signals += 1;
                        Action::Hold
                    }
                }
            }
            Signal::Exit(reason) => match portfolio.sell_all(bar.close)? {
                TradeOutcome::Executed(_) => {
                    debug!(timestamp = %bar.timestamp, %reason, "position closed");
                    state.on_exit(reason);
                    Action::Sell
                }
                other => {
                    warn!(timestamp = %bar.timestamp, outcome = ?other, "sell signal skipped");
                    skipped_signals += 1;
                    Action::Hold
                }
            },
            Signal::Hold => Action::Hold,
        };

        value_series.push(ValuePoint {
            timestamp: bar.timestamp,
            close: bar.close,
            value: portfolio.get_value(bar.close)?,
            action,
        });
    }

    // validate_series guarantees at least one bar.
    let last_close = bars[bars.len() - 1].close;
    let final_value = portfolio.get_value(last_close)?;

    info!(
        final_value,
        trades = portfolio.trade_summary().len(),
        skipped_signals,
        "backtest complete"
    );

    Ok(BacktestResult {
        portfolio,
        value_series,
        final_value,
        skipped_signals,
    })
}
