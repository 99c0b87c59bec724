//! Performance statistics over value and return series.
//!
//! The free functions are pure and validate their inputs: malformed input is a
//! `Validation` error, an undefined result (zero variance, non-positive base)
//! is a `Domain` error. Annualization frequency is always an argument;
//! [`TRADING_DAYS_PER_YEAR`] is the usual choice for daily bars.

use tracing::warn;

use super::backtest::{BacktestConfig, BacktestResult};
use super::error::TradesimError;
use super::trade::TradeAction;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 60.0 * 60.0;

/// Compound annual growth rate: `(final / beginning)^(1 / years) - 1`.
pub fn cagr(beginning_value: f64, final_value: f64, years: f64) -> Result<f64, TradesimError> {
    require_finite("beginning_value", beginning_value)?;
    require_finite("final_value", final_value)?;
    require_finite("years", years)?;

    if beginning_value <= 0.0 {
        return Err(TradesimError::domain(format!(
            "CAGR needs a positive beginning value, got {}",
            beginning_value
        )));
    }
    if years <= 0.0 {
        return Err(TradesimError::domain(format!(
            "CAGR needs a positive number of years, got {}",
            years
        )));
    }
    if final_value < 0.0 {
        return Err(TradesimError::domain(format!(
            "CAGR is undefined for a negative final value ({})",
            final_value
        )));
    }

    Ok((final_value / beginning_value).powf(1.0 / years) - 1.0)
}

/// Annualized Sharpe ratio of periodic returns against a yearly risk-free rate.
pub fn sharpe_ratio(
    returns: &[f64],
    periods_per_year: f64,
    risk_free_rate: f64,
) -> Result<f64, TradesimError> {
    require_series("returns", returns, 2)?;
    require_periods(periods_per_year)?;
    require_finite("risk_free_rate", risk_free_rate)?;

    let per_period_rf = risk_free_rate / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_period_rf).collect();

    let (mean, stddev) = mean_and_stddev(&excess);
    // Identical returns leave a rounding residue of a few ulps in the mean.
    if stddev <= f64::EPSILON * mean.abs().max(1.0) {
        return Err(TradesimError::domain(
            "Sharpe ratio is undefined for zero-variance returns",
        ));
    }

    Ok(mean / stddev * periods_per_year.sqrt())
}

/// Largest peak-to-trough decline as a fraction of the peak.
pub fn max_drawdown(values: &[f64]) -> Result<f64, TradesimError> {
    require_series("values", values, 1)?;

    let mut peak = values[0];
    let mut largest = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
            continue;
        }
        if peak <= 0.0 {
            return Err(TradesimError::domain(format!(
                "drawdown is undefined for a non-positive peak ({})",
                peak
            )));
        }
        let drawdown = (peak - value) / peak;
        if drawdown > largest {
            largest = drawdown;
        }
    }

    Ok(largest)
}

/// Annualized standard deviation of periodic returns.
pub fn volatility(returns: &[f64], periods_per_year: f64) -> Result<f64, TradesimError> {
    require_series("returns", returns, 2)?;
    require_periods(periods_per_year)?;

    let (_, stddev) = mean_and_stddev(returns);
    Ok(stddev * periods_per_year.sqrt())
}

/// Fractional change between consecutive values.
pub fn pct_change(values: &[f64]) -> Result<Vec<f64>, TradesimError> {
    require_series("values", values, 0)?;

    values
        .windows(2)
        .map(|w| {
            if w[0] == 0.0 {
                Err(TradesimError::domain(
                    "percentage change from a zero value is undefined",
                ))
            } else {
                Ok((w[1] - w[0]) / w[0])
            }
        })
        .collect()
}

/// Mean and population standard deviation.
fn mean_and_stddev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn require_finite(field: &str, value: f64) -> Result<(), TradesimError> {
    if !value.is_finite() {
        return Err(TradesimError::validation(field, "must be finite"));
    }
    Ok(())
}

fn require_periods(periods_per_year: f64) -> Result<(), TradesimError> {
    if !periods_per_year.is_finite() || periods_per_year <= 0.0 {
        return Err(TradesimError::validation(
            "periods_per_year",
            format!("must be positive, got {}", periods_per_year),
        ));
    }
    Ok(())
}

fn require_series(field: &str, values: &[f64], minimum: usize) -> Result<(), TradesimError> {
    if values.len() < minimum {
        return Err(TradesimError::validation(
            field,
            format!("need at least {} elements, got {}", minimum, values.len()),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(TradesimError::validation(field, "contains a non-finite element"));
    }
    Ok(())
}

/// Headline numbers for one backtest run. Statistics that cannot be computed
/// for the run (a flat value series has no Sharpe ratio) are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub years: f64,
    pub cagr: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub total_trades: usize,
    pub buys: usize,
    pub sells: usize,
    pub total_fees: f64,
}

impl PerformanceSummary {
    pub fn compute(result: &BacktestResult, config: &BacktestConfig) -> Self {
        let initial_value = result.portfolio.initial_cash();
        let final_value = result.final_value;

        let total_return = if initial_value > 0.0 {
            (final_value - initial_value) / initial_value
        } else {
            0.0
        };

        let years = match (result.value_series.first(), result.value_series.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_seconds() as f64 / SECONDS_PER_YEAR
            }
            _ => 0.0,
        };

        let values = result.values();
        let cagr = defined("CAGR", cagr(initial_value, final_value, years));
        let max_drawdown = defined("max drawdown", max_drawdown(&values));

        let (sharpe_ratio, volatility) = match pct_change(&values) {
            Ok(returns) => (
                defined(
                    "Sharpe ratio",
                    sharpe_ratio(&returns, config.periods_per_year, config.risk_free_rate),
                ),
                defined("volatility", volatility(&returns, config.periods_per_year)),
            ),
            Err(e) => {
                warn!(error = %e, "return series unavailable");
                (None, None)
            }
        };

        let trades = result.portfolio.trade_summary();
        let buys = trades
            .iter()
            .filter(|t| t.action == TradeAction::Buy)
            .count();

        PerformanceSummary {
            initial_value,
            final_value,
            total_return,
            years,
            cagr,
            sharpe_ratio,
            volatility,
            max_drawdown,
            total_trades: trades.len(),
            buys,
            sells: trades.len() - buys,
            total_fees: trades.iter().map(|t| t.fee).sum(),
        }
    }
}

fn defined(name: &str, value: Result<f64, TradesimError>) -> Option<f64> {
    match value {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "{} undefined for this run", name);
            None
        }
    }
}
