//! Configuration validation.
//!
//! Validates all config fields before a backtest runs. The data path is not
//! checked here since `--data` may supply it; `cli::resolve_data_path`
//! reports it missing.

use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_initial_cash(config)?;
    validate_rate(config, "transaction_cost")?;
    validate_rate(config, "slippage")?;
    validate_risk_free_rate(config)?;
    validate_periods_per_year(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    validate_windows(config)?;
    validate_quantity(config)?;
    validate_exit_pct(config, "stop_loss")?;
    validate_exit_pct(config, "take_profit")?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TradesimError {
    TradesimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let value = config.get_double("backtest", "initial_cash", 100_000.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_cash",
            "initial_cash must be positive",
        ));
    }
    Ok(())
}

fn validate_rate(config: &dyn ConfigPort, key: &str) -> Result<(), TradesimError> {
    let value = config.get_double("backtest", key, 0.001);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "backtest",
            key,
            &format!("{} must be non-negative", key),
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.02);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_periods_per_year(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let value = config.get_double("backtest", "periods_per_year", 252.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

/// Reads an optional `[data]` date in `YYYY-MM-DD` form.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, TradesimError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "data",
                    key,
                    &format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

fn validate_windows(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    let short = config.get_int("strategy", "short_window", 10);
    let long = config.get_int("strategy", "long_window", 100);

    if short < 1 {
        return Err(invalid(
            "strategy",
            "short_window",
            "short_window must be at least 1",
        ));
    }
    if long <= short {
        return Err(invalid(
            "strategy",
            "long_window",
            "long_window must be greater than short_window",
        ));
    }
    Ok(())
}

fn validate_quantity(config: &dyn ConfigPort) -> Result<(), TradesimError> {
    match config.get_string("strategy", "quantity") {
        None => Ok(()),
        Some(s) if s.trim().eq_ignore_ascii_case("all") => Ok(()),
        Some(s) => match s.trim().parse::<f64>() {
            Ok(q) if q.is_finite() && q > 0.0 => Ok(()),
            _ => Err(invalid(
                "strategy",
                "quantity",
                "quantity must be a positive number or 'all'",
            )),
        },
    }
}

fn validate_exit_pct(config: &dyn ConfigPort, key: &str) -> Result<(), TradesimError> {
    let value = config.get_double("strategy", key, 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "strategy",
            key,
            &format!("{} must be between 0 and 1", key),
        ));
    }
    Ok(())
}
