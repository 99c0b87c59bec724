//! Core domain types and logic.

pub mod price_bar;
pub mod trade;
pub mod portfolio;
pub mod metrics;
pub mod sma;
pub mod strategy;
pub mod backtest;
pub mod config_validation;
pub mod error;
