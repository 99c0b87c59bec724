//! tradesim: single-instrument trading simulator and performance statistics.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

// Independent runs may be moved across threads.
const _: fn() = || {
    fn require_send_sync<T: Send + Sync>() {}

    require_send_sync::<domain::portfolio::Portfolio>();
    require_send_sync::<domain::trade::Trade>();
    require_send_sync::<domain::backtest::BacktestResult>();
    require_send_sync::<domain::strategy::SmaCrossover>();
};
