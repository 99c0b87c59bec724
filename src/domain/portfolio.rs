//! Single-instrument portfolio with a slippage and fee friction model.
//!
//! The portfolio owns cash, holdings and an append-only trade log. State only
//! changes through [`Portfolio::buy`] and [`Portfolio::sell`]; both validate
//! their inputs before touching state, and both report an unaffordable trade
//! as a [`TradeOutcome`] rather than an error.

use tracing::debug;

use super::error::TradesimError;
use super::trade::{Trade, TradeAction};

pub const DEFAULT_TRANSACTION_COST: f64 = 0.001;
pub const DEFAULT_SLIPPAGE: f64 = 0.001;

const MAX_QUANTITY_CORRECTIONS: usize = 8;

/// Result of a buy or sell that passed input validation.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    Executed(Trade),
    InsufficientFunds { required: f64, available: f64 },
    InsufficientHoldings { requested: f64, held: f64 },
}

impl TradeOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, TradeOutcome::Executed(_))
    }

    pub fn trade(&self) -> Option<&Trade> {
        match self {
            TradeOutcome::Executed(trade) => Some(trade),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    cash: f64,
    initial_cash: f64,
    holdings: f64,
    transaction_cost: f64,
    slippage: f64,
    trades: Vec<Trade>,
}

impl Portfolio {
    /// Portfolio with the default 0.1% fee and 0.1% slippage.
    pub fn new(initial_cash: f64) -> Result<Self, TradesimError> {
        Self::with_costs(initial_cash, DEFAULT_TRANSACTION_COST, DEFAULT_SLIPPAGE)
    }

    /// Rates of 1 or more are accepted but make every trade degenerate; that
    /// is the caller's business.
    pub fn with_costs(
        initial_cash: f64,
        transaction_cost: f64,
        slippage: f64,
    ) -> Result<Self, TradesimError> {
        require_non_negative("initial_cash", initial_cash)?;
        require_non_negative("transaction_cost", transaction_cost)?;
        require_non_negative("slippage", slippage)?;

        Ok(Portfolio {
            cash: initial_cash,
            initial_cash,
            holdings: 0.0,
            transaction_cost,
            slippage,
            trades: Vec::new(),
        })
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn holdings(&self) -> f64 {
        self.holdings
    }

    pub fn transaction_cost(&self) -> f64 {
        self.transaction_cost
    }

    pub fn slippage(&self) -> f64 {
        self.slippage
    }

    pub fn has_holdings(&self) -> bool {
        self.holdings > 0.0
    }

    pub fn buy(&mut self, price: f64, quantity: f64) -> Result<TradeOutcome, TradesimError> {
        require_positive("price", price)?;
        require_positive("quantity", quantity)?;

        let effective_price = price * (1.0 + self.slippage);
        let gross_cost = effective_price * quantity;
        let total_cost = gross_cost * (1.0 + self.transaction_cost);

        if self.cash < total_cost {
            debug!(price, quantity, required = total_cost, available = self.cash, "buy skipped");
            return Ok(TradeOutcome::InsufficientFunds {
                required: total_cost,
                available: self.cash,
            });
        }

        self.cash -= total_cost;
        self.holdings += quantity;

        let trade = Trade {
            action: TradeAction::Buy,
            price,
            effective_price,
            quantity,
            fee: total_cost - gross_cost,
            amount: total_cost,
            remaining_cash: self.cash,
        };
        debug!(price, quantity, total_cost, cash = self.cash, "buy executed");
        self.trades.push(trade.clone());
        Ok(TradeOutcome::Executed(trade))
    }

    pub fn sell(&mut self, price: f64, quantity: f64) -> Result<TradeOutcome, TradesimError> {
        require_positive("price", price)?;
        require_positive("quantity", quantity)?;

        if self.holdings < quantity {
            debug!(price, quantity, held = self.holdings, "sell skipped");
            return Ok(TradeOutcome::InsufficientHoldings {
                requested: quantity,
                held: self.holdings,
            });
        }

        let effective_price = price * (1.0 - self.slippage);
        let revenue = effective_price * quantity;
        let net_revenue = revenue * (1.0 - self.transaction_cost);

        self.cash += net_revenue;
        self.holdings -= quantity;

        let trade = Trade {
            action: TradeAction::Sell,
            price,
            effective_price,
            quantity,
            fee: revenue - net_revenue,
            amount: net_revenue,
            remaining_cash: self.cash,
        };
        debug!(price, quantity, revenue = net_revenue, cash = self.cash, "sell executed");
        self.trades.push(trade.clone());
        Ok(TradeOutcome::Executed(trade))
    }

    /// Sells the entire position. Flat portfolios report
    /// `InsufficientHoldings` with a zero request.
    pub fn sell_all(&mut self, price: f64) -> Result<TradeOutcome, TradesimError> {
        if !self.has_holdings() {
            require_positive("price", price)?;
            return Ok(TradeOutcome::InsufficientHoldings {
                requested: 0.0,
                held: self.holdings,
            });
        }
        self.sell(price, self.holdings)
    }

    /// Mark-to-market value: cash plus holdings at `price`.
    pub fn get_value(&self, price: f64) -> Result<f64, TradesimError> {
        require_non_negative("price", price)?;
        Ok(self.cash + self.holdings * price)
    }

    /// Trade log in execution order.
    pub fn trade_summary(&self) -> &[Trade] {
        &self.trades
    }

    /// Largest whole quantity a buy at `price` can pay for, fees and slippage
    /// included.
    pub fn max_affordable_quantity(&self, price: f64) -> Result<f64, TradesimError> {
        require_positive("price", price)?;
        let effective_price = price * (1.0 + self.slippage);
        let total_cost = |quantity: f64| effective_price * quantity * (1.0 + self.transaction_cost);

        let mut quantity = (self.cash / (effective_price * (1.0 + self.transaction_cost))).floor();
        // The division can round up by one unit; past 2^53 one unit is below
        // the spacing of f64, so step by the spacing instead.
        for _ in 0..MAX_QUANTITY_CORRECTIONS {
            if quantity <= 0.0 || total_cost(quantity) <= self.cash {
                break;
            }
            quantity = (quantity - (quantity * f64::EPSILON).max(1.0)).floor();
        }
        Ok(quantity.max(0.0))
    }

    /// Sum of sell revenues minus buy costs across the trade log.
    pub fn net_cash_flow(&self) -> f64 {
        self.trades.iter().map(Trade::cash_delta).sum()
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), TradesimError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TradesimError::validation(
            field,
            format!("must be positive and finite, got {}", value),
        ));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<(), TradesimError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TradesimError::validation(
            field,
            format!("must be non-negative and finite, got {}", value),
        ));
    }
    Ok(())
}
