//! Executed trade records.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "Buy"),
            TradeAction::Sell => write!(f, "Sell"),
        }
    }
}

/// One executed trade. `price` is the quoted price; `amount` is the cash that
/// actually moved after slippage and fees (total cost of a buy, net revenue of
/// a sell).
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub action: TradeAction,
    pub price: f64,
    pub effective_price: f64,
    pub quantity: f64,
    pub fee: f64,
    pub amount: f64,
    pub remaining_cash: f64,
}

impl Trade {
    pub fn total_cost(&self) -> Option<f64> {
        match self.action {
            TradeAction::Buy => Some(self.amount),
            TradeAction::Sell => None,
        }
    }

    pub fn revenue(&self) -> Option<f64> {
        match self.action {
            TradeAction::Buy => None,
            TradeAction::Sell => Some(self.amount),
        }
    }

    /// Signed change in cash caused by this trade.
    pub fn cash_delta(&self) -> f64 {
        match self.action {
            TradeAction::Buy => -self.amount,
            TradeAction::Sell => self.amount,
        }
    }

    /// Signed change in holdings caused by this trade.
    pub fn holdings_delta(&self) -> f64 {
        match self.action {
            TradeAction::Buy => self.quantity,
            TradeAction::Sell => -self.quantity,
        }
    }
}
