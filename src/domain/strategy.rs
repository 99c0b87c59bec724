//! Moving-average crossover strategy with optional stop-loss / take-profit.

use std::fmt;

/// Per-bar action as recorded in the value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// `1` buy, `-1` sell, `0` hold.
    pub fn as_signal(&self) -> i8 {
        match self {
            Action::Buy => 1,
            Action::Sell => -1,
            Action::Hold => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Crossover,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Crossover => write!(f, "crossover"),
            ExitReason::StopLoss => write!(f, "stop-loss"),
            ExitReason::TakeProfit => write!(f, "take-profit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Enter,
    Exit(ExitReason),
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionSizing {
    Fixed(f64),
    /// As many whole units as the cash covers.
    AllCash,
}

impl fmt::Display for PositionSizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSizing::Fixed(quantity) => write!(f, "{}", quantity),
            PositionSizing::AllCash => write!(f, "all"),
        }
    }
}

/// What the strategy knows about its own open position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionState {
    pub entry_price: Option<f64>,
    /// Set after a stop-loss or take-profit exit; re-entry waits until the
    /// short average has dropped back to or below the long one.
    pub awaiting_reset: bool,
}

impl PositionState {
    pub fn is_holding(&self) -> bool {
        self.entry_price.is_some()
    }

    pub fn on_entry(&mut self, price: f64) {
        self.entry_price = Some(price);
        self.awaiting_reset = false;
    }

    pub fn on_exit(&mut self, reason: ExitReason) {
        self.entry_price = None;
        self.awaiting_reset = reason != ExitReason::Crossover;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    pub sizing: PositionSizing,
    /// Fraction below the entry price that forces an exit; 0 disables.
    pub stop_loss_pct: f64,
    /// Fraction above the entry price that forces an exit; 0 disables.
    pub take_profit_pct: f64,
}

impl Default for SmaCrossover {
    fn default() -> Self {
        SmaCrossover {
            short_window: 10,
            long_window: 100,
            sizing: PositionSizing::Fixed(250.0),
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
        }
    }
}

impl SmaCrossover {
    pub fn name(&self) -> String {
        format!("SMA Crossover ({}/{})", self.short_window, self.long_window)
    }

    pub fn should_stop_loss(&self, entry_price: f64, close: f64) -> bool {
        self.stop_loss_pct > 0.0 && close <= entry_price * (1.0 - self.stop_loss_pct)
    }

    pub fn should_take_profit(&self, entry_price: f64, close: f64) -> bool {
        self.take_profit_pct > 0.0 && close >= entry_price * (1.0 + self.take_profit_pct)
    }

    pub fn decide(
        &self,
        sma_short: f64,
        sma_long: f64,
        close: f64,
        state: &mut PositionState,
    ) -> Signal {
        if let Some(entry_price) = state.entry_price {
            if self.should_stop_loss(entry_price, close) {
                return Signal::Exit(ExitReason::StopLoss);
            }
            if self.should_take_profit(entry_price, close) {
                return Signal::Exit(ExitReason::TakeProfit);
            }
            if sma_short < sma_long {
                return Signal::Exit(ExitReason::Crossover);
            }
            return Signal::Hold;
        }

        if state.awaiting_reset {
            if sma_short <= sma_long {
                state.awaiting_reset = false;
            }
            return Signal::Hold;
        }

        if sma_short > sma_long {
            Signal::Enter
        } else {
            Signal::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> SmaCrossover {
        SmaCrossover {
            short_window: 2,
            long_window: 4,
            sizing: PositionSizing::Fixed(10.0),
            stop_loss_pct: 0.02,
            take_profit_pct: 0.05,
        }
    }

    #[test]
    fn default_matches_reference_run() {
        let s = SmaCrossover::default();
        assert_eq!(s.short_window, 10);
        assert_eq!(s.long_window, 100);
        assert_eq!(s.sizing, PositionSizing::Fixed(250.0));
        assert_eq!(s.name(), "SMA Crossover (10/100)");
    }

    #[test]
    fn action_signals() {
        assert_eq!(Action::Buy.as_signal(), 1);
        assert_eq!(Action::Sell.as_signal(), -1);
        assert_eq!(Action::Hold.as_signal(), 0);
    }

    #[test]
    fn enters_when_short_above_long() {
        let mut state = PositionState::default();
        assert_eq!(strategy().decide(11.0, 10.0, 10.0, &mut state), Signal::Enter);
        assert_eq!(strategy().decide(10.0, 10.0, 10.0, &mut state), Signal::Hold);
        assert_eq!(strategy().decide(9.0, 10.0, 10.0, &mut state), Signal::Hold);
    }

    #[test]
    fn exits_on_cross_below() {
        let mut state = PositionState::default();
        state.on_entry(100.0);
        assert_eq!(
            strategy().decide(9.0, 10.0, 100.0, &mut state),
            Signal::Exit(ExitReason::Crossover)
        );
        assert_eq!(strategy().decide(11.0, 10.0, 100.0, &mut state), Signal::Hold);
    }

    #[test]
    fn stop_loss_triggers_at_threshold() {
        let s = strategy();
        assert!(s.should_stop_loss(100.0, 98.0));
        assert!(s.should_stop_loss(100.0, 97.0));
        assert!(!s.should_stop_loss(100.0, 98.5));

        let mut state = PositionState::default();
        state.on_entry(100.0);
        assert_eq!(
            s.decide(11.0, 10.0, 97.0, &mut state),
            Signal::Exit(ExitReason::StopLoss)
        );
    }

    #[test]
    fn take_profit_triggers_at_threshold() {
        let s = strategy();
        assert!(s.should_take_profit(100.0, 105.0));
        assert!(!s.should_take_profit(100.0, 104.0));

        let mut state = PositionState::default();
        state.on_entry(100.0);
        assert_eq!(
            s.decide(11.0, 10.0, 106.0, &mut state),
            Signal::Exit(ExitReason::TakeProfit)
        );
    }

    #[test]
    fn disabled_exits_never_trigger() {
        let s = SmaCrossover {
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
            ..strategy()
        };
        assert!(!s.should_stop_loss(100.0, 1.0));
        assert!(!s.should_take_profit(100.0, 1_000.0));
    }

    #[test]
    fn forced_exit_waits_for_reset_before_reentry() {
        let s = strategy();
        let mut state = PositionState::default();
        state.on_entry(100.0);
        state.on_exit(ExitReason::StopLoss);
        assert!(state.awaiting_reset);

        assert_eq!(s.decide(11.0, 10.0, 90.0, &mut state), Signal::Hold);
        assert_eq!(s.decide(10.0, 10.0, 90.0, &mut state), Signal::Hold);
        assert!(!state.awaiting_reset);
        assert_eq!(s.decide(11.0, 10.0, 90.0, &mut state), Signal::Enter);
    }

    #[test]
    fn crossover_exit_does_not_require_reset() {
        let mut state = PositionState::default();
        state.on_entry(100.0);
        state.on_exit(ExitReason::Crossover);
        assert!(!state.awaiting_reset);
        assert!(!state.is_holding());
    }

    #[test]
    fn sizing_display() {
        assert_eq!(PositionSizing::Fixed(250.0).to_string(), "250");
        assert_eq!(PositionSizing::AllCash.to_string(), "all");
    }
}
