//! Single-instrument price bar.

use chrono::NaiveDateTime;

use super::error::TradesimError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(timestamp: NaiveDateTime, close: f64) -> Self {
        PriceBar {
            timestamp,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Checks that a series can drive a simulation: non-empty, strictly
/// increasing timestamps, positive finite closes.
pub fn validate_series(bars: &[PriceBar]) -> Result<(), TradesimError> {
    if bars.is_empty() {
        return Err(TradesimError::InsufficientData {
            bars: 0,
            minimum: 1,
        });
    }

    for (i, bar) in bars.iter().enumerate() {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(TradesimError::validation(
                "close",
                format!("bar {} at {} has close {}", i, bar.timestamp, bar.close),
            ));
        }
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(TradesimError::validation(
                "timestamp",
                format!(
                    "bar {} at {} does not follow {}",
                    i,
                    bar.timestamp,
                    bars[i - 1].timestamp
                ),
            ));
        }
    }
    Ok(())
}
