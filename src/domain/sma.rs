//! Simple moving average over closing prices.
//!
//! O(n) sliding window. SMA(n) = (P[i-n+1] + ... + P[i]) / n.
//! Warmup: first (n-1) points are `None`.

use super::price_bar::PriceBar;

pub fn calculate_sma(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return Vec::new();
    }

    let mut values = Vec::with_capacity(closes.len());
    let mut window_sum = 0.0_f64;

    for (i, &close) in closes.iter().enumerate() {
        window_sum += close;
        if i >= window {
            window_sum -= closes[i - window];
        }

        if i + 1 >= window {
            values.push(Some(window_sum / window as f64));
        } else {
            values.push(None);
        }
    }

    values
}

pub fn sma_of_bars(bars: &[PriceBar], window: usize) -> Vec<Option<f64>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    calculate_sma(&closes, window)
}
