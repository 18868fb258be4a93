//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, unless avg_gain is also 0 (flat series): RSI = 50
//!
//! Warmup: first n bars are undefined (need n price changes to compute initial average).

use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator_helpers::wilder_over;
use crate::domain::ohlcv::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut gains: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
            continue;
        }
        let change = bar.close - bars[i - 1].close;
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let avg_gains = wilder_over(&gains, period);
    let avg_losses = wilder_over(&losses, period);

    let values = avg_gains
        .into_iter()
        .zip(avg_losses)
        .map(|(gain, loss)| Some(rsi_from_averages(gain?, loss?)))
        .collect();

    IndicatorSeries::from_simple(bars, values)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
