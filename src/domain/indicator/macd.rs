//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Warmup: slow - 1 + signal - 1 bars (for fast < slow)

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::indicator_helpers::ema_over;
use crate::domain::ohlcv::PriceBar;

pub fn calculate_macd(
    bars: &[PriceBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    let ema_fast = ema_over(&closes, fast);
    let ema_slow = ema_over(&closes, slow);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal_line = ema_over(&macd_line, signal_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = match (macd_line[i], signal_line[i]) {
                (Some(line), Some(signal)) => Some(IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                }),
                _ => None,
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                value,
            }
        })
        .collect();

    IndicatorSeries { values }
}
