//! OBV (On-Balance Volume) indicator.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::PriceBar;

/// Calculate OBV (On-Balance Volume).
///
/// OBV[0] = volume[0]
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
/// If close[i] == close[i-1]: OBV[i] = OBV[i-1]
///
/// No warmup period; every bar is defined.
pub fn calculate_obv(bars: &[PriceBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut obv = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            obv = bar.volume;
        } else {
            let prev_close = bars[i - 1].close;
            if bar.close > prev_close {
                obv += bar.volume;
            } else if bar.close < prev_close {
                obv -= bar.volume;
            }
        }
        values.push(Some(obv));
    }

    IndicatorSeries::from_simple(bars, values)
}
