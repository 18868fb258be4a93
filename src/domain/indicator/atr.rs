//! Average True Range indicator.
//!
//! TR[0] = high - low; TR[i] = max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR is Wilder's running mean of TR, seeded with the simple mean of the
//! first n true ranges. Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator_helpers::wilder_over;
use crate::domain::ohlcv::PriceBar;

pub fn calculate_atr(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let tr_values: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                Some(bar.high - bar.low)
            } else {
                Some(bar.true_range(bars[i - 1].close))
            }
        })
        .collect();

    IndicatorSeries::from_simple(bars, wilder_over(&tr_values, period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::bar;

    #[test]
    fn atr_warmup() {
        let bars: Vec<PriceBar> = (0..5).map(|i| bar(i, 110.0, 90.0, 100.0, 1000.0)).collect();

        let series = calculate_atr(&bars, 3);
        assert_eq!(series.len(), 5);
        assert_eq!(series.first_valid(), Some(2));
    }

    #[test]
    fn atr_seed_is_average() {
        let bars = vec![
            bar(0, 110.0, 100.0, 105.0, 1000.0),
            bar(1, 115.0, 105.0, 110.0, 1000.0),
            bar(2, 120.0, 110.0, 115.0, 1000.0),
        ];

        let series = calculate_atr(&bars, 3);
        let seed = series.simple_values()[2].unwrap();
        assert!((seed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = vec![
            bar(0, 110.0, 100.0, 105.0, 1000.0),
            bar(1, 115.0, 105.0, 110.0, 1000.0),
            bar(2, 120.0, 110.0, 115.0, 1000.0),
            bar(3, 125.0, 115.0, 120.0, 1000.0),
        ];

        let series = calculate_atr(&bars, 3);
        let atr3 = series.simple_values()[3].unwrap();

        let seed = 10.0;
        let expected = (seed * 2.0 + 10.0) / 3.0;
        assert!((atr3 - expected).abs() < 1e-9);
    }

    #[test]
    fn atr_uses_gap_from_previous_close() {
        let bars = vec![
            bar(0, 110.0, 100.0, 105.0, 1000.0),
            bar(1, 130.0, 120.0, 125.0, 1000.0),
        ];
        let series = calculate_atr(&bars, 2);
        // TR[0] = 10, TR[1] = |130 - 105| = 25
        assert!((series.simple_values()[1].unwrap() - 17.5).abs() < 1e-9);
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars: Vec<PriceBar> = (0..2).map(|i| bar(i, 110.0, 90.0, 100.0, 1000.0)).collect();

        let series = calculate_atr(&bars, 5);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_valid(), None);
    }
}
