//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_bollinger(bars: &[PriceBar], period: usize, mult: f64) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let value = (period > 0 && i + 1 >= period).then(|| {
                let window = &bars[i + 1 - period..=i];
                let middle = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
                let variance = window
                    .iter()
                    .map(|b| {
                        let diff = b.close - middle;
                        diff * diff
                    })
                    .sum::<f64>()
                    / period as f64;
                let stddev = variance.sqrt();

                IndicatorValue::Bollinger {
                    upper: middle + mult * stddev,
                    middle,
                    lower: middle - mult * stddev,
                }
            });
            IndicatorPoint {
                timestamp: bar.timestamp,
                value,
            }
        })
        .collect();

    IndicatorSeries { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::flat_bars;

    fn bands(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.values[i].value {
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            }) => (upper, middle, lower),
            other => panic!("Expected Bollinger value at {}, got {:?}", i, other),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let series = calculate_bollinger(&flat_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3, 2.0);
        assert!(!series.values[0].is_valid());
        assert!(!series.values[1].is_valid());
        assert!(series.values[2].is_valid());
        assert_eq!(series.first_valid(), Some(2));
    }

    #[test]
    fn bollinger_constant_prices_collapse() {
        let series = calculate_bollinger(&flat_bars(&[50.0; 25]), 20, 2.0);
        let (upper, middle, lower) = bands(&series, 24);
        assert!((upper - 50.0).abs() < f64::EPSILON);
        assert!((middle - 50.0).abs() < f64::EPSILON);
        assert!((lower - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bollinger_population_stddev() {
        // closes 2, 4, 6: mean 4, population variance 8/3
        let series = calculate_bollinger(&flat_bars(&[2.0, 4.0, 6.0]), 3, 2.0);
        let (upper, middle, lower) = bands(&series, 2);
        let stddev = (8.0f64 / 3.0).sqrt();
        assert!((middle - 4.0).abs() < 1e-12);
        assert!((upper - (4.0 + 2.0 * stddev)).abs() < 1e-12);
        assert!((lower - (4.0 - 2.0 * stddev)).abs() < 1e-12);
    }

    #[test]
    fn bollinger_custom_multiplier() {
        let series = calculate_bollinger(&flat_bars(&[2.0, 4.0, 6.0]), 3, 1.5);
        let (upper, middle, _) = bands(&series, 2);
        let stddev = (8.0f64 / 3.0).sqrt();
        assert!((upper - middle - 1.5 * stddev).abs() < 1e-12);
    }

    #[test]
    fn bollinger_multiplier_is_not_rounded() {
        // alternating 100/102 closes: population stddev 1, width 2k
        let closes: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 100.0 } else { 102.0 }).collect();
        let series = calculate_bollinger(&flat_bars(&closes), 20, 2.125);
        let (upper, _, lower) = bands(&series, 29);
        assert!((upper - lower - 4.25).abs() < 1e-9);

        let narrow = calculate_bollinger(&flat_bars(&closes), 20, 0.004);
        let (upper, _, lower) = bands(&narrow, 29);
        assert!((upper - lower - 0.008).abs() < 1e-12);
    }

    #[test]
    fn bollinger_zero_period() {
        let series = calculate_bollinger(&flat_bars(&[1.0, 2.0]), 0, 2.0);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_valid(), None);
    }
}
