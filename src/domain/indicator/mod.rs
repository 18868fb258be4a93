//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorSeries`: A time series of indicator values
//!
//! A point whose window lacks history carries `value: None`. Consumers must
//! treat `None` as "no signal possible", never as zero.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;

pub use adx::calculate_adx;
pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use obv::calculate_obv;
pub use rsi::calculate_rsi;
pub use sma::calculate_volume_sma;

use chrono::NaiveDateTime;

use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<IndicatorValue>,
}

impl IndicatorPoint {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }

    /// The scalar value, if this point holds a defined `Simple` value.
    pub fn simple(&self) -> Option<f64> {
        match self.value {
            Some(IndicatorValue::Simple(v)) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Wrap a scalar sequence aligned with `bars` into a series.
    pub fn from_simple(bars: &[PriceBar], values: Vec<Option<f64>>) -> Self {
        let values = bars
            .iter()
            .zip(values)
            .map(|(bar, v)| IndicatorPoint {
                timestamp: bar.timestamp,
                value: v.map(IndicatorValue::Simple),
            })
            .collect();
        IndicatorSeries { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn simple_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(IndicatorPoint::simple).collect()
    }

    /// Index of the first defined point.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(IndicatorPoint::is_valid)
    }
}

#[cfg(test)]
pub(crate) mod test_bars {
    use crate::domain::ohlcv::PriceBar;
    use chrono::{Duration, NaiveDate};

    /// Daily bars with open = high = low = close.
    pub fn flat_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| bar(i, close, close, close, 1000.0))
            .collect()
    }

    pub fn bar(i: usize, high: f64, low: f64, close: f64, volume: f64) -> PriceBar {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        PriceBar {
            symbol: "TEST".into(),
            timestamp: start + Duration::days(i as i64),
            open: close,
            high,
            low,
            close,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_simple_only_for_scalars() {
        let bars = test_bars::flat_bars(&[1.0]);
        let point = IndicatorPoint {
            timestamp: bars[0].timestamp,
            value: Some(IndicatorValue::Bollinger {
                upper: 2.0,
                middle: 1.0,
                lower: 0.0,
            }),
        };
        assert!(point.is_valid());
        assert_eq!(point.simple(), None);
    }

    #[test]
    fn from_simple_keeps_timestamps() {
        let bars = test_bars::flat_bars(&[1.0, 2.0]);
        let series = IndicatorSeries::from_simple(&bars, vec![None, Some(2.0)]);
        assert_eq!(series.values[1].timestamp, bars[1].timestamp);
        assert_eq!(series.simple_values(), vec![None, Some(2.0)]);
        assert_eq!(series.first_valid(), Some(1));
    }
}
