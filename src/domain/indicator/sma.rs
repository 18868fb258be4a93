//! Simple moving average of volume.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator_helpers::sma_over;
use crate::domain::ohlcv::PriceBar;

/// Rolling mean of volume, the baseline for volume-spike conditions.
pub fn calculate_volume_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.volume)).collect();
    IndicatorSeries::from_simple(bars, sma_over(&volumes, period))
}
