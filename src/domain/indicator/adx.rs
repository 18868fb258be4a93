//! ADX (Average Directional Index) indicator.
//!
//! +DM = high - prev_high when it exceeds prev_low - low and is positive, else 0
//! -DM = prev_low - low when it exceeds high - prev_high and is positive, else 0
//! TR, +DM and -DM are Wilder-smoothed over n bars.
//! +DI = 100 * smoothed(+DM) / smoothed(TR), -DI likewise
//! DX  = 100 * |+DI - -DI| / (+DI + -DI)   (0 when both are 0)
//! ADX = Wilder average of DX over n bars
//!
//! Warmup: the first directional move needs a previous bar, the smoothed
//! values need n moves and ADX needs n DX values, so ADX is first defined at
//! index 2n - 1.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator_helpers::wilder_over;
use crate::domain::ohlcv::PriceBar;

pub fn calculate_adx(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut plus_dm: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut minus_dm: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut tr: Vec<Option<f64>> = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            plus_dm.push(None);
            minus_dm.push(None);
            tr.push(None);
            continue;
        }
        let prev = &bars[i - 1];
        let up_move = bar.high - prev.high;
        let down_move = prev.low - bar.low;

        plus_dm.push(Some(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        }));
        minus_dm.push(Some(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        }));
        tr.push(Some(bar.true_range(prev.close)));
    }

    let smoothed_tr = wilder_over(&tr, period);
    let smoothed_plus = wilder_over(&plus_dm, period);
    let smoothed_minus = wilder_over(&minus_dm, period);

    let dx: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            let tr = smoothed_tr[i]?;
            let (plus_di, minus_di) = if tr > 0.0 {
                (100.0 * smoothed_plus[i]? / tr, 100.0 * smoothed_minus[i]? / tr)
            } else {
                (0.0, 0.0)
            };
            let sum = plus_di + minus_di;
            Some(if sum > 0.0 {
                100.0 * (plus_di - minus_di).abs() / sum
            } else {
                0.0
            })
        })
        .collect();

    IndicatorSeries::from_simple(bars, wilder_over(&dx, period))
}
