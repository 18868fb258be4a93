//! Per-bar indicator frames.
//!
//! `build_frames` runs every indicator the scorer can reference over a bar
//! series and zips the results into one `IndicatorFrame` per bar. Malformed
//! bars are set aside first: their frames stay undefined and every indicator
//! is computed over the well-formed subsequence, so a single bad bar never
//! poisons the rest of the series.

use tracing::warn;

use crate::domain::error::{ConfigError, IndicatorError};
use crate::domain::indicator::{
    IndicatorSeries, IndicatorValue, calculate_adx, calculate_atr, calculate_bollinger,
    calculate_ema, calculate_macd, calculate_obv, calculate_rsi, calculate_volume_sma,
};
use crate::domain::ohlcv::PriceBar;

/// Window lengths for every derived field.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_medium: usize,
    pub ema_slow: usize,
    pub ema_trend: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr: usize,
    pub adx: usize,
    pub bollinger: usize,
    pub bollinger_mult: f64,
    pub volume_ma: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            ema_fast: 10,
            ema_medium: 21,
            ema_slow: 50,
            ema_trend: 200,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr: 14,
            adx: 14,
            bollinger: 20,
            bollinger_mult: 2.0,
            volume_ma: 50,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("ema_fast", self.ema_fast),
            ("ema_medium", self.ema_medium),
            ("ema_slow", self.ema_slow),
            ("ema_trend", self.ema_trend),
            ("rsi", self.rsi),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("atr", self.atr),
            ("adx", self.adx),
            ("bollinger", self.bollinger),
            ("volume_ma", self.volume_ma),
        ];
        for (key, window) in windows {
            if window == 0 {
                return Err(ConfigError::invalid("indicators", key, "window must be > 0"));
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::invalid(
                "indicators",
                "macd_fast",
                format!(
                    "must be less than macd_slow ({} >= {})",
                    self.macd_fast, self.macd_slow
                ),
            ));
        }
        if !(self.bollinger_mult.is_finite() && self.bollinger_mult > 0.0) {
            return Err(ConfigError::invalid(
                "indicators",
                "bollinger_mult",
                "must be > 0",
            ));
        }
        Ok(())
    }

    /// Bars needed before every derived field can be defined.
    pub fn longest_warmup(&self) -> usize {
        [
            self.ema_fast,
            self.ema_medium,
            self.ema_slow,
            self.ema_trend,
            self.rsi + 1,
            self.macd_slow + self.macd_signal - 1,
            self.atr,
            2 * self.adx,
            self.bollinger,
            self.volume_ma,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// A price bar with every derived field. `None` means undefined, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub bar: PriceBar,
    /// The bar failed validation; nothing may score, enter or exit on it.
    pub rejected: bool,
    pub ema_fast: Option<f64>,
    pub ema_medium: Option<f64>,
    pub ema_slow: Option<f64>,
    pub ema_trend: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
    pub obv: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bb_width: Option<f64>,
    pub volume_ma: Option<f64>,
}

impl IndicatorFrame {
    /// A frame for `bar` with every derived field undefined.
    pub fn undefined(bar: PriceBar) -> Self {
        IndicatorFrame {
            bar,
            rejected: false,
            ema_fast: None,
            ema_medium: None,
            ema_slow: None,
            ema_trend: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            macd_hist: None,
            atr: None,
            adx: None,
            obv: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
            bb_width: None,
            volume_ma: None,
        }
    }
}

/// Frames aligned one-to-one with the input bars, plus the bars that were
/// rejected as malformed.
#[derive(Debug, Clone)]
pub struct FrameSet {
    pub frames: Vec<IndicatorFrame>,
    pub rejected: Vec<IndicatorError>,
}

pub fn build_frames(bars: &[PriceBar], config: &IndicatorConfig) -> FrameSet {
    let mut rejected = Vec::new();
    let mut good_indices = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        match bar.validate(i) {
            Ok(()) => good_indices.push(i),
            Err(err) => {
                warn!(symbol = %bar.symbol, "skipping malformed bar: {}", err);
                rejected.push(err);
            }
        }
    }

    let good: Vec<PriceBar> = good_indices.iter().map(|&i| bars[i].clone()).collect();
    let ema_fast = calculate_ema(&good, config.ema_fast);
    let ema_medium = calculate_ema(&good, config.ema_medium);
    let ema_slow = calculate_ema(&good, config.ema_slow);
    let ema_trend = calculate_ema(&good, config.ema_trend);
    let rsi = calculate_rsi(&good, config.rsi);
    let macd = calculate_macd(&good, config.macd_fast, config.macd_slow, config.macd_signal);
    let atr = calculate_atr(&good, config.atr);
    let adx = calculate_adx(&good, config.adx);
    let obv = calculate_obv(&good);
    let bollinger = calculate_bollinger(&good, config.bollinger, config.bollinger_mult);
    let volume_ma = calculate_volume_sma(&good, config.volume_ma);

    let mut frames: Vec<IndicatorFrame> =
        bars.iter().cloned().map(IndicatorFrame::undefined).collect();
    for err in &rejected {
        frames[err.bar_index].rejected = true;
    }

    for (k, &i) in good_indices.iter().enumerate() {
        let frame = &mut frames[i];
        frame.ema_fast = simple_at(&ema_fast, k);
        frame.ema_medium = simple_at(&ema_medium, k);
        frame.ema_slow = simple_at(&ema_slow, k);
        frame.ema_trend = simple_at(&ema_trend, k);
        frame.rsi = simple_at(&rsi, k);
        frame.atr = simple_at(&atr, k);
        frame.adx = simple_at(&adx, k);
        frame.obv = simple_at(&obv, k);
        frame.volume_ma = simple_at(&volume_ma, k);

        if let Some(IndicatorValue::Macd {
            line,
            signal,
            histogram,
        }) = macd.values[k].value
        {
            frame.macd = Some(line);
            frame.macd_signal = Some(signal);
            frame.macd_hist = Some(histogram);
        }
        if let Some(IndicatorValue::Bollinger {
            upper,
            middle,
            lower,
        }) = bollinger.values[k].value
        {
            frame.bb_upper = Some(upper);
            frame.bb_middle = Some(middle);
            frame.bb_lower = Some(lower);
            frame.bb_width = Some(upper - lower);
        }
    }

    FrameSet { frames, rejected }
}

fn simple_at(series: &IndicatorSeries, k: usize) -> Option<f64> {
    series.values.get(k).and_then(|p| p.simple())
}
