#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sigtrader::domain::condition_parser;
use sigtrader::domain::error::{FetchError, NotifyError};
pub use sigtrader::domain::ohlcv::PriceBar;
use sigtrader::domain::frame::IndicatorConfig;
use sigtrader::domain::scorer::{NamedCondition, ScoringConfig};
use sigtrader::domain::simulator::SimulatorConfig;
use sigtrader::domain::strategy::Strategy;
use sigtrader::domain::universe::DataConfig;
use sigtrader::ports::data_port::{DataPort, HistoryRequest};
use sigtrader::ports::notifier_port::NotifierPort;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, FetchError>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(
            symbol.to_string(),
            FetchError::Read {
                symbol: symbol.to_string(),
                reason: reason.to_string(),
            },
        );
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<PriceBar>, FetchError> {
        if let Some(err) = self.errors.get(symbol) {
            return Err(err.clone());
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| request.contains(b.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, FetchError> {
        let mut symbols: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Records every message and attachment it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
    pub files: Mutex<Vec<(PathBuf, String)>>,
}

impl NotifierPort for RecordingNotifier {
    fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }

    fn send_file(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        self.files
            .lock()
            .unwrap()
            .push((path.to_path_buf(), caption.to_string()));
        Ok(())
    }
}

/// A notifier whose every delivery fails.
pub struct FailingNotifier;

impl NotifierPort for FailingNotifier {
    fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError {
            reason: "offline".into(),
        })
    }

    fn send_file(&self, _path: &Path, _caption: &str) -> Result<(), NotifyError> {
        Err(NotifyError {
            reason: "offline".into(),
        })
    }
}

pub fn day(n: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(n as i64)
}

pub fn make_bar(symbol: &str, n: usize, high: f64, low: f64, close: f64) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        timestamp: day(n),
        open: close,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

/// `n` bars with high/low one unit either side of a constant close.
pub fn steady_bars(symbol: &str, n: usize, close: f64) -> Vec<PriceBar> {
    (0..n)
        .map(|i| make_bar(symbol, i, close + 1.0, close - 1.0, close))
        .collect()
}

/// `n` bars whose close climbs by `step` each bar.
pub fn rising_bars(symbol: &str, n: usize, start: f64, step: f64) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let close = start + step * i as f64;
            make_bar(symbol, i, close + 1.0, close - 1.0, close)
        })
        .collect()
}

/// A deterministic oscillating series with drift.
pub fn wave_bars(symbol: &str, n: usize) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let x = i as f64;
            let close = 100.0 + 6.0 * (x * 0.45).sin() + 0.4 * x;
            PriceBar {
                symbol: symbol.to_string(),
                timestamp: day(i),
                open: close - 0.5,
                high: close + 1.5 + (x * 0.3).cos().abs(),
                low: close - 1.5 - (x * 0.2).sin().abs(),
                close,
                volume: 1000.0 + 400.0 * (x * 0.9).sin().abs(),
            }
        })
        .collect()
}

pub fn small_indicators() -> IndicatorConfig {
    IndicatorConfig {
        ema_fast: 3,
        ema_medium: 5,
        ema_slow: 8,
        ema_trend: 13,
        rsi: 5,
        macd_fast: 3,
        macd_slow: 6,
        macd_signal: 3,
        atr: 3,
        adx: 3,
        bollinger: 5,
        bollinger_mult: 2.0,
        volume_ma: 5,
    }
}

pub fn named(name: &str, text: &str) -> NamedCondition {
    NamedCondition::new(name, condition_parser::parse(text).unwrap())
}

/// Short windows, one always-true scored condition, no filters.
pub fn always_strategy() -> Strategy {
    Strategy {
        name: "Always".to_string(),
        indicators: small_indicators(),
        scoring: ScoringConfig {
            conditions: vec![named("POSITIVE", "ABOVE(CLOSE, 0)")],
            filters: Vec::new(),
            min_score: 1,
        },
        simulator: SimulatorConfig::default(),
    }
}

pub fn data_config(workers: usize) -> DataConfig {
    DataConfig {
        dir: PathBuf::from("unused"),
        symbols: None,
        start: None,
        end: None,
        workers,
        min_price: 0.0,
    }
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
