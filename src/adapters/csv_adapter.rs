//! CSV file data adapter.
//!
//! Price history lives in `<dir>/<SYMBOL>.csv` with a header row naming
//! `timestamp` (or `date`), `open`, `high`, `low`, `close` and `volume`.
//! File names match symbols case-insensitively, so `reliance.csv` serves
//! `RELIANCE`.
//! The universe is the `SYMBOL` column of `<dir>/symbols.csv` when that file
//! exists, otherwise every other `*.csv` file in the directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::domain::config_validation::parse_timestamp;
use crate::domain::error::FetchError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::{DataPort, HistoryRequest};

pub const SYMBOLS_FILE: &str = "symbols.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(symbol: &str, headers: &StringRecord) -> Result<Self, FetchError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
                .ok_or_else(|| FetchError::Malformed {
                    symbol: symbol.to_string(),
                    line: 1,
                    reason: format!("missing {} column", names[0]),
                })
        };
        Ok(Columns {
            timestamp: find(&["timestamp", "date", "datetime"])?,
            open: find(&["open"])?,
            high: find(&["high"])?,
            low: find(&["low"])?,
            close: find(&["close"])?,
            volume: find(&["volume"])?,
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", symbol));
        if exact.is_file() {
            return exact;
        }
        self.find_case_insensitive(symbol).unwrap_or(exact)
    }

    fn find_case_insensitive(&self, symbol: &str) -> Option<PathBuf> {
        fs::read_dir(&self.base_path)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                let is_csv = path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
                is_csv
                    && path
                        .file_stem()
                        .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(symbol))
            })
    }

    fn read_symbols_file(&self, path: &Path) -> Result<Vec<String>, FetchError> {
        let source = SYMBOLS_FILE.to_string();
        let mut rdr = csv::Reader::from_path(path).map_err(|e| FetchError::Read {
            symbol: source.clone(),
            reason: e.to_string(),
        })?;
        let headers = rdr.headers().map_err(|e| FetchError::Read {
            symbol: source.clone(),
            reason: e.to_string(),
        })?;
        let column = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("symbol"))
            .ok_or_else(|| FetchError::Malformed {
                symbol: source.clone(),
                line: 1,
                reason: "missing SYMBOL column".into(),
            })?;

        let mut symbols = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| FetchError::Malformed {
                symbol: source.clone(),
                line: i + 2,
                reason: e.to_string(),
            })?;
            if let Some(symbol) = record.get(column).map(str::trim).filter(|s| !s.is_empty()) {
                symbols.push(symbol.to_uppercase());
            }
        }
        Ok(symbols)
    }
}

/// Empty or non-numeric cells become NaN so the bar is rejected downstream.
fn cell(record: &StringRecord, index: usize) -> f64 {
    record
        .get(index)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<PriceBar>, FetchError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound {
                symbol: symbol.to_string(),
            },
            _ => FetchError::Read {
                symbol: symbol.to_string(),
                reason: format!("{}: {}", path.display(), e),
            },
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| FetchError::Read {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;
        let cols = Columns::from_headers(symbol, headers)?;

        let mut bars = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let line = i + 2;
            let record = result.map_err(|e| FetchError::Malformed {
                symbol: symbol.to_string(),
                line,
                reason: e.to_string(),
            })?;

            let raw = record.get(cols.timestamp).unwrap_or("");
            let timestamp = parse_timestamp(raw).ok_or_else(|| FetchError::Malformed {
                symbol: symbol.to_string(),
                line,
                reason: format!("invalid timestamp '{}'", raw),
            })?;

            if !request.contains(timestamp) {
                continue;
            }

            bars.push(PriceBar {
                symbol: symbol.to_string(),
                timestamp,
                open: cell(&record, cols.open),
                high: cell(&record, cols.high),
                low: cell(&record, cols.low),
                close: cell(&record, cols.close),
                volume: cell(&record, cols.volume),
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, FetchError> {
        let listing = self.base_path.join(SYMBOLS_FILE);
        if listing.is_file() {
            return self.read_symbols_file(&listing);
        }

        let dir_error = |e: std::io::Error| FetchError::Read {
            symbol: self.base_path.display().to_string(),
            reason: e.to_string(),
        };
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path).map_err(dir_error)? {
            let path = entry.map_err(dir_error)?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                symbols.push(stem.to_string_lossy().to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
