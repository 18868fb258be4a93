//! Symbol universe: which symbols a run covers and how they are processed.
//!
//! Each symbol is fetched and evaluated independently on a bounded rayon pool.
//! Workers return their own [`SymbolOutcome`]; the caller receives them merged
//! and sorted by symbol once every worker has finished, so the result never
//! depends on completion order. A failing symbol is recorded as skipped and
//! never affects the others.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::config_validation::{read_f64, read_timestamp, read_usize};
use crate::domain::error::{ConfigError, FetchError, SigtraderError};
use crate::domain::ohlcv::PriceBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::{DataPort, HistoryRequest};

/// Symbols with fewer bars than this are skipped.
pub const MIN_BARS: usize = 30;

pub const DEFAULT_WORKERS: usize = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Split a comma-separated symbol list, uppercasing each entry.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// The `[data]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub dir: PathBuf,
    /// Explicit universe; `None` means ask the data port.
    pub symbols: Option<Vec<String>>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub workers: usize,
    /// Scan only: symbols whose last close is below this are ignored.
    pub min_price: f64,
}

impl DataConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ConfigError> {
        let s = "data";

        let dir = config
            .get_string(s, "dir")
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ConfigError::missing(s, "dir"))?;

        let symbols = match config.get_string(s, "symbols") {
            Some(text) if !text.trim().is_empty() => Some(
                parse_symbols(&text)
                    .map_err(|e| ConfigError::invalid(s, "symbols", e.to_string()))?,
            ),
            _ => None,
        };

        let start = read_timestamp(config, s, "start")?;
        let end = read_timestamp(config, s, "end")?;
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ConfigError::invalid(
                    s,
                    "end",
                    format!("{} is before start {}", end, start),
                ));
            }
        }

        let workers = read_usize(config, s, "workers", DEFAULT_WORKERS)?;
        if workers == 0 {
            return Err(ConfigError::invalid(s, "workers", "must be at least 1"));
        }

        let min_price = read_f64(config, s, "min_price", 0.0)?;
        if min_price < 0.0 {
            return Err(ConfigError::invalid(s, "min_price", "must be >= 0"));
        }

        Ok(DataConfig {
            dir: PathBuf::from(dir),
            symbols,
            start,
            end,
            workers,
            min_price,
        })
    }

    pub fn history_request(&self) -> HistoryRequest {
        HistoryRequest {
            start: self.start,
            end: self.end,
        }
    }
}

/// Resolve the universe: a command-line override, then the configured list,
/// then whatever the data port lists.
pub fn resolve_symbols(
    data: &DataConfig,
    data_port: &dyn DataPort,
    symbol_override: Option<&str>,
) -> Result<Vec<String>, SigtraderError> {
    if let Some(text) = symbol_override {
        return parse_symbols(text)
            .map_err(|e| ConfigError::invalid("data", "symbols", e.to_string()).into());
    }
    if let Some(symbols) = &data.symbols {
        return Ok(symbols.clone());
    }
    let mut symbols = data_port.list_symbols()?;
    symbols.sort();
    symbols.dedup();
    Ok(symbols)
}

/// Shared flag that makes workers skip the symbols they have not started yet.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Fetch(FetchError),
    NoData,
    InsufficientBars { bars: usize },
    Cancelled,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Fetch(e) => write!(f, "{}", e),
            SkipReason::NoData => write!(f, "no data found"),
            SkipReason::InsufficientBars { bars } => {
                write!(f, "only {} bars, minimum {} required", bars, MIN_BARS)
            }
            SkipReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

impl SkippedSymbol {
    /// The error to report when this was the only symbol in the run.
    pub fn into_error(self) -> SigtraderError {
        match self.reason {
            SkipReason::Fetch(e) => SigtraderError::Fetch(e),
            SkipReason::NoData | SkipReason::Cancelled => SigtraderError::NoData {
                symbol: self.symbol,
            },
            SkipReason::InsufficientBars { bars } => SigtraderError::InsufficientData {
                symbol: self.symbol,
                bars,
                minimum: MIN_BARS,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRun<T> {
    pub symbol: String,
    pub bars: usize,
    pub value: T,
}

/// What one worker produced for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome<T> {
    Done(SymbolRun<T>),
    Skipped(SkippedSymbol),
}

impl<T> SymbolOutcome<T> {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Done(run) => &run.symbol,
            SymbolOutcome::Skipped(skip) => &skip.symbol,
        }
    }
}

/// Merged outcomes, each list sorted by symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseResult<T> {
    pub completed: Vec<SymbolRun<T>>,
    pub skipped: Vec<SkippedSymbol>,
}

impl<T> UniverseResult<T> {
    pub fn total(&self) -> usize {
        self.completed.len() + self.skipped.len()
    }

    fn merge(mut outcomes: Vec<SymbolOutcome<T>>) -> Self {
        outcomes.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        let mut completed = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                SymbolOutcome::Done(run) => completed.push(run),
                SymbolOutcome::Skipped(skip) => skipped.push(skip),
            }
        }
        UniverseResult { completed, skipped }
    }
}

/// Fetch every symbol on a pool of `workers` threads and apply `evaluate` to
/// each usable bar series.
pub fn run_universe<T, F>(
    data_port: &dyn DataPort,
    symbols: &[String],
    request: &HistoryRequest,
    workers: usize,
    cancel: &CancelToken,
    evaluate: F,
) -> Result<UniverseResult<T>, SigtraderError>
where
    T: Send,
    F: Fn(&str, &[PriceBar]) -> T + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()?;

    info!(symbols = symbols.len(), workers, "processing universe");

    let outcomes: Vec<SymbolOutcome<T>> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| process_symbol(data_port, symbol, request, cancel, &evaluate))
            .collect()
    });

    let result = UniverseResult::merge(outcomes);
    if !result.skipped.is_empty() {
        info!(
            completed = result.completed.len(),
            skipped = result.skipped.len(),
            "processed {} of {} symbols",
            result.completed.len(),
            result.total()
        );
    }
    Ok(result)
}

fn process_symbol<T, F>(
    data_port: &dyn DataPort,
    symbol: &str,
    request: &HistoryRequest,
    cancel: &CancelToken,
    evaluate: &F,
) -> SymbolOutcome<T>
where
    F: Fn(&str, &[PriceBar]) -> T,
{
    let skip = |reason: SkipReason| {
        if reason != SkipReason::Cancelled {
            warn!(symbol, "skipping symbol: {}", reason);
        }
        SymbolOutcome::Skipped(SkippedSymbol {
            symbol: symbol.to_string(),
            reason,
        })
    };

    if cancel.is_cancelled() {
        return skip(SkipReason::Cancelled);
    }

    let bars = match data_port.fetch_bars(symbol, request) {
        Ok(bars) => bars,
        Err(e) => return skip(SkipReason::Fetch(e)),
    };
    if bars.is_empty() {
        return skip(SkipReason::NoData);
    }
    if bars.len() < MIN_BARS {
        return skip(SkipReason::InsufficientBars { bars: bars.len() });
    }

    SymbolOutcome::Done(SymbolRun {
        symbol: symbol.to_string(),
        bars: bars.len(),
        value: evaluate(symbol, &bars),
    })
}
