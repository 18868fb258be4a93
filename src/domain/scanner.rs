//! Last-bar scan across a universe.
//!
//! Every symbol is evaluated with the same pipeline as a backtest, but only
//! the final bar matters: a triggered signal there becomes an [`Alert`]
//! carrying the ATR bracket a position opened at that close would use.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::pipeline::evaluate_signals;
use crate::domain::position::Side;
use crate::domain::strategy::Strategy;
use crate::domain::universe::{CancelToken, SkippedSymbol, run_universe};
use crate::ports::data_port::{DataPort, HistoryRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub side: Side,
    pub close: f64,
    pub score: u32,
    /// Number of scored conditions the score is out of.
    pub max_score: u32,
    pub matched: Vec<String>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Alert {
    /// One line for a notification message.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} {} @ {:.2} score {}/{}",
            self.side.action(),
            self.symbol,
            self.close,
            self.score,
            self.max_score
        );
        if let Some(rsi) = self.rsi {
            line.push_str(&format!(" RSI {:.1}", rsi));
        }
        if let (Some(sl), Some(tp)) = (self.stop_loss, self.take_profit) {
            line.push_str(&format!(" SL {:.2} TP {:.2}", sl, tp));
        }
        if !self.matched.is_empty() {
            line.push_str(&format!(" [{}]", self.matched.join(", ")));
        }
        line
    }
}

/// Alert for the last bar of `bars`, if its signal triggered.
pub fn scan_symbol(
    symbol: &str,
    bars: &[PriceBar],
    strategy: &Strategy,
    min_price: f64,
) -> Option<Alert> {
    let last = bars.last()?;
    if last.close < min_price {
        debug!(symbol, close = last.close, min_price, "below minimum price");
        return None;
    }

    let evaluation = evaluate_signals(bars, strategy);
    let signal = evaluation.signals.last()?;
    let frame = evaluation.frames.frames.last()?;
    if !signal.triggered {
        debug!(symbol, score = signal.score, "no signal on last bar");
        return None;
    }

    let atr = frame.atr.filter(|a| *a > 0.0);
    let (stop_loss, take_profit) = match atr {
        Some(atr) => {
            let (sl, tp) = strategy.simulator.bracket(frame.bar.close, atr);
            (Some(sl), Some(tp))
        }
        None => (None, None),
    };

    Some(Alert {
        symbol: symbol.to_string(),
        timestamp: frame.bar.timestamp,
        side: strategy.simulator.side,
        close: frame.bar.close,
        score: signal.score,
        max_score: strategy.scoring.conditions.len() as u32,
        matched: signal.matched.clone(),
        rsi: frame.rsi,
        atr,
        stop_loss,
        take_profit,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Highest score first, then by symbol.
    pub alerts: Vec<Alert>,
    pub scanned: usize,
    pub skipped: Vec<SkippedSymbol>,
}

impl ScanOutcome {
    /// Notification text: a header and one line per alert.
    pub fn summary(&self, strategy_name: &str) -> String {
        let mut text = format!(
            "{}: {} alert(s) from {} symbol(s)",
            strategy_name,
            self.alerts.len(),
            self.scanned
        );
        for alert in &self.alerts {
            text.push('\n');
            text.push_str(&alert.summary_line());
        }
        text
    }
}

/// Scan every symbol on the worker pool.
pub fn run_scan(
    data_port: &dyn DataPort,
    symbols: &[String],
    request: &HistoryRequest,
    strategy: &Strategy,
    min_price: f64,
    workers: usize,
    cancel: &CancelToken,
) -> Result<ScanOutcome, SigtraderError> {
    let result = run_universe(data_port, symbols, request, workers, cancel, |symbol, bars| {
        scan_symbol(symbol, bars, strategy, min_price)
    })?;

    let scanned = result.completed.len();
    let mut alerts: Vec<Alert> = result
        .completed
        .into_iter()
        .filter_map(|run| run.value)
        .collect();
    alerts.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.symbol.cmp(&b.symbol)));

    info!(
        scanned,
        skipped = result.skipped.len(),
        alerts = alerts.len(),
        "scan complete"
    );

    Ok(ScanOutcome {
        alerts,
        scanned,
        skipped: result.skipped,
    })
}
