//! Spreadsheet-readable CSV output for trade logs, equity curves and scan
//! alerts.

use std::path::Path;

use serde::Serialize;

use crate::domain::error::SigtraderError;
use crate::domain::position::TradeRecord;
use crate::domain::report::{CurvePoint, Report};
use crate::domain::scanner::Alert;
use crate::ports::report_port::ReportPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct TradeRow<'a> {
    symbol: &'a str,
    side: String,
    quantity: u64,
    entry_time: String,
    entry_price: f64,
    exit_time: String,
    exit_price: f64,
    exit_reason: String,
    bars_held: usize,
    pnl_percent: f64,
    pnl_currency: f64,
}

impl<'a> From<&'a TradeRecord> for TradeRow<'a> {
    fn from(t: &'a TradeRecord) -> Self {
        TradeRow {
            symbol: &t.symbol,
            side: t.side.to_string(),
            quantity: t.quantity,
            entry_time: t.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            entry_price: t.entry_price,
            exit_time: t.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            exit_price: t.exit_price,
            exit_reason: t.exit_reason.to_string(),
            bars_held: t.bars_held(),
            pnl_percent: round2(t.pnl_percent),
            pnl_currency: round2(t.pnl_currency),
        }
    }
}

#[derive(Serialize)]
struct EquityRow {
    timestamp: String,
    cumulative_pnl: f64,
    equity: f64,
}

impl EquityRow {
    fn new(point: &CurvePoint, initial_equity: f64) -> Self {
        EquityRow {
            timestamp: point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            cumulative_pnl: round2(point.cumulative_pnl),
            equity: round2(initial_equity + point.cumulative_pnl),
        }
    }
}

#[derive(Serialize)]
struct AlertRow<'a> {
    symbol: &'a str,
    timestamp: String,
    action: &'static str,
    close: f64,
    score: String,
    matched: String,
    rsi: Option<f64>,
    atr: Option<f64>,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
}

impl<'a> From<&'a Alert> for AlertRow<'a> {
    fn from(a: &'a Alert) -> Self {
        AlertRow {
            symbol: &a.symbol,
            timestamp: a.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            action: a.side.action(),
            close: a.close,
            score: format!("{}/{}", a.score, a.max_score),
            matched: a.matched.join(" "),
            rsi: a.rsi.map(round2),
            atr: a.atr.map(round2),
            stop_loss: a.stop_loss.map(round2),
            take_profit: a.take_profit.map(round2),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn write_rows<T: Serialize>(
    rows: impl IntoIterator<Item = T>,
    path: &Path,
) -> Result<(), SigtraderError> {
    let report_error = |reason: String| SigtraderError::Report {
        path: path.display().to_string(),
        reason,
    };
    let mut writer = csv::Writer::from_path(path).map_err(|e| report_error(e.to_string()))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| report_error(e.to_string()))?;
    }
    writer.flush().map_err(|e| report_error(e.to_string()))?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write_trades(&self, trades: &[TradeRecord], path: &Path) -> Result<(), SigtraderError> {
        write_rows(trades.iter().map(TradeRow::from), path)
    }

    fn write_equity(&self, report: &Report, path: &Path) -> Result<(), SigtraderError> {
        let rows = report
            .equity_curve
            .iter()
            .map(|p| EquityRow::new(p, report.initial_equity));
        write_rows(rows, path)
    }

    fn write_alerts(&self, alerts: &[Alert], path: &Path) -> Result<(), SigtraderError> {
        write_rows(alerts.iter().map(AlertRow::from), path)
    }
}
