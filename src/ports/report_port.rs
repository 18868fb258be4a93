//! Report output port.

use std::path::Path;

use crate::domain::error::SigtraderError;
use crate::domain::position::TradeRecord;
use crate::domain::report::Report;
use crate::domain::scanner::Alert;

/// Writes trade logs, equity curves and scan alerts.
pub trait ReportPort {
    fn write_trades(&self, trades: &[TradeRecord], path: &Path) -> Result<(), SigtraderError>;

    /// One row per closed trade: exit time, cumulative pnl and account equity.
    fn write_equity(&self, report: &Report, path: &Path) -> Result<(), SigtraderError>;

    fn write_alerts(&self, alerts: &[Alert], path: &Path) -> Result<(), SigtraderError>;
}
