//! Trade report aggregation.

use chrono::NaiveDateTime;

use super::position::{TradeRecord, sort_by_exit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub timestamp: NaiveDateTime,
    /// Sum of `pnl_currency` over every trade closed up to and including this one.
    pub cumulative_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage of trades with positive pnl, 0 when there are no trades.
    pub win_rate: f64,
    pub average_pnl_percent: f64,
    pub total_pnl: f64,
    pub initial_equity: f64,
    pub final_equity: f64,
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Largest peak-to-trough decline of equity, as a fraction of the peak.
    pub max_drawdown: f64,
    pub average_bars_held: f64,
    pub equity_curve: Vec<CurvePoint>,
}

impl Report {
    /// Aggregate `trades` in the order given.
    pub fn compute(trades: &[TradeRecord], initial_equity: f64) -> Self {
        let total_trades = trades.len();

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut pnl_percent_sum = 0.0_f64;
        let mut bars_held_sum = 0usize;
        let mut cumulative = 0.0_f64;
        let mut equity_curve = Vec::with_capacity(total_trades);

        for trade in trades {
            let pnl = trade.pnl_currency;
            if pnl > 0.0 {
                winning_trades += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                losing_trades += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            }
            pnl_percent_sum += trade.pnl_percent;
            bars_held_sum += trade.bars_held();

            cumulative += pnl;
            equity_curve.push(CurvePoint {
                timestamp: trade.exit_time,
                cumulative_pnl: cumulative,
            });
        }

        let (win_rate, average_pnl_percent, average_bars_held) = if total_trades > 0 {
            let n = total_trades as f64;
            (
                winning_trades as f64 / n * 100.0,
                pnl_percent_sum / n,
                bars_held_sum as f64 / n,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        Report {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            average_pnl_percent,
            total_pnl: cumulative,
            initial_equity,
            final_equity: initial_equity + cumulative,
            profit_factor,
            largest_win,
            largest_loss,
            max_drawdown: compute_drawdown(initial_equity, &equity_curve),
            average_bars_held,
            equity_curve,
        }
    }

    /// Aggregate trades from several symbols. `trades` is left ordered by
    /// exit time then symbol.
    pub fn combined(trades: &mut [TradeRecord], initial_equity: f64) -> Self {
        sort_by_exit(trades);
        Self::compute(trades, initial_equity)
    }
}

fn compute_drawdown(initial_equity: f64, curve: &[CurvePoint]) -> f64 {
    let mut peak = initial_equity;
    let mut max_dd = 0.0_f64;

    for point in curve {
        let equity = initial_equity + point.cumulative_pnl;
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak);
        }
    }

    max_dd
}
