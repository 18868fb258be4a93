//! Single-symbol signal evaluation pipeline.
//!
//! bars → indicator frames → per-bar signals → position simulator → report.

use tracing::info;

use crate::domain::frame::{FrameSet, build_frames};
use crate::domain::ohlcv::PriceBar;
use crate::domain::report::Report;
use crate::domain::scorer::{Signal, score_series};
use crate::domain::simulator::{SimulationResult, simulate};
use crate::domain::strategy::Strategy;

/// Frames and signals for a bar series, aligned one-to-one with the bars.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub frames: FrameSet,
    pub signals: Vec<Signal>,
}

impl Evaluation {
    pub fn triggered(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.triggered)
    }
}

/// Build frames and score every bar.
pub fn evaluate_signals(bars: &[PriceBar], strategy: &Strategy) -> Evaluation {
    let frames = build_frames(bars, &strategy.indicators);
    let signals = score_series(&strategy.scoring, &frames.frames);
    Evaluation { frames, signals }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub evaluation: Evaluation,
    pub simulation: SimulationResult,
    pub report: Report,
}

/// Run the full pipeline for one symbol.
pub fn run_backtest(symbol: &str, bars: &[PriceBar], strategy: &Strategy) -> BacktestResult {
    let evaluation = evaluate_signals(bars, strategy);
    let simulation = simulate(
        symbol,
        &strategy.simulator,
        &evaluation.frames.frames,
        &evaluation.signals,
    );
    let report = Report::compute(&simulation.trades, simulation.initial_equity);

    info!(
        symbol,
        bars = bars.len(),
        rejected = evaluation.frames.rejected.len(),
        signals = evaluation.triggered().count(),
        trades = report.total_trades,
        total_pnl = report.total_pnl,
        "backtest complete"
    );

    BacktestResult {
        symbol: symbol.to_string(),
        evaluation,
        simulation,
        report,
    }
}
