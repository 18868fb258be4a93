//! Position simulator.
//!
//! A two-state machine per symbol: `Flat` or `Open(Position)`. While flat, the
//! first triggered signal with a usable ATR opens a position at the bar close
//! with ATR-bracketed stop and target. While open, every *subsequent* bar is
//! checked against the bracket and the position is closed at the touched level.
//! Signals are ignored while a position is open. Rejected bars are skipped
//! entirely: they neither fill an exit nor count as the last mark.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::error::ConfigError;
use crate::domain::frame::IndicatorFrame;
use crate::domain::position::{ExitReason, Position, Side, TradeRecord};
use crate::domain::scorer::Signal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Risk this percentage of current equity between entry and stop.
    RiskPercent(f64),
    /// A fixed number of units per trade.
    Fixed(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub side: Side,
    pub initial_equity: f64,
    pub stop_atr_mult: f64,
    pub target_atr_mult: f64,
    pub sizing: Sizing,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            side: Side::Long,
            initial_equity: 30_000.0,
            stop_atr_mult: 1.5,
            target_atr_mult: 3.0,
            sizing: Sizing::RiskPercent(2.0),
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_equity.is_finite() && self.initial_equity > 0.0) {
            return Err(ConfigError::invalid(
                "position",
                "initial_equity",
                "must be > 0",
            ));
        }
        if !(self.stop_atr_mult.is_finite() && self.stop_atr_mult > 0.0) {
            return Err(ConfigError::invalid(
                "position",
                "stop_atr_mult",
                "must be > 0",
            ));
        }
        if !(self.target_atr_mult.is_finite() && self.target_atr_mult > 0.0) {
            return Err(ConfigError::invalid(
                "position",
                "target_atr_mult",
                "must be > 0",
            ));
        }
        match self.sizing {
            Sizing::RiskPercent(pct) if !(pct > 0.0 && pct <= 100.0) => Err(
                ConfigError::invalid("position", "risk_pct", "must be in (0, 100]"),
            ),
            Sizing::Fixed(0) => Err(ConfigError::invalid(
                "position",
                "quantity",
                "must be > 0",
            )),
            _ => Ok(()),
        }
    }

    /// Stop and target for an entry at `entry` with the given ATR.
    pub fn bracket(&self, entry: f64, atr: f64) -> (f64, f64) {
        let sign = self.side.sign();
        (
            entry - sign * self.stop_atr_mult * atr,
            entry + sign * self.target_atr_mult * atr,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulatorState {
    Flat,
    Open(Position),
}

/// What a single bar did to the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Idle,
    Entered(Position),
    Exited(TradeRecord),
    /// A triggered signal was not acted on.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AtrUndefined,
    ZeroQuantity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub symbol: String,
    pub initial_equity: f64,
    pub final_equity: f64,
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Clone)]
pub struct PositionSimulator {
    symbol: String,
    config: SimulatorConfig,
    state: SimulatorState,
    equity: f64,
    trades: Vec<TradeRecord>,
    last_mark: Option<(usize, NaiveDateTime, f64)>,
}

impl PositionSimulator {
    pub fn new(symbol: impl Into<String>, config: SimulatorConfig) -> Self {
        let equity = config.initial_equity;
        PositionSimulator {
            symbol: symbol.into(),
            config,
            state: SimulatorState::Flat,
            equity,
            trades: Vec::new(),
            last_mark: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.state, SimulatorState::Flat)
    }

    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Advance by one bar. `signal` must belong to the same bar as `frame`.
    pub fn step(&mut self, frame: &IndicatorFrame, signal: &Signal) -> StepOutcome {
        let bar = &frame.bar;
        let bar_index = signal.bar_index;
        if frame.rejected {
            debug!(symbol = %self.symbol, bar_index, "rejected bar ignored");
            return StepOutcome::Idle;
        }
        if bar.close.is_finite() {
            self.last_mark = Some((bar_index, bar.timestamp, bar.close));
        }

        if let SimulatorState::Open(position) = &self.state {
            if bar_index <= position.entry_index {
                return StepOutcome::Idle;
            }
            let Some((reason, exit_price)) = position.touched_exit(bar) else {
                return StepOutcome::Idle;
            };
            let trade = position.close(bar.timestamp, bar_index, exit_price, reason);
            return StepOutcome::Exited(self.record(trade));
        }

        if !signal.triggered {
            return StepOutcome::Idle;
        }

        let atr = match frame.atr {
            Some(atr) if atr > 0.0 => atr,
            _ => {
                debug!(symbol = %self.symbol, bar_index, "signal skipped: ATR undefined");
                return StepOutcome::Skipped(SkipReason::AtrUndefined);
            }
        };

        let entry_price = bar.close;
        let (stop_loss, take_profit) = self.config.bracket(entry_price, atr);
        let quantity = self.size(entry_price, stop_loss);
        if quantity == 0 {
            debug!(
                symbol = %self.symbol,
                bar_index,
                equity = self.equity,
                "signal skipped: position size rounds to zero"
            );
            return StepOutcome::Skipped(SkipReason::ZeroQuantity);
        }

        let position = Position {
            symbol: self.symbol.clone(),
            side: self.config.side,
            quantity,
            entry_price,
            entry_time: bar.timestamp,
            entry_index: bar_index,
            stop_loss,
            take_profit,
        };
        debug!(
            symbol = %self.symbol,
            bar_index,
            side = %position.side,
            quantity,
            entry_price,
            stop_loss,
            take_profit,
            score = signal.score,
            "entered position"
        );
        self.state = SimulatorState::Open(position.clone());
        StepOutcome::Entered(position)
    }

    /// Close any open position at the last seen close and return the results.
    pub fn finish(mut self) -> SimulationResult {
        let state = std::mem::replace(&mut self.state, SimulatorState::Flat);
        if let (SimulatorState::Open(position), Some((index, timestamp, close))) =
            (state, self.last_mark)
        {
            let trade = position.close(timestamp, index, close, ExitReason::EndOfData);
            self.record(trade);
        }

        SimulationResult {
            symbol: self.symbol,
            initial_equity: self.config.initial_equity,
            final_equity: self.equity,
            trades: self.trades,
        }
    }

    fn size(&self, entry_price: f64, stop_loss: f64) -> u64 {
        match self.config.sizing {
            Sizing::Fixed(quantity) => quantity,
            Sizing::RiskPercent(pct) => {
                let risk_amount = self.equity * pct / 100.0;
                let per_unit = (entry_price - stop_loss).abs();
                if risk_amount <= 0.0 || per_unit <= 0.0 {
                    return 0;
                }
                (risk_amount / per_unit).floor() as u64
            }
        }
    }

    fn record(&mut self, trade: TradeRecord) -> TradeRecord {
        self.equity += trade.pnl_currency;
        debug!(
            symbol = %self.symbol,
            exit_reason = %trade.exit_reason,
            exit_price = trade.exit_price,
            pnl = trade.pnl_currency,
            equity = self.equity,
            "closed position"
        );
        self.trades.push(trade.clone());
        self.state = SimulatorState::Flat;
        trade
    }
}

/// Drive a simulator over aligned frames and signals.
pub fn simulate(
    symbol: &str,
    config: &SimulatorConfig,
    frames: &[IndicatorFrame],
    signals: &[Signal],
) -> SimulationResult {
    let mut sim = PositionSimulator::new(symbol, config.clone());
    for (frame, signal) in frames.iter().zip(signals) {
        sim.step(frame, signal);
    }
    sim.finish()
}
