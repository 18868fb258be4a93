//! Open positions and closed trade records.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn parse(s: &str) -> Option<Side> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" => Some(Side::Long),
            "short" | "sell" => Some(Side::Short),
            _ => None,
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    /// Alert verb for opening a position on this side.
    pub fn action(self) -> &'static str {
        match self {
            Side::Long => "BUY",
            Side::Short => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "STOP_LOSS"),
            ExitReason::TakeProfit => write!(f, "TAKE_PROFIT"),
            ExitReason::EndOfData => write!(f, "END_OF_DATA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub entry_index: usize,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl Position {
    pub fn should_stop_loss(&self, bar: &PriceBar) -> bool {
        match self.side {
            Side::Long => bar.low <= self.stop_loss,
            Side::Short => bar.high >= self.stop_loss,
        }
    }

    pub fn should_take_profit(&self, bar: &PriceBar) -> bool {
        match self.side {
            Side::Long => bar.high >= self.take_profit,
            Side::Short => bar.low <= self.take_profit,
        }
    }

    /// The level touched by `bar`, if any. When both levels fall inside the
    /// bar's range the stop wins.
    pub fn touched_exit(&self, bar: &PriceBar) -> Option<(ExitReason, f64)> {
        if self.should_stop_loss(bar) {
            Some((ExitReason::StopLoss, self.stop_loss))
        } else if self.should_take_profit(bar) {
            Some((ExitReason::TakeProfit, self.take_profit))
        } else {
            None
        }
    }

    pub fn pnl_at(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) * self.quantity as f64
    }

    pub fn close(
        &self,
        exit_time: NaiveDateTime,
        exit_index: usize,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> TradeRecord {
        let pnl_percent =
            self.side.sign() * (exit_price - self.entry_price) / self.entry_price * 100.0;
        TradeRecord {
            symbol: self.symbol.clone(),
            side: self.side,
            quantity: self.quantity,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            entry_index: self.entry_index,
            exit_time,
            exit_price,
            exit_index,
            exit_reason,
            pnl_percent,
            pnl_currency: self.pnl_at(exit_price),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub entry_index: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_index: usize,
    pub exit_reason: ExitReason,
    pub pnl_percent: f64,
    pub pnl_currency: f64,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.pnl_currency > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index.saturating_sub(self.entry_index)
    }
}

/// Order trades from several symbols by exit time, then symbol.
pub fn sort_by_exit(trades: &mut [TradeRecord]) {
    trades.sort_by(|a, b| {
        a.exit_time
            .cmp(&b.exit_time)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::bar;

    fn long_position() -> Position {
        Position {
            symbol: "RELIANCE".into(),
            side: Side::Long,
            quantity: 100,
            entry_price: 100.0,
            entry_time: bar(0, 0.0, 0.0, 0.0, 0.0).timestamp,
            entry_index: 0,
            stop_loss: 97.0,
            take_profit: 106.0,
        }
    }

    fn short_position() -> Position {
        Position {
            side: Side::Short,
            stop_loss: 103.0,
            take_profit: 94.0,
            ..long_position()
        }
    }

    #[test]
    fn side_parse() {
        assert_eq!(Side::parse("long"), Some(Side::Long));
        assert_eq!(Side::parse(" SELL "), Some(Side::Short));
        assert_eq!(Side::parse("sideways"), None);
    }

    #[test]
    fn long_stop_touched_by_low() {
        let pos = long_position();
        let b = bar(1, 101.0, 96.5, 100.0, 0.0);
        assert_eq!(pos.touched_exit(&b), Some((ExitReason::StopLoss, 97.0)));
    }

    #[test]
    fn long_target_touched_by_high() {
        let pos = long_position();
        let b = bar(1, 106.0, 99.0, 105.0, 0.0);
        assert_eq!(pos.touched_exit(&b), Some((ExitReason::TakeProfit, 106.0)));
    }

    #[test]
    fn untouched_bar() {
        let pos = long_position();
        assert_eq!(pos.touched_exit(&bar(1, 105.0, 98.0, 101.0, 0.0)), None);
    }

    #[test]
    fn stop_wins_same_bar_tie() {
        let pos = long_position();
        let wide = bar(1, 110.0, 90.0, 100.0, 0.0);
        assert_eq!(pos.touched_exit(&wide), Some((ExitReason::StopLoss, 97.0)));

        let short = short_position();
        assert_eq!(short.touched_exit(&wide), Some((ExitReason::StopLoss, 103.0)));
    }

    #[test]
    fn short_levels_are_mirrored() {
        let pos = short_position();
        assert_eq!(
            pos.touched_exit(&bar(1, 99.0, 93.0, 95.0, 0.0)),
            Some((ExitReason::TakeProfit, 94.0))
        );
        assert_eq!(
            pos.touched_exit(&bar(1, 103.5, 99.0, 101.0, 0.0)),
            Some((ExitReason::StopLoss, 103.0))
        );
    }

    #[test]
    fn close_long_computes_pnl() {
        let pos = long_position();
        let exit_time = bar(4, 0.0, 0.0, 0.0, 0.0).timestamp;
        let trade = pos.close(exit_time, 4, 106.0, ExitReason::TakeProfit);
        assert!((trade.pnl_currency - 600.0).abs() < 1e-9);
        assert!((trade.pnl_percent - 6.0).abs() < 1e-9);
        assert!(trade.is_win());
        assert_eq!(trade.bars_held(), 4);
    }

    #[test]
    fn close_short_computes_pnl() {
        let pos = short_position();
        let exit_time = bar(2, 0.0, 0.0, 0.0, 0.0).timestamp;
        let trade = pos.close(exit_time, 2, 103.0, ExitReason::StopLoss);
        assert!((trade.pnl_currency + 300.0).abs() < 1e-9);
        assert!((trade.pnl_percent + 3.0).abs() < 1e-9);
        assert!(!trade.is_win());
    }
}
