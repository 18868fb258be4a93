//! Condition AST and evaluation.
//!
//! A `Condition` is a pure predicate over the current indicator frame and,
//! for temporal variants, the frame before it.
//!
//! # Evaluation Semantics
//!
//! Evaluation is three-valued internally: a comparison touching an undefined
//! operand is *unknown*. `AND` is false if any child is false, `OR` is true if
//! any child is true, `NOT` keeps unknown as unknown. At the top level unknown
//! means "no signal possible" and evaluates to `false`.
//!
//! - `CROSS_ABOVE`/`CROSS_BELOW`/`RISING`/`FALLING` need a previous frame
//! - `BETWEEN` bounds are exclusive
//! - `STACKED(a, b, c, ...)` holds when a > b > c > ...

use std::fmt;

use crate::domain::frame::IndicatorFrame;

/// A named value readable from an `IndicatorFrame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
    EmaFast,
    EmaMedium,
    EmaSlow,
    EmaTrend,
    Rsi,
    Macd,
    MacdSignal,
    MacdHist,
    Atr,
    Adx,
    Obv,
    BbUpper,
    BbMiddle,
    BbLower,
    BbWidth,
    VolumeMa,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
        Field::EmaFast,
        Field::EmaMedium,
        Field::EmaSlow,
        Field::EmaTrend,
        Field::Rsi,
        Field::Macd,
        Field::MacdSignal,
        Field::MacdHist,
        Field::Atr,
        Field::Adx,
        Field::Obv,
        Field::BbUpper,
        Field::BbMiddle,
        Field::BbLower,
        Field::BbWidth,
        Field::VolumeMa,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Open => "OPEN",
            Field::High => "HIGH",
            Field::Low => "LOW",
            Field::Close => "CLOSE",
            Field::Volume => "VOLUME",
            Field::EmaFast => "EMA_FAST",
            Field::EmaMedium => "EMA_MEDIUM",
            Field::EmaSlow => "EMA_SLOW",
            Field::EmaTrend => "EMA_TREND",
            Field::Rsi => "RSI",
            Field::Macd => "MACD",
            Field::MacdSignal => "MACD_SIGNAL",
            Field::MacdHist => "MACD_HIST",
            Field::Atr => "ATR",
            Field::Adx => "ADX",
            Field::Obv => "OBV",
            Field::BbUpper => "BB_UPPER",
            Field::BbMiddle => "BB_MIDDLE",
            Field::BbLower => "BB_LOWER",
            Field::BbWidth => "BB_WIDTH",
            Field::VolumeMa => "VOLUME_MA",
        }
    }

    /// Case-insensitive lookup by DSL name.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    pub fn value(self, frame: &IndicatorFrame) -> Option<f64> {
        let bar = &frame.bar;
        let raw = match self {
            Field::Open => Some(bar.open),
            Field::High => Some(bar.high),
            Field::Low => Some(bar.low),
            Field::Close => Some(bar.close),
            Field::Volume => Some(bar.volume),
            Field::EmaFast => frame.ema_fast,
            Field::EmaMedium => frame.ema_medium,
            Field::EmaSlow => frame.ema_slow,
            Field::EmaTrend => frame.ema_trend,
            Field::Rsi => frame.rsi,
            Field::Macd => frame.macd,
            Field::MacdSignal => frame.macd_signal,
            Field::MacdHist => frame.macd_hist,
            Field::Atr => frame.atr,
            Field::Adx => frame.adx,
            Field::Obv => frame.obv,
            Field::BbUpper => frame.bb_upper,
            Field::BbMiddle => frame.bb_middle,
            Field::BbLower => frame.bb_lower,
            Field::BbWidth => frame.bb_width,
            Field::VolumeMa => frame.volume_ma,
        };
        raw.filter(|v| v.is_finite())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(Field),
    Constant(f64),
    /// `factor * field`, e.g. `1.5 * VOLUME_MA`.
    Scaled { factor: f64, field: Field },
}

impl Operand {
    pub fn resolve(&self, frame: &IndicatorFrame) -> Option<f64> {
        match self {
            Operand::Field(field) => field.value(frame),
            Operand::Constant(v) => Some(*v),
            Operand::Scaled { factor, field } => field.value(frame).map(|v| v * factor),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(field) => write!(f, "{}", field),
            Operand::Constant(v) => write!(f, "{}", v),
            Operand::Scaled { factor, field } => write!(f, "{} * {}", factor, field),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    CrossAbove { left: Operand, right: Operand },
    CrossBelow { left: Operand, right: Operand },
    Above { left: Operand, right: Operand },
    Below { left: Operand, right: Operand },
    Between {
        operand: Operand,
        lower: f64,
        upper: f64,
    },
    Rising(Operand),
    Falling(Operand),
    Stacked(Vec<Operand>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Evaluate against `current`, with `previous` the frame one bar earlier.
    pub fn evaluate(&self, current: &IndicatorFrame, previous: Option<&IndicatorFrame>) -> bool {
        self.evaluate_tri(current, previous).unwrap_or(false)
    }

    /// `None` = unknown because an operand was undefined.
    fn evaluate_tri(
        &self,
        current: &IndicatorFrame,
        previous: Option<&IndicatorFrame>,
    ) -> Option<bool> {
        match self {
            Condition::CrossAbove { left, right } => {
                let prev = previous?;
                let (lc, rc) = (left.resolve(current)?, right.resolve(current)?);
                let (lp, rp) = (left.resolve(prev)?, right.resolve(prev)?);
                Some(lc > rc && lp <= rp)
            }
            Condition::CrossBelow { left, right } => {
                let prev = previous?;
                let (lc, rc) = (left.resolve(current)?, right.resolve(current)?);
                let (lp, rp) = (left.resolve(prev)?, right.resolve(prev)?);
                Some(lc < rc && lp >= rp)
            }
            Condition::Above { left, right } => {
                Some(left.resolve(current)? > right.resolve(current)?)
            }
            Condition::Below { left, right } => {
                Some(left.resolve(current)? < right.resolve(current)?)
            }
            Condition::Between {
                operand,
                lower,
                upper,
            } => {
                let v = operand.resolve(current)?;
                Some(v > *lower && v < *upper)
            }
            Condition::Rising(operand) => {
                let prev = previous?;
                Some(operand.resolve(current)? > operand.resolve(prev)?)
            }
            Condition::Falling(operand) => {
                let prev = previous?;
                Some(operand.resolve(current)? < operand.resolve(prev)?)
            }
            Condition::Stacked(operands) => {
                let values = operands
                    .iter()
                    .map(|o| o.resolve(current))
                    .collect::<Option<Vec<f64>>>()?;
                Some(values.windows(2).all(|w| w[0] > w[1]))
            }
            Condition::And(children) => {
                let mut unknown = false;
                for child in children {
                    match child.evaluate_tri(current, previous) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                if unknown { None } else { Some(true) }
            }
            Condition::Or(children) => {
                let mut unknown = false;
                for child in children {
                    match child.evaluate_tri(current, previous) {
                        Some(true) => return Some(true),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                if unknown { None } else { Some(false) }
            }
            Condition::Not(child) => child.evaluate_tri(current, previous).map(|b| !b),
        }
    }
}

fn join(operands: &[Operand]) -> String {
    operands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::CrossAbove { left, right } => write!(f, "CROSS_ABOVE({}, {})", left, right),
            Condition::CrossBelow { left, right } => write!(f, "CROSS_BELOW({}, {})", left, right),
            Condition::Above { left, right } => write!(f, "ABOVE({}, {})", left, right),
            Condition::Below { left, right } => write!(f, "BELOW({}, {})", left, right),
            Condition::Between {
                operand,
                lower,
                upper,
            } => write!(f, "BETWEEN({}, {}, {})", operand, lower, upper),
            Condition::Rising(operand) => write!(f, "RISING({})", operand),
            Condition::Falling(operand) => write!(f, "FALLING({})", operand),
            Condition::Stacked(operands) => write!(f, "STACKED({})", join(operands)),
            Condition::And(children) | Condition::Or(children) => {
                let keyword = if matches!(self, Condition::And(_)) {
                    "AND"
                } else {
                    "OR"
                };
                let inner = children
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}({})", keyword, inner)
            }
            Condition::Not(child) => write!(f, "NOT({})", child),
        }
    }
}
