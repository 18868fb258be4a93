//! Signal scoring.
//!
//! Each bar is scored by counting how many of the configured conditions hold.
//! A bar is *triggered* when the score reaches `min_score` and every filter
//! condition holds. Filters gate the trigger without counting toward the score.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::condition::Condition;
use crate::domain::frame::IndicatorFrame;

#[derive(Debug, Clone, PartialEq)]
pub struct NamedCondition {
    pub name: String,
    pub condition: Condition,
}

impl NamedCondition {
    pub fn new(name: impl Into<String>, condition: Condition) -> Self {
        NamedCondition {
            name: name.into(),
            condition,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub conditions: Vec<NamedCondition>,
    pub filters: Vec<NamedCondition>,
    pub min_score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub score: u32,
    pub triggered: bool,
    /// Names of the scored conditions that held, in configuration order.
    pub matched: Vec<String>,
}

/// Score the frame at `bar_index`; `previous` is the frame one bar earlier.
pub fn score_bar(
    config: &ScoringConfig,
    bar_index: usize,
    current: &IndicatorFrame,
    previous: Option<&IndicatorFrame>,
) -> Signal {
    let matched: Vec<String> = config
        .conditions
        .iter()
        .filter(|c| c.condition.evaluate(current, previous))
        .map(|c| c.name.clone())
        .collect();
    let score = matched.len() as u32;

    let filters_pass = config
        .filters
        .iter()
        .all(|f| f.condition.evaluate(current, previous));
    let triggered = score >= config.min_score && filters_pass;

    debug!(
        bar_index,
        score,
        total = config.conditions.len(),
        filters_pass,
        triggered,
        "scored bar"
    );

    Signal {
        bar_index,
        timestamp: current.bar.timestamp,
        score,
        triggered,
        matched,
    }
}

/// Score every frame in order. Rejected frames get a zero score and are never
/// used as the previous frame.
pub fn score_series(config: &ScoringConfig, frames: &[IndicatorFrame]) -> Vec<Signal> {
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            if frame.rejected {
                return Signal {
                    bar_index: i,
                    timestamp: frame.bar.timestamp,
                    score: 0,
                    triggered: false,
                    matched: Vec::new(),
                };
            }
            let previous = i
                .checked_sub(1)
                .map(|p| &frames[p])
                .filter(|p| !p.rejected);
            score_bar(config, i, frame, previous)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::condition::{Field, Operand};
    use crate::domain::indicator::test_bars::bar;

    fn frame(i: usize, close: f64, rsi: Option<f64>) -> IndicatorFrame {
        let mut f = IndicatorFrame::undefined(bar(i, close, close, close, 1000.0));
        f.rsi = rsi;
        f.ema_trend = Some(100.0);
        f
    }

    fn above(left: Field, right: f64) -> Condition {
        Condition::Above {
            left: Operand::Field(left),
            right: Operand::Constant(right),
        }
    }

    fn config(min_score: u32) -> ScoringConfig {
        ScoringConfig {
            conditions: vec![
                NamedCondition::new("PRICE", above(Field::Close, 50.0)),
                NamedCondition::new("RSI_STRONG", above(Field::Rsi, 60.0)),
                NamedCondition::new(
                    "RSI_UP",
                    Condition::Rising(Operand::Field(Field::Rsi)),
                ),
            ],
            filters: vec![NamedCondition::new(
                "TREND",
                Condition::Above {
                    left: Operand::Field(Field::Close),
                    right: Operand::Field(Field::EmaTrend),
                },
            )],
            min_score,
        }
    }

    #[test]
    fn score_counts_matches() {
        let prev = frame(0, 120.0, Some(55.0));
        let curr = frame(1, 120.0, Some(65.0));
        let signal = score_bar(&config(3), 1, &curr, Some(&prev));
        assert_eq!(signal.score, 3);
        assert!(signal.triggered);
        assert_eq!(signal.matched, vec!["PRICE", "RSI_STRONG", "RSI_UP"]);
        assert_eq!(signal.bar_index, 1);
        assert_eq!(signal.timestamp, curr.bar.timestamp);
    }

    #[test]
    fn below_min_score_not_triggered() {
        let curr = frame(0, 120.0, Some(55.0));
        let signal = score_bar(&config(2), 0, &curr, None);
        assert_eq!(signal.score, 1);
        assert!(!signal.triggered);
    }

    #[test]
    fn undefined_rsi_scores_nothing() {
        let curr = frame(0, 120.0, None);
        let signal = score_bar(&config(1), 0, &curr, None);
        assert_eq!(signal.matched, vec!["PRICE"]);
        assert!(signal.triggered);
    }

    #[test]
    fn failing_filter_blocks_trigger() {
        let prev = frame(0, 90.0, Some(55.0));
        let curr = frame(1, 90.0, Some(65.0));
        let signal = score_bar(&config(3), 1, &curr, Some(&prev));
        assert_eq!(signal.score, 3);
        assert!(!signal.triggered);
    }

    #[test]
    fn empty_filters_always_pass() {
        let mut cfg = config(1);
        cfg.filters.clear();
        let curr = frame(0, 90.0, None);
        assert!(score_bar(&cfg, 0, &curr, None).triggered);
    }

    #[test]
    fn series_scores_every_frame() {
        let frames: Vec<IndicatorFrame> = (0..5)
            .map(|i| frame(i, 120.0, Some(50.0 + 5.0 * i as f64)))
            .collect();
        let signals = score_series(&config(3), &frames);
        assert_eq!(signals.len(), 5);
        assert!(!signals[0].triggered);
        assert_eq!(signals[0].score, 1);
        assert!(signals[3].triggered);
    }

    #[test]
    fn rejected_frames_are_not_scored_or_used_as_previous() {
        let mut frames: Vec<IndicatorFrame> = (0..4)
            .map(|i| frame(i, 120.0, Some(50.0 + 5.0 * i as f64)))
            .collect();
        frames[1].rejected = true;
        let signals = score_series(&config(1), &frames);
        assert_eq!(signals[1].score, 0);
        assert!(!signals[1].triggered);
        assert!(!signals[2].matched.contains(&"RSI_UP".to_string()));
        assert!(signals[3].matched.contains(&"RSI_UP".to_string()));
    }

    #[test]
    fn scoring_is_deterministic() {
        let frames: Vec<IndicatorFrame> = (0..30)
            .map(|i| frame(i, 100.0 + (i % 7) as f64, Some(40.0 + (i % 11) as f64 * 3.0)))
            .collect();
        let first = score_series(&config(2), &frames);
        let second = score_series(&config(2), &frames);
        assert_eq!(first, second);
    }
}
