//! Strategy configuration and composition.
//!
//! A strategy bundles indicator windows, the scored and filter conditions, and
//! position settings. Condition names listed under `[strategy]` are looked up
//! in `[conditions]` first and then in the built-in library below.

use crate::domain::condition_parser;
use crate::domain::config_validation::{
    read_f64, read_list, read_usize, read_window, validate_min_score,
};
use crate::domain::error::ConfigError;
use crate::domain::frame::IndicatorConfig;
use crate::domain::position::Side;
use crate::domain::scorer::{NamedCondition, ScoringConfig};
use crate::domain::simulator::{SimulatorConfig, Sizing};
use crate::ports::config_port::ConfigPort;

/// Conditions available without a `[conditions]` entry.
pub const BUILTIN_CONDITIONS: &[(&str, &str)] = &[
    ("TREND", "ABOVE(CLOSE, EMA_TREND)"),
    ("EMA_STACK", "STACKED(EMA_FAST, EMA_MEDIUM, EMA_SLOW)"),
    ("EMA_CROSS", "CROSS_ABOVE(EMA_FAST, EMA_MEDIUM)"),
    ("RSI_BAND", "BETWEEN(RSI, 50, 70)"),
    ("RSI_RISING", "AND(RISING(RSI), ABOVE(RSI, 50))"),
    (
        "MACD_STRONG",
        "AND(ABOVE(MACD, MACD_SIGNAL), ABOVE(MACD_HIST, 0.1))",
    ),
    ("MACD_CROSS", "CROSS_ABOVE(MACD, MACD_SIGNAL)"),
    ("MACD_BEARISH", "BELOW(MACD, MACD_SIGNAL)"),
    ("ADX_TREND", "ABOVE(ADX, 25)"),
    ("VOLUME_SPIKE", "ABOVE(VOLUME, 1.5 * VOLUME_MA)"),
    ("OBV_RISING", "RISING(OBV)"),
    ("RSI_OVERSOLD_EXIT", "ABOVE(RSI, 30)"),
    ("RSI_OVERBOUGHT", "ABOVE(RSI, 70)"),
    ("NEAR_LOWER_BAND", "NOT(ABOVE(CLOSE, 1.02 * BB_LOWER))"),
    ("NEAR_UPPER_BAND", "NOT(BELOW(CLOSE, 0.98 * BB_UPPER))"),
];

const DEFAULT_CONDITIONS: [&str; 5] = [
    "EMA_STACK",
    "RSI_BAND",
    "MACD_STRONG",
    "ADX_TREND",
    "VOLUME_SPIKE",
];
const DEFAULT_FILTERS: [&str; 1] = ["TREND"];
const DEFAULT_MIN_SCORE: u32 = 4;

pub fn builtin_condition(name: &str) -> Option<&'static str> {
    BUILTIN_CONDITIONS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, text)| *text)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    pub indicators: IndicatorConfig,
    pub scoring: ScoringConfig,
    pub simulator: SimulatorConfig,
}

impl Default for Strategy {
    /// The momentum strategy: five scored conditions, four required, above the
    /// long-term trend.
    fn default() -> Self {
        let lookup = |names: &[&str]| -> Vec<NamedCondition> {
            names
                .iter()
                .filter_map(|n| {
                    let text = builtin_condition(n)?;
                    let condition = condition_parser::parse(text).ok()?;
                    Some(NamedCondition::new(*n, condition))
                })
                .collect()
        };
        Strategy {
            name: "Momentum".to_string(),
            indicators: IndicatorConfig::default(),
            scoring: ScoringConfig {
                conditions: lookup(&DEFAULT_CONDITIONS),
                filters: lookup(&DEFAULT_FILTERS),
                min_score: DEFAULT_MIN_SCORE,
            },
            simulator: SimulatorConfig::default(),
        }
    }
}

impl Strategy {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ConfigError> {
        let indicators = read_indicator_config(config)?;
        indicators.validate()?;

        let simulator = read_simulator_config(config)?;
        simulator.validate()?;

        let condition_names = read_list(config, "strategy", "conditions")
            .unwrap_or_else(|| DEFAULT_CONDITIONS.iter().map(|s| s.to_string()).collect());
        if condition_names.is_empty() {
            return Err(ConfigError::missing("strategy", "conditions"));
        }
        let filter_names = read_list(config, "strategy", "filters")
            .unwrap_or_else(|| DEFAULT_FILTERS.iter().map(|s| s.to_string()).collect());

        let conditions = resolve_conditions(config, &condition_names)?;
        let filters = resolve_conditions(config, &filter_names)?;

        let min_score = read_usize(config, "strategy", "min_score", DEFAULT_MIN_SCORE as usize)?;
        let min_score = u32::try_from(min_score)
            .map_err(|_| ConfigError::invalid("strategy", "min_score", "value too large"))?;
        validate_min_score(min_score, conditions.len())?;

        let name = config
            .get_string("strategy", "name")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unnamed".to_string());

        Ok(Strategy {
            name,
            indicators,
            scoring: ScoringConfig {
                conditions,
                filters,
                min_score,
            },
            simulator,
        })
    }
}

fn resolve_conditions(
    config: &dyn ConfigPort,
    names: &[String],
) -> Result<Vec<NamedCondition>, ConfigError> {
    names
        .iter()
        .map(|name| {
            let text = config
                .get_string("conditions", name)
                .or_else(|| builtin_condition(name).map(str::to_string))
                .ok_or_else(|| {
                    ConfigError::invalid(
                        "strategy",
                        "conditions",
                        format!("unknown condition {}", name),
                    )
                })?;
            let condition =
                condition_parser::parse(text.trim()).map_err(|source| ConfigError::Condition {
                    name: name.clone(),
                    source,
                })?;
            Ok(NamedCondition::new(name.clone(), condition))
        })
        .collect()
}

fn read_indicator_config(config: &dyn ConfigPort) -> Result<IndicatorConfig, ConfigError> {
    let d = IndicatorConfig::default();
    let s = "indicators";
    Ok(IndicatorConfig {
        ema_fast: read_window(config, s, "ema_fast", d.ema_fast)?,
        ema_medium: read_window(config, s, "ema_medium", d.ema_medium)?,
        ema_slow: read_window(config, s, "ema_slow", d.ema_slow)?,
        ema_trend: read_window(config, s, "ema_trend", d.ema_trend)?,
        rsi: read_window(config, s, "rsi", d.rsi)?,
        macd_fast: read_window(config, s, "macd_fast", d.macd_fast)?,
        macd_slow: read_window(config, s, "macd_slow", d.macd_slow)?,
        macd_signal: read_window(config, s, "macd_signal", d.macd_signal)?,
        atr: read_window(config, s, "atr", d.atr)?,
        adx: read_window(config, s, "adx", d.adx)?,
        bollinger: read_window(config, s, "bollinger", d.bollinger)?,
        bollinger_mult: read_f64(config, s, "bollinger_mult", d.bollinger_mult)?,
        volume_ma: read_window(config, s, "volume_ma", d.volume_ma)?,
    })
}

fn read_simulator_config(config: &dyn ConfigPort) -> Result<SimulatorConfig, ConfigError> {
    let d = SimulatorConfig::default();
    let s = "position";

    let side = match config.get_string("strategy", "side") {
        None => d.side,
        Some(text) => Side::parse(&text).ok_or_else(|| {
            ConfigError::invalid(
                "strategy",
                "side",
                format!("expected long or short, found '{}'", text.trim()),
            )
        })?,
    };

    let sizing_kind = config
        .get_string(s, "sizing")
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "risk".to_string());
    let sizing = match sizing_kind.as_str() {
        "risk" => Sizing::RiskPercent(read_f64(config, s, "risk_pct", 2.0)?),
        "fixed" => {
            let quantity = read_usize(config, s, "quantity", 1)?;
            Sizing::Fixed(quantity as u64)
        }
        other => {
            return Err(ConfigError::invalid(
                s,
                "sizing",
                format!("expected risk or fixed, found '{}'", other),
            ));
        }
    };

    Ok(SimulatorConfig {
        side,
        initial_equity: read_f64(config, s, "initial_equity", d.initial_equity)?,
        stop_atr_mult: read_f64(config, s, "stop_atr_mult", d.stop_atr_mult)?,
        target_atr_mult: read_f64(config, s, "target_atr_mult", d.target_atr_mult)?,
        sizing,
    })
}
