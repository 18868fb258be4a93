//! Configuration reading and validation.
//!
//! Every value is read through [`ConfigPort`] and checked before any symbol is
//! processed. A missing optional key falls back to its default; a present but
//! unparseable or out-of-range value is an error.

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::error::ConfigError;
use crate::domain::strategy::Strategy;
use crate::domain::universe::DataConfig;
use crate::ports::config_port::ConfigPort;

/// Load and validate everything a run needs.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(Strategy, DataConfig), ConfigError> {
    let data = DataConfig::from_config(config)?;
    let strategy = Strategy::from_config(config)?;
    Ok((strategy, data))
}

fn present(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    match present(config, section, key) {
        None => Ok(default),
        Some(s) => s.parse::<usize>().map_err(|_| {
            ConfigError::invalid(section, key, format!("expected a whole number, found '{}'", s))
        }),
    }
}

/// A window length: a whole number greater than zero.
pub fn read_window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    let value = read_usize(config, section, key, default)?;
    if value == 0 {
        return Err(ConfigError::invalid(section, key, "window must be > 0"));
    }
    Ok(value)
}

pub fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ConfigError> {
    match present(config, section, key) {
        None => Ok(default),
        Some(s) => match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(ConfigError::invalid(
                section,
                key,
                format!("expected a number, found '{}'", s),
            )),
        },
    }
}

/// Comma-separated list; `None` when the key is absent, empty when it is blank.
pub fn read_list(config: &dyn ConfigPort, section: &str, key: &str) -> Option<Vec<String>> {
    config.get_string(section, key).map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
}

pub fn read_timestamp(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDateTime>, ConfigError> {
    present(config, section, key)
        .map(|s| {
            parse_timestamp(&s).ok_or_else(|| {
                ConfigError::invalid(
                    section,
                    key,
                    format!("expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS, found '{}'", s),
                )
            })
        })
        .transpose()
}

/// Accepts `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM[:SS]`.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn validate_min_score(min_score: u32, scored: usize) -> Result<(), ConfigError> {
    if min_score == 0 {
        return Err(ConfigError::invalid(
            "strategy",
            "min_score",
            "must be at least 1",
        ));
    }
    if min_score as usize > scored {
        return Err(ConfigError::invalid(
            "strategy",
            "min_score",
            format!(
                "{} exceeds the number of scored conditions ({})",
                min_score, scored
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn read_usize_default_when_missing() {
        let config = make_config("[indicators]\n");
        assert_eq!(read_usize(&config, "indicators", "rsi", 14).unwrap(), 14);
    }

    #[test]
    fn read_usize_rejects_garbage() {
        let config = make_config("[indicators]\nrsi = fourteen\n");
        let err = read_usize(&config, "indicators", "rsi", 14).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "rsi"));
    }

    #[test]
    fn read_window_rejects_zero() {
        let config = make_config("[indicators]\natr = 0\n");
        assert!(read_window(&config, "indicators", "atr", 14).is_err());
    }

    #[test]
    fn read_f64_parses_and_rejects() {
        let config = make_config("[position]\nrisk_pct = 2.5\nstop_atr_mult = wide\n");
        assert_eq!(read_f64(&config, "position", "risk_pct", 2.0).unwrap(), 2.5);
        assert!(read_f64(&config, "position", "stop_atr_mult", 1.5).is_err());
        assert_eq!(read_f64(&config, "position", "missing", 3.0).unwrap(), 3.0);
    }

    #[test]
    fn read_list_splits_and_trims() {
        let config = make_config("[data]\nsymbols = RELIANCE, TCS ,,INFY\n");
        assert_eq!(
            read_list(&config, "data", "symbols"),
            Some(vec!["RELIANCE".into(), "TCS".into(), "INFY".into()])
        );
        assert_eq!(read_list(&config, "data", "missing"), None);

        let blank = make_config("[strategy]\nfilters =\n");
        assert_eq!(read_list(&blank, "strategy", "filters"), Some(vec![]));
    }

    #[test]
    fn timestamps_accept_date_and_datetime() {
        let d = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(d.to_string(), "2024-01-15 00:00:00");
        let dt = parse_timestamp("2024-01-15 09:15:00").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 09:15:00");
        assert!(parse_timestamp("2024/01/15").is_none());
    }

    #[test]
    fn read_timestamp_reports_bad_format() {
        let config = make_config("[data]\nstart = 15-01-2024\n");
        let err = read_timestamp(&config, "data", "start").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "start"));
        assert_eq!(read_timestamp(&config, "data", "end").unwrap(), None);
    }

    #[test]
    fn min_score_bounds() {
        assert!(validate_min_score(0, 5).is_err());
        assert!(validate_min_score(6, 5).is_err());
        assert!(validate_min_score(4, 5).is_ok());
        assert!(validate_min_score(5, 5).is_ok());
    }

    #[test]
    fn full_config_validates() {
        let config = make_config(
            r#"
[data]
dir = ./data
symbols = RELIANCE
workers = 2

[strategy]
name = Nifty momentum
conditions = EMA_STACK, RSI_BAND, MACD_STRONG, ADX_TREND, VOLUME_SPIKE
filters = TREND
min_score = 4
"#,
        );
        let (strategy, data) = validate_config(&config).unwrap();
        assert_eq!(strategy.name, "Nifty momentum");
        assert_eq!(data.workers, 2);
    }
}
