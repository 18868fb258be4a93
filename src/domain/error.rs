//! Domain error types.
//!
//! Errors are split by where they are allowed to surface:
//! - [`FetchError`]: price-history collaborator boundary, per symbol
//! - [`IndicatorError`]: one malformed bar, per bar
//! - [`ConfigError`]: invalid configuration, fatal at startup
//! - [`NotifyError`]: notifier delivery, logged and never fatal

use chrono::NaiveDateTime;

/// A parse error with position information for condition parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("no price history for {symbol}")]
    NotFound { symbol: String },

    #[error("failed to read price history for {symbol}: {reason}")]
    Read { symbol: String, reason: String },

    #[error("malformed price history for {symbol} at line {line}: {reason}")]
    Malformed {
        symbol: String,
        line: usize,
        reason: String,
    },
}

/// A bar whose fields cannot feed the indicator calculator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("bar {bar_index} ({timestamp}): {field} {reason}")]
pub struct IndicatorError {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub field: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    Missing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    Invalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid condition {name}: {source}")]
    Condition { name: String, source: ParseError },
}

impl ConfigError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        ConfigError::Missing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

/// Delivery failure reported by a notifier adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("notification failed: {reason}")]
pub struct NotifyError {
    pub reason: String,
}

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    RuleParse(#[from] ParseError),

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("failed to write report {path}: {reason}")]
    Report { path: String, reason: String },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            SigtraderError::Io(_)
            | SigtraderError::Report { .. }
            | SigtraderError::WorkerPool(_) => 1,
            SigtraderError::RuleParse(_)
            | SigtraderError::Config(ConfigError::Condition { .. }) => 4,
            SigtraderError::Config(_) => 2,
            SigtraderError::Fetch(_) => 3,
            SigtraderError::NoData { .. }
            | SigtraderError::InsufficientData { .. }
            | SigtraderError::Indicator(_) => 5,
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
