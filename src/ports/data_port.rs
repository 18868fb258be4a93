//! Price history port.

use chrono::NaiveDateTime;

use crate::domain::error::FetchError;
use crate::domain::ohlcv::PriceBar;

/// Optional inclusive bounds on the bars returned by [`DataPort::fetch_bars`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryRequest {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl HistoryRequest {
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start.is_none_or(|s| timestamp >= s) && self.end.is_none_or(|e| timestamp <= e)
    }
}

/// Source of chronological OHLCV bars.
///
/// Implementations are shared across the worker pool, hence `Send + Sync`.
pub trait DataPort: Send + Sync {
    fn fetch_bars(
        &self,
        symbol: &str,
        request: &HistoryRequest,
    ) -> Result<Vec<PriceBar>, FetchError>;

    fn list_symbols(&self) -> Result<Vec<String>, FetchError>;
}
