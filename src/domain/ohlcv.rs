//! OHLCV price bar representation.

use chrono::NaiveDateTime;

use super::error::IndicatorError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Checks that every field the indicator calculator reads is usable.
    ///
    /// `bar_index` is the position of this bar in its series and is carried
    /// into the error so callers can report the offending bar.
    pub fn validate(&self, bar_index: usize) -> Result<(), IndicatorError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(self.reject(bar_index, field, "is not a finite number"));
            }
        }
        if self.volume < 0.0 {
            return Err(self.reject(bar_index, "volume", "is negative"));
        }
        if self.high < self.low {
            return Err(self.reject(bar_index, "high", "is below low"));
        }
        Ok(())
    }

    fn reject(&self, bar_index: usize, field: &'static str, reason: &str) -> IndicatorError {
        IndicatorError {
            bar_index,
            timestamp: self.timestamp,
            field,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> PriceBar {
        PriceBar {
            symbol: "RELIANCE".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, |110-130|=20, |90-130|=40 → 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn well_formed_bar_validates() {
        assert!(sample_bar().validate(0).is_ok());
    }

    #[test]
    fn nan_close_is_rejected_with_index() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        let err = bar.validate(12).unwrap_err();
        assert_eq!(err.bar_index, 12);
        assert_eq!(err.field, "close");
        assert_eq!(err.timestamp, bar.timestamp);
    }

    #[test]
    fn negative_volume_is_rejected() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        let err = bar.validate(3).unwrap_err();
        assert_eq!(err.field, "volume");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut bar = sample_bar();
        bar.high = 80.0;
        let err = bar.validate(0).unwrap_err();
        assert_eq!(err.field, "high");
    }
}
