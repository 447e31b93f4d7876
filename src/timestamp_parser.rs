use anyhow::Result;
use chrono::{DateTime, Utc};

/// Converts the numeric timestamps found in event logs into UTC instants
pub struct TimestampParser;

impl TimestampParser {
    /// Interpret `millis` as milliseconds since 1970-01-01T00:00:00Z.
    /// Fractional values are rounded to the nearest millisecond.
    pub fn from_epoch_millis(millis: f64) -> Result<DateTime<Utc>> {
        if !millis.is_finite() {
            anyhow::bail!("Timestamp is not a finite number: {}", millis);
        }

        let rounded = millis.round();
        if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
            anyhow::bail!("Timestamp out of range: {}", millis);
        }

        DateTime::from_timestamp_millis(rounded as i64)
            .ok_or_else(|| anyhow::anyhow!("Timestamp out of range: {}", millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_epoch_zero() {
        let dt = TimestampParser::from_epoch_millis(0.0).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_one_day() {
        let dt = TimestampParser::from_epoch_millis(86_400_000.0).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_fractional_rounds() {
        let dt = TimestampParser::from_epoch_millis(1_500.6).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_501);
    }

    #[test]
    fn test_negative_is_before_epoch() {
        let dt = TimestampParser::from_epoch_millis(-1_000.0).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_invalid() {
        assert!(TimestampParser::from_epoch_millis(f64::NAN).is_err());
        assert!(TimestampParser::from_epoch_millis(f64::INFINITY).is_err());
        assert!(TimestampParser::from_epoch_millis(1e30).is_err());
    }
}
