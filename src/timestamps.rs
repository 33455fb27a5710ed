//! Timestamps are stored as POSIX UTC seconds in `f64`, which is half the
//! size of a date object per field.

use crate::error::CasicsError;
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    Posix(f64),
    Text(String),
    DateTime(DateTime<Utc>),
}

impl From<f64> for Timestamp {
    fn from(v: f64) -> Self {
        Timestamp::Posix(v)
    }
}

impl From<&str> for Timestamp {
    fn from(v: &str) -> Self {
        Timestamp::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(v: DateTime<Utc>) -> Self {
        Timestamp::DateTime(v)
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// POSIX UTC seconds for any accepted timestamp form.
///
/// Text is read as RFC 3339 (GitHub's `2012-07-20T01:19:13Z`) or as a naive
/// date-time taken to be UTC.
pub fn canonicalize_timestamp(value: impl Into<Timestamp>) -> Result<f64, CasicsError> {
    match value.into() {
        Timestamp::Posix(v) => Ok(v),
        Timestamp::DateTime(dt) => Ok(to_posix(dt)),
        Timestamp::Text(text) => {
            let text = text.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Ok(to_posix(dt.with_timezone(&Utc)));
            }
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|naive| to_posix(naive.and_utc()))
                .ok_or_else(|| CasicsError::InvalidTimestamp(text.to_string()))
        }
    }
}

fn to_posix(dt: DateTime<Utc>) -> f64 {
    dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_micros()) / 1e6
}

/// Now, truncated to whole seconds.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp() as f64
}

/// ISO 8601 text for a stored timestamp; empty for `None` or zero.
pub fn timestamp_str(value: Option<f64>) -> Result<String, CasicsError> {
    let Some(v) = value.filter(|v| *v != 0.0) else {
        return Ok(String::new());
    };
    if !v.is_finite() {
        return Err(CasicsError::InvalidTimestamp(v.to_string()));
    }
    let mut secs = v.floor() as i64;
    let mut micros = ((v - v.floor()) * 1e6).round() as u32;
    if micros >= 1_000_000 {
        secs += 1;
        micros -= 1_000_000;
    }
    let dt = DateTime::<Utc>::from_timestamp(secs, micros * 1000)
        .ok_or_else(|| CasicsError::InvalidTimestamp(v.to_string()))?;
    if dt.nanosecond() == 0 {
        Ok(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    } else {
        Ok(dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn canonicalizes_each_form() {
        assert_eq!(canonicalize_timestamp(1342747153.0).unwrap(), 1342747153.0);
        assert_eq!(
            canonicalize_timestamp("2012-07-20T01:19:13Z").unwrap(),
            1342747153.0
        );
        assert_eq!(
            canonicalize_timestamp("2012-07-20 01:19:13").unwrap(),
            1342747153.0
        );
        let dt = Utc.with_ymd_and_hms(2012, 7, 20, 1, 19, 13).unwrap();
        assert_eq!(canonicalize_timestamp(dt).unwrap(), 1342747153.0);
    }

    #[test]
    fn rejects_unparseable_text() {
        assert!(matches!(
            canonicalize_timestamp("last tuesday"),
            Err(CasicsError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn formats_stored_values() {
        assert_eq!(timestamp_str(None).unwrap(), "");
        assert_eq!(timestamp_str(Some(0.0)).unwrap(), "");
        assert_eq!(
            timestamp_str(Some(1342747153.0)).unwrap(),
            "2012-07-20T01:19:13"
        );
        assert_eq!(
            timestamp_str(Some(1342747153.5)).unwrap(),
            "2012-07-20T01:19:13.500000"
        );
    }

    #[test]
    fn rounding_carries_into_seconds() {
        assert_eq!(
            timestamp_str(Some(1342747153.9999996)).unwrap(),
            "2012-07-20T01:19:14"
        );
        assert_eq!(
            timestamp_str(Some(1342747153.25)).unwrap(),
            "2012-07-20T01:19:13.250000"
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                timestamp_str(Some(v)),
                Err(CasicsError::InvalidTimestamp(_))
            ));
        }
    }

    #[test]
    fn now_is_whole_seconds() {
        let now = now_timestamp();
        assert_eq!(now.fract(), 0.0);
        assert!(now > 1_342_747_153.0);
    }
}
