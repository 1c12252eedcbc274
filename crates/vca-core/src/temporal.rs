//! # Temporal Types: UTC Timestamps and the Clock Seam
//!
//! `Timestamp` is UTC with seconds precision, rendered as
//! `YYYY-MM-DDTHH:MM:SSZ`. Token `iat`/`nbf`/`exp` claims are epoch seconds
//! taken from a `Timestamp`.
//!
//! Code that needs the current time takes a [`Clock`]. Production uses
//! [`SystemClock`]; tests pin time with [`FixedClock`] so that signing the
//! same payload twice yields the same token and hash.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Midnight UTC at the start of `date`.
    pub fn start_of_day(date: NaiveDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        if !s.ends_with('Z') {
            return Err(TimestampError {
                input: s.to_string(),
                reason: "must use Z suffix (UTC only)".to_string(),
            });
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| TimestampError {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, TimestampError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| TimestampError {
                input: secs.to_string(),
                reason: "out of range".to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// This timestamp shifted by `days` whole days.
    pub fn plus_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// This timestamp shifted by `secs` seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

// ─── Clock ───────────────────────────────────────────────────────────

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that returns a pinned instant until moved explicitly.
#[derive(Debug)]
pub struct FixedClock {
    at: Mutex<Timestamp>,
}

impl FixedClock {
    /// Pin the clock at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self { at: Mutex::new(at) }
    }

    /// Move the clock to `at`.
    pub fn set(&self, at: Timestamp) {
        *self.at.lock() = at;
    }

    /// Advance the clock by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut guard = self.at.lock();
        *guard = guard.plus_secs(secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.at.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_drops_subseconds() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 7).unwrap();
        let ts = Timestamp::from_utc(dt.with_nanosecond(999_000_000).unwrap());
        assert_eq!(ts.to_string(), "2024-06-01T12:00:07Z");
    }

    #[test]
    fn start_of_day_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let ts = Timestamp::start_of_day(date);
        assert_eq!(ts.to_iso8601(), "2024-06-01T00:00:00Z");
        assert_eq!(ts.epoch_secs(), 1_717_200_000);
    }

    #[test]
    fn only_zulu_timestamps_parse() {
        assert!(Timestamp::parse("2024-06-01T12:00:00Z").is_ok());
        let err = Timestamp::parse("2024-06-01T14:00:00+02:00").unwrap_err();
        assert!(err.reason.contains("Z suffix"));
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn epoch_seconds_survive_conversion() {
        let ts = Timestamp::parse("2024-06-01T12:00:00Z").unwrap();
        assert_eq!(Timestamp::from_epoch_secs(ts.epoch_secs()).unwrap(), ts);
    }

    #[test]
    fn plus_days_365() {
        let ts = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        assert_eq!(ts.plus_days(365).to_iso8601(), "2026-01-01T00:00:00Z");
    }

    #[test]
    fn fixed_clock_is_pinned_until_moved() {
        let start = Timestamp::parse("2026-03-01T09:00:00Z").unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);
        clock.advance_secs(60);
        assert_eq!(clock.now().to_iso8601(), "2026-03-01T09:01:00Z");
        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
