//! Fixed-offset wall clock.
//!
//! Every place the engine cares about "today" goes through a [`Clock`] so that
//! date-sensitive logic (streaks, missions, goal periods) is testable. The
//! production clock runs at a single fixed UTC offset with no DST handling or
//! timezone introspection.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

/// Default UTC offset in hours (UTC+13).
pub const DEFAULT_OFFSET_HOURS: i32 = 13;

/// Source of the current date and time.
pub trait Clock {
    /// Current timestamp in the fixed local offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current calendar date in the fixed local offset.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Production clock pinned to a fixed UTC offset.
pub struct FixedClock {
    offset: FixedOffset,
}

impl FixedClock {
    /// Create a clock at the given whole-hour UTC offset.
    ///
    /// Falls back to [`DEFAULT_OFFSET_HOURS`] if the offset is out of range.
    pub fn new(offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(DEFAULT_OFFSET_HOURS * 3600).unwrap());
        Self { offset }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(DEFAULT_OFFSET_HOURS)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Manually-advanced clock for tests.
pub struct ManualClock {
    now: std::cell::Cell<DateTime<FixedOffset>>,
}

impl ManualClock {
    /// Create a manual clock at midday on the given date.
    pub fn at_date(date: NaiveDate) -> Self {
        let offset = FixedOffset::east_opt(DEFAULT_OFFSET_HOURS * 3600).unwrap();
        let now = date
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap();
        Self {
            now: std::cell::Cell::new(now),
        }
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.now.set(self.now.get() + Duration::days(days));
    }

    /// Jump to a specific date, keeping the time of day.
    pub fn set_date(&self, date: NaiveDate) {
        let current = self.now.get();
        let new = date
            .and_time(current.time())
            .and_local_timezone(*current.offset())
            .unwrap();
        self.now.set(new);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }
}

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the month containing `date`.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

/// `YYYY-MM` key for the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Whether `date` falls on Monday..Friday.
pub fn is_weekday(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() < 5
}

/// Parse an ISO date, tolerating a trailing time component.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let date_part = value.split('T').next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parse an RFC 3339 timestamp.
pub fn parse_datetime(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_starts_on_monday() {
        // 2026-08-23 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let monday = start_of_week(sunday);
        assert_eq!(monday, NaiveDate::from_ymd_opt(2026, 8, 17).unwrap());
        assert_eq!(start_of_week(monday), monday);
    }

    #[test]
    fn test_month_key_and_start() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        assert_eq!(month_key(date), "2026-08");
        assert_eq!(
            start_of_month(date),
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap()
        );
    }

    #[test]
    fn test_weekday_detection() {
        let friday = NaiveDate::from_ymd_opt(2026, 8, 21).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 8, 22).unwrap();
        assert!(is_weekday(friday));
        assert!(!is_weekday(saturday));
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::at_date(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        clock.advance_days(1);
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_date_tolerates_timestamps() {
        assert_eq!(
            parse_date("2026-08-23T10:30:00+13:00"),
            NaiveDate::from_ymd_opt(2026, 8, 23)
        );
        assert_eq!(parse_date("not a date"), None);
    }
}
