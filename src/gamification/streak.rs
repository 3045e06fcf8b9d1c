//! Daily outreach streak with one-time milestone bonuses.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rusqlite::Connection;
use tracing::info;

use crate::gamification::rules::{STREAK_TOKEN_BONUSES, STREAK_XP_BONUSES};
use crate::gamification::stats::StatsStore;
use crate::gamification::tokens::TokenLedger;
use crate::gamification::EngineError;
use crate::settings::SettingsStore;

/// Maintains the outreach streak on the stats row.
pub struct StreakTracker<'a> {
    conn: &'a Connection,
}

/// Outcome of a streak update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current: i64,
    pub longest: i64,
    /// False for a same-day repeat or while paused.
    pub extended: bool,
    /// One-time milestone XP credited by this update.
    pub bonus_xp: i64,
    /// One-time milestone tokens credited by this update.
    pub bonus_tokens: i64,
}

impl<'a> StreakTracker<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Register an outreach touch on `today` and update the streak.
    ///
    /// Same-day repeats are no-ops. While paused the streak count is frozen
    /// and only `last_outreach_date` advances. Milestone bonuses are granted
    /// once per lifetime via ledger idempotency keys.
    pub fn update(
        &self,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<StreakUpdate, EngineError> {
        let stats_store = StatsStore::new(self.conn);
        let settings = SettingsStore::new(self.conn);
        settings.check_pause_expiry(today)?;

        let stats = stats_store.get_or_create(now)?;

        if stats.last_outreach_date == Some(today) {
            return Ok(StreakUpdate {
                current: stats.current_outreach_streak_days,
                longest: stats.longest_outreach_streak_days,
                extended: false,
                bonus_xp: 0,
                bonus_tokens: 0,
            });
        }

        if settings.is_paused(today)? {
            stats_store.set_last_outreach_date(today)?;
            return Ok(StreakUpdate {
                current: stats.current_outreach_streak_days,
                longest: stats.longest_outreach_streak_days,
                extended: false,
                bonus_xp: 0,
                bonus_tokens: 0,
            });
        }

        let yesterday = today - Duration::days(1);
        let current = if stats.last_outreach_date == Some(yesterday) {
            stats.current_outreach_streak_days + 1
        } else {
            1
        };
        let longest = stats.longest_outreach_streak_days.max(current);
        stats_store.set_streak(current, longest, Some(today))?;

        let mut bonus_xp = 0;
        let mut bonus_tokens = 0;
        for (days, xp) in STREAK_XP_BONUSES {
            if current == days {
                let key = format!("streak_xp_{days}");
                let award = stats_store.add_xp(xp, "streak_bonus", Some(&key), now)?;
                bonus_xp += award.amount;
            }
        }
        let ledger = TokenLedger::new(self.conn);
        for (days, tokens) in STREAK_TOKEN_BONUSES {
            if current == days {
                let key = format!("streak_tokens_{days}");
                bonus_tokens += ledger.add_tokens(tokens, "streak_bonus", Some(&key), now)?;
            }
        }

        if bonus_xp > 0 || bonus_tokens > 0 {
            info!(current, bonus_xp, bonus_tokens, "streak milestone");
        }
        Ok(StreakUpdate {
            current,
            longest,
            extended: true,
            bonus_xp,
            bonus_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_now() -> DateTime<FixedOffset> {
        Utc::now().fixed_offset()
    }

    #[test]
    fn test_increment_and_same_day_noop() {
        let db = Database::open_in_memory().unwrap();
        let tracker = StreakTracker::new(db.connection());
        let now = test_now();

        let update = tracker.update(date(2026, 8, 10), now).unwrap();
        assert_eq!(update.current, 1);
        assert!(update.extended);

        let update = tracker.update(date(2026, 8, 10), now).unwrap();
        assert_eq!(update.current, 1);
        assert!(!update.extended);

        let update = tracker.update(date(2026, 8, 11), now).unwrap();
        assert_eq!(update.current, 2);
    }

    #[test]
    fn test_gap_resets() {
        let db = Database::open_in_memory().unwrap();
        let tracker = StreakTracker::new(db.connection());
        let now = test_now();

        tracker.update(date(2026, 8, 10), now).unwrap();
        tracker.update(date(2026, 8, 11), now).unwrap();
        let update = tracker.update(date(2026, 8, 14), now).unwrap();
        assert_eq!(update.current, 1);
        assert_eq!(update.longest, 2);
    }

    #[test]
    fn test_pause_freezes_streak() {
        let db = Database::open_in_memory().unwrap();
        let tracker = StreakTracker::new(db.connection());
        let settings = SettingsStore::new(db.connection());
        let now = test_now();

        tracker.update(date(2026, 8, 10), now).unwrap();
        tracker.update(date(2026, 8, 11), now).unwrap();

        settings
            .set_pause(date(2026, 8, 12), date(2026, 8, 13), None)
            .unwrap();
        let update = tracker.update(date(2026, 8, 12), now).unwrap();
        assert_eq!(update.current, 2);
        assert!(!update.extended);

        // first touch after the pause continues from the frozen count
        let update = tracker.update(date(2026, 8, 14), now).unwrap();
        assert_eq!(update.current, 3);
    }

    #[test]
    fn test_milestone_bonuses_once() {
        let db = Database::open_in_memory().unwrap();
        let tracker = StreakTracker::new(db.connection());
        let now = test_now();

        let mut day = date(2026, 8, 1);
        let mut three_day_bonus = 0;
        for _ in 0..3 {
            three_day_bonus = tracker.update(day, now).unwrap().bonus_tokens;
            day += Duration::days(1);
        }
        assert_eq!(three_day_bonus, 2);

        // break the streak and rebuild: the 3-day bonus is lifetime-one-time
        day += Duration::days(3);
        let mut rebuilt_bonus = 0;
        for _ in 0..3 {
            rebuilt_bonus = tracker.update(day, now).unwrap().bonus_tokens;
            day += Duration::days(1);
        }
        assert_eq!(rebuilt_bonus, 0);
    }

    #[test]
    fn test_ten_day_xp_bonus() {
        let db = Database::open_in_memory().unwrap();
        let tracker = StreakTracker::new(db.connection());
        let now = test_now();

        let mut day = date(2026, 8, 1);
        let mut last = None;
        for _ in 0..10 {
            last = Some(tracker.update(day, now).unwrap());
            day += Duration::days(1);
        }
        let update = last.unwrap();
        assert_eq!(update.current, 10);
        assert_eq!(update.bonus_xp, 50);
    }
}
