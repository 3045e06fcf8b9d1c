//! Singleton user stats: XP total, level, streak fields, consistency score.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::clock::{parse_date, parse_datetime};
use crate::gamification::types::{level_for_xp, UserStats, XpLogEntry};
use crate::gamification::EngineError;

/// Store for the singleton `user_stats` row and the XP ledger.
pub struct StatsStore<'a> {
    conn: &'a Connection,
}

/// Outcome of an XP award.
#[derive(Debug, Clone, Copy)]
pub struct XpAward {
    /// Amount actually credited; zero when an idempotency key already existed.
    pub amount: i64,
    pub total_xp: i64,
    pub previous_level: u32,
    pub new_level: u32,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.previous_level
    }
}

impl<'a> StatsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Fetch the stats row, creating it on first access.
    pub fn get_or_create(&self, now: DateTime<FixedOffset>) -> Result<UserStats, EngineError> {
        if let Some(stats) = self.get()? {
            return Ok(stats);
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO user_stats (id, created_at) VALUES (1, ?1)",
            params![now.to_rfc3339()],
        )?;
        self.get()?.ok_or(EngineError::MissingSingleton("user_stats"))
    }

    fn get(&self) -> Result<Option<UserStats>, EngineError> {
        self.conn
            .query_row(
                "SELECT current_xp, current_level, current_outreach_streak_days,
                        longest_outreach_streak_days, last_outreach_date,
                        last_consistency_score, last_consistency_calculated_at, created_at
                 FROM user_stats WHERE id = 1",
                [],
                parse_stats_row,
            )
            .optional()
            .map_err(EngineError::from)
    }

    /// Credit XP and append a ledger entry atomically, recomputing the level.
    ///
    /// With a `bonus_key`, the grant is idempotent: if the key already exists
    /// in the ledger the award is a no-op and the returned amount is zero.
    pub fn add_xp(
        &self,
        amount: i64,
        reason: &str,
        bonus_key: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<XpAward, EngineError> {
        let before = self.get_or_create(now)?;

        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO xp_logs (amount, reason, bonus_key, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![amount, reason, bonus_key, now.to_rfc3339()],
        )?;
        if inserted == 0 {
            // bonus already granted
            return Ok(XpAward {
                amount: 0,
                total_xp: before.current_xp,
                previous_level: before.current_level,
                new_level: before.current_level,
            });
        }

        tx.execute(
            "UPDATE user_stats SET current_xp = current_xp + ?1 WHERE id = 1",
            params![amount],
        )?;
        let total_xp: i64 =
            tx.query_row("SELECT current_xp FROM user_stats WHERE id = 1", [], |row| {
                row.get(0)
            })?;
        let new_level = level_for_xp(total_xp);
        tx.execute(
            "UPDATE user_stats SET current_level = ?1 WHERE id = 1",
            params![new_level],
        )?;
        tx.commit()?;

        if new_level > before.current_level {
            debug!(total_xp, new_level, "level up");
        }
        Ok(XpAward {
            amount,
            total_xp,
            previous_level: before.current_level,
            new_level,
        })
    }

    /// XP totals per day for the week starting at `week_start` (Monday).
    pub fn xp_this_week(&self, week_start: NaiveDate) -> Result<[i64; 7], EngineError> {
        let mut totals = [0i64; 7];
        let mut stmt = self.conn.prepare(
            "SELECT substr(created_at, 1, 10), SUM(amount) FROM xp_logs
             WHERE substr(created_at, 1, 10) >= ?1
             GROUP BY substr(created_at, 1, 10)",
        )?;
        let rows = stmt.query_map(params![week_start.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (day_str, total) = row?;
            if let Some(day) = parse_date(&day_str) {
                let offset = (day - week_start).num_days();
                if (0..7).contains(&offset) {
                    totals[offset as usize] = total;
                }
            }
        }
        Ok(totals)
    }

    /// Sum of XP credited on dates in `[from, to]`.
    pub fn xp_gained_between(&self, from: NaiveDate, to: NaiveDate) -> Result<i64, EngineError> {
        let total: Option<i64> = self.conn.query_row(
            "SELECT SUM(amount) FROM xp_logs
             WHERE substr(created_at, 1, 10) >= ?1 AND substr(created_at, 1, 10) <= ?2",
            params![from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0))
    }

    /// Recent ledger entries, newest first.
    pub fn recent_logs(&self, limit: i64) -> Result<Vec<XpLogEntry>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, amount, reason, bonus_key, created_at
             FROM xp_logs ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let created_str: String = row.get(4)?;
            Ok(XpLogEntry {
                id: row.get(0)?,
                amount: row.get(1)?,
                reason: row.get(2)?,
                bonus_key: row.get(3)?,
                created_at: parse_datetime(&created_str)
                    .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }

    /// Persist streak fields.
    pub fn set_streak(
        &self,
        current: i64,
        longest: i64,
        last_outreach_date: Option<NaiveDate>,
    ) -> Result<(), EngineError> {
        self.conn.execute(
            "UPDATE user_stats SET current_outreach_streak_days = ?1,
                    longest_outreach_streak_days = ?2, last_outreach_date = ?3
             WHERE id = 1",
            params![current, longest, last_outreach_date.map(|d| d.to_string())],
        )?;
        Ok(())
    }

    /// Move `last_outreach_date` forward without touching the streak count.
    pub fn set_last_outreach_date(&self, date: NaiveDate) -> Result<(), EngineError> {
        self.conn.execute(
            "UPDATE user_stats SET last_outreach_date = ?1 WHERE id = 1",
            params![date.to_string()],
        )?;
        Ok(())
    }

    /// Persist a freshly computed consistency score.
    pub fn set_consistency(
        &self,
        score: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<(), EngineError> {
        self.conn.execute(
            "UPDATE user_stats SET last_consistency_score = ?1,
                    last_consistency_calculated_at = ?2
             WHERE id = 1",
            params![score, now.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Cached consistency score if it was computed within `max_age`.
    pub fn cached_consistency(
        &self,
        now: DateTime<FixedOffset>,
        max_age: Duration,
    ) -> Result<Option<i64>, EngineError> {
        let stats = self.get_or_create(now)?;
        match (stats.last_consistency_score, stats.last_consistency_calculated_at) {
            (Some(score), Some(at)) if now - at < max_age => Ok(Some(score)),
            _ => Ok(None),
        }
    }
}

fn parse_stats_row(row: &rusqlite::Row) -> rusqlite::Result<UserStats> {
    let last_date: Option<String> = row.get(4)?;
    let consistency_at: Option<String> = row.get(6)?;
    let created_str: String = row.get(7)?;
    Ok(UserStats {
        current_xp: row.get(0)?,
        current_level: row.get::<_, i64>(1)? as u32,
        current_outreach_streak_days: row.get(2)?,
        longest_outreach_streak_days: row.get(3)?,
        last_outreach_date: last_date.as_deref().and_then(parse_date),
        last_consistency_score: row.get(5)?,
        last_consistency_calculated_at: consistency_at.as_deref().and_then(parse_datetime),
        created_at: parse_datetime(&created_str)
            .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::Utc;

    fn test_now() -> DateTime<FixedOffset> {
        Utc::now().fixed_offset()
    }

    #[test]
    fn test_lazy_singleton() {
        let db = Database::open_in_memory().unwrap();
        let store = StatsStore::new(db.connection());
        let stats = store.get_or_create(test_now()).unwrap();
        assert_eq!(stats.current_xp, 0);
        assert_eq!(stats.current_level, 1);

        // second call reuses the same row
        store.get_or_create(test_now()).unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM user_stats", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_add_xp_levels_up() {
        let db = Database::open_in_memory().unwrap();
        let store = StatsStore::new(db.connection());
        let now = test_now();

        let award = store.add_xp(149, "outreach_log", None, now).unwrap();
        assert_eq!(award.new_level, 1);
        assert!(!award.leveled_up());

        let award = store.add_xp(1, "outreach_log", None, now).unwrap();
        assert_eq!(award.total_xp, 150);
        assert_eq!(award.new_level, 2);
        assert!(award.leveled_up());
    }

    #[test]
    fn test_bonus_key_grants_once() {
        let db = Database::open_in_memory().unwrap();
        let store = StatsStore::new(db.connection());
        let now = test_now();

        let first = store.add_xp(50, "streak_bonus", Some("streak_xp_10"), now).unwrap();
        assert_eq!(first.amount, 50);

        let second = store.add_xp(50, "streak_bonus", Some("streak_xp_10"), now).unwrap();
        assert_eq!(second.amount, 0);
        assert_eq!(second.total_xp, 50);

        let entries: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM xp_logs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_xp_this_week_buckets() {
        let db = Database::open_in_memory().unwrap();
        let store = StatsStore::new(db.connection());
        let monday = NaiveDate::from_ymd_opt(2026, 8, 17).unwrap();
        let offset = FixedOffset::east_opt(13 * 3600).unwrap();

        for (day, amount) in [(0i64, 5i64), (0, 3), (2, 8)] {
            let at = (monday + Duration::days(day))
                .and_hms_opt(9, 0, 0)
                .unwrap()
                .and_local_timezone(offset)
                .unwrap();
            store.add_xp(amount, "outreach_log", None, at).unwrap();
        }

        let totals = store.xp_this_week(monday).unwrap();
        assert_eq!(totals, [8, 0, 8, 0, 0, 0, 0]);
    }
}
