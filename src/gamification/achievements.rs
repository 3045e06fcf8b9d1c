//! Static achievement catalog, unlocked monotonically from aggregate counts.

use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection};
use tracing::info;

use crate::clock::parse_datetime;
use crate::gamification::stats::StatsStore;
use crate::gamification::types::Achievement;
use crate::gamification::EngineError;
use crate::storage::CrmStore;

/// Manages the achievement catalog.
pub struct AchievementTracker<'a> {
    conn: &'a Connection,
}

impl<'a> AchievementTracker<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Seed the default catalog. Idempotent.
    pub fn seed_defaults(&self) -> Result<(), EngineError> {
        for (key, name, description) in [
            ("streak_7", "Week Warrior", "Maintain a 7-day outreach streak"),
            ("streak_30", "Consistency King", "Maintain a 30-day outreach streak"),
            ("xp_1000", "Rising Star", "Earn 1,000 XP"),
            ("xp_5000", "Power Player", "Earn 5,000 XP"),
            ("outreach_100", "Outreach Machine", "Log 100 outreach activities"),
            ("deals_10", "Deal Closer", "Close 10 deals"),
        ] {
            self.conn.execute(
                "INSERT OR IGNORE INTO achievements (key, name, description) VALUES (?1, ?2, ?3)",
                params![key, name, description],
            )?;
        }
        Ok(())
    }

    /// Unlock any achievement whose condition is now met; never reverts.
    ///
    /// Returns the keys newly unlocked by this check.
    pub fn check_and_unlock(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<String>, EngineError> {
        let stats = StatsStore::new(self.conn).get_or_create(now)?;
        let crm = CrmStore::new(self.conn);
        let total_outreach = crm.total_outreach()?;
        let total_deals = crm.total_won_deals()?;

        let mut unlocked = Vec::new();
        for achievement in self.list()? {
            if achievement.is_unlocked() {
                continue;
            }
            let met = match achievement.key.as_str() {
                "streak_7" => stats.current_outreach_streak_days >= 7,
                "streak_30" => stats.current_outreach_streak_days >= 30,
                "xp_1000" => stats.current_xp >= 1000,
                "xp_5000" => stats.current_xp >= 5000,
                "outreach_100" => total_outreach >= 100,
                "deals_10" => total_deals >= 10,
                _ => false,
            };
            if met {
                self.conn.execute(
                    "UPDATE achievements SET unlocked_at = ?1
                     WHERE key = ?2 AND unlocked_at IS NULL",
                    params![now.to_rfc3339(), achievement.key],
                )?;
                info!(key = %achievement.key, "achievement unlocked");
                unlocked.push(achievement.key);
            }
        }
        Ok(unlocked)
    }

    /// Full catalog in seeded order.
    pub fn list(&self) -> Result<Vec<Achievement>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, key, name, description, unlocked_at FROM achievements ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let unlocked_str: Option<String> = row.get(4)?;
            Ok(Achievement {
                id: row.get(0)?,
                key: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                unlocked_at: unlocked_str.as_deref().and_then(parse_datetime),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }
}
