//! Level, milestone, and revenue reward unlocking plus claims.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::cache::{TtlCache, KEY_LIFETIME_REVENUE};
use crate::clock::parse_datetime;
use crate::gamification::types::{
    LevelReward, MilestoneReward, RevenueReward, RewardKind, UnlockedReward,
};
use crate::gamification::EngineError;
use crate::storage::CrmStore;

/// Manages reward catalogs, unlock checks, and claims.
pub struct RewardManager<'a> {
    conn: &'a Connection,
}

impl<'a> RewardManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Seed the default reward catalogs. Idempotent.
    pub fn seed_defaults(&self) -> Result<(), EngineError> {
        for (interval, text) in [
            (2, "Bag of favourite lollies"),
            (5, "Small treat of your choice"),
            (10, "Full free day or special reward"),
        ] {
            self.conn.execute(
                "INSERT OR IGNORE INTO level_rewards (level_interval, reward_text) VALUES (?1, ?2)",
                params![interval, text],
            )?;
        }
        for (level, text) in [
            (10, "Take yourself out for sushi"),
            (25, "Buy a small gift for yourself"),
            (50, "Weekend getaway fund contribution"),
        ] {
            self.conn.execute(
                "INSERT OR IGNORE INTO milestone_rewards (target_level, reward_text) VALUES (?1, ?2)",
                params![level, text],
            )?;
        }
        for (revenue, text, icon) in [
            (1000.0, "Nice dinner out", "utensils"),
            (2500.0, "New pair of sneakers", "shoe"),
            (5000.0, "Weekend spa day", "spa"),
            (10000.0, "New tech gadget", "laptop"),
            (15000.0, "Designer item", "star"),
            (25000.0, "Weekend getaway trip", "plane"),
            (50000.0, "Luxury watch", "watch"),
            (75000.0, "High-end home upgrade", "home"),
            (100000.0, "Dream vacation package", "globe"),
            (150000.0, "Investment portfolio contribution", "chart"),
            (200000.0, "Luxury experience of choice", "crown"),
            (250000.0, "Major life upgrade fund", "rocket"),
            (300000.0, "McLaren MP4-12C Spider", "car"),
        ] {
            self.conn.execute(
                "INSERT OR IGNORE INTO revenue_rewards (target_revenue, reward_text, reward_icon)
                 VALUES (?1, ?2, ?3)",
                params![revenue, text, icon],
            )?;
        }
        for (name, cost, description) in [
            ("Bag of favourite lollies", 8, "Treat yourself to your favourite sweets"),
            ("Coffee or drink", 10, "A nice coffee or beverage of your choice"),
            ("1 hour guilt-free gaming", 12, "Take a break and play your favourite game"),
            ("Nice lunch treat", 20, "Enjoy a nice lunch out"),
            ("Car care item", 50, "Something nice for your car"),
            ("T-shirt", 75, "Buy yourself a new t-shirt"),
        ] {
            self.conn.execute(
                "INSERT OR IGNORE INTO reward_items (name, cost, description) VALUES (?1, ?2, ?3)",
                params![name, cost, description],
            )?;
        }
        Ok(())
    }

    /// Unlock interval rewards for the level just reached.
    ///
    /// Fires at every multiple of each active interval; the unique triple on
    /// `unlocked_rewards` makes repeat checks no-ops.
    pub fn check_level_rewards(
        &self,
        level: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<UnlockedReward>, EngineError> {
        let mut unlocked = Vec::new();
        let rewards = self.list_level_rewards()?;
        for reward in rewards {
            if !reward.is_active || reward.level_interval <= 0 || level % reward.level_interval != 0
            {
                continue;
            }
            let inserted = self.conn.execute(
                "INSERT OR IGNORE INTO unlocked_rewards
                 (reward_type, reward_reference_id, level_achieved, reward_text, unlocked_at)
                 VALUES ('level', ?1, ?2, ?3, ?4)",
                params![reward.id, level, reward.reward_text, now.to_rfc3339()],
            )?;
            if inserted > 0 {
                info!(level, reward = %reward.reward_text, "level reward unlocked");
                unlocked.push(self.last_unlocked()?);
            }
        }
        Ok(unlocked)
    }

    /// Unlock milestone rewards at or below the level just reached.
    pub fn check_milestone_rewards(
        &self,
        level: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<UnlockedReward>, EngineError> {
        let mut unlocked = Vec::new();
        let milestones = self.list_milestone_rewards()?;
        for milestone in milestones {
            if !milestone.is_active
                || milestone.unlocked_at.is_some()
                || milestone.target_level > level
            {
                continue;
            }
            let inserted = self.conn.execute(
                "INSERT OR IGNORE INTO unlocked_rewards
                 (reward_type, reward_reference_id, level_achieved, reward_text, unlocked_at)
                 VALUES ('milestone', ?1, ?2, ?3, ?4)",
                params![
                    milestone.id,
                    milestone.target_level,
                    milestone.reward_text,
                    now.to_rfc3339()
                ],
            )?;
            if inserted > 0 {
                self.conn.execute(
                    "UPDATE milestone_rewards SET unlocked_at = ?1 WHERE id = ?2",
                    params![now.to_rfc3339(), milestone.id],
                )?;
                info!(level = milestone.target_level, reward = %milestone.reward_text,
                      "milestone reward unlocked");
                unlocked.push(self.last_unlocked()?);
            }
        }
        Ok(unlocked)
    }

    /// Lifetime revenue: one-off client charges plus accrued recurring fees
    /// plus freelance income, cached behind a short TTL.
    pub fn lifetime_revenue(
        &self,
        cache: &TtlCache<f64>,
        today: NaiveDate,
    ) -> Result<f64, EngineError> {
        if let Some(cached) = cache.get(KEY_LIFETIME_REVENUE) {
            return Ok(cached);
        }
        let crm = CrmStore::new(self.conn);
        let total = crm.total_one_off_revenue()?
            + crm.recurring_revenue_to_date(today)?
            + crm.freelance_income_total()?;
        cache.set(KEY_LIFETIME_REVENUE, total);
        Ok(total)
    }

    /// Unlock revenue rewards whose threshold the lifetime total has met.
    pub fn check_revenue_rewards(
        &self,
        cache: &TtlCache<f64>,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<RevenueReward>, EngineError> {
        let revenue = self.lifetime_revenue(cache, today)?;
        let mut unlocked = Vec::new();
        for reward in self.list_revenue_rewards()? {
            if !reward.is_active
                || reward.unlocked_at.is_some()
                || reward.target_revenue > revenue
            {
                continue;
            }
            self.conn.execute(
                "UPDATE revenue_rewards SET unlocked_at = ?1 WHERE id = ?2 AND unlocked_at IS NULL",
                params![now.to_rfc3339(), reward.id],
            )?;
            info!(target = reward.target_revenue, reward = %reward.reward_text,
                  "revenue reward unlocked");
            unlocked.push(RevenueReward {
                unlocked_at: Some(now),
                ..reward
            });
        }
        Ok(unlocked)
    }

    /// Claim an unlocked reward. Errors if it does not exist or was already
    /// claimed; a claimed milestone also marks its catalog row.
    pub fn claim_unlocked(
        &self,
        id: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<UnlockedReward, EngineError> {
        let reward = self.get_unlocked(id)?.ok_or(EngineError::NotUnlocked(id))?;
        if reward.claimed_at.is_some() {
            return Err(EngineError::AlreadyClaimed(id));
        }
        self.conn.execute(
            "UPDATE unlocked_rewards SET claimed_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id],
        )?;
        if reward.reward_type == RewardKind::Milestone {
            self.conn.execute(
                "UPDATE milestone_rewards SET claimed_at = ?1 WHERE id = ?2",
                params![now.to_rfc3339(), reward.reward_reference_id],
            )?;
        }
        Ok(UnlockedReward {
            claimed_at: Some(now),
            ..reward
        })
    }

    /// Claim a revenue reward. Requires a prior unlock; fails on double claim.
    pub fn claim_revenue(
        &self,
        id: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<RevenueReward, EngineError> {
        let reward = self
            .get_revenue_reward(id)?
            .ok_or(EngineError::NotUnlocked(id))?;
        if reward.unlocked_at.is_none() {
            return Err(EngineError::NotUnlocked(id));
        }
        if reward.claimed_at.is_some() {
            return Err(EngineError::AlreadyClaimed(id));
        }
        self.conn.execute(
            "UPDATE revenue_rewards SET claimed_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id],
        )?;
        Ok(RevenueReward {
            claimed_at: Some(now),
            ..reward
        })
    }

    /// Unlocked-but-unclaimed rewards, oldest first.
    pub fn unclaimed(&self) -> Result<Vec<UnlockedReward>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, reward_type, reward_reference_id, level_achieved, reward_text,
                    unlocked_at, claimed_at
             FROM unlocked_rewards WHERE claimed_at IS NULL ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], parse_unlocked_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }

    pub fn list_level_rewards(&self) -> Result<Vec<LevelReward>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, level_interval, reward_text, is_active
             FROM level_rewards ORDER BY level_interval ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LevelReward {
                id: row.get(0)?,
                level_interval: row.get(1)?,
                reward_text: row.get(2)?,
                is_active: row.get::<_, i64>(3)? != 0,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }

    pub fn list_milestone_rewards(&self) -> Result<Vec<MilestoneReward>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, target_level, reward_text, is_active, unlocked_at, claimed_at
             FROM milestone_rewards ORDER BY target_level ASC",
        )?;
        let rows = stmt.query_map([], parse_milestone_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }

    pub fn list_revenue_rewards(&self) -> Result<Vec<RevenueReward>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, target_revenue, reward_text, reward_icon, is_active,
                    unlocked_at, claimed_at
             FROM revenue_rewards ORDER BY target_revenue ASC",
        )?;
        let rows = stmt.query_map([], parse_revenue_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }

    fn get_unlocked(&self, id: i64) -> Result<Option<UnlockedReward>, EngineError> {
        self.conn
            .query_row(
                "SELECT id, reward_type, reward_reference_id, level_achieved, reward_text,
                        unlocked_at, claimed_at
                 FROM unlocked_rewards WHERE id = ?1",
                params![id],
                parse_unlocked_row,
            )
            .optional()
            .map_err(EngineError::from)
    }

    fn get_revenue_reward(&self, id: i64) -> Result<Option<RevenueReward>, EngineError> {
        self.conn
            .query_row(
                "SELECT id, target_revenue, reward_text, reward_icon, is_active,
                        unlocked_at, claimed_at
                 FROM revenue_rewards WHERE id = ?1",
                params![id],
                parse_revenue_row,
            )
            .optional()
            .map_err(EngineError::from)
    }

    fn last_unlocked(&self) -> Result<UnlockedReward, EngineError> {
        let id = self.conn.last_insert_rowid();
        self.get_unlocked(id)?.ok_or(EngineError::NotUnlocked(id))
    }
}

fn parse_unlocked_row(row: &rusqlite::Row) -> rusqlite::Result<UnlockedReward> {
    let type_str: String = row.get(1)?;
    let unlocked_str: String = row.get(5)?;
    let claimed_str: Option<String> = row.get(6)?;
    Ok(UnlockedReward {
        id: row.get(0)?,
        reward_type: RewardKind::parse(&type_str),
        reward_reference_id: row.get(2)?,
        level_achieved: row.get(3)?,
        reward_text: row.get(4)?,
        unlocked_at: parse_datetime(&unlocked_str)
            .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
        claimed_at: claimed_str.as_deref().and_then(parse_datetime),
    })
}

fn parse_milestone_row(row: &rusqlite::Row) -> rusqlite::Result<MilestoneReward> {
    let unlocked_str: Option<String> = row.get(4)?;
    let claimed_str: Option<String> = row.get(5)?;
    Ok(MilestoneReward {
        id: row.get(0)?,
        target_level: row.get(1)?,
        reward_text: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
        unlocked_at: unlocked_str.as_deref().and_then(parse_datetime),
        claimed_at: claimed_str.as_deref().and_then(parse_datetime),
    })
}

fn parse_revenue_row(row: &rusqlite::Row) -> rusqlite::Result<RevenueReward> {
    let unlocked_str: Option<String> = row.get(5)?;
    let claimed_str: Option<String> = row.get(6)?;
    Ok(RevenueReward {
        id: row.get(0)?,
        target_revenue: row.get(1)?,
        reward_text: row.get(2)?,
        reward_icon: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        unlocked_at: unlocked_str.as_deref().and_then(parse_datetime),
        claimed_at: claimed_str.as_deref().and_then(parse_datetime),
    })
}
