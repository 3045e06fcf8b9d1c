//! Daily missions and the monthly boss battle.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::clock::{is_weekday, parse_date};
use crate::gamification::tokens::TokenLedger;
use crate::gamification::types::{BossBattle, BossType, DailyMission, MissionType};
use crate::gamification::EngineError;

/// Manages daily missions and monthly boss battles.
pub struct MissionManager<'a> {
    conn: &'a Connection,
}

impl<'a> MissionManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Today's mission, lazily created. Weekends have none.
    pub fn current_mission(
        &self,
        today: NaiveDate,
    ) -> Result<Option<DailyMission>, EngineError> {
        if !is_weekday(today) {
            return Ok(None);
        }
        if let Some(mission) = self.get_mission(today)? {
            return Ok(Some(mission));
        }
        let mut rng = rand::rng();
        let mission_type = match rng.random_range(0..3) {
            0 => MissionType::Outreach,
            1 => MissionType::Tasks,
            _ => MissionType::FollowUps,
        };
        self.create_for_date(today, mission_type).map(Some)
    }

    /// Create the mission row for a date with a rolled target.
    pub fn create_for_date(
        &self,
        date: NaiveDate,
        mission_type: MissionType,
    ) -> Result<DailyMission, EngineError> {
        let mut rng = rand::rng();
        let (target, tokens, description) = match mission_type {
            MissionType::Outreach => (
                rng.random_range(3..=5),
                5,
                "Complete outreach activities today",
            ),
            MissionType::Tasks => (
                rng.random_range(2..=4),
                4,
                "Complete tasks from your task list",
            ),
            MissionType::FollowUps => (rng.random_range(1..=3), 3, "Follow up with leads"),
        };
        self.conn.execute(
            "INSERT OR IGNORE INTO daily_missions
             (mission_date, mission_type, description, target_count, reward_tokens)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                date.to_string(),
                mission_type.as_str(),
                description,
                target,
                tokens
            ],
        )?;
        self.get_mission(date)?
            .ok_or(EngineError::MissingSingleton("daily_missions"))
    }

    fn get_mission(&self, date: NaiveDate) -> Result<Option<DailyMission>, EngineError> {
        self.conn
            .query_row(
                "SELECT id, mission_date, mission_type, description, target_count,
                        progress_count, reward_tokens, is_completed
                 FROM daily_missions WHERE mission_date = ?1",
                params![date.to_string()],
                parse_mission_row,
            )
            .optional()
            .map_err(EngineError::from)
    }

    /// Advance today's mission when its type matches.
    ///
    /// Completion is terminal and grants the token reward exactly once.
    pub fn update_mission_progress(
        &self,
        mission_type: MissionType,
        count: i64,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<Option<DailyMission>, EngineError> {
        let Some(mission) = self.current_mission(today)? else {
            return Ok(None);
        };
        if mission.mission_type != mission_type || mission.is_completed {
            return Ok(Some(mission));
        }
        let progress = mission.progress_count + count;
        let completed = mission.target_count > 0 && progress >= mission.target_count;
        self.conn.execute(
            "UPDATE daily_missions SET progress_count = ?1, is_completed = ?2 WHERE id = ?3",
            params![progress, completed as i64, mission.id],
        )?;
        if completed {
            let key = format!("mission:{}", mission.mission_date);
            TokenLedger::new(self.conn).add_tokens(
                mission.reward_tokens,
                "daily_mission",
                Some(&key),
                now,
            )?;
            info!(date = %mission.mission_date, tokens = mission.reward_tokens,
                  "daily mission completed");
        }
        self.get_mission(today)
    }

    /// This month's boss battle, lazily created.
    pub fn current_battle(&self, month: &str) -> Result<BossBattle, EngineError> {
        if let Some(battle) = self.get_battle(month)? {
            return Ok(battle);
        }
        let mut rng = rand::rng();
        let (boss_type, target, desc) = if rng.random_range(0..2) == 0 {
            (
                BossType::Outreach,
                rng.random_range(40..=60),
                "Monthly Challenge: Complete outreach activities",
            )
        } else {
            (
                BossType::ReviveLeads,
                rng.random_range(5..=10),
                "Monthly Challenge: Revive cold leads",
            )
        };
        self.conn.execute(
            "INSERT OR IGNORE INTO boss_fights
             (month, boss_type, description, target_value, reward_tokens)
             VALUES (?1, ?2, ?3, ?4, 50)",
            params![month, boss_type.as_str(), desc, target],
        )?;
        self.get_battle(month)?
            .ok_or(EngineError::MissingSingleton("boss_fights"))
    }

    /// Create the battle row for a month with a rolled target.
    pub fn create_battle_for_month(
        &self,
        month: &str,
        boss_type: BossType,
    ) -> Result<BossBattle, EngineError> {
        let mut rng = rand::rng();
        let (target, desc) = match boss_type {
            BossType::Outreach => (
                rng.random_range(40..=60),
                "Monthly Challenge: Complete outreach activities",
            ),
            BossType::ReviveLeads => (
                rng.random_range(5..=10),
                "Monthly Challenge: Revive cold leads",
            ),
        };
        self.conn.execute(
            "INSERT OR IGNORE INTO boss_fights
             (month, boss_type, description, target_value, reward_tokens)
             VALUES (?1, ?2, ?3, ?4, 50)",
            params![month, boss_type.as_str(), desc, target],
        )?;
        self.get_battle(month)?
            .ok_or(EngineError::MissingSingleton("boss_fights"))
    }

    fn get_battle(&self, month: &str) -> Result<Option<BossBattle>, EngineError> {
        self.conn
            .query_row(
                "SELECT id, month, boss_type, description, target_value,
                        progress_value, reward_tokens, is_completed
                 FROM boss_fights WHERE month = ?1",
                params![month],
                parse_battle_row,
            )
            .optional()
            .map_err(EngineError::from)
    }

    /// Advance this month's battle when its type matches.
    ///
    /// Completion is terminal and grants the token reward exactly once.
    pub fn update_boss_progress(
        &self,
        boss_type: BossType,
        increment: i64,
        month: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<BossBattle, EngineError> {
        let battle = self.current_battle(month)?;
        if battle.boss_type != boss_type || battle.is_completed {
            return Ok(battle);
        }
        let progress = battle.progress_value + increment;
        let completed = battle.target_value > 0 && progress >= battle.target_value;
        self.conn.execute(
            "UPDATE boss_fights SET progress_value = ?1, is_completed = ?2 WHERE id = ?3",
            params![progress, completed as i64, battle.id],
        )?;
        if completed {
            let key = format!("boss:{month}");
            TokenLedger::new(self.conn).add_tokens(
                battle.reward_tokens,
                "boss_battle",
                Some(&key),
                now,
            )?;
            info!(month, tokens = battle.reward_tokens, "boss defeated");
        }
        self.get_battle(month)?
            .ok_or(EngineError::MissingSingleton("boss_fights"))
    }

    /// Recent missions, newest first.
    pub fn recent_missions(&self, limit: i64) -> Result<Vec<DailyMission>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mission_date, mission_type, description, target_count,
                    progress_count, reward_tokens, is_completed
             FROM daily_missions ORDER BY mission_date DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], parse_mission_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }

    /// Past battles, newest month first.
    pub fn past_battles(&self, limit: i64) -> Result<Vec<BossBattle>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, month, boss_type, description, target_value,
                    progress_value, reward_tokens, is_completed
             FROM boss_fights ORDER BY month DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], parse_battle_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }
}

fn parse_mission_row(row: &rusqlite::Row) -> rusqlite::Result<DailyMission> {
    let date_str: String = row.get(1)?;
    let type_str: String = row.get(2)?;
    Ok(DailyMission {
        id: row.get(0)?,
        mission_date: parse_date(&date_str).unwrap_or_else(|| chrono::Utc::now().date_naive()),
        mission_type: MissionType::parse(&type_str),
        description: row.get(3)?,
        target_count: row.get(4)?,
        progress_count: row.get(5)?,
        reward_tokens: row.get(6)?,
        is_completed: row.get::<_, i64>(7)? != 0,
    })
}

fn parse_battle_row(row: &rusqlite::Row) -> rusqlite::Result<BossBattle> {
    let type_str: String = row.get(2)?;
    Ok(BossBattle {
        id: row.get(0)?,
        month: row.get(1)?,
        boss_type: BossType::parse(&type_str),
        description: row.get(3)?,
        target_value: row.get(4)?,
        progress_value: row.get(5)?,
        reward_tokens: row.get(6)?,
        is_completed: row.get::<_, i64>(7)? != 0,
    })
}
