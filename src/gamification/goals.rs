//! Goal targets, recommendations, and once-per-period completion bonuses.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::clock::{month_key, start_of_month, start_of_week};
use crate::gamification::stats::StatsStore;
use crate::gamification::tokens::TokenLedger;
use crate::gamification::types::{Goal, GoalType};
use crate::gamification::EngineError;
use crate::storage::CrmStore;

/// Manages goal rows and evaluates period completion.
pub struct GoalManager<'a> {
    conn: &'a Connection,
}

impl<'a> GoalManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Recommended target from trailing averages.
    pub fn recommended_target(
        &self,
        goal_type: GoalType,
        today: NaiveDate,
    ) -> Result<i64, EngineError> {
        let crm = CrmStore::new(self.conn);
        let target = match goal_type {
            GoalType::DailyOutreach => {
                let total = crm.outreach_count_since(today - Duration::days(30))?;
                (total / 30 + 1).max(1)
            }
            GoalType::WeeklyOutreach => {
                let total = crm.outreach_count_since(today - Duration::weeks(8))?;
                (total / 8 + 1).max(5)
            }
            GoalType::MonthlyRevenue => {
                let total = crm.client_revenue_since(today - Duration::days(90))?;
                (total as i64 / 3 + 100).max(100)
            }
            GoalType::MonthlyDeals => {
                let total = crm.won_deals_since(today - Duration::days(90))?;
                (total / 3 + 1).max(1)
            }
        };
        Ok(target)
    }

    /// Fetch the goal for a period, creating it with the recommended target.
    ///
    /// Non-manual goals track the recommendation on every fetch.
    pub fn get_or_create(
        &self,
        goal_type: GoalType,
        period: &str,
        today: NaiveDate,
    ) -> Result<Goal, EngineError> {
        let existing = self.get(goal_type, period)?;
        let recommended = self.recommended_target(goal_type, today)?;
        match existing {
            Some(goal) if goal.is_manual => Ok(goal),
            Some(mut goal) => {
                if goal.target_value != recommended {
                    self.conn.execute(
                        "UPDATE goals SET target_value = ?1 WHERE id = ?2",
                        params![recommended, goal.id],
                    )?;
                    goal.target_value = recommended;
                }
                Ok(goal)
            }
            None => {
                self.conn.execute(
                    "INSERT INTO goals (goal_type, period, target_value, is_manual)
                     VALUES (?1, ?2, ?3, 0)",
                    params![goal_type.as_str(), period, recommended],
                )?;
                Ok(Goal {
                    id: self.conn.last_insert_rowid(),
                    goal_type,
                    period: period.to_string(),
                    target_value: recommended,
                    is_manual: false,
                })
            }
        }
    }

    fn get(&self, goal_type: GoalType, period: &str) -> Result<Option<Goal>, EngineError> {
        self.conn
            .query_row(
                "SELECT id, goal_type, period, target_value, is_manual
                 FROM goals WHERE goal_type = ?1 AND period = ?2",
                params![goal_type.as_str(), period],
                |row| {
                    let type_str: String = row.get(1)?;
                    Ok(Goal {
                        id: row.get(0)?,
                        goal_type: GoalType::parse(&type_str).unwrap_or(goal_type),
                        period: row.get(2)?,
                        target_value: row.get(3)?,
                        is_manual: row.get::<_, i64>(4)? != 0,
                    })
                },
            )
            .optional()
            .map_err(EngineError::from)
    }

    /// Pin a target the recommendation must not overwrite.
    pub fn set_manual_target(
        &self,
        goal_type: GoalType,
        period: &str,
        target_value: i64,
    ) -> Result<(), EngineError> {
        self.conn.execute(
            "INSERT INTO goals (goal_type, period, target_value, is_manual)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(goal_type, period)
             DO UPDATE SET target_value = ?3, is_manual = 1",
            params![goal_type.as_str(), period, target_value],
        )?;
        Ok(())
    }

    /// Evaluate the daily outreach goal; bonus once per date.
    pub fn check_daily_goal(
        &self,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<bool, EngineError> {
        let goal = self.get_or_create(GoalType::DailyOutreach, &today.to_string(), today)?;
        if goal.target_value <= 0 {
            return Ok(false);
        }
        let actual = CrmStore::new(self.conn).outreach_count_on(today)?;
        if actual < goal.target_value {
            return Ok(false);
        }
        self.award(GoalType::DailyOutreach, &format!("daily_goal:{today}"), now)
    }

    /// Evaluate the weekly outreach goal; bonus once per ISO week.
    pub fn check_weekly_goal(
        &self,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<bool, EngineError> {
        let week_start = start_of_week(today);
        let goal =
            self.get_or_create(GoalType::WeeklyOutreach, &week_start.to_string(), today)?;
        if goal.target_value <= 0 {
            return Ok(false);
        }
        let actual = CrmStore::new(self.conn).outreach_count_since(week_start)?;
        if actual < goal.target_value {
            return Ok(false);
        }
        self.award(GoalType::WeeklyOutreach, &format!("weekly_goal:{week_start}"), now)
    }

    /// Evaluate the monthly revenue goal; bonus once per month.
    pub fn check_monthly_revenue_goal(
        &self,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<bool, EngineError> {
        let month = month_key(today);
        let goal = self.get_or_create(GoalType::MonthlyRevenue, &month, today)?;
        if goal.target_value <= 0 {
            return Ok(false);
        }
        let actual = CrmStore::new(self.conn).client_revenue_since(start_of_month(today))?;
        if (actual as i64) < goal.target_value {
            return Ok(false);
        }
        self.award(GoalType::MonthlyRevenue, &format!("monthly_revenue_goal:{month}"), now)
    }

    /// Evaluate the monthly won-deals goal; bonus once per month.
    pub fn check_monthly_deals_goal(
        &self,
        today: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<bool, EngineError> {
        let month = month_key(today);
        let goal = self.get_or_create(GoalType::MonthlyDeals, &month, today)?;
        if goal.target_value <= 0 {
            return Ok(false);
        }
        let actual = CrmStore::new(self.conn).won_deals_since(start_of_month(today))?;
        if actual < goal.target_value {
            return Ok(false);
        }
        self.award(GoalType::MonthlyDeals, &format!("monthly_deals_goal:{month}"), now)
    }

    fn award(
        &self,
        goal_type: GoalType,
        bonus_key: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<bool, EngineError> {
        let stats = StatsStore::new(self.conn);
        let granted = stats
            .add_xp(goal_type.xp_bonus(), "goal_bonus", Some(bonus_key), now)?
            .amount
            > 0;
        if granted {
            TokenLedger::new(self.conn).add_tokens(
                goal_type.token_bonus(),
                "goal_bonus",
                Some(bonus_key),
                now,
            )?;
            info!(goal = %goal_type, key = bonus_key, "goal hit");
        }
        Ok(granted)
    }
}
