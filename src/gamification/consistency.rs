//! Weekly consistency score.
//!
//! Mean of three trailing-7-day percentages: outreach against the daily goal,
//! follow-ups contacted against follow-ups due, tasks done against tasks due.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rusqlite::Connection;

use crate::gamification::goals::GoalManager;
use crate::gamification::stats::StatsStore;
use crate::gamification::types::GoalType;
use crate::gamification::EngineError;
use crate::storage::CrmStore;

/// Fallback daily outreach target when no goal data exists.
const DEFAULT_DAILY_TARGET: i64 = 3;

/// Breakdown of the consistency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub score: i64,
    pub outreach_pct: i64,
    pub followup_pct: i64,
    pub task_pct: i64,
    pub outreach_count: i64,
    pub outreach_goal: i64,
    pub tasks_done: i64,
    pub tasks_due: i64,
}

/// Compute the score over the trailing 7 days and cache it on the stats row.
pub fn calculate(
    conn: &Connection,
    today: NaiveDate,
    now: DateTime<FixedOffset>,
) -> Result<ConsistencyReport, EngineError> {
    let week_ago = today - Duration::days(7);
    let crm = CrmStore::new(conn);

    let mut daily_target =
        GoalManager::new(conn).recommended_target(GoalType::DailyOutreach, today)?;
    if daily_target <= 0 {
        daily_target = DEFAULT_DAILY_TARGET;
    }

    let outreach_count = crm.outreach_count_since(week_ago)?;
    let outreach_goal = daily_target * 7;
    let outreach_pct = if outreach_goal > 0 {
        (outreach_count * 100 / outreach_goal).min(100)
    } else {
        0
    };

    let followups_due = crm.leads_with_followup_between(week_ago, today)?;
    let leads_contacted = crm.leads_contacted_since(week_ago)?;
    let followup_pct = (leads_contacted * 100 / followups_due.max(1)).min(100);

    let (tasks_due, tasks_done) = crm.tasks_due_between(week_ago, today)?;
    let task_pct = (tasks_done * 100 / tasks_due.max(1)).min(100);

    let score = (outreach_pct + followup_pct + task_pct) / 3;

    let stats = StatsStore::new(conn);
    stats.get_or_create(now)?;
    stats.set_consistency(score, now)?;

    Ok(ConsistencyReport {
        score,
        outreach_pct,
        followup_pct,
        task_pct,
        outreach_count,
        outreach_goal,
        tasks_done,
        tasks_due,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::types::{OutreachOutcome, OutreachType, TaskStatus};
    use crate::storage::Database;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_week_scores_zero_outreach() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now().fixed_offset();
        let report = calculate(db.connection(), date(2026, 8, 21), now).unwrap();

        assert_eq!(report.outreach_pct, 0);
        // a week with nothing logged and nothing due scores zero across the board
        assert_eq!(report.followup_pct, 0);
        assert_eq!(report.task_pct, 0);
        assert_eq!(report.score, 0);
    }

    #[test]
    fn test_full_week_scores_high() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now().fixed_offset();
        let today = date(2026, 8, 21);
        let crm = CrmStore::new(db.connection());

        // 3 touches a day for the trailing week covers the default target
        for offset in 0..7 {
            for _ in 0..3 {
                crm.insert_outreach(
                    today - Duration::days(offset),
                    OutreachType::Email,
                    OutreachOutcome::Contacted,
                    None,
                    None,
                    now,
                )
                .unwrap();
            }
        }
        let task = crm
            .insert_task("Invoice", None, Some(today), None, None, now)
            .unwrap();
        crm.set_task_status(task, TaskStatus::Done).unwrap();

        let report = calculate(db.connection(), today, now).unwrap();
        assert_eq!(report.outreach_pct, 100);
        assert_eq!(report.task_pct, 100);
        assert!(report.score >= 66);

        // score was cached on the stats row
        let stats = StatsStore::new(db.connection()).get_or_create(now).unwrap();
        assert_eq!(stats.last_consistency_score, Some(report.score));
    }
}
