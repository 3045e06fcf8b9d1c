//! Gamification engine: XP, streaks, goals, rewards, missions, tokens.
//!
//! [`Engine`] is the facade the outer surfaces call. Each pipeline action
//! (outreach logged, lead moved, task done) fans out to XP and token awards,
//! streak maintenance, mission and boss progress, goal checks, and
//! achievement unlocks.

pub mod achievements;
pub mod consistency;
pub mod goals;
pub mod missions;
pub mod rewards;
pub mod rules;
pub mod stats;
pub mod streak;
pub mod tokens;
pub mod types;

pub use achievements::AchievementTracker;
pub use consistency::ConsistencyReport;
pub use goals::GoalManager;
pub use missions::MissionManager;
pub use rewards::RewardManager;
pub use rules::PipelineEvent;
pub use stats::{StatsStore, XpAward};
pub use streak::{StreakTracker, StreakUpdate};
pub use tokens::TokenLedger;
pub use types::{
    level_for_xp, xp_for_level, xp_for_next_level, Achievement, BossBattle, BossType,
    DailyMission, Goal, GoalType, LevelReward, MilestoneReward, MissionStatus, MissionType,
    RevenueReward, RewardItem, RewardKind, TokenTransaction, UnlockedReward, UserStats,
    XpLogEntry,
};

use chrono::Duration;
use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

use crate::activity::ActivityLog;
use crate::cache::{TtlCache, PREFIX_DASHBOARD};
use crate::clock::{month_key, Clock};
use crate::crm::types::{
    Lead, LeadStatus, NewClient, OutreachOutcome, OutreachType, TaskStatus,
};
use crate::settings::SettingsStore;
use crate::storage::{CrmError, CrmStore};

/// Gamification engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CRM error: {0}")]
    Crm(#[from] CrmError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Reward item not found: {0}")]
    ItemNotFound(i64),

    #[error("Reward not unlocked: {0}")]
    NotUnlocked(i64),

    #[error("Reward already claimed: {0}")]
    AlreadyClaimed(i64),

    #[error("Singleton row missing from {0}")]
    MissingSingleton(&'static str),
}

/// Outcome of recording an outreach touch.
#[derive(Debug)]
pub struct OutreachRecorded {
    pub outreach_id: i64,
    pub xp: XpAward,
    pub tokens: i64,
    pub streak: StreakUpdate,
    pub mission: Option<DailyMission>,
    pub new_achievements: Vec<String>,
}

/// Point-in-time dashboard summary.
#[derive(Debug)]
pub struct StatusSummary {
    pub stats: UserStats,
    pub token_balance: i64,
    pub mission: Option<DailyMission>,
    pub battle: BossBattle,
    pub unclaimed_rewards: usize,
    pub consistency_score: i64,
}

/// Facade over the gamification subsystems.
pub struct Engine<'a> {
    conn: &'a Connection,
    clock: &'a dyn Clock,
    cache: &'a TtlCache<f64>,
}

impl<'a> Engine<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock, cache: &'a TtlCache<f64>) -> Self {
        Self { conn, clock, cache }
    }

    /// Seed the reward and achievement catalogs. Idempotent.
    pub fn seed_defaults(&self) -> Result<(), EngineError> {
        RewardManager::new(self.conn).seed_defaults()?;
        AchievementTracker::new(self.conn).seed_defaults()
    }

    /// Log an outreach touch and run every rule it feeds.
    pub fn record_outreach(
        &self,
        outreach_type: OutreachType,
        outcome: OutreachOutcome,
        lead_id: Option<i64>,
        notes: Option<&str>,
    ) -> Result<OutreachRecorded, EngineError> {
        let now = self.clock.now();
        let today = self.clock.today();
        SettingsStore::new(self.conn).check_pause_expiry(today)?;

        let crm = CrmStore::new(self.conn);
        let outreach_id =
            crm.insert_outreach(today, outreach_type, outcome, lead_id, notes, now)?;
        if let Some(lead_id) = lead_id {
            crm.touch_lead_contacted(lead_id, now)?;
        }

        let (xp, tokens) = self.award_event(PipelineEvent::OutreachLogged)?;
        let streak = StreakTracker::new(self.conn).update(today, now)?;

        let missions = MissionManager::new(self.conn);
        let mut mission = missions.update_mission_progress(MissionType::Outreach, 1, today, now)?;
        if lead_id.is_some() {
            mission = missions.update_mission_progress(MissionType::FollowUps, 1, today, now)?;
        }
        missions.update_boss_progress(BossType::Outreach, 1, &month_key(today), now)?;

        let goal_manager = GoalManager::new(self.conn);
        goal_manager.check_daily_goal(today, now)?;
        goal_manager.check_weekly_goal(today, now)?;

        let new_achievements = AchievementTracker::new(self.conn).check_and_unlock(now)?;

        ActivityLog::new(self.conn).append(
            "outreach_logged",
            &format!("Logged {} outreach", outreach_type.as_str()),
            lead_id.map(|id| (id, "lead")),
            now,
        )?;

        Ok(OutreachRecorded {
            outreach_id,
            xp,
            tokens,
            streak,
            mission,
            new_achievements,
        })
    }

    /// Move a lead through the pipeline and award the matching event.
    pub fn record_lead_status_change(
        &self,
        lead_id: i64,
        status: LeadStatus,
    ) -> Result<Lead, EngineError> {
        let now = self.clock.now();
        let today = self.clock.today();
        let crm = CrmStore::new(self.conn);
        let lead = crm.set_lead_status(lead_id, status, now)?;

        let (event, action_type) = match status {
            LeadStatus::Contacted => (Some(PipelineEvent::LeadContacted), "lead_contacted"),
            LeadStatus::CallBooked => (Some(PipelineEvent::LeadCallBooked), "call_booked"),
            LeadStatus::ProposalSent => (Some(PipelineEvent::LeadProposalSent), "proposal_sent"),
            LeadStatus::ClosedWon => (Some(PipelineEvent::LeadClosedWon), "deal_closed_won"),
            LeadStatus::ClosedLost => (None, "deal_closed_lost"),
            _ => (None, "lead_updated"),
        };
        if let Some(event) = event {
            self.award_event(event)?;
        }
        if status == LeadStatus::Contacted {
            crm.touch_lead_contacted(lead_id, now)?;
        }
        if status == LeadStatus::ClosedWon {
            GoalManager::new(self.conn).check_monthly_deals_goal(today, now)?;
            AchievementTracker::new(self.conn).check_and_unlock(now)?;
        }

        ActivityLog::new(self.conn).append(
            action_type,
            &format!("{} moved to {}", lead.name, status.as_str()),
            Some((lead_id, "lead")),
            now,
        )?;
        Ok(lead)
    }

    /// Bring a dead lead back into the pipeline, advancing the revive boss.
    pub fn record_lead_revived(&self, lead_id: i64) -> Result<Lead, EngineError> {
        let now = self.clock.now();
        let today = self.clock.today();
        let crm = CrmStore::new(self.conn);
        let lead = crm.set_lead_status(lead_id, LeadStatus::Contacted, now)?;
        crm.touch_lead_contacted(lead_id, now)?;

        self.award_event(PipelineEvent::LeadContacted)?;
        MissionManager::new(self.conn).update_boss_progress(
            BossType::ReviveLeads,
            1,
            &month_key(today),
            now,
        )?;
        ActivityLog::new(self.conn).append(
            "lead_revived",
            &format!("Revived {}", lead.name),
            Some((lead_id, "lead")),
            now,
        )?;
        Ok(lead)
    }

    /// Complete a task and run the rules it feeds.
    pub fn record_task_done(&self, task_id: i64) -> Result<(), EngineError> {
        let now = self.clock.now();
        let today = self.clock.today();
        let crm = CrmStore::new(self.conn);
        let task = crm.get_task(task_id)?.ok_or(CrmError::TaskNotFound(task_id))?;
        if task.status == TaskStatus::Done {
            return Ok(());
        }
        crm.set_task_status(task_id, TaskStatus::Done)?;

        self.award_event(PipelineEvent::TaskDone)?;
        MissionManager::new(self.conn).update_mission_progress(
            MissionType::Tasks,
            1,
            today,
            now,
        )?;
        AchievementTracker::new(self.conn).check_and_unlock(now)?;
        ActivityLog::new(self.conn).append(
            "task_completed",
            &format!("Completed: {}", task.title),
            Some((task_id, "task")),
            now,
        )?;
        Ok(())
    }

    /// Sign a client: revenue changes, so the dashboard cache is flushed and
    /// revenue rewards plus the monthly revenue goal are re-evaluated.
    pub fn record_client_signed(&self, client: &NewClient) -> Result<i64, EngineError> {
        let now = self.clock.now();
        let today = self.clock.today();
        let id = CrmStore::new(self.conn).insert_client(client, now)?;

        self.cache.invalidate_prefix(PREFIX_DASHBOARD);
        RewardManager::new(self.conn).check_revenue_rewards(self.cache, today, now)?;
        GoalManager::new(self.conn).check_monthly_revenue_goal(today, now)?;
        ActivityLog::new(self.conn).append(
            "client_added",
            &format!("Signed {}", client.name),
            Some((id, "client")),
            now,
        )?;
        Ok(id)
    }

    /// Log freelance income and re-evaluate revenue rewards.
    pub fn record_freelance_job(
        &self,
        title: &str,
        category: &str,
        amount: f64,
    ) -> Result<i64, EngineError> {
        let now = self.clock.now();
        let today = self.clock.today();
        let id = CrmStore::new(self.conn).insert_freelance_job(
            title,
            category,
            amount,
            Some(today),
            now,
        )?;
        self.cache.invalidate_prefix(PREFIX_DASHBOARD);
        RewardManager::new(self.conn).check_revenue_rewards(self.cache, today, now)?;
        ActivityLog::new(self.conn).append(
            "freelance_logged",
            &format!("Freelance: {title}"),
            Some((id, "freelance_job")),
            now,
        )?;
        Ok(id)
    }

    /// Dashboard summary for the status surface.
    pub fn status(&self) -> Result<StatusSummary, EngineError> {
        let now = self.clock.now();
        let today = self.clock.today();
        SettingsStore::new(self.conn).check_pause_expiry(today)?;

        let stats_store = StatsStore::new(self.conn);
        let consistency_score = match stats_store.cached_consistency(now, Duration::hours(1))? {
            Some(score) => score,
            None => consistency::calculate(self.conn, today, now)?.score,
        };
        let stats = stats_store.get_or_create(now)?;
        let mission = MissionManager::new(self.conn).current_mission(today)?;
        let battle = MissionManager::new(self.conn).current_battle(&month_key(today))?;
        let unclaimed = RewardManager::new(self.conn).unclaimed()?.len();
        let balance = TokenLedger::new(self.conn).balance()?;

        Ok(StatusSummary {
            stats,
            token_balance: balance,
            mission,
            battle,
            unclaimed_rewards: unclaimed,
            consistency_score,
        })
    }

    /// Award the XP and tokens for an event, running reward checks on level up.
    fn award_event(&self, event: PipelineEvent) -> Result<(XpAward, i64), EngineError> {
        let now = self.clock.now();
        let award = StatsStore::new(self.conn).add_xp(event.xp(), event.reason(), None, now)?;
        let mut tokens = 0;
        if event.tokens() > 0 {
            tokens = TokenLedger::new(self.conn).add_tokens(
                event.tokens(),
                event.reason(),
                None,
                now,
            )?;
        }
        if award.leveled_up() {
            let rewards = RewardManager::new(self.conn);
            for level in (award.previous_level + 1)..=award.new_level {
                rewards.check_level_rewards(level as i64, now)?;
            }
            rewards.check_milestone_rewards(award.new_level as i64, now)?;
            ActivityLog::new(self.conn).append(
                "level_up",
                &format!("Reached level {}", award.new_level),
                None,
                now,
            )?;
            info!(level = award.new_level, "level up");
        }
        Ok((award, tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::crm::types::NewLead;
    use crate::storage::Database;
    use chrono::NaiveDate;
    use std::time::Duration as StdDuration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Database, ManualClock, TtlCache<f64>) {
        let db = Database::open_in_memory().unwrap();
        // 2026-08-21 is a Friday
        let clock = ManualClock::at_date(date(2026, 8, 21));
        let cache = TtlCache::new(StdDuration::from_secs(60));
        (db, clock, cache)
    }

    #[test]
    fn test_record_outreach_fans_out() {
        let (db, clock, cache) = setup();
        let engine = Engine::new(db.connection(), &clock, &cache);
        engine.seed_defaults().unwrap();

        let recorded = engine
            .record_outreach(OutreachType::Email, OutreachOutcome::Contacted, None, None)
            .unwrap();

        assert_eq!(recorded.xp.amount, 5);
        assert_eq!(recorded.tokens, 1);
        assert_eq!(recorded.streak.current, 1);

        let battle = MissionManager::new(db.connection())
            .current_battle("2026-08")
            .unwrap();
        if battle.boss_type == BossType::Outreach {
            assert_eq!(battle.progress_value, 1);
        }
    }

    #[test]
    fn test_closed_won_awards_and_logs() {
        let (db, clock, cache) = setup();
        let engine = Engine::new(db.connection(), &clock, &cache);
        engine.seed_defaults().unwrap();

        let lead = CrmStore::new(db.connection())
            .insert_lead(
                &NewLead {
                    name: "Jo's Bakery".to_string(),
                    ..Default::default()
                },
                clock.now(),
            )
            .unwrap();

        let lead = engine
            .record_lead_status_change(lead.id, LeadStatus::ClosedWon)
            .unwrap();
        assert_eq!(lead.status, LeadStatus::ClosedWon);

        let stats = StatsStore::new(db.connection())
            .get_or_create(clock.now())
            .unwrap();
        // close XP plus the monthly deals goal bonus the close satisfies
        assert_eq!(
            stats.current_xp,
            PipelineEvent::LeadClosedWon.xp() + GoalType::MonthlyDeals.xp_bonus()
        );

        let feed = ActivityLog::new(db.connection()).recent(5).unwrap();
        assert_eq!(feed[0].action_type, "deal_closed_won");
    }

    #[test]
    fn test_revive_advances_boss() {
        let (db, clock, cache) = setup();
        let engine = Engine::new(db.connection(), &clock, &cache);
        engine.seed_defaults().unwrap();

        MissionManager::new(db.connection())
            .create_battle_for_month("2026-08", BossType::ReviveLeads)
            .unwrap();

        let lead = CrmStore::new(db.connection())
            .insert_lead(
                &NewLead {
                    name: "Cold Lead".to_string(),
                    ..Default::default()
                },
                clock.now(),
            )
            .unwrap();
        CrmStore::new(db.connection())
            .set_lead_status(lead.id, LeadStatus::ClosedLost, clock.now())
            .unwrap();

        engine.record_lead_revived(lead.id).unwrap();

        let battle = MissionManager::new(db.connection())
            .current_battle("2026-08")
            .unwrap();
        assert_eq!(battle.progress_value, 1);
    }

    #[test]
    fn test_task_done_is_idempotent() {
        let (db, clock, cache) = setup();
        let engine = Engine::new(db.connection(), &clock, &cache);
        engine.seed_defaults().unwrap();

        let task_id = CrmStore::new(db.connection())
            .insert_task("Send invoice", None, None, None, None, clock.now())
            .unwrap();

        engine.record_task_done(task_id).unwrap();
        engine.record_task_done(task_id).unwrap();

        let stats = StatsStore::new(db.connection())
            .get_or_create(clock.now())
            .unwrap();
        assert_eq!(stats.current_xp, PipelineEvent::TaskDone.xp());
    }

    #[test]
    fn test_client_signed_unlocks_revenue_rewards() {
        let (db, clock, cache) = setup();
        let engine = Engine::new(db.connection(), &clock, &cache);
        engine.seed_defaults().unwrap();

        engine
            .record_client_signed(&NewClient {
                name: "Acme".to_string(),
                amount_charged: 1500.0,
                ..Default::default()
            })
            .unwrap();

        let unlocked = RewardManager::new(db.connection())
            .list_revenue_rewards()
            .unwrap()
            .into_iter()
            .filter(|r| r.unlocked_at.is_some())
            .count();
        assert_eq!(unlocked, 1);
    }

    #[test]
    fn test_status_summary() {
        let (db, clock, cache) = setup();
        let engine = Engine::new(db.connection(), &clock, &cache);
        engine.seed_defaults().unwrap();

        engine
            .record_outreach(OutreachType::Call, OutreachOutcome::BookedCall, None, None)
            .unwrap();

        let status = engine.status().unwrap();
        assert_eq!(status.stats.current_outreach_streak_days, 1);
        assert!(status.token_balance >= 1);
        assert!(status.mission.is_some());
    }
}
