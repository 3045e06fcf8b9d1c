//! Gamification entity definitions.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// XP thresholds per level, ascending. The largest level whose threshold is
/// at or below the XP total is the current level; XP past the last entry
/// stays at the max level.
pub const LEVELS: [(u32, i64); 15] = [
    (1, 0),
    (2, 150),
    (3, 400),
    (4, 800),
    (5, 1400),
    (6, 2200),
    (7, 3200),
    (8, 4500),
    (9, 6500),
    (10, 9000),
    (11, 12000),
    (12, 16000),
    (13, 20000),
    (14, 25000),
    (15, 30000),
];

/// Level for an XP total.
pub fn level_for_xp(xp: i64) -> u32 {
    let mut level = 1;
    for (lvl, threshold) in LEVELS {
        if xp >= threshold {
            level = lvl;
        } else {
            break;
        }
    }
    level
}

/// XP threshold of the given level.
pub fn xp_for_level(level: u32) -> i64 {
    LEVELS
        .iter()
        .find(|(lvl, _)| *lvl == level)
        .map(|(_, threshold)| *threshold)
        .unwrap_or(0)
}

/// XP threshold of the next level, or `None` at the level cap.
pub fn xp_for_next_level(level: u32) -> Option<i64> {
    LEVELS
        .iter()
        .find(|(lvl, _)| *lvl == level + 1)
        .map(|(_, threshold)| *threshold)
}

/// The singleton per-user stats row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub current_xp: i64,
    pub current_level: u32,
    pub current_outreach_streak_days: i64,
    pub longest_outreach_streak_days: i64,
    pub last_outreach_date: Option<NaiveDate>,
    pub last_consistency_score: Option<i64>,
    pub last_consistency_calculated_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
}

impl UserStats {
    /// Progress through the current level as a percentage (0..=100).
    pub fn xp_progress_percent(&self) -> i64 {
        let floor = xp_for_level(self.current_level);
        match xp_for_next_level(self.current_level) {
            Some(next) if next > floor => {
                let in_level = self.current_xp - floor;
                (in_level * 100 / (next - floor)).clamp(0, 100)
            }
            _ => 100,
        }
    }
}

/// One append-only XP ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpLogEntry {
    pub id: i64,
    pub amount: i64,
    pub reason: String,
    /// Idempotency key for one-time bonuses; `None` for ordinary awards.
    pub bonus_key: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// One append-only token ledger entry; negative amounts are spends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTransaction {
    pub id: i64,
    pub amount: i64,
    pub reason: String,
    pub bonus_key: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// Kind of tracked goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    DailyOutreach,
    WeeklyOutreach,
    MonthlyRevenue,
    MonthlyDeals,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::DailyOutreach => "daily_outreach",
            GoalType::WeeklyOutreach => "weekly_outreach",
            GoalType::MonthlyRevenue => "monthly_revenue",
            GoalType::MonthlyDeals => "monthly_deals",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily_outreach" => Some(GoalType::DailyOutreach),
            "weekly_outreach" => Some(GoalType::WeeklyOutreach),
            "monthly_revenue" => Some(GoalType::MonthlyRevenue),
            "monthly_deals" => Some(GoalType::MonthlyDeals),
            _ => None,
        }
    }
}

impl std::fmt::Display for GoalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One goal row per (goal_type, period).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub goal_type: GoalType,
    /// Period identifier: a date, an ISO week, or a `YYYY-MM` month key.
    pub period: String,
    pub target_value: i64,
    /// Manual targets are never overwritten by the recommendation.
    pub is_manual: bool,
}

/// A one-time unlockable achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub description: String,
    pub unlocked_at: Option<DateTime<FixedOffset>>,
}

impl Achievement {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// Reward repeating at every multiple of `level_interval`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelReward {
    pub id: i64,
    pub level_interval: i64,
    pub reward_text: String,
    pub is_active: bool,
}

/// One-time reward unlocked at `target_level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneReward {
    pub id: i64,
    pub target_level: i64,
    pub reward_text: String,
    pub is_active: bool,
    pub unlocked_at: Option<DateTime<FixedOffset>>,
    pub claimed_at: Option<DateTime<FixedOffset>>,
}

/// One-time reward unlocked at a lifetime-revenue threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueReward {
    pub id: i64,
    pub target_revenue: f64,
    pub reward_text: String,
    pub reward_icon: String,
    pub is_active: bool,
    pub unlocked_at: Option<DateTime<FixedOffset>>,
    pub claimed_at: Option<DateTime<FixedOffset>>,
}

impl RevenueReward {
    /// Progress toward the threshold as a percentage (0..=100).
    pub fn progress_percent(&self, lifetime_revenue: f64) -> i64 {
        if self.target_revenue <= 0.0 {
            return 0;
        }
        ((lifetime_revenue / self.target_revenue * 100.0) as i64).clamp(0, 100)
    }
}

/// Kind of reward recorded in the unlock log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Level,
    Milestone,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Level => "level",
            RewardKind::Milestone => "milestone",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "milestone" => RewardKind::Milestone,
            _ => RewardKind::Level,
        }
    }
}

/// One reward-unlock event. Level rewards may unlock repeatedly (once per
/// interval crossing); the `(reward_type, reward_reference_id, level_achieved)`
/// triple is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedReward {
    pub id: i64,
    pub reward_type: RewardKind,
    pub reward_reference_id: i64,
    pub level_achieved: i64,
    pub reward_text: String,
    pub unlocked_at: DateTime<FixedOffset>,
    pub claimed_at: Option<DateTime<FixedOffset>>,
}

/// A redeemable token-shop item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardItem {
    pub id: i64,
    pub name: String,
    pub cost: i64,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Kind of daily mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    Outreach,
    Tasks,
    FollowUps,
}

impl MissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionType::Outreach => "outreach",
            MissionType::Tasks => "tasks",
            MissionType::FollowUps => "follow_ups",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "tasks" => MissionType::Tasks,
            "follow_ups" => MissionType::FollowUps,
            _ => MissionType::Outreach,
        }
    }
}

/// Reported state of a daily mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStatus {
    InProgress,
    Completed,
    Expired,
}

/// One mission row per weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMission {
    pub id: i64,
    pub mission_date: NaiveDate,
    pub mission_type: MissionType,
    pub description: String,
    pub target_count: i64,
    pub progress_count: i64,
    pub reward_tokens: i64,
    pub is_completed: bool,
}

impl DailyMission {
    /// Status relative to `today`. A stale uncompleted mission reads as
    /// expired but is never mutated.
    pub fn status(&self, today: NaiveDate) -> MissionStatus {
        if self.is_completed {
            MissionStatus::Completed
        } else if self.mission_date < today {
            MissionStatus::Expired
        } else {
            MissionStatus::InProgress
        }
    }

    /// Progress as a percentage (0..=100).
    pub fn progress_percent(&self) -> i64 {
        if self.target_count <= 0 {
            return 0;
        }
        (self.progress_count * 100 / self.target_count).clamp(0, 100)
    }
}

/// Kind of monthly boss challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossType {
    Outreach,
    ReviveLeads,
}

impl BossType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BossType::Outreach => "outreach",
            BossType::ReviveLeads => "revive_leads",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "revive_leads" => BossType::ReviveLeads,
            _ => BossType::Outreach,
        }
    }
}

/// One boss fight row per calendar month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossBattle {
    pub id: i64,
    /// `YYYY-MM` month key.
    pub month: String,
    pub boss_type: BossType,
    pub description: String,
    pub target_value: i64,
    pub progress_value: i64,
    pub reward_tokens: i64,
    pub is_completed: bool,
}

impl BossBattle {
    /// Progress as a percentage (0..=100).
    pub fn progress_percent(&self) -> i64 {
        if self.target_value <= 0 {
            return 0;
        }
        (self.progress_value * 100 / self.target_value).clamp(0, 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries_exact() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(149), 1);
        assert_eq!(level_for_xp(150), 2);
        assert_eq!(level_for_xp(399), 2);
        assert_eq!(level_for_xp(400), 3);
        assert_eq!(level_for_xp(30000), 15);
        assert_eq!(level_for_xp(1_000_000), 15);
    }

    #[test]
    fn test_level_monotonic() {
        let mut last = 0;
        for xp in (0..35_000).step_by(7) {
            let level = level_for_xp(xp);
            assert!(level >= last, "level regressed at xp={xp}");
            last = level;
        }
    }

    #[test]
    fn test_xp_for_next_level() {
        assert_eq!(xp_for_next_level(1), Some(150));
        assert_eq!(xp_for_next_level(14), Some(30000));
        assert_eq!(xp_for_next_level(15), None);
    }

    #[test]
    fn test_xp_progress_percent() {
        let stats = UserStats {
            current_xp: 275,
            current_level: 2,
            current_outreach_streak_days: 0,
            longest_outreach_streak_days: 0,
            last_outreach_date: None,
            last_consistency_score: None,
            last_consistency_calculated_at: None,
            created_at: chrono::Utc::now().fixed_offset(),
        };
        // 125 into the 250-wide band between 150 and 400
        assert_eq!(stats.xp_progress_percent(), 50);
    }

    #[test]
    fn test_mission_status() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 21).unwrap();
        let mut mission = DailyMission {
            id: 1,
            mission_date: today,
            mission_type: MissionType::Outreach,
            description: "Complete outreach activities today".to_string(),
            target_count: 4,
            progress_count: 2,
            reward_tokens: 5,
            is_completed: false,
        };
        assert_eq!(mission.status(today), MissionStatus::InProgress);
        assert_eq!(mission.progress_percent(), 50);

        mission.mission_date = today - chrono::Duration::days(1);
        assert_eq!(mission.status(today), MissionStatus::Expired);

        mission.is_completed = true;
        assert_eq!(mission.status(today), MissionStatus::Completed);
    }
}
