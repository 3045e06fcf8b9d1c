//! Award tables for pipeline events, streak bonuses, and goal bonuses.

use crate::gamification::types::GoalType;

/// A pipeline event that may earn XP and tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    OutreachLogged,
    LeadContacted,
    LeadCallBooked,
    LeadProposalSent,
    LeadClosedWon,
    TaskDone,
}

impl PipelineEvent {
    /// XP awarded for the event.
    pub fn xp(&self) -> i64 {
        match self {
            PipelineEvent::OutreachLogged => 5,
            PipelineEvent::LeadContacted => 3,
            PipelineEvent::LeadCallBooked => 7,
            PipelineEvent::LeadProposalSent => 10,
            PipelineEvent::LeadClosedWon => 20,
            PipelineEvent::TaskDone => 8,
        }
    }

    /// Tokens awarded for the event; most events earn none.
    pub fn tokens(&self) -> i64 {
        match self {
            PipelineEvent::OutreachLogged => 1,
            PipelineEvent::TaskDone => 1,
            _ => 0,
        }
    }

    /// Ledger reason string.
    pub fn reason(&self) -> &'static str {
        match self {
            PipelineEvent::OutreachLogged => "outreach_log",
            PipelineEvent::LeadContacted => "lead_contacted",
            PipelineEvent::LeadCallBooked => "lead_call_booked",
            PipelineEvent::LeadProposalSent => "lead_proposal_sent",
            PipelineEvent::LeadClosedWon => "lead_closed_won",
            PipelineEvent::TaskDone => "task_done",
        }
    }
}

/// One-time XP bonuses at streak lengths: (days, xp).
pub const STREAK_XP_BONUSES: [(i64, i64); 2] = [(10, 50), (30, 200)];

/// One-time token bonuses at streak lengths: (days, tokens).
pub const STREAK_TOKEN_BONUSES: [(i64, i64); 4] = [(3, 2), (7, 5), (14, 10), (30, 25)];

impl GoalType {
    /// XP bonus for hitting the goal, awarded once per period.
    pub fn xp_bonus(&self) -> i64 {
        match self {
            GoalType::DailyOutreach => 15,
            GoalType::WeeklyOutreach => 40,
            GoalType::MonthlyRevenue => 100,
            GoalType::MonthlyDeals => 75,
        }
    }

    /// Token bonus for hitting the goal, awarded once per period.
    pub fn token_bonus(&self) -> i64 {
        match self {
            GoalType::DailyOutreach => 2,
            GoalType::WeeklyOutreach => 5,
            GoalType::MonthlyRevenue => 10,
            GoalType::MonthlyDeals => 8,
        }
    }
}
