//! CRM entity definitions: leads, clients, tasks, outreach logs, freelance jobs.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Pipeline status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    CallBooked,
    FollowUp,
    ProposalSent,
    ClosedWon,
    ClosedLost,
}

impl LeadStatus {
    /// Stored text value.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::CallBooked => "call_booked",
            LeadStatus::FollowUp => "follow_up",
            LeadStatus::ProposalSent => "proposal_sent",
            LeadStatus::ClosedWon => "closed_won",
            LeadStatus::ClosedLost => "closed_lost",
        }
    }

    /// Parse a stored text value, defaulting to `New`.
    pub fn parse(value: &str) -> Self {
        match value {
            "contacted" => LeadStatus::Contacted,
            "call_booked" => LeadStatus::CallBooked,
            "follow_up" => LeadStatus::FollowUp,
            "proposal_sent" => LeadStatus::ProposalSent,
            "closed_won" => LeadStatus::ClosedWon,
            "closed_lost" => LeadStatus::ClosedLost,
            _ => LeadStatus::New,
        }
    }

    /// Whether the lead has left the active pipeline.
    pub fn is_closed(&self) -> bool {
        matches!(self, LeadStatus::ClosedWon | LeadStatus::ClosedLost)
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sales lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub business_name: Option<String>,
    pub niche: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub has_website: bool,
    pub website_quality: Option<String>,
    pub next_action_date: Option<NaiveDate>,
    pub last_contacted_at: Option<DateTime<FixedOffset>>,
    pub converted_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// New lead payload for inserts.
#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub name: String,
    pub business_name: Option<String>,
    pub niche: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub has_website: bool,
    pub website_quality: Option<String>,
    pub next_action_date: Option<NaiveDate>,
}

/// Project type sold to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Website,
    HostingOnly,
    SaasOnly,
    Bundle,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Website => "website",
            ProjectType::HostingOnly => "hosting_only",
            ProjectType::SaasOnly => "saas_only",
            ProjectType::Bundle => "bundle",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "hosting_only" => ProjectType::HostingOnly,
            "saas_only" => ProjectType::SaasOnly,
            "bundle" => ProjectType::Bundle,
            _ => ProjectType::Website,
        }
    }
}

/// Engagement status of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Completed,
    Paused,
    Cancelled,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Completed => "completed",
            ClientStatus::Paused => "paused",
            ClientStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "completed" => ClientStatus::Completed,
            "paused" => ClientStatus::Paused,
            "cancelled" => ClientStatus::Cancelled,
            _ => ClientStatus::Active,
        }
    }
}

/// A paying client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub business_name: Option<String>,
    pub contact_email: Option<String>,
    pub project_type: ProjectType,
    pub start_date: Option<NaiveDate>,
    pub amount_charged: f64,
    pub status: ClientStatus,
    pub hosting_active: bool,
    pub monthly_hosting_fee: f64,
    pub saas_active: bool,
    pub monthly_saas_fee: f64,
    pub related_lead_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl Client {
    /// Monthly recurring revenue contributed by this client.
    pub fn monthly_recurring(&self) -> f64 {
        let hosting = if self.hosting_active {
            self.monthly_hosting_fee
        } else {
            0.0
        };
        let saas = if self.saas_active {
            self.monthly_saas_fee
        } else {
            0.0
        };
        hosting + saas
    }
}

/// New client payload for inserts.
#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub business_name: Option<String>,
    pub contact_email: Option<String>,
    pub project_type: ProjectType,
    pub start_date: Option<NaiveDate>,
    pub amount_charged: f64,
    pub hosting_active: bool,
    pub monthly_hosting_fee: f64,
    pub saas_active: bool,
    pub monthly_saas_fee: f64,
    pub related_lead_id: Option<i64>,
    pub notes: Option<String>,
}

impl Default for NewClient {
    fn default() -> Self {
        Self {
            name: String::new(),
            business_name: None,
            contact_email: None,
            project_type: ProjectType::Website,
            start_date: None,
            amount_charged: 0.0,
            hosting_active: false,
            monthly_hosting_fee: 0.0,
            saas_active: false,
            monthly_saas_fee: 0.0,
            related_lead_id: None,
            notes: None,
        }
    }
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "in_progress" => TaskStatus::InProgress,
            "done" => TaskStatus::Done,
            _ => TaskStatus::Open,
        }
    }
}

/// A to-do item, optionally tied to a lead or client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub related_lead_id: Option<i64>,
    pub related_client_id: Option<i64>,
    pub created_at: DateTime<FixedOffset>,
}

/// Channel used for an outreach touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachType {
    Email,
    Call,
    Dm,
    InPerson,
    Other,
}

impl OutreachType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutreachType::Email => "email",
            OutreachType::Call => "call",
            OutreachType::Dm => "dm",
            OutreachType::InPerson => "in_person",
            OutreachType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "call" => OutreachType::Call,
            "dm" => OutreachType::Dm,
            "in_person" => OutreachType::InPerson,
            "other" => OutreachType::Other,
            _ => OutreachType::Email,
        }
    }
}

/// Immediate outcome of an outreach touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachOutcome {
    Contacted,
    BookedCall,
    NoResponse,
    ClosedWon,
    ClosedLost,
    FollowUpSet,
}

impl OutreachOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutreachOutcome::Contacted => "contacted",
            OutreachOutcome::BookedCall => "booked_call",
            OutreachOutcome::NoResponse => "no_response",
            OutreachOutcome::ClosedWon => "closed_won",
            OutreachOutcome::ClosedLost => "closed_lost",
            OutreachOutcome::FollowUpSet => "follow_up_set",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "booked_call" => OutreachOutcome::BookedCall,
            "no_response" => OutreachOutcome::NoResponse,
            "closed_won" => OutreachOutcome::ClosedWon,
            "closed_lost" => OutreachOutcome::ClosedLost,
            "follow_up_set" => OutreachOutcome::FollowUpSet,
            _ => OutreachOutcome::Contacted,
        }
    }
}

/// A logged outreach activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachLog {
    pub id: i64,
    pub date: NaiveDate,
    pub outreach_type: OutreachType,
    pub outcome: OutreachOutcome,
    pub lead_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// One-off freelance income outside the client pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreelanceJob {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub amount: f64,
    pub date_completed: Option<NaiveDate>,
    pub created_at: DateTime<FixedOffset>,
}
