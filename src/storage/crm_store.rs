//! CRUD and aggregate queries for CRM entities.
//!
//! The gamification engine consumes the aggregates (trailing outreach counts,
//! won-deal counts, revenue sums); the CRUD surface is what the route layer of
//! a front-end would call.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::clock::{parse_date, parse_datetime};
use crate::crm::types::{
    Client, ClientStatus, FreelanceJob, Lead, LeadStatus, NewClient, NewLead, OutreachLog,
    OutreachOutcome, OutreachType, ProjectType, Task, TaskStatus,
};

/// Store for leads, clients, tasks, outreach logs and freelance jobs.
pub struct CrmStore<'a> {
    conn: &'a Connection,
}

/// CRM store errors.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Lead not found: {0}")]
    LeadNotFound(i64),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),
}

impl<'a> CrmStore<'a> {
    /// Create a store over an open connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== Leads ==========

    /// Insert a new lead and return it.
    pub fn insert_lead(&self, lead: &NewLead, now: DateTime<FixedOffset>) -> Result<Lead, CrmError> {
        self.conn.execute(
            "INSERT INTO leads
             (name, business_name, niche, email, phone, source, status, notes,
              has_website, website_quality, next_action_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'new', ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                lead.name,
                lead.business_name,
                lead.niche,
                lead.email,
                lead.phone,
                lead.source,
                lead.notes,
                lead.has_website as i64,
                lead.website_quality,
                lead.next_action_date.map(|d| d.to_string()),
                now.to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_lead(id)?.ok_or(CrmError::LeadNotFound(id))
    }

    /// Get a lead by id.
    pub fn get_lead(&self, id: i64) -> Result<Option<Lead>, CrmError> {
        self.conn
            .query_row(
                "SELECT id, name, business_name, niche, email, phone, source, status, notes,
                        has_website, website_quality, next_action_date, last_contacted_at,
                        converted_at, created_at, updated_at
                 FROM leads WHERE id = ?1",
                params![id],
                parse_lead_row,
            )
            .optional()
            .map_err(CrmError::from)
    }

    /// All leads, most recently updated first.
    pub fn list_leads(&self) -> Result<Vec<Lead>, CrmError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, business_name, niche, email, phone, source, status, notes,
                    has_website, website_quality, next_action_date, last_contacted_at,
                    converted_at, created_at, updated_at
             FROM leads ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], parse_lead_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(CrmError::from)
    }

    /// Move a lead to a new pipeline status.
    ///
    /// Sets `converted_at` on the first transition to `closed_won`.
    pub fn set_lead_status(
        &self,
        id: i64,
        status: LeadStatus,
        now: DateTime<FixedOffset>,
    ) -> Result<Lead, CrmError> {
        let updated = if status == LeadStatus::ClosedWon {
            self.conn.execute(
                "UPDATE leads SET status = ?1, updated_at = ?2,
                        converted_at = COALESCE(converted_at, ?2)
                 WHERE id = ?3",
                params![status.as_str(), now.to_rfc3339(), id],
            )?
        } else {
            self.conn.execute(
                "UPDATE leads SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now.to_rfc3339(), id],
            )?
        };
        if updated == 0 {
            return Err(CrmError::LeadNotFound(id));
        }
        self.get_lead(id)?.ok_or(CrmError::LeadNotFound(id))
    }

    /// Record that a lead was just contacted.
    pub fn touch_lead_contacted(
        &self,
        id: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<(), CrmError> {
        self.conn.execute(
            "UPDATE leads SET last_contacted_at = ?1, updated_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), id],
        )?;
        Ok(())
    }

    /// Count of deals won on or after `since`.
    pub fn won_deals_since(&self, since: NaiveDate) -> Result<i64, CrmError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM leads
             WHERE status = 'closed_won' AND converted_at >= ?1",
            params![since.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count of deals won inside the date window.
    pub fn won_deals_between(&self, from: NaiveDate, to: NaiveDate) -> Result<i64, CrmError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM leads
             WHERE status = 'closed_won'
               AND substr(converted_at, 1, 10) >= ?1
               AND substr(converted_at, 1, 10) <= ?2",
            params![from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Total deals ever won.
    pub fn total_won_deals(&self) -> Result<i64, CrmError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM leads WHERE status = 'closed_won'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Open-pipeline leads whose follow-up falls inside the window.
    pub fn leads_with_followup_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<i64, CrmError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM leads
             WHERE next_action_date IS NOT NULL
               AND next_action_date >= ?1 AND next_action_date <= ?2
               AND status NOT IN ('closed_won', 'closed_lost')",
            params![from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Leads contacted on or after `since`.
    pub fn leads_contacted_since(&self, since: NaiveDate) -> Result<i64, CrmError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM leads
             WHERE last_contacted_at IS NOT NULL AND last_contacted_at >= ?1",
            params![since.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ========== Clients ==========

    /// Insert a new client and return its id.
    pub fn insert_client(
        &self,
        client: &NewClient,
        now: DateTime<FixedOffset>,
    ) -> Result<i64, CrmError> {
        self.conn.execute(
            "INSERT INTO clients
             (name, business_name, contact_email, project_type, start_date, amount_charged,
              status, hosting_active, monthly_hosting_fee, saas_active, monthly_saas_fee,
              related_lead_id, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active', ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            params![
                client.name,
                client.business_name,
                client.contact_email,
                client.project_type.as_str(),
                client.start_date.map(|d| d.to_string()),
                client.amount_charged,
                client.hosting_active as i64,
                client.monthly_hosting_fee,
                client.saas_active as i64,
                client.monthly_saas_fee,
                client.related_lead_id,
                client.notes,
                now.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All clients, newest first.
    pub fn list_clients(&self) -> Result<Vec<Client>, CrmError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, business_name, contact_email, project_type, start_date,
                    amount_charged, status, hosting_active, monthly_hosting_fee,
                    saas_active, monthly_saas_fee, related_lead_id, notes, created_at, updated_at
             FROM clients ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], parse_client_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(CrmError::from)
    }

    /// Sum of one-off charges for clients started on or after `since`.
    pub fn client_revenue_since(&self, since: NaiveDate) -> Result<f64, CrmError> {
        let total: Option<f64> = self.conn.query_row(
            "SELECT SUM(amount_charged) FROM clients WHERE start_date >= ?1",
            params![since.to_string()],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0.0))
    }

    /// Sum of one-off charges for clients started inside the date window.
    pub fn client_revenue_between(&self, from: NaiveDate, to: NaiveDate) -> Result<f64, CrmError> {
        let total: Option<f64> = self.conn.query_row(
            "SELECT SUM(amount_charged) FROM clients
             WHERE start_date >= ?1 AND start_date <= ?2",
            params![from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0.0))
    }

    /// Sum of all one-off client charges.
    pub fn total_one_off_revenue(&self) -> Result<f64, CrmError> {
        let total: Option<f64> = self
            .conn
            .query_row("SELECT SUM(amount_charged) FROM clients", [], |row| {
                row.get(0)
            })?;
        Ok(total.unwrap_or(0.0))
    }

    /// Accrued recurring revenue: months active times the monthly fees, for
    /// every non-cancelled client with an active hosting or SaaS fee.
    pub fn recurring_revenue_to_date(&self, today: NaiveDate) -> Result<f64, CrmError> {
        let clients = self.list_clients()?;
        let mut total = 0.0;
        for client in &clients {
            if client.status == ClientStatus::Cancelled {
                continue;
            }
            let monthly = client.monthly_recurring();
            if monthly <= 0.0 {
                continue;
            }
            let start = client.start_date.unwrap_or_else(|| client.created_at.date_naive());
            total += monthly * months_active(start, today) as f64;
        }
        Ok(total)
    }

    // ========== Tasks ==========

    /// Insert a task and return its id.
    pub fn insert_task(
        &self,
        title: &str,
        description: Option<&str>,
        due_date: Option<NaiveDate>,
        related_lead_id: Option<i64>,
        related_client_id: Option<i64>,
        now: DateTime<FixedOffset>,
    ) -> Result<i64, CrmError> {
        self.conn.execute(
            "INSERT INTO tasks (title, description, due_date, status, related_lead_id,
                                related_client_id, created_at)
             VALUES (?1, ?2, ?3, 'open', ?4, ?5, ?6)",
            params![
                title,
                description,
                due_date.map(|d| d.to_string()),
                related_lead_id,
                related_client_id,
                now.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a task by id.
    pub fn get_task(&self, id: i64) -> Result<Option<Task>, CrmError> {
        self.conn
            .query_row(
                "SELECT id, title, description, due_date, status, related_lead_id,
                        related_client_id, created_at
                 FROM tasks WHERE id = ?1",
                params![id],
                parse_task_row,
            )
            .optional()
            .map_err(CrmError::from)
    }

    /// Update a task's status.
    pub fn set_task_status(&self, id: i64, status: TaskStatus) -> Result<(), CrmError> {
        let updated = self.conn.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            return Err(CrmError::TaskNotFound(id));
        }
        Ok(())
    }

    /// Tasks due inside the window, total and completed.
    pub fn tasks_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<(i64, i64), CrmError> {
        let due: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE due_date >= ?1 AND due_date <= ?2",
            params![from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        let done: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks
             WHERE due_date >= ?1 AND due_date <= ?2 AND status = 'done'",
            params![from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        Ok((due, done))
    }

    // ========== Outreach ==========

    /// Log an outreach touch and return its id.
    pub fn insert_outreach(
        &self,
        date: NaiveDate,
        outreach_type: OutreachType,
        outcome: OutreachOutcome,
        lead_id: Option<i64>,
        notes: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<i64, CrmError> {
        self.conn.execute(
            "INSERT INTO outreach_logs (date, type, outcome, lead_id, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                date.to_string(),
                outreach_type.as_str(),
                outcome.as_str(),
                lead_id,
                notes,
                now.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Outreach touches on or after `since`.
    pub fn outreach_count_since(&self, since: NaiveDate) -> Result<i64, CrmError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM outreach_logs WHERE date >= ?1",
            params![since.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Outreach touches on a single date.
    pub fn outreach_count_on(&self, date: NaiveDate) -> Result<i64, CrmError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM outreach_logs WHERE date = ?1",
            params![date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Total outreach touches ever logged.
    pub fn total_outreach(&self) -> Result<i64, CrmError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM outreach_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Recent outreach logs, newest first.
    pub fn recent_outreach(&self, limit: i64) -> Result<Vec<OutreachLog>, CrmError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, type, outcome, lead_id, notes, created_at
             FROM outreach_logs ORDER BY date DESC, created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], parse_outreach_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(CrmError::from)
    }

    // ========== Freelance income ==========

    /// Log a freelance job and return its id.
    pub fn insert_freelance_job(
        &self,
        title: &str,
        category: &str,
        amount: f64,
        date_completed: Option<NaiveDate>,
        now: DateTime<FixedOffset>,
    ) -> Result<i64, CrmError> {
        self.conn.execute(
            "INSERT INTO freelance_jobs (title, category, amount, date_completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                title,
                category,
                amount,
                date_completed.map(|d| d.to_string()),
                now.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Sum of all freelance income.
    pub fn freelance_income_total(&self) -> Result<f64, CrmError> {
        let total: Option<f64> = self
            .conn
            .query_row("SELECT SUM(amount) FROM freelance_jobs", [], |row| {
                row.get(0)
            })?;
        Ok(total.unwrap_or(0.0))
    }

    /// All freelance jobs, newest first.
    pub fn list_freelance_jobs(&self) -> Result<Vec<FreelanceJob>, CrmError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, amount, date_completed, created_at
             FROM freelance_jobs ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let date_str: Option<String> = row.get(4)?;
            let created_str: String = row.get(5)?;
            Ok(FreelanceJob {
                id: row.get(0)?,
                title: row.get(1)?,
                category: row.get(2)?,
                amount: row.get(3)?,
                date_completed: date_str.as_deref().and_then(parse_date),
                created_at: parse_datetime(&created_str)
                    .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(CrmError::from)
    }
}

/// Whole months from `start` through `today`, counting the starting month.
fn months_active(start: NaiveDate, today: NaiveDate) -> i64 {
    if today < start {
        return 0;
    }
    let months =
        (today.year() as i64 - start.year() as i64) * 12 + today.month() as i64 - start.month() as i64;
    months + 1
}

fn parse_lead_row(row: &rusqlite::Row) -> rusqlite::Result<Lead> {
    let status_str: String = row.get(7)?;
    let next_action: Option<String> = row.get(11)?;
    let last_contacted: Option<String> = row.get(12)?;
    let converted: Option<String> = row.get(13)?;
    let created_str: String = row.get(14)?;
    let updated_str: String = row.get(15)?;

    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        business_name: row.get(2)?,
        niche: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        source: row.get(6)?,
        status: LeadStatus::parse(&status_str),
        notes: row.get(8)?,
        has_website: row.get::<_, i64>(9)? != 0,
        website_quality: row.get(10)?,
        next_action_date: next_action.as_deref().and_then(parse_date),
        last_contacted_at: last_contacted.as_deref().and_then(parse_datetime),
        converted_at: converted.as_deref().and_then(parse_datetime),
        created_at: parse_datetime(&created_str)
            .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
        updated_at: parse_datetime(&updated_str)
            .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
    })
}

fn parse_client_row(row: &rusqlite::Row) -> rusqlite::Result<Client> {
    let project_str: String = row.get(4)?;
    let start_str: Option<String> = row.get(5)?;
    let status_str: String = row.get(7)?;
    let created_str: String = row.get(14)?;
    let updated_str: String = row.get(15)?;

    Ok(Client {
        id: row.get(0)?,
        name: row.get(1)?,
        business_name: row.get(2)?,
        contact_email: row.get(3)?,
        project_type: ProjectType::parse(&project_str),
        start_date: start_str.as_deref().and_then(parse_date),
        amount_charged: row.get(6)?,
        status: ClientStatus::parse(&status_str),
        hosting_active: row.get::<_, i64>(8)? != 0,
        monthly_hosting_fee: row.get(9)?,
        saas_active: row.get::<_, i64>(10)? != 0,
        monthly_saas_fee: row.get(11)?,
        related_lead_id: row.get(12)?,
        notes: row.get(13)?,
        created_at: parse_datetime(&created_str)
            .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
        updated_at: parse_datetime(&updated_str)
            .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
    })
}

fn parse_task_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let due_str: Option<String> = row.get(3)?;
    let status_str: String = row.get(4)?;
    let created_str: String = row.get(7)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: due_str.as_deref().and_then(parse_date),
        status: TaskStatus::parse(&status_str),
        related_lead_id: row.get(5)?,
        related_client_id: row.get(6)?,
        created_at: parse_datetime(&created_str)
            .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
    })
}

fn parse_outreach_row(row: &rusqlite::Row) -> rusqlite::Result<OutreachLog> {
    let date_str: String = row.get(1)?;
    let type_str: String = row.get(2)?;
    let outcome_str: String = row.get(3)?;
    let created_str: String = row.get(6)?;

    Ok(OutreachLog {
        id: row.get(0)?,
        date: parse_date(&date_str).unwrap_or_else(|| chrono::Utc::now().date_naive()),
        outreach_type: OutreachType::parse(&type_str),
        outcome: OutreachOutcome::parse(&outcome_str),
        lead_id: row.get(4)?,
        notes: row.get(5)?,
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lead_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let store = CrmStore::new(db.connection());
        let now = test_now();

        let lead = store
            .insert_lead(
                &NewLead {
                    name: "Jo's Bakery".to_string(),
                    niche: Some("food".to_string()),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        assert_eq!(lead.status, LeadStatus::New);

        let lead = store
            .set_lead_status(lead.id, LeadStatus::Contacted, now)
            .unwrap();
        assert_eq!(lead.status, LeadStatus::Contacted);
        assert!(lead.converted_at.is_none());

        let lead = store
            .set_lead_status(lead.id, LeadStatus::ClosedWon, now)
            .unwrap();
        assert!(lead.converted_at.is_some());
        assert_eq!(store.total_won_deals().unwrap(), 1);
    }

    #[test]
    fn test_won_deals_and_revenue_windows() {
        let db = Database::open_in_memory().unwrap();
        let store = CrmStore::new(db.connection());
        let offset = FixedOffset::east_opt(13 * 3600).unwrap();
        let at = |d: NaiveDate| {
            d.and_hms_opt(10, 0, 0)
                .unwrap()
                .and_local_timezone(offset)
                .unwrap()
        };
        let july = date(2026, 7, 20);
        let august = date(2026, 8, 5);

        for (name, closed) in [("July win", july), ("August win", august)] {
            let lead = store
                .insert_lead(
                    &NewLead {
                        name: name.to_string(),
                        ..Default::default()
                    },
                    at(closed),
                )
                .unwrap();
            store
                .set_lead_status(lead.id, LeadStatus::ClosedWon, at(closed))
                .unwrap();
        }
        for (amount, start) in [(500.0, july), (900.0, august)] {
            store
                .insert_client(
                    &NewClient {
                        name: "Client".to_string(),
                        amount_charged: amount,
                        start_date: Some(start),
                        ..Default::default()
                    },
                    at(start),
                )
                .unwrap();
        }

        let july_start = date(2026, 7, 1);
        let july_end = date(2026, 7, 31);
        assert_eq!(store.won_deals_between(july_start, july_end).unwrap(), 1);
        assert_eq!(
            store.client_revenue_between(july_start, july_end).unwrap(),
            500.0
        );
        // the open-ended variants still see both months
        assert_eq!(store.won_deals_since(july_start).unwrap(), 2);
        assert_eq!(store.client_revenue_since(july_start).unwrap(), 1400.0);
    }

    #[test]
    fn test_set_status_missing_lead() {
        let db = Database::open_in_memory().unwrap();
        let store = CrmStore::new(db.connection());
        let result = store.set_lead_status(99, LeadStatus::Contacted, test_now());
        assert!(matches!(result, Err(CrmError::LeadNotFound(99))));
    }

    #[test]
    fn test_outreach_counts() {
        let db = Database::open_in_memory().unwrap();
        let store = CrmStore::new(db.connection());
        let now = test_now();
        let today = date(2026, 8, 21);

        for offset in [0i64, 0, 1, 5, 40] {
            let d = today - chrono::Duration::days(offset);
            store
                .insert_outreach(d, OutreachType::Email, OutreachOutcome::Contacted, None, None, now)
                .unwrap();
        }

        assert_eq!(store.outreach_count_on(today).unwrap(), 2);
        assert_eq!(
            store
                .outreach_count_since(today - chrono::Duration::days(30))
                .unwrap(),
            4
        );
        assert_eq!(store.total_outreach().unwrap(), 5);
    }

    #[test]
    fn test_recurring_revenue_accrual() {
        let db = Database::open_in_memory().unwrap();
        let store = CrmStore::new(db.connection());
        let now = test_now();

        store
            .insert_client(
                &NewClient {
                    name: "Acme".to_string(),
                    amount_charged: 1000.0,
                    hosting_active: true,
                    monthly_hosting_fee: 50.0,
                    start_date: Some(date(2026, 5, 10)),
                    ..Default::default()
                },
                now,
            )
            .unwrap();

        // May through August inclusive = 4 months
        let total = store.recurring_revenue_to_date(date(2026, 8, 21)).unwrap();
        assert_eq!(total, 200.0);
        assert_eq!(store.total_one_off_revenue().unwrap(), 1000.0);
    }

    #[test]
    fn test_months_active() {
        assert_eq!(months_active(date(2026, 8, 1), date(2026, 8, 21)), 1);
        assert_eq!(months_active(date(2026, 5, 10), date(2026, 8, 21)), 4);
        assert_eq!(months_active(date(2026, 9, 1), date(2026, 8, 21)), 0);
    }

    #[test]
    fn test_task_window_counts() {
        let db = Database::open_in_memory().unwrap();
        let store = CrmStore::new(db.connection());
        let now = test_now();
        let today = date(2026, 8, 21);

        let t1 = store
            .insert_task("Send proposal", None, Some(today), None, None, now)
            .unwrap();
        store
            .insert_task("Chase invoice", None, Some(today - chrono::Duration::days(2)), None, None, now)
            .unwrap();
        store.set_task_status(t1, TaskStatus::Done).unwrap();

        let (due, done) = store
            .tasks_due_between(today - chrono::Duration::days(7), today)
            .unwrap();
        assert_eq!(due, 2);
        assert_eq!(done, 1);
    }
}
