//! Monthly review snapshots.
//!
//! One row per `YYYY-MM` holding a JSON snapshot of that month's aggregates.
//! Purely a cached report: regenerating upserts, deleting is safe.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::clock::{parse_datetime, start_of_month};
use crate::gamification::stats::StatsStore;
use crate::gamification::EngineError;
use crate::storage::CrmStore;

/// Aggregated metrics for one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySnapshot {
    pub outreach_count: i64,
    pub deals_won: i64,
    pub revenue: f64,
    pub xp_gained: i64,
    pub missions_completed: i64,
}

/// A stored review.
#[derive(Debug, Clone)]
pub struct MonthlyReview {
    pub id: i64,
    pub year_month: String,
    pub snapshot: MonthlySnapshot,
    pub generated_at: DateTime<FixedOffset>,
}

/// Store for monthly review snapshots.
pub struct ReviewStore<'a> {
    conn: &'a Connection,
}

impl<'a> ReviewStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Build the snapshot for the month containing `reference` and upsert it.
    pub fn generate(
        &self,
        reference: NaiveDate,
        now: DateTime<FixedOffset>,
    ) -> Result<MonthlyReview, EngineError> {
        let month_start = start_of_month(reference);
        let month_end = end_of_month(reference);
        let year_month = crate::clock::month_key(reference);

        let crm = CrmStore::new(self.conn);
        let outreach_count =
            crm.outreach_count_since(month_start)? - crm.outreach_count_since(next_day(month_end))?;
        let deals_won = crm.won_deals_between(month_start, month_end)?;
        let revenue = crm.client_revenue_between(month_start, month_end)?;
        let xp_gained = StatsStore::new(self.conn).xp_gained_between(month_start, month_end)?;
        let missions_completed: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM daily_missions
             WHERE is_completed = 1 AND mission_date >= ?1 AND mission_date <= ?2",
            params![month_start.to_string(), month_end.to_string()],
            |row| row.get(0),
        )?;

        let snapshot = MonthlySnapshot {
            outreach_count,
            deals_won,
            revenue,
            xp_gained,
            missions_completed,
        };
        let content = serde_json::to_string(&snapshot).map_err(EngineError::Serialize)?;
        self.conn.execute(
            "INSERT INTO monthly_reviews (year_month, content, generated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(year_month) DO UPDATE SET content = ?2, generated_at = ?3",
            params![year_month, content, now.to_rfc3339()],
        )?;
        self.get(&year_month)?
            .ok_or(EngineError::MissingSingleton("monthly_reviews"))
    }

    /// A stored review by month key.
    pub fn get(&self, year_month: &str) -> Result<Option<MonthlyReview>, EngineError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, year_month, content, generated_at
                 FROM monthly_reviews WHERE year_month = ?1",
                params![year_month],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, year_month, content, generated_str)) = row else {
            return Ok(None);
        };
        let snapshot = serde_json::from_str(&content).map_err(EngineError::Serialize)?;
        Ok(Some(MonthlyReview {
            id,
            year_month,
            snapshot,
            generated_at: parse_datetime(&generated_str)
                .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
        }))
    }

    /// Drop a stored review.
    pub fn delete(&self, year_month: &str) -> Result<bool, EngineError> {
        let deleted = self.conn.execute(
            "DELETE FROM monthly_reviews WHERE year_month = ?1",
            params![year_month],
        )?;
        Ok(deleted > 0)
    }
}

fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap() - chrono::Duration::days(1)
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date + chrono::Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::types::{LeadStatus, NewClient, NewLead, OutreachOutcome, OutreachType};
    use crate::storage::Database;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generate_and_regenerate() {
        let db = Database::open_in_memory().unwrap();
        let store = ReviewStore::new(db.connection());
        let now = Utc::now().fixed_offset();
        let crm = CrmStore::new(db.connection());

        crm.insert_outreach(
            date(2026, 8, 5),
            OutreachType::Email,
            OutreachOutcome::Contacted,
            None,
            None,
            now,
        )
        .unwrap();

        let review = store.generate(date(2026, 8, 21), now).unwrap();
        assert_eq!(review.year_month, "2026-08");
        assert_eq!(review.snapshot.outreach_count, 1);

        crm.insert_outreach(
            date(2026, 8, 6),
            OutreachType::Call,
            OutreachOutcome::BookedCall,
            None,
            None,
            now,
        )
        .unwrap();

        // regenerate upserts the same row
        let review = store.generate(date(2026, 8, 21), now).unwrap();
        assert_eq!(review.snapshot.outreach_count, 2);
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM monthly_reviews", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_regenerated_past_month_excludes_later_activity() {
        let db = Database::open_in_memory().unwrap();
        let store = ReviewStore::new(db.connection());
        let crm = CrmStore::new(db.connection());
        let offset = FixedOffset::east_opt(13 * 3600).unwrap();
        let at = |d: NaiveDate| {
            d.and_hms_opt(10, 0, 0)
                .unwrap()
                .and_local_timezone(offset)
                .unwrap()
        };

        // a deal and a client in July, then more of both in August
        for (name, amount, day) in [
            ("July deal", 500.0, date(2026, 7, 10)),
            ("August deal", 900.0, date(2026, 8, 4)),
        ] {
            let lead = crm
                .insert_lead(
                    &NewLead {
                        name: name.to_string(),
                        ..Default::default()
                    },
                    at(day),
                )
                .unwrap();
            crm.set_lead_status(lead.id, LeadStatus::ClosedWon, at(day))
                .unwrap();
            crm.insert_client(
                &NewClient {
                    name: name.to_string(),
                    amount_charged: amount,
                    start_date: Some(day),
                    related_lead_id: Some(lead.id),
                    ..Default::default()
                },
                at(day),
            )
            .unwrap();
        }

        let review = store.generate(date(2026, 7, 20), at(date(2026, 8, 21))).unwrap();
        assert_eq!(review.snapshot.deals_won, 1);
        assert_eq!(review.snapshot.revenue, 500.0);

        let review = store.generate(date(2026, 8, 20), at(date(2026, 8, 21))).unwrap();
        assert_eq!(review.snapshot.deals_won, 1);
        assert_eq!(review.snapshot.revenue, 900.0);
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let store = ReviewStore::new(db.connection());
        let now = Utc::now().fixed_offset();

        store.generate(date(2026, 8, 21), now).unwrap();
        assert!(store.delete("2026-08").unwrap());
        assert!(!store.delete("2026-08").unwrap());
        assert!(store.get("2026-08").unwrap().is_none());
    }

    #[test]
    fn test_end_of_month() {
        assert_eq!(end_of_month(date(2026, 8, 21)), date(2026, 8, 31));
        assert_eq!(end_of_month(date(2026, 12, 3)), date(2026, 12, 31));
        assert_eq!(end_of_month(date(2026, 2, 10)), date(2026, 2, 28));
    }
}
