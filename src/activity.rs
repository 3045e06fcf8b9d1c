//! Append-only activity feed.

use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection};

use crate::clock::parse_datetime;
use crate::gamification::EngineError;

/// One feed entry.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub id: i64,
    pub action_type: String,
    pub description: String,
    pub related_id: Option<i64>,
    pub related_kind: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
}

/// Store for the activity feed.
pub struct ActivityLog<'a> {
    conn: &'a Connection,
}

impl<'a> ActivityLog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append an entry.
    pub fn append(
        &self,
        action_type: &str,
        description: &str,
        related: Option<(i64, &str)>,
        now: DateTime<FixedOffset>,
    ) -> Result<i64, EngineError> {
        self.conn.execute(
            "INSERT INTO activity_log (action_type, description, related_id, related_kind, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                action_type,
                description,
                related.map(|(id, _)| id),
                related.map(|(_, kind)| kind),
                now.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Recent entries, newest first.
    pub fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, action_type, description, related_id, related_kind, timestamp
             FROM activity_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let ts_str: String = row.get(5)?;
            Ok(ActivityEntry {
                id: row.get(0)?,
                action_type: row.get(1)?,
                description: row.get(2)?,
                related_id: row.get(3)?,
                related_kind: row.get(4)?,
                timestamp: parse_datetime(&ts_str)
                    .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::Utc;

    #[test]
    fn test_append_and_recent() {
        let db = Database::open_in_memory().unwrap();
        let log = ActivityLog::new(db.connection());
        let now = Utc::now().fixed_offset();

        log.append("outreach_logged", "Emailed Jo's Bakery", Some((3, "lead")), now)
            .unwrap();
        log.append("task_completed", "Send proposal", None, now).unwrap();

        let entries = log.recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action_type, "task_completed");
        assert_eq!(entries[1].related_id, Some(3));
        assert_eq!(entries[1].related_kind.as_deref(), Some("lead"));
    }
}
