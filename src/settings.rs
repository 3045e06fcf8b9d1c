//! Pause mode: a date window during which the outreach streak is frozen.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::clock::parse_date;
use crate::gamification::EngineError;

/// Singleton pause settings.
#[derive(Debug, Clone, Default)]
pub struct UserSettings {
    pub pause_active: bool,
    pub pause_start: Option<NaiveDate>,
    pub pause_end: Option<NaiveDate>,
    pub pause_reason: Option<String>,
}

/// Store for the singleton `user_settings` row.
pub struct SettingsStore<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Fetch the settings row, creating it on first access.
    pub fn get_or_create(&self) -> Result<UserSettings, EngineError> {
        self.conn
            .execute("INSERT OR IGNORE INTO user_settings (id) VALUES (1)", [])?;
        let settings = self
            .conn
            .query_row(
                "SELECT pause_active, pause_start, pause_end, pause_reason
                 FROM user_settings WHERE id = 1",
                [],
                |row| {
                    let start: Option<String> = row.get(1)?;
                    let end: Option<String> = row.get(2)?;
                    Ok(UserSettings {
                        pause_active: row.get::<_, i64>(0)? != 0,
                        pause_start: start.as_deref().and_then(parse_date),
                        pause_end: end.as_deref().and_then(parse_date),
                        pause_reason: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or(EngineError::MissingSingleton("user_settings"))?;
        Ok(settings)
    }

    /// Start a pause window.
    pub fn set_pause(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        reason: Option<&str>,
    ) -> Result<(), EngineError> {
        self.get_or_create()?;
        self.conn.execute(
            "UPDATE user_settings SET pause_active = 1, pause_start = ?1,
                    pause_end = ?2, pause_reason = ?3
             WHERE id = 1",
            params![start.to_string(), end.to_string(), reason],
        )?;
        info!(%start, %end, "pause started");
        Ok(())
    }

    /// End the pause immediately.
    pub fn clear_pause(&self) -> Result<(), EngineError> {
        self.get_or_create()?;
        self.conn.execute(
            "UPDATE user_settings SET pause_active = 0, pause_start = NULL,
                    pause_end = NULL, pause_reason = NULL
             WHERE id = 1",
            [],
        )?;
        Ok(())
    }

    /// Whether the pause covers `today`. Call [`check_pause_expiry`] first so
    /// a lapsed pause has been cleared.
    ///
    /// [`check_pause_expiry`]: SettingsStore::check_pause_expiry
    pub fn is_paused(&self, today: NaiveDate) -> Result<bool, EngineError> {
        let settings = self.get_or_create()?;
        if !settings.pause_active {
            return Ok(false);
        }
        Ok(match settings.pause_end {
            Some(end) => today <= end,
            None => true,
        })
    }

    /// Expire a lapsed pause: clear it and pull the streak's
    /// `last_outreach_date` forward to the pause end so the frozen streak
    /// survives the gap.
    pub fn check_pause_expiry(&self, today: NaiveDate) -> Result<(), EngineError> {
        let settings = self.get_or_create()?;
        let Some(end) = settings.pause_end else {
            return Ok(());
        };
        if !settings.pause_active || today <= end {
            return Ok(());
        }
        self.clear_pause()?;
        self.conn.execute(
            "UPDATE user_stats SET last_outreach_date = ?1
             WHERE id = 1 AND (last_outreach_date IS NULL OR last_outreach_date < ?1)",
            params![end.to_string()],
        )?;
        info!(pause_end = %end, "pause expired");
        Ok(())
    }
}
