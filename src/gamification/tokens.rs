//! Token balance and transaction ledger.
//!
//! The `user_tokens` row is a denormalized cache of the `token_transactions`
//! sum; every balance change writes both inside one transaction.

use chrono::{DateTime, FixedOffset};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::clock::parse_datetime;
use crate::gamification::types::{RewardItem, TokenTransaction};
use crate::gamification::EngineError;

/// Store for the token balance and ledger.
pub struct TokenLedger<'a> {
    conn: &'a Connection,
}

impl<'a> TokenLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Current balance, creating the row on first access.
    pub fn balance(&self) -> Result<i64, EngineError> {
        self.conn
            .execute("INSERT OR IGNORE INTO user_tokens (id, total_tokens) VALUES (1, 0)", [])?;
        let balance = self.conn.query_row(
            "SELECT total_tokens FROM user_tokens WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(balance)
    }

    /// Credit tokens and append a ledger entry atomically.
    ///
    /// With a `bonus_key`, the grant is idempotent; returns the amount
    /// actually credited (zero when the key already existed).
    pub fn add_tokens(
        &self,
        amount: i64,
        reason: &str,
        bonus_key: Option<&str>,
        now: DateTime<FixedOffset>,
    ) -> Result<i64, EngineError> {
        self.balance()?;
        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO token_transactions (amount, reason, bonus_key, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![amount, reason, bonus_key, now.to_rfc3339()],
        )?;
        if inserted == 0 {
            return Ok(0);
        }
        tx.execute(
            "UPDATE user_tokens SET total_tokens = total_tokens + ?1 WHERE id = 1",
            params![amount],
        )?;
        tx.commit()?;
        Ok(amount)
    }

    /// Debit tokens; returns `false` and leaves the balance unchanged when it
    /// would go negative.
    pub fn spend_tokens(
        &self,
        amount: i64,
        reason: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<bool, EngineError> {
        if self.balance()? < amount {
            return Ok(false);
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO token_transactions (amount, reason, created_at) VALUES (?1, ?2, ?3)",
            params![-amount, reason, now.to_rfc3339()],
        )?;
        tx.execute(
            "UPDATE user_tokens SET total_tokens = total_tokens - ?1 WHERE id = 1",
            params![amount],
        )?;
        tx.commit()?;
        debug!(amount, reason, "tokens spent");
        Ok(true)
    }

    /// Redeem a shop item, spending its cost.
    pub fn redeem(
        &self,
        item_id: i64,
        now: DateTime<FixedOffset>,
    ) -> Result<bool, EngineError> {
        let item = self.get_item(item_id)?.ok_or(EngineError::ItemNotFound(item_id))?;
        if !item.is_active {
            return Err(EngineError::ItemNotFound(item_id));
        }
        self.spend_tokens(item.cost, &format!("redeem:{}", item.name), now)
    }

    /// A shop item by id.
    pub fn get_item(&self, id: i64) -> Result<Option<RewardItem>, EngineError> {
        use rusqlite::OptionalExtension;
        self.conn
            .query_row(
                "SELECT id, name, cost, description, is_active FROM reward_items WHERE id = ?1",
                params![id],
                parse_item_row,
            )
            .optional()
            .map_err(EngineError::from)
    }

    /// Active shop items, cheapest first.
    pub fn list_items(&self) -> Result<Vec<RewardItem>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, cost, description, is_active
             FROM reward_items WHERE is_active = 1 ORDER BY cost ASC",
        )?;
        let rows = stmt.query_map([], parse_item_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }

    /// Recent ledger entries, newest first.
    pub fn recent_transactions(&self, limit: i64) -> Result<Vec<TokenTransaction>, EngineError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, amount, reason, bonus_key, created_at
             FROM token_transactions ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let created_str: String = row.get(4)?;
            Ok(TokenTransaction {
                id: row.get(0)?,
                amount: row.get(1)?,
                reason: row.get(2)?,
                bonus_key: row.get(3)?,
                created_at: parse_datetime(&created_str)
                    .unwrap_or_else(|| chrono::Utc::now().fixed_offset()),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(EngineError::from)
    }
}

fn parse_item_row(row: &rusqlite::Row) -> rusqlite::Result<RewardItem> {
    Ok(RewardItem {
        id: row.get(0)?,
        name: row.get(1)?,
        cost: row.get(2)?,
        description: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
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

    #[test]
    fn test_add_and_spend() {
        let db = Database::open_in_memory().unwrap();
        let ledger = TokenLedger::new(db.connection());
        let now = test_now();

        assert_eq!(ledger.balance().unwrap(), 0);
        ledger.add_tokens(10, "outreach_log", None, now).unwrap();
        assert_eq!(ledger.balance().unwrap(), 10);

        assert!(ledger.spend_tokens(4, "redeem:coffee", now).unwrap());
        assert_eq!(ledger.balance().unwrap(), 6);
    }

    #[test]
    fn test_overspend_leaves_balance_unchanged() {
        let db = Database::open_in_memory().unwrap();
        let ledger = TokenLedger::new(db.connection());
        let now = test_now();

        ledger.add_tokens(5, "outreach_log", None, now).unwrap();
        assert!(!ledger.spend_tokens(6, "redeem:coffee", now).unwrap());
        assert_eq!(ledger.balance().unwrap(), 5);

        // no spend entry was appended
        let entries: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM token_transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_bonus_key_grants_once() {
        let db = Database::open_in_memory().unwrap();
        let ledger = TokenLedger::new(db.connection());
        let now = test_now();

        assert_eq!(ledger.add_tokens(5, "streak_bonus", Some("streak_tokens_7"), now).unwrap(), 5);
        assert_eq!(ledger.add_tokens(5, "streak_bonus", Some("streak_tokens_7"), now).unwrap(), 0);
        assert_eq!(ledger.balance().unwrap(), 5);
    }

    #[test]
    fn test_redeem_unknown_item() {
        let db = Database::open_in_memory().unwrap();
        let ledger = TokenLedger::new(db.connection());
        let result = ledger.redeem(42, test_now());
        assert!(matches!(result, Err(EngineError::ItemNotFound(42))));
    }
}
