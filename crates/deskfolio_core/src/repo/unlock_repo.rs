//! Desktop-scoped unlock ledger.
//!
//! # Invariants
//! - One row per `(email, desktop)`; repeated unlocks only refresh
//!   `last_seen_at`.

use crate::model::desktop::DesktopId;
use crate::model::item::ItemId;
use crate::model::visitor::VisitorEmail;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockGrant {
    pub email: String,
    pub desktop_id: DesktopId,
    /// Item that triggered the first unlock.
    pub first_item_id: ItemId,
    pub unlocked_at: i64,
    pub last_seen_at: i64,
}

/// Repository interface for the unlock ledger.
pub trait UnlockRepository {
    /// Records an unlock; idempotent per `(email, desktop)`.
    fn record_unlock(
        &self,
        email: &VisitorEmail,
        desktop_id: DesktopId,
        item_id: ItemId,
        now_ms: i64,
    ) -> RepoResult<UnlockGrant>;
    fn is_unlocked(&self, email: &VisitorEmail, desktop_id: DesktopId) -> RepoResult<bool>;
    fn get_grant(
        &self,
        email: &VisitorEmail,
        desktop_id: DesktopId,
    ) -> RepoResult<Option<UnlockGrant>>;
}

/// SQLite-backed unlock ledger.
pub struct SqliteUnlockRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUnlockRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "unlock_ledger",
            &["email", "desktop_uuid", "first_item_uuid", "last_seen_at"],
        )?;
        Ok(Self { conn })
    }
}

impl UnlockRepository for SqliteUnlockRepository<'_> {
    fn record_unlock(
        &self,
        email: &VisitorEmail,
        desktop_id: DesktopId,
        item_id: ItemId,
        now_ms: i64,
    ) -> RepoResult<UnlockGrant> {
        self.conn.execute(
            "INSERT INTO unlock_ledger (
                email,
                desktop_uuid,
                first_item_uuid,
                unlocked_at,
                last_seen_at
            ) VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(email, desktop_uuid) DO UPDATE SET
                last_seen_at = excluded.last_seen_at;",
            params![
                email.as_str(),
                desktop_id.to_string(),
                item_id.to_string(),
                now_ms
            ],
        )?;
        self.get_grant(email, desktop_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "unlock for desktop {desktop_id} was not persisted"
            ))
        })
    }

    fn is_unlocked(&self, email: &VisitorEmail, desktop_id: DesktopId) -> RepoResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM unlock_ledger WHERE email = ?1 AND desktop_uuid = ?2;",
                params![email.as_str(), desktop_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_grant(
        &self,
        email: &VisitorEmail,
        desktop_id: DesktopId,
    ) -> RepoResult<Option<UnlockGrant>> {
        let row = self
            .conn
            .query_row(
                "SELECT email, desktop_uuid, first_item_uuid, unlocked_at, last_seen_at
                 FROM unlock_ledger
                 WHERE email = ?1 AND desktop_uuid = ?2;",
                params![email.as_str(), desktop_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(email, desktop, item, unlocked_at, last_seen_at)| {
            Ok(UnlockGrant {
                email,
                desktop_id: parse_uuid(&desktop, "unlock_ledger.desktop_uuid")?,
                first_item_id: parse_uuid(&item, "unlock_ledger.first_item_uuid")?,
                unlocked_at,
                last_seen_at,
            })
        })
        .transpose()
    }
}
