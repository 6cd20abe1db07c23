//! Dock repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most `max` dock entries per desktop; the cap is checked inside the
//!   insert transaction.
//! - `(desktop, action, target)` is unique.

use crate::model::desktop::DesktopId;
use crate::model::dock::{DockAction, DockItem, DockItemId, NewDockItem};
use crate::repo::{
    apply_order_rows, ensure_connection_ready, is_unique_violation, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const DOCK_SELECT_SQL: &str = "SELECT
    dock_uuid,
    desktop_uuid,
    icon,
    label,
    action,
    target,
    sort_order
FROM dock_items";

/// Repository interface for dock shortcuts.
pub trait DockRepository {
    /// Appends one dock entry, enforcing the per-desktop cap.
    fn insert_dock_item(
        &self,
        desktop_id: DesktopId,
        item: &NewDockItem,
        max: usize,
    ) -> RepoResult<DockItem>;
    fn get_dock_item(&self, id: DockItemId) -> RepoResult<Option<DockItem>>;
    fn delete_dock_item(&self, desktop_id: DesktopId, id: DockItemId) -> RepoResult<()>;
    fn list_dock(&self, desktop_id: DesktopId) -> RepoResult<Vec<DockItem>>;
    /// Applies dock orders atomically.
    fn apply_dock_orders(&self, desktop_id: DesktopId, rows: &[(DockItemId, i64)])
        -> RepoResult<()>;
}

/// SQLite-backed dock repository.
pub struct SqliteDockRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDockRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "dock_items",
            &["dock_uuid", "desktop_uuid", "action", "target", "sort_order"],
        )?;
        Ok(Self { conn })
    }
}

impl DockRepository for SqliteDockRepository<'_> {
    fn insert_dock_item(
        &self,
        desktop_id: DesktopId,
        item: &NewDockItem,
        max: usize,
    ) -> RepoResult<DockItem> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let (count, next_order): (i64, i64) = tx.query_row(
            "SELECT COUNT(*), COALESCE(MAX(sort_order), -1) + 1
             FROM dock_items
             WHERE desktop_uuid = ?1;",
            [desktop_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if usize::try_from(count).unwrap_or(usize::MAX) >= max {
            return Err(RepoError::LimitReached {
                entity: "dock item",
                max,
            });
        }

        let inserted = tx.execute(
            "INSERT INTO dock_items (
                dock_uuid,
                desktop_uuid,
                icon,
                label,
                action,
                target,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                desktop_id.to_string(),
                item.icon.as_str(),
                item.label.as_str(),
                item.action.as_str(),
                item.target.as_str(),
                next_order,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::UniqueViolation("dock action and target"));
            }
            Err(err) => return Err(err.into()),
        }
        tx.commit()?;

        self.get_dock_item(id)?.ok_or(RepoError::NotFound {
            entity: "dock item",
            id,
        })
    }

    fn get_dock_item(&self, id: DockItemId) -> RepoResult<Option<DockItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOCK_SELECT_SQL} WHERE dock_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_dock_row(row)?));
        }
        Ok(None)
    }

    fn delete_dock_item(&self, desktop_id: DesktopId, id: DockItemId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM dock_items WHERE dock_uuid = ?1 AND desktop_uuid = ?2;",
            params![id.to_string(), desktop_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "dock item",
                id,
            });
        }
        Ok(())
    }

    fn list_dock(&self, desktop_id: DesktopId) -> RepoResult<Vec<DockItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCK_SELECT_SQL}
             WHERE desktop_uuid = ?1
             ORDER BY sort_order ASC, dock_uuid ASC;"
        ))?;
        let mut rows = stmt.query([desktop_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_dock_row(row)?);
        }
        Ok(items)
    }

    fn apply_dock_orders(
        &self,
        desktop_id: DesktopId,
        rows: &[(DockItemId, i64)],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        apply_order_rows(
            &tx,
            "UPDATE dock_items
             SET sort_order = ?2
             WHERE dock_uuid = ?1
               AND desktop_uuid = ?3;",
            "dock item",
            desktop_id,
            rows,
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn parse_dock_row(row: &Row<'_>) -> RepoResult<DockItem> {
    let action_value: String = row.get("action")?;
    let action = DockAction::parse(&action_value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid dock action `{action_value}`"))
    })?;
    Ok(DockItem {
        id: parse_uuid(&row.get::<_, String>("dock_uuid")?, "dock_items.dock_uuid")?,
        desktop_id: parse_uuid(
            &row.get::<_, String>("desktop_uuid")?,
            "dock_items.desktop_uuid",
        )?,
        icon: row.get("icon")?,
        label: row.get("label")?,
        action,
        target: row.get("target")?,
        order: row.get("sort_order")?,
    })
}
