//! View settings persistence and consistent projection snapshots.
//!
//! # Invariants
//! - Desktops without a stored row read as `ViewSettings::defaults`.
//! - `load_snapshot` reads desktop, items, dock and settings inside one
//!   deferred transaction so a projection never mixes two tree states.

use crate::model::desktop::DesktopId;
use crate::model::view::{clamp_present_delay, PresentWrap, ViewMode, ViewSettings};
use crate::projection::snapshot::TreeSnapshot;
use crate::repo::desktop_repo::{DesktopRepository, SqliteDesktopRepository};
use crate::repo::dock_repo::{DockRepository, SqliteDockRepository};
use crate::repo::item_repo::list_desktop_items;
use crate::repo::{
    bool_to_int, ensure_connection_ready, from_json, parse_flag, to_json, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for view settings and snapshots.
pub trait ViewRepository {
    fn get_view_settings(&self, desktop_id: DesktopId) -> RepoResult<ViewSettings>;
    /// Upserts the whole settings row.
    fn save_view_settings(&self, settings: &ViewSettings) -> RepoResult<()>;
    /// Loads everything a projection needs from one read transaction.
    fn load_snapshot(&self, desktop_id: DesktopId) -> RepoResult<TreeSnapshot>;
}

/// SQLite-backed view repository.
pub struct SqliteViewRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteViewRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "view_settings",
            &[
                "desktop_uuid",
                "active_mode",
                "page_order_json",
                "present_order_json",
                "present_delay_ms",
                "present_wrap",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ViewRepository for SqliteViewRepository<'_> {
    fn get_view_settings(&self, desktop_id: DesktopId) -> RepoResult<ViewSettings> {
        load_view_settings(self.conn, desktop_id)
    }

    fn save_view_settings(&self, settings: &ViewSettings) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO view_settings (
                desktop_uuid,
                active_mode,
                page_order_json,
                present_order_json,
                present_auto,
                present_delay_ms,
                present_wrap
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(desktop_uuid) DO UPDATE SET
                active_mode = excluded.active_mode,
                page_order_json = excluded.page_order_json,
                present_order_json = excluded.present_order_json,
                present_auto = excluded.present_auto,
                present_delay_ms = excluded.present_delay_ms,
                present_wrap = excluded.present_wrap,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                settings.desktop_id.to_string(),
                settings.active_mode.as_str(),
                to_json(&settings.page_order, "view_settings.page_order_json")?,
                to_json(&settings.present_order, "view_settings.present_order_json")?,
                bool_to_int(settings.present_auto),
                clamp_present_delay(settings.present_delay_ms),
                settings.present_wrap.as_str(),
            ],
        )?;
        Ok(())
    }

    fn load_snapshot(&self, desktop_id: DesktopId) -> RepoResult<TreeSnapshot> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let desktop = SqliteDesktopRepository::try_new(&tx)?
            .get_desktop(desktop_id)?
            .ok_or(RepoError::NotFound {
                entity: "desktop",
                id: desktop_id,
            })?;
        let items = list_desktop_items(&tx, desktop_id)?;
        let dock = SqliteDockRepository::try_new(&tx)?.list_dock(desktop_id)?;
        let settings = load_view_settings(&tx, desktop_id)?;
        tx.commit()?;

        Ok(TreeSnapshot::new(desktop, items, dock, settings))
    }
}

fn load_view_settings(conn: &Connection, desktop_id: DesktopId) -> RepoResult<ViewSettings> {
    let row = conn
        .query_row(
            "SELECT
                active_mode,
                page_order_json,
                present_order_json,
                present_auto,
                present_delay_ms,
                present_wrap
             FROM view_settings
             WHERE desktop_uuid = ?1;",
            [desktop_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((mode, page_order, present_order, auto, delay, wrap)) = row else {
        return Ok(ViewSettings::defaults(desktop_id));
    };

    let active_mode = ViewMode::parse(&mode)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid active_mode `{mode}`")))?;
    let present_wrap = PresentWrap::parse(&wrap)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid present_wrap `{wrap}`")))?;
    let present_delay_ms = u32::try_from(delay)
        .map_err(|_| RepoError::InvalidData(format!("invalid present_delay_ms `{delay}`")))?;

    Ok(ViewSettings {
        desktop_id,
        active_mode,
        page_order: from_json(&page_order, "view_settings.page_order_json")?,
        present_order: from_json(&present_order, "view_settings.present_order_json")?,
        present_auto: parse_flag(auto, "view_settings.present_auto")?,
        present_delay_ms,
        present_wrap,
    })
}
