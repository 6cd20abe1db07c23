//! Desktop repository contracts and SQLite implementation.
//!
//! # Invariants
//! - One desktop per owner account; creation is an upsert on `owner_id`.
//! - Handles are unique case-insensitively.

use crate::model::desktop::{Desktop, DesktopId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, is_unique_violation, parse_flag, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const DESKTOP_SELECT_SQL: &str = "SELECT
    desktop_uuid,
    owner_id,
    handle,
    theme_id,
    background,
    title,
    description,
    is_public,
    created_at,
    updated_at
FROM desktops";

/// Repository interface for desktops.
pub trait DesktopRepository {
    /// Returns the owner's desktop, creating it with `handle` when missing.
    fn ensure_desktop(&self, owner_id: &str, handle: &str) -> RepoResult<Desktop>;
    fn get_desktop(&self, id: DesktopId) -> RepoResult<Option<Desktop>>;
    fn find_by_owner(&self, owner_id: &str) -> RepoResult<Option<Desktop>>;
    fn find_by_handle(&self, handle: &str) -> RepoResult<Option<Desktop>>;
    /// Writes display settings of an existing desktop.
    fn update_desktop(&self, desktop: &Desktop) -> RepoResult<()>;
}

/// SQLite-backed desktop repository.
pub struct SqliteDesktopRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDesktopRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            "desktops",
            &["desktop_uuid", "owner_id", "handle", "is_public"],
        )?;
        Ok(Self { conn })
    }

    fn find_one(&self, filter: &str, value: &str) -> RepoResult<Option<Desktop>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DESKTOP_SELECT_SQL} WHERE {filter} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_desktop_row(row)?));
        }
        Ok(None)
    }
}

impl DesktopRepository for SqliteDesktopRepository<'_> {
    fn ensure_desktop(&self, owner_id: &str, handle: &str) -> RepoResult<Desktop> {
        let inserted = self.conn.execute(
            "INSERT INTO desktops (desktop_uuid, owner_id, handle)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(owner_id) DO NOTHING;",
            params![Uuid::new_v4().to_string(), owner_id, handle],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::UniqueViolation("desktop handle"));
            }
            Err(err) => return Err(err.into()),
        }

        self.find_by_owner(owner_id)?
            .ok_or_else(|| RepoError::InvalidData(format!("desktop for `{owner_id}` vanished")))
    }

    fn get_desktop(&self, id: DesktopId) -> RepoResult<Option<Desktop>> {
        self.find_one("desktop_uuid", &id.to_string())
    }

    fn find_by_owner(&self, owner_id: &str) -> RepoResult<Option<Desktop>> {
        self.find_one("owner_id", owner_id)
    }

    fn find_by_handle(&self, handle: &str) -> RepoResult<Option<Desktop>> {
        self.find_one("handle", handle)
    }

    fn update_desktop(&self, desktop: &Desktop) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE desktops
             SET theme_id = ?2,
                 background = ?3,
                 title = ?4,
                 description = ?5,
                 is_public = ?6,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE desktop_uuid = ?1;",
            params![
                desktop.id.to_string(),
                desktop.theme_id.as_str(),
                desktop.background.as_deref(),
                desktop.title.as_deref(),
                desktop.description.as_deref(),
                bool_to_int(desktop.is_public),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "desktop",
                id: desktop.id,
            });
        }
        Ok(())
    }
}

fn parse_desktop_row(row: &Row<'_>) -> RepoResult<Desktop> {
    Ok(Desktop {
        id: parse_uuid(&row.get::<_, String>("desktop_uuid")?, "desktops.desktop_uuid")?,
        owner_id: row.get("owner_id")?,
        handle: row.get("handle")?,
        theme_id: row.get("theme_id")?,
        background: row.get("background")?,
        title: row.get("title")?,
        description: row.get("description")?,
        is_public: parse_flag(row.get("is_public")?, "desktops.is_public")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
