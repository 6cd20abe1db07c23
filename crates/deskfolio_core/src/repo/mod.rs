//! Repository layer: SQLite persistence behind use-case oriented traits.
//!
//! # Responsibility
//! - Define data access contracts for desktops, items, content, dock,
//!   view settings and the unlock ledger.
//! - Keep SQL details and transaction scoping inside the repository boundary.
//!
//! # Invariants
//! - Repositories are built over one migrated connection (`try_new` checks it).
//! - Multi-row writes run in one `IMMEDIATE` transaction; any failing row
//!   rolls the whole batch back.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::{schema_version, table_exists, table_has_column, DbError};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod content_repo;
pub mod desktop_repo;
pub mod dock_repo;
pub mod item_repo;
pub mod unlock_repo;
pub mod view_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-level failures.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target row does not exist in the expected scope.
    NotFound { entity: &'static str, id: Uuid },
    /// Per-desktop cap would be exceeded.
    LimitReached { entity: &'static str, max: usize },
    /// Unique constraint rejected the write.
    UniqueViolation(&'static str),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::LimitReached { entity, max } => {
                write!(f, "{entity} limit of {max} reached")
            }
            Self::UniqueViolation(what) => write!(f, "duplicate {what}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "repository requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Checks schema version and the presence of `table` with `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }
    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

/// Applies `(id, sort_order)` rows with `update_sql`, failing on the first
/// row that matches nothing.
///
/// `update_sql` binds `?1 = id`, `?2 = sort_order`, `?3 = scope id`. Callers
/// run this inside a transaction so a failure leaves every row untouched.
pub(crate) fn apply_order_rows(
    conn: &Connection,
    update_sql: &str,
    entity: &'static str,
    scope: Uuid,
    rows: &[(Uuid, i64)],
) -> RepoResult<()> {
    let mut stmt = conn.prepare(update_sql)?;
    for (id, order) in rows {
        let changed = stmt.execute(params![id.to_string(), order, scope.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity, id: *id });
        }
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T, column: &'static str) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode {column}: {err}")))
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned>(
    value: &str,
    column: &'static str,
) -> RepoResult<T> {
    serde_json::from_str(value)
        .map_err(|err| RepoError::InvalidData(format!("invalid json in {column}: {err}")))
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation
                && (code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}
