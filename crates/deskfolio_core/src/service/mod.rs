//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Run every ownership and structural check before the first write.
//! - Map failures onto the stable `ErrorCode` set returned to callers.

use crate::model::desktop::{Caller, Desktop, DesktopId};
use crate::model::item::{Item, ItemId};
use crate::model::validation::ValidationError;
use crate::projection::ProjectionError;
use crate::repo::desktop_repo::DesktopRepository;
use crate::repo::item_repo::ItemRepository;
use crate::repo::RepoError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod access_service;
pub mod content_service;
pub mod desktop_service;
pub mod dock_service;
pub mod ordering_service;
pub mod tree_service;
pub mod view_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Generic text surfaced for unexpected failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Stable error codes of the action surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    InvalidParent,
    LimitReached,
    Duplicate,
    ServerError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidParent => "INVALID_PARENT",
            Self::LimitReached => "LIMIT_REACHED",
            Self::Duplicate => "DUPLICATE",
            Self::ServerError => "SERVER_ERROR",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a parent was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidParentReason {
    Missing,
    NotAFolder,
    OtherDesktop,
    Cycle,
}

impl InvalidParentReason {
    fn describe(self) -> &'static str {
        match self {
            Self::Missing => "does not exist",
            Self::NotAFolder => "is not a folder",
            Self::OtherDesktop => "belongs to another desktop",
            Self::Cycle => "is the item itself or one of its descendants",
        }
    }
}

/// Errors from service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any write.
    Validation(ValidationError),
    /// No identity on an owner operation.
    Unauthorized,
    /// Identity present but not the desktop owner.
    Forbidden(DesktopId),
    /// Visitor lacks an unlock for a locked item.
    Locked(ItemId),
    NotFound {
        entity: &'static str,
        key: String,
    },
    InvalidParent {
        parent_id: ItemId,
        reason: InvalidParentReason,
    },
    LimitReached {
        entity: &'static str,
        max: usize,
    },
    Duplicate(&'static str),
    /// Visitor unlock targeted an item that is not locked.
    NotLocked(ItemId),
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) | Self::NotLocked(_) => ErrorCode::ValidationError,
            Self::Unauthorized => ErrorCode::Unauthorized,
            Self::Forbidden(_) | Self::Locked(_) => ErrorCode::Forbidden,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidParent { .. } => ErrorCode::InvalidParent,
            Self::LimitReached { .. } => ErrorCode::LimitReached,
            Self::Duplicate(_) => ErrorCode::Duplicate,
            Self::Repo(_) => ErrorCode::ServerError,
        }
    }

    /// Caller-facing message; internal failures collapse to a generic text.
    pub fn public_message(&self) -> String {
        match self {
            Self::Repo(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Unauthorized => write!(f, "authentication required"),
            Self::Forbidden(_) => write!(f, "caller does not own this desktop"),
            Self::Locked(id) => write!(f, "item {id} is locked"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::InvalidParent { parent_id, reason } => {
                write!(f, "parent {parent_id} {}", reason.describe())
            }
            Self::LimitReached { entity, max } => write!(f, "{entity} limit of {max} reached"),
            Self::Duplicate(what) => write!(f, "duplicate {what}"),
            Self::NotLocked(id) => write!(f, "item {id} is not locked"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::not_found(entity, id),
            RepoError::LimitReached { entity, max } => Self::LimitReached { entity, max },
            RepoError::UniqueViolation(what) => Self::Duplicate(what),
            other => Self::Repo(other),
        }
    }
}

impl From<ProjectionError> for ServiceError {
    fn from(value: ProjectionError) -> Self {
        match value {
            ProjectionError::FolderNotFound(id) => Self::not_found("folder", id),
            ProjectionError::NotAFolder(id) => Self::InvalidParent {
                parent_id: id,
                reason: InvalidParentReason::NotAFolder,
            },
            ProjectionError::SlideOutOfRange { index, .. } => Self::not_found("slide", index),
        }
    }
}

/// Loads a desktop and requires `caller` to own it.
pub(crate) fn require_owner<D: DesktopRepository>(
    desktops: &D,
    caller: &Caller,
    desktop_id: DesktopId,
) -> ServiceResult<Desktop> {
    if caller.account_id().is_none() {
        return Err(ServiceError::Unauthorized);
    }
    let desktop = desktops
        .get_desktop(desktop_id)?
        .ok_or_else(|| ServiceError::not_found("desktop", desktop_id))?;
    if !desktop.is_owned_by(caller) {
        return Err(ServiceError::Forbidden(desktop_id));
    }
    Ok(desktop)
}

/// Loads an item and requires `caller` to own its desktop.
pub(crate) fn require_item_owner<D: DesktopRepository, I: ItemRepository>(
    desktops: &D,
    items: &I,
    caller: &Caller,
    item_id: ItemId,
) -> ServiceResult<Item> {
    if caller.account_id().is_none() {
        return Err(ServiceError::Unauthorized);
    }
    let item = items
        .get_item(item_id)?
        .ok_or_else(|| ServiceError::not_found("item", item_id))?;
    require_owner(desktops, caller, item.desktop_id)?;
    Ok(item)
}
