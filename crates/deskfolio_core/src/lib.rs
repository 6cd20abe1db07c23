//! Core domain logic for Deskfolio.
//! This crate is the single source of truth for tree, ordering, access and
//! projection invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod projection;
pub mod repo;
pub mod service;
pub mod time;

pub use config::CoreLimits;
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::desktop::{Caller, Desktop, DesktopId};
pub use model::item::{Item, ItemId, ItemKind, ItemPatch, NewItem};
pub use model::patch::Patch;
pub use projection::{ProjectedView, TreeSnapshot, ViewerAccess};
pub use repo::{RepoError, RepoResult};
pub use service::{ErrorCode, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
