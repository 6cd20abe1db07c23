//! Request/response action surface for Deskfolio.
//!
//! # Responsibility
//! - Own the process connection and build core services per call.
//! - Wrap every outcome in the uniform `ActionResponse` envelope.
//!
//! # Invariants
//! - Actions never panic and never leak internal error detail.

pub mod api;
pub mod config;
pub mod envelope;

pub use api::{core_version, ping, ApiInitError, DeskApi};
pub use config::ApiConfig;
pub use envelope::{ActionError, ActionResponse};
