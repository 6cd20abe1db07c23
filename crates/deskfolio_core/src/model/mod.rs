//! Domain model for desktops, their item tree and the visitor-facing settings.
//!
//! # Responsibility
//! - Define canonical data structures used by services and projections.
//! - Own field-level validation so every write path shares one rule set.
//!
//! # Invariants
//! - Every item, tab, block and dock entry is identified by a stable UUID.
//! - Spatial coordinates are clamped into `[0, 100]` before they reach storage.
//! - Partial updates distinguish "leave as is" from "clear" (see [`patch::Patch`]).

pub mod content;
pub mod desktop;
pub mod dock;
pub mod item;
pub mod patch;
pub mod validation;
pub mod view;
pub mod visitor;
