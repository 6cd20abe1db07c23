//! Batch ordering across the three order spaces.
//!
//! # Responsibility
//! - Sibling order within one parent, spatial position on the canvas, and
//!   dock order.
//!
//! # Invariants
//! - A batch is validated in full before the repository sees it.
//! - The repository applies each batch in one transaction; a failing row
//!   leaves every row untouched.
//! - Coordinates are clamped to `[0, 100]`, never rejected for range.

use crate::config::CoreLimits;
use crate::model::desktop::{Caller, DesktopId};
use crate::model::dock::{DockItem, DockItemId};
use crate::model::item::{Item, ItemId, Position};
use crate::model::validation::ValidationError;
use crate::repo::desktop_repo::DesktopRepository;
use crate::repo::dock_repo::DockRepository;
use crate::repo::item_repo::{ItemRepository, PositionUpdate};
use crate::service::{require_item_owner, require_owner, ServiceError, ServiceResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// One row of a sibling or dock reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: Uuid,
    pub order: i64,
}

/// One row of a reposition batch. Coordinates are clamped on write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub id: ItemId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub order: Option<i64>,
}

/// Ordering service facade.
pub struct OrderingService<D: DesktopRepository, I: ItemRepository, K: DockRepository> {
    desktops: D,
    items: I,
    dock: K,
    limits: CoreLimits,
}

impl<D: DesktopRepository, I: ItemRepository, K: DockRepository> OrderingService<D, I, K> {
    pub fn new(desktops: D, items: I, dock: K, limits: CoreLimits) -> Self {
        Self {
            desktops,
            items,
            dock,
            limits,
        }
    }

    /// Rewrites sibling orders of one parent; returns the siblings re-read in
    /// order.
    pub fn reorder_siblings(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        rows: &[OrderRow],
    ) -> ServiceResult<Vec<Item>> {
        require_owner(&self.desktops, caller, desktop_id)?;
        check_batch(rows.iter().map(|row| row.id), rows.len(), self.max_items())?;

        let mut parent = None;
        for (index, row) in rows.iter().enumerate() {
            let item = self.item_on_desktop(desktop_id, row.id)?;
            if index == 0 {
                parent = item.parent_id;
            } else if item.parent_id != parent {
                return Err(ValidationError::MixedParents.into());
            }
        }

        let pairs: Vec<(ItemId, i64)> = rows.iter().map(|row| (row.id, row.order)).collect();
        self.items.apply_sibling_orders(desktop_id, &pairs)?;
        info!(
            "event=siblings_reorder module=service status=ok desktop_id={} rows={}",
            desktop_id,
            rows.len()
        );
        self.items
            .list_children(desktop_id, parent)
            .map_err(Into::into)
    }

    /// Writes clamped positions (and optional orders); returns every item of
    /// the desktop in order.
    pub fn reposition_items(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        rows: &[PositionRow],
    ) -> ServiceResult<Vec<Item>> {
        require_owner(&self.desktops, caller, desktop_id)?;
        check_batch(rows.iter().map(|row| row.id), rows.len(), self.max_items())?;

        let mut updates = Vec::with_capacity(rows.len());
        for row in rows {
            self.item_on_desktop(desktop_id, row.id)?;
            updates.push(PositionUpdate {
                id: row.id,
                position: Position::clamped(row.x, row.y)?,
                order: row.order,
            });
        }

        self.items.apply_positions(desktop_id, &updates)?;
        info!(
            "event=items_reposition module=service status=ok desktop_id={} rows={}",
            desktop_id,
            rows.len()
        );
        self.items
            .list_desktop_items(desktop_id)
            .map_err(Into::into)
    }

    /// Rewrites dock orders; returns the dock re-read in order.
    pub fn reorder_dock(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        rows: &[OrderRow],
    ) -> ServiceResult<Vec<DockItem>> {
        require_owner(&self.desktops, caller, desktop_id)?;
        check_batch(
            rows.iter().map(|row| row.id),
            rows.len(),
            self.limits.max_dock_items,
        )?;

        let pairs: Vec<(DockItemId, i64)> = rows.iter().map(|row| (row.id, row.order)).collect();
        self.dock.apply_dock_orders(desktop_id, &pairs)?;
        info!(
            "event=dock_reorder module=service status=ok desktop_id={} rows={}",
            desktop_id,
            rows.len()
        );
        self.dock.list_dock(desktop_id).map_err(Into::into)
    }

    /// Paints one item above every other item of its desktop.
    pub fn bring_to_front(&self, caller: &Caller, item_id: ItemId) -> ServiceResult<Item> {
        let item = require_item_owner(&self.desktops, &self.items, caller, item_id)?;
        let z_index = self.items.bring_to_front(item.desktop_id, item_id)?;
        info!(
            "event=item_focus module=service status=ok item_id={} z_index={}",
            item_id, z_index
        );
        self.items
            .get_item(item_id)?
            .ok_or_else(|| ServiceError::not_found("item", item_id))
    }

    fn max_items(&self) -> usize {
        self.limits.max_desktop_icons + self.limits.max_content_files
    }

    fn item_on_desktop(&self, desktop_id: DesktopId, item_id: ItemId) -> ServiceResult<Item> {
        self.items
            .get_item(item_id)?
            .filter(|item| item.desktop_id == desktop_id)
            .ok_or_else(|| ServiceError::not_found("item", item_id))
    }
}

/// Rejects empty, oversized, and duplicate-id batches.
fn check_batch(
    ids: impl Iterator<Item = Uuid>,
    len: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if len == 0 {
        return Err(ValidationError::EmptyBatch);
    }
    if len > max {
        return Err(ValidationError::BatchTooLarge { len, max });
    }
    let mut seen = HashSet::with_capacity(len);
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId(id));
        }
    }
    Ok(())
}
