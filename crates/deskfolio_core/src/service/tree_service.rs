//! Item tree use-case service.
//!
//! # Responsibility
//! - Validate tree hierarchy invariants above the repository layer.
//! - Provide item create, update, move, delete and list operations.
//!
//! # Invariants
//! - A parent must exist, be a folder, and live on the same desktop.
//! - Move operations must not create parent-child cycles.
//! - Quotas are per desktop and per variant.

use crate::config::CoreLimits;
use crate::model::desktop::{Caller, DesktopId};
use crate::model::item::{Item, ItemId, ItemKind, ItemPatch, NewItem};
use crate::model::validation::ValidationError;
use crate::repo::desktop_repo::DesktopRepository;
use crate::repo::item_repo::{DeleteMode, ItemRepository};
use crate::service::{
    require_item_owner, require_owner, InvalidParentReason, ServiceError, ServiceResult,
};
use log::info;
use std::collections::HashSet;

/// Item tree service facade.
pub struct TreeService<D: DesktopRepository, I: ItemRepository> {
    desktops: D,
    items: I,
    limits: CoreLimits,
}

impl<D: DesktopRepository, I: ItemRepository> TreeService<D, I> {
    pub fn new(desktops: D, items: I, limits: CoreLimits) -> Self {
        Self {
            desktops,
            items,
            limits,
        }
    }

    /// Creates one item appended after its siblings.
    pub fn create_item(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        input: NewItem,
    ) -> ServiceResult<Item> {
        require_owner(&self.desktops, caller, desktop_id)?;
        let item = input.into_item(desktop_id)?;
        if let Some(parent_id) = item.parent_id {
            self.ensure_parent_is_folder(desktop_id, parent_id)?;
        }

        let created = self.items.insert_item(&item, self.quota_for(item.kind))?;
        info!(
            "event=item_create module=service status=ok desktop_id={} item_id={} variant={} order={}",
            desktop_id,
            created.id,
            created.kind.variant_str(),
            created.order
        );
        Ok(created)
    }

    /// Merges a partial patch; explicit `null` clears, omitted fields stay.
    pub fn update_item(
        &self,
        caller: &Caller,
        item_id: ItemId,
        patch: ItemPatch,
    ) -> ServiceResult<Item> {
        let mut item = require_item_owner(&self.desktops, &self.items, caller, item_id)?;
        item.apply_patch(patch)?;
        self.items.update_item(&item)?;
        info!(
            "event=item_update module=service status=ok item_id={}",
            item_id
        );
        self.load(item_id)
    }

    /// Reparents an item (root when `new_parent_id` is `None`).
    pub fn move_item(
        &self,
        caller: &Caller,
        item_id: ItemId,
        new_parent_id: Option<ItemId>,
    ) -> ServiceResult<Item> {
        let item = require_item_owner(&self.desktops, &self.items, caller, item_id)?;
        if let Some(parent_id) = new_parent_id {
            if parent_id == item_id {
                return Err(ServiceError::InvalidParent {
                    parent_id,
                    reason: InvalidParentReason::Cycle,
                });
            }
            self.ensure_parent_is_folder(item.desktop_id, parent_id)?;
            if self.would_create_cycle(item_id, parent_id)? {
                return Err(ServiceError::InvalidParent {
                    parent_id,
                    reason: InvalidParentReason::Cycle,
                });
            }
        }

        let moved = self.items.move_item(item_id, new_parent_id)?;
        info!(
            "event=item_move module=service status=ok item_id={} parent_id={} order={}",
            item_id,
            new_parent_id.map_or_else(|| "root".to_string(), |id| id.to_string()),
            moved.order
        );
        Ok(moved)
    }

    /// Deletes an item; returns how many items were removed.
    pub fn delete_item(
        &self,
        caller: &Caller,
        item_id: ItemId,
        mode: DeleteMode,
    ) -> ServiceResult<usize> {
        let item = require_item_owner(&self.desktops, &self.items, caller, item_id)?;
        if mode == DeleteMode::Dissolve && !item.is_folder() {
            return Err(ValidationError::UnsupportedForKind {
                field: "dissolve",
                kind: item.kind.label(),
            }
            .into());
        }

        let removed = self.items.delete_item(item_id, mode)?;
        info!(
            "event=item_delete module=service status=ok item_id={} mode={:?} removed={}",
            item_id, mode, removed
        );
        Ok(removed)
    }

    pub fn get_item(&self, caller: &Caller, item_id: ItemId) -> ServiceResult<Item> {
        require_item_owner(&self.desktops, &self.items, caller, item_id)
    }

    /// Lists children of `parent_id` (root when `None`) in sibling order.
    pub fn list_children(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        parent_id: Option<ItemId>,
    ) -> ServiceResult<Vec<Item>> {
        require_owner(&self.desktops, caller, desktop_id)?;
        if let Some(parent_id) = parent_id {
            self.ensure_parent_is_folder(desktop_id, parent_id)?;
        }
        self.items
            .list_children(desktop_id, parent_id)
            .map_err(Into::into)
    }

    pub fn list_items(&self, caller: &Caller, desktop_id: DesktopId) -> ServiceResult<Vec<Item>> {
        require_owner(&self.desktops, caller, desktop_id)?;
        self.items
            .list_desktop_items(desktop_id)
            .map_err(Into::into)
    }

    fn quota_for(&self, kind: ItemKind) -> usize {
        match kind {
            ItemKind::DesktopIcon => self.limits.max_desktop_icons,
            ItemKind::ContentFile(_) => self.limits.max_content_files,
        }
    }

    fn load(&self, item_id: ItemId) -> ServiceResult<Item> {
        self.items
            .get_item(item_id)?
            .ok_or_else(|| ServiceError::not_found("item", item_id))
    }

    fn ensure_parent_is_folder(
        &self,
        desktop_id: DesktopId,
        parent_id: ItemId,
    ) -> ServiceResult<()> {
        let parent = self
            .items
            .get_item(parent_id)?
            .ok_or(ServiceError::InvalidParent {
                parent_id,
                reason: InvalidParentReason::Missing,
            })?;
        if parent.desktop_id != desktop_id {
            return Err(ServiceError::InvalidParent {
                parent_id,
                reason: InvalidParentReason::OtherDesktop,
            });
        }
        if !parent.is_folder() {
            return Err(ServiceError::InvalidParent {
                parent_id,
                reason: InvalidParentReason::NotAFolder,
            });
        }
        Ok(())
    }

    /// Walks ancestors of `candidate_parent_id` up to the root looking for
    /// `item_id`. A revisited node also counts as a cycle.
    fn would_create_cycle(
        &self,
        item_id: ItemId,
        candidate_parent_id: ItemId,
    ) -> ServiceResult<bool> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == item_id {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Ok(true);
            }

            let node = self
                .items
                .get_item(current)?
                .ok_or(ServiceError::InvalidParent {
                    parent_id: current,
                    reason: InvalidParentReason::Missing,
                })?;
            cursor = node.parent_id;
        }
        Ok(false)
    }
}
