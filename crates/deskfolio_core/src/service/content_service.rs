//! Tabs and blocks of one item.
//!
//! # Invariants
//! - A block lives either directly on its item or under one tab of the same
//!   item.
//! - Reorders stay within one container and are all-or-nothing.

use crate::model::content::{Block, BlockId, BlockPayload, ItemContent, Tab, TabContent, TabId};
use crate::model::desktop::Caller;
use crate::model::item::{Item, ItemId};
use crate::model::validation::{normalize_required, ValidationError, MAX_TITLE_CHARS};
use crate::repo::content_repo::ContentRepository;
use crate::repo::desktop_repo::DesktopRepository;
use crate::repo::item_repo::ItemRepository;
use crate::service::ordering_service::OrderRow;
use crate::service::{require_item_owner, ServiceError, ServiceResult};
use log::info;
use std::collections::HashSet;
use uuid::Uuid;

/// Content service facade.
pub struct ContentService<D: DesktopRepository, I: ItemRepository, C: ContentRepository> {
    desktops: D,
    items: I,
    content: C,
}

impl<D: DesktopRepository, I: ItemRepository, C: ContentRepository> ContentService<D, I, C> {
    pub fn new(desktops: D, items: I, content: C) -> Self {
        Self {
            desktops,
            items,
            content,
        }
    }

    pub fn add_tab(&self, caller: &Caller, item_id: ItemId, label: &str) -> ServiceResult<Tab> {
        self.owned_item(caller, item_id)?;
        let label = normalize_required(label, "label", MAX_TITLE_CHARS)?;
        let tab = self.content.insert_tab(item_id, &label)?;
        info!(
            "event=tab_add module=service status=ok item_id={} tab_id={}",
            item_id, tab.id
        );
        Ok(tab)
    }

    pub fn rename_tab(&self, caller: &Caller, tab_id: TabId, label: &str) -> ServiceResult<Tab> {
        self.owned_tab(caller, tab_id)?;
        let label = normalize_required(label, "label", MAX_TITLE_CHARS)?;
        self.content.rename_tab(tab_id, &label).map_err(Into::into)
    }

    /// Deletes a tab with all of its blocks.
    pub fn delete_tab(&self, caller: &Caller, tab_id: TabId) -> ServiceResult<()> {
        self.owned_tab(caller, tab_id)?;
        self.content.delete_tab(tab_id)?;
        info!("event=tab_delete module=service status=ok tab_id={}", tab_id);
        Ok(())
    }

    pub fn reorder_tabs(
        &self,
        caller: &Caller,
        item_id: ItemId,
        rows: &[OrderRow],
    ) -> ServiceResult<Vec<Tab>> {
        self.owned_item(caller, item_id)?;
        let pairs = unique_pairs(rows)?;
        self.content.apply_tab_orders(item_id, &pairs)?;
        self.content.list_tabs(item_id).map_err(Into::into)
    }

    /// Appends a block to the item, or to `tab_id` when given.
    pub fn add_block(
        &self,
        caller: &Caller,
        item_id: ItemId,
        tab_id: Option<TabId>,
        payload: BlockPayload,
    ) -> ServiceResult<Block> {
        self.owned_item(caller, item_id)?;
        if let Some(tab_id) = tab_id {
            self.tab_of_item(item_id, tab_id)?;
        }
        payload.validate()?;
        let block = self.content.insert_block(item_id, tab_id, &payload)?;
        info!(
            "event=block_add module=service status=ok item_id={} block_id={} type={}",
            item_id,
            block.id,
            payload.block_type()
        );
        Ok(block)
    }

    /// Replaces a block payload; the block may change type.
    pub fn update_block(
        &self,
        caller: &Caller,
        block_id: BlockId,
        payload: BlockPayload,
    ) -> ServiceResult<Block> {
        self.owned_block(caller, block_id)?;
        payload.validate()?;
        self.content
            .update_block_payload(block_id, &payload)
            .map_err(Into::into)
    }

    pub fn delete_block(&self, caller: &Caller, block_id: BlockId) -> ServiceResult<()> {
        self.owned_block(caller, block_id)?;
        self.content.delete_block(block_id)?;
        info!(
            "event=block_delete module=service status=ok block_id={}",
            block_id
        );
        Ok(())
    }

    /// Reorders blocks of one container; returns the item content re-read.
    pub fn reorder_blocks(
        &self,
        caller: &Caller,
        item_id: ItemId,
        tab_id: Option<TabId>,
        rows: &[OrderRow],
    ) -> ServiceResult<ItemContent> {
        let item = self.owned_item(caller, item_id)?;
        if let Some(tab_id) = tab_id {
            self.tab_of_item(item_id, tab_id)?;
        }
        let pairs = unique_pairs(rows)?;
        self.content.apply_block_orders(item_id, tab_id, &pairs)?;
        load_content(&self.content, item)
    }

    pub fn load_item_content(&self, caller: &Caller, item_id: ItemId) -> ServiceResult<ItemContent> {
        let item = self.owned_item(caller, item_id)?;
        load_content(&self.content, item)
    }

    fn owned_item(&self, caller: &Caller, item_id: ItemId) -> ServiceResult<Item> {
        require_item_owner(&self.desktops, &self.items, caller, item_id)
    }

    fn owned_tab(&self, caller: &Caller, tab_id: TabId) -> ServiceResult<Tab> {
        let tab = self
            .content
            .get_tab(tab_id)?
            .ok_or_else(|| ServiceError::not_found("tab", tab_id))?;
        self.owned_item(caller, tab.item_id)?;
        Ok(tab)
    }

    fn owned_block(&self, caller: &Caller, block_id: BlockId) -> ServiceResult<Block> {
        let block = self
            .content
            .get_block(block_id)?
            .ok_or_else(|| ServiceError::not_found("block", block_id))?;
        self.owned_item(caller, block.item_id)?;
        Ok(block)
    }

    fn tab_of_item(&self, item_id: ItemId, tab_id: TabId) -> ServiceResult<Tab> {
        self.content
            .get_tab(tab_id)?
            .filter(|tab| tab.item_id == item_id)
            .ok_or_else(|| ServiceError::not_found("tab", tab_id))
    }
}

/// Groups an item's tabs and blocks into render order.
pub(crate) fn load_content<C: ContentRepository>(
    content: &C,
    item: Item,
) -> ServiceResult<ItemContent> {
    let tabs = content.list_tabs(item.id)?;
    let mut blocks = content.list_blocks(item.id)?;
    blocks.sort_by_key(|block| (block.order, block.id));

    let top_level = blocks
        .iter()
        .filter(|block| block.tab_id.is_none())
        .cloned()
        .collect();
    let tabs = tabs
        .into_iter()
        .map(|tab| {
            let tab_blocks = blocks
                .iter()
                .filter(|block| block.tab_id == Some(tab.id))
                .cloned()
                .collect();
            TabContent {
                tab,
                blocks: tab_blocks,
            }
        })
        .collect();

    Ok(ItemContent {
        item,
        blocks: top_level,
        tabs,
    })
}

fn unique_pairs(rows: &[OrderRow]) -> ServiceResult<Vec<(Uuid, i64)>> {
    if rows.is_empty() {
        return Err(ValidationError::EmptyBatch.into());
    }
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.id) {
            return Err(ValidationError::DuplicateId(row.id).into());
        }
    }
    Ok(rows.iter().map(|row| (row.id, row.order)).collect())
}
