//! Publish/draft and free/locked state machine plus the visitor email gate.
//!
//! # Responsibility
//! - Owner-side transitions: publish, unpublish, lock, unlock.
//! - Visitor-side unlock against the desktop-scoped ledger.
//!
//! # Invariants
//! - `publish` always stamps `published_at = now`, also on re-publish.
//! - `unpublish` keeps the last `published_at`.
//! - A ledger row unlocks every locked item of its desktop for that email.
//! - Drafts do not exist for visitors (`NOT_FOUND`).

use crate::model::content::ItemContent;
use crate::model::desktop::{Caller, DesktopId};
use crate::model::item::{AccessLevel, Item, ItemId, PublishStatus};
use crate::model::visitor::VisitorEmail;
use crate::repo::content_repo::ContentRepository;
use crate::repo::desktop_repo::DesktopRepository;
use crate::repo::item_repo::ItemRepository;
use crate::repo::unlock_repo::UnlockRepository;
use crate::service::content_service::load_content;
use crate::service::desktop_service::resolve_handle;
use crate::service::{require_item_owner, ServiceError, ServiceResult};
use crate::time::now_epoch_ms;
use log::info;

/// Access gate service facade.
pub struct AccessService<
    D: DesktopRepository,
    I: ItemRepository,
    C: ContentRepository,
    U: UnlockRepository,
> {
    desktops: D,
    items: I,
    content: C,
    unlocks: U,
}

impl<D, I, C, U> AccessService<D, I, C, U>
where
    D: DesktopRepository,
    I: ItemRepository,
    C: ContentRepository,
    U: UnlockRepository,
{
    pub fn new(desktops: D, items: I, content: C, unlocks: U) -> Self {
        Self {
            desktops,
            items,
            content,
            unlocks,
        }
    }

    /// `draft -> published`; re-publishing re-stamps `published_at`.
    pub fn publish(&self, caller: &Caller, item_id: ItemId) -> ServiceResult<Item> {
        let item = require_item_owner(&self.desktops, &self.items, caller, item_id)?;
        let stamp = Some(now_epoch_ms());
        let updated = self
            .items
            .set_publish_status(item_id, PublishStatus::Published, stamp)?;
        info!(
            "event=item_publish module=service status=ok item_id={} republish={}",
            item_id,
            item.is_published()
        );
        Ok(updated)
    }

    /// `published -> draft`; `published_at` is retained.
    pub fn unpublish(&self, caller: &Caller, item_id: ItemId) -> ServiceResult<Item> {
        require_item_owner(&self.desktops, &self.items, caller, item_id)?;
        let updated = self
            .items
            .set_publish_status(item_id, PublishStatus::Draft, None)?;
        info!(
            "event=item_unpublish module=service status=ok item_id={}",
            item_id
        );
        Ok(updated)
    }

    pub fn lock(&self, caller: &Caller, item_id: ItemId) -> ServiceResult<Item> {
        self.set_access(caller, item_id, AccessLevel::Locked)
    }

    pub fn unlock(&self, caller: &Caller, item_id: ItemId) -> ServiceResult<Item> {
        self.set_access(caller, item_id, AccessLevel::Free)
    }

    /// Verifies a locked item on the desktop behind `handle`, records the
    /// desktop-wide unlock for `email`, and returns the item content.
    pub fn visitor_unlock(
        &self,
        handle: &str,
        item_id: ItemId,
        email: &str,
    ) -> ServiceResult<ItemContent> {
        let email = VisitorEmail::parse(email)?;
        let desktop = resolve_handle(&self.desktops, &Caller::Anonymous, handle)?;
        let item = self
            .items
            .get_item(item_id)?
            .filter(|item| item.desktop_id == desktop.id && item.is_published())
            .ok_or_else(|| ServiceError::not_found("item", item_id))?;
        if !item.is_locked() {
            return Err(ServiceError::NotLocked(item_id));
        }

        let grant = self
            .unlocks
            .record_unlock(&email, desktop.id, item_id, now_epoch_ms())?;
        info!(
            "event=visitor_unlock module=service status=ok desktop_id={} item_id={} email={} unlocked_at={}",
            desktop.id,
            item_id,
            email.masked(),
            grant.unlocked_at
        );
        load_content(&self.content, item)
    }

    /// Ledger lookup; no expiry.
    pub fn is_unlocked(&self, email: &str, desktop_id: DesktopId) -> ServiceResult<bool> {
        let email = VisitorEmail::parse(email)?;
        self.unlocks
            .is_unlocked(&email, desktop_id)
            .map_err(Into::into)
    }

    /// Returns item content as `caller` may see it. Owners see everything;
    /// visitors need a published item and, when locked, a ledger row.
    pub fn fetch_item_for_visitor(
        &self,
        caller: &Caller,
        handle: &str,
        item_id: ItemId,
        email: Option<&str>,
    ) -> ServiceResult<ItemContent> {
        let desktop = resolve_handle(&self.desktops, caller, handle)?;
        let is_owner = desktop.is_owned_by(caller);
        let item = self
            .items
            .get_item(item_id)?
            .filter(|item| item.desktop_id == desktop.id && (is_owner || item.is_published()))
            .ok_or_else(|| ServiceError::not_found("item", item_id))?;

        if item.is_locked() && !is_owner {
            let email = match email {
                Some(raw) => VisitorEmail::parse(raw)?,
                None => return Err(ServiceError::Locked(item_id)),
            };
            if !self.unlocks.is_unlocked(&email, desktop.id)? {
                return Err(ServiceError::Locked(item_id));
            }
        }
        load_content(&self.content, item)
    }

    fn set_access(
        &self,
        caller: &Caller,
        item_id: ItemId,
        access_level: AccessLevel,
    ) -> ServiceResult<Item> {
        require_item_owner(&self.desktops, &self.items, caller, item_id)?;
        let updated = self.items.set_access_level(item_id, access_level)?;
        info!(
            "event=item_access module=service status=ok item_id={} access={}",
            item_id,
            access_level.as_str()
        );
        Ok(updated)
    }
}
