//! Desktop lifecycle and display settings.
//!
//! # Invariants
//! - One desktop per account, created lazily on first access.
//! - Private desktops resolve to `NOT_FOUND` for anyone but the owner.

use crate::model::desktop::{normalize_handle, Caller, Desktop, DesktopId, DesktopSettingsPatch};
use crate::repo::desktop_repo::DesktopRepository;
use crate::service::{require_owner, ServiceError, ServiceResult};
use log::info;

/// Desktop service facade.
pub struct DesktopService<D: DesktopRepository> {
    desktops: D,
}

impl<D: DesktopRepository> DesktopService<D> {
    pub fn new(desktops: D) -> Self {
        Self { desktops }
    }

    /// Returns the caller's desktop, creating it under `handle` when missing.
    ///
    /// An existing desktop keeps its handle.
    pub fn ensure_desktop(&self, caller: &Caller, handle: &str) -> ServiceResult<Desktop> {
        let owner_id = caller.account_id().ok_or(ServiceError::Unauthorized)?;
        if let Some(existing) = self.desktops.find_by_owner(owner_id)? {
            return Ok(existing);
        }

        let handle = normalize_handle(handle)?;
        let desktop = self.desktops.ensure_desktop(owner_id, &handle)?;
        info!(
            "event=desktop_ensure module=service status=ok desktop_id={}",
            desktop.id
        );
        Ok(desktop)
    }

    pub fn get_desktop(&self, caller: &Caller, desktop_id: DesktopId) -> ServiceResult<Desktop> {
        require_owner(&self.desktops, caller, desktop_id)
    }

    pub fn update_desktop_settings(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        patch: DesktopSettingsPatch,
    ) -> ServiceResult<Desktop> {
        let mut desktop = require_owner(&self.desktops, caller, desktop_id)?;
        desktop.apply_settings(patch)?;
        self.desktops.update_desktop(&desktop)?;
        info!(
            "event=desktop_settings_update module=service status=ok desktop_id={}",
            desktop_id
        );
        require_owner(&self.desktops, caller, desktop_id)
    }

    /// Resolves a handle for `caller`; private desktops are visible to their
    /// owner only.
    pub fn find_by_handle(&self, caller: &Caller, handle: &str) -> ServiceResult<Desktop> {
        resolve_handle(&self.desktops, caller, handle)
    }
}

pub(crate) fn resolve_handle<D: DesktopRepository>(
    desktops: &D,
    caller: &Caller,
    handle: &str,
) -> ServiceResult<Desktop> {
    let normalized =
        normalize_handle(handle).map_err(|_| ServiceError::not_found("desktop", handle))?;
    let desktop = desktops
        .find_by_handle(&normalized)?
        .ok_or_else(|| ServiceError::not_found("desktop", handle))?;
    if !desktop.is_public && !desktop.is_owned_by(caller) {
        return Err(ServiceError::not_found("desktop", handle));
    }
    Ok(desktop)
}
