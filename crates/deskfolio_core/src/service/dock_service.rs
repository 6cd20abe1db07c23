//! Dock shortcut management.

use crate::config::CoreLimits;
use crate::model::desktop::{Caller, DesktopId};
use crate::model::dock::{DockItem, DockItemId, NewDockItem};
use crate::repo::desktop_repo::DesktopRepository;
use crate::repo::dock_repo::DockRepository;
use crate::service::{require_owner, ServiceResult};
use log::info;

/// Dock service facade.
pub struct DockService<D: DesktopRepository, K: DockRepository> {
    desktops: D,
    dock: K,
    limits: CoreLimits,
}

impl<D: DesktopRepository, K: DockRepository> DockService<D, K> {
    pub fn new(desktops: D, dock: K, limits: CoreLimits) -> Self {
        Self {
            desktops,
            dock,
            limits,
        }
    }

    /// Appends a shortcut. Fails with `LIMIT_REACHED` past the cap and with
    /// `DUPLICATE` for a repeated action and target.
    pub fn add_dock_item(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        input: NewDockItem,
    ) -> ServiceResult<DockItem> {
        require_owner(&self.desktops, caller, desktop_id)?;
        let input = input.normalized()?;
        let created = self
            .dock
            .insert_dock_item(desktop_id, &input, self.limits.max_dock_items)?;
        info!(
            "event=dock_add module=service status=ok desktop_id={} dock_id={} action={}",
            desktop_id,
            created.id,
            created.action.as_str()
        );
        Ok(created)
    }

    pub fn remove_dock_item(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        dock_id: DockItemId,
    ) -> ServiceResult<()> {
        require_owner(&self.desktops, caller, desktop_id)?;
        self.dock.delete_dock_item(desktop_id, dock_id)?;
        info!(
            "event=dock_remove module=service status=ok desktop_id={} dock_id={}",
            desktop_id, dock_id
        );
        Ok(())
    }

    pub fn list_dock(&self, caller: &Caller, desktop_id: DesktopId) -> ServiceResult<Vec<DockItem>> {
        require_owner(&self.desktops, caller, desktop_id)?;
        self.dock.list_dock(desktop_id).map_err(Into::into)
    }
}
