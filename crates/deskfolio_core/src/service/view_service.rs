//! View settings and projected reads.
//!
//! # Invariants
//! - Settings are synthesised from defaults until first written.
//! - A projection reads one snapshot; viewer access is resolved before it.

use crate::model::desktop::{Caller, DesktopId};
use crate::model::item::ItemId;
use crate::model::view::{ViewMode, ViewSettings, ViewSettingsPatch};
use crate::model::visitor::VisitorEmail;
use crate::projection::{
    project_desktop, project_page, project_present, ProjectedView, ViewerAccess,
};
use crate::repo::desktop_repo::DesktopRepository;
use crate::repo::unlock_repo::UnlockRepository;
use crate::repo::view_repo::ViewRepository;
use crate::service::desktop_service::resolve_handle;
use crate::service::{require_owner, ServiceResult};
use log::info;

/// Who is asking for a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub caller: Caller,
    /// Email previously used on the unlock gate, if any.
    pub email: Option<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self {
            caller: Caller::Anonymous,
            email: None,
        }
    }

    pub fn visitor(email: impl Into<String>) -> Self {
        Self {
            caller: Caller::Anonymous,
            email: Some(email.into()),
        }
    }

    pub fn caller(caller: Caller) -> Self {
        Self {
            caller,
            email: None,
        }
    }
}

/// View service facade.
pub struct ViewService<D: DesktopRepository, V: ViewRepository, U: UnlockRepository> {
    desktops: D,
    views: V,
    unlocks: U,
}

impl<D: DesktopRepository, V: ViewRepository, U: UnlockRepository> ViewService<D, V, U> {
    pub fn new(desktops: D, views: V, unlocks: U) -> Self {
        Self {
            desktops,
            views,
            unlocks,
        }
    }

    pub fn get_view_settings(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
    ) -> ServiceResult<ViewSettings> {
        require_owner(&self.desktops, caller, desktop_id)?;
        self.views
            .get_view_settings(desktop_id)
            .map_err(Into::into)
    }

    /// Merges a settings patch; `present_delay_ms` is clamped, orders are
    /// de-duplicated.
    pub fn set_view_settings(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        patch: ViewSettingsPatch,
    ) -> ServiceResult<ViewSettings> {
        require_owner(&self.desktops, caller, desktop_id)?;
        let mut settings = self.views.get_view_settings(desktop_id)?;
        settings.apply_patch(patch);
        self.views.save_view_settings(&settings)?;
        info!(
            "event=view_settings_update module=service status=ok desktop_id={} mode={} delay_ms={}",
            desktop_id,
            settings.active_mode.as_str(),
            settings.present_delay_ms
        );
        Ok(settings)
    }

    /// Projects the desktop behind `handle` for `viewer`. `mode` defaults to
    /// the desktop's active mode; `folder_id` only scopes the desktop canvas.
    pub fn fetch_view(
        &self,
        handle: &str,
        mode: Option<ViewMode>,
        viewer: &Viewer,
        folder_id: Option<ItemId>,
    ) -> ServiceResult<ProjectedView> {
        let desktop = resolve_handle(&self.desktops, &viewer.caller, handle)?;
        let access = if desktop.is_owned_by(&viewer.caller) {
            ViewerAccess::Owner
        } else {
            let unlocked = match viewer.email.as_deref() {
                Some(raw) => {
                    let email = VisitorEmail::parse(raw)?;
                    self.unlocks.is_unlocked(&email, desktop.id)?
                }
                None => false,
            };
            ViewerAccess::Visitor { unlocked }
        };

        let snapshot = self.views.load_snapshot(desktop.id)?;
        let view = match mode.unwrap_or(snapshot.settings.active_mode) {
            ViewMode::Desktop => {
                ProjectedView::Desktop(project_desktop(&snapshot, access, folder_id)?)
            }
            ViewMode::Page => ProjectedView::Page(project_page(&snapshot, access)),
            ViewMode::Present => ProjectedView::Present(project_present(&snapshot, access)),
        };
        Ok(view)
    }
}
