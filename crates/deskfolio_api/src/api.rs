//! Use-case actions over one owned connection.
//!
//! # Responsibility
//! - Translate action calls into core service calls.
//! - Return every outcome as an `ActionResponse`.
//!
//! # Invariants
//! - Exactly one connection per `DeskApi`; no process-global data handles.
//! - Services are built per call and borrow the connection only for its duration.

use crate::config::ApiConfig;
use crate::envelope::ActionResponse;
use deskfolio_core::db::{open_db, open_db_in_memory};
use deskfolio_core::model::content::{Block, BlockId, BlockPayload, ItemContent, Tab, TabId};
use deskfolio_core::model::desktop::DesktopSettingsPatch;
use deskfolio_core::model::dock::{DockItem, DockItemId, NewDockItem};
use deskfolio_core::model::view::{ViewMode, ViewSettings, ViewSettingsPatch};
use deskfolio_core::repo::content_repo::SqliteContentRepository;
use deskfolio_core::repo::desktop_repo::SqliteDesktopRepository;
use deskfolio_core::repo::dock_repo::SqliteDockRepository;
use deskfolio_core::repo::item_repo::{DeleteMode, SqliteItemRepository};
use deskfolio_core::repo::unlock_repo::SqliteUnlockRepository;
use deskfolio_core::repo::view_repo::SqliteViewRepository;
use deskfolio_core::service::access_service::AccessService;
use deskfolio_core::service::content_service::ContentService;
use deskfolio_core::service::desktop_service::DesktopService;
use deskfolio_core::service::dock_service::DockService;
use deskfolio_core::service::ordering_service::{OrderRow, OrderingService, PositionRow};
use deskfolio_core::service::tree_service::TreeService;
use deskfolio_core::service::view_service::{ViewService, Viewer};
use deskfolio_core::{
    core_version as core_version_inner, init_logging, ping as ping_inner, Caller, CoreLimits,
    DbError, Desktop, DesktopId, Item, ItemId, ItemPatch, LoggingError, NewItem, ProjectedView,
    ServiceResult,
};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

type Desktops<'conn> = SqliteDesktopRepository<'conn>;
type Items<'conn> = SqliteItemRepository<'conn>;

/// Health check.
pub fn ping() -> String {
    ping_inner().to_owned()
}

pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Startup failures of `DeskApi::open`.
#[derive(Debug)]
pub enum ApiInitError {
    Logging(LoggingError),
    Db(DbError),
}

impl Display for ApiInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging init failed: {err}"),
            Self::Db(err) => write!(f, "database open failed: {err}"),
        }
    }
}

impl Error for ApiInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<LoggingError> for ApiInitError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for ApiInitError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Action surface bound to one database connection.
pub struct DeskApi {
    conn: Connection,
    limits: CoreLimits,
}

impl DeskApi {
    /// Starts logging when a directory is configured, then opens the database.
    pub fn open(config: &ApiConfig) -> Result<Self, ApiInitError> {
        if let Some(log_dir) = config.log_dir.as_deref() {
            init_logging(&config.log_level, log_dir)?;
        }
        let conn = open_db(&config.db_path)?;
        info!(
            "event=api_open module=api status=ok db_path={}",
            config.db_path.display()
        );
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, ApiInitError> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            limits: CoreLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: CoreLimits) -> Self {
        self.limits = limits;
        self
    }

    // Desktops

    pub fn ensure_desktop(&self, caller: &Caller, handle: &str) -> ActionResponse<Desktop> {
        let result = self
            .desktops()
            .and_then(|service| service.ensure_desktop(caller, handle));
        ActionResponse::from_result("ensure_desktop", result)
    }

    pub fn get_desktop(&self, caller: &Caller, desktop_id: DesktopId) -> ActionResponse<Desktop> {
        let result = self
            .desktops()
            .and_then(|service| service.get_desktop(caller, desktop_id));
        ActionResponse::from_result("get_desktop", result)
    }

    pub fn update_desktop_settings(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        patch: DesktopSettingsPatch,
    ) -> ActionResponse<Desktop> {
        let result = self
            .desktops()
            .and_then(|service| service.update_desktop_settings(caller, desktop_id, patch));
        ActionResponse::from_result("update_desktop_settings", result)
    }

    // Tree

    pub fn create_item(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        input: NewItem,
    ) -> ActionResponse<Item> {
        let result = self
            .tree()
            .and_then(|service| service.create_item(caller, desktop_id, input));
        ActionResponse::from_result("create_item", result)
    }

    pub fn update_item(
        &self,
        caller: &Caller,
        item_id: ItemId,
        patch: ItemPatch,
    ) -> ActionResponse<Item> {
        let result = self
            .tree()
            .and_then(|service| service.update_item(caller, item_id, patch));
        ActionResponse::from_result("update_item", result)
    }

    pub fn move_item(
        &self,
        caller: &Caller,
        item_id: ItemId,
        new_parent_id: Option<ItemId>,
    ) -> ActionResponse<Item> {
        let result = self
            .tree()
            .and_then(|service| service.move_item(caller, item_id, new_parent_id));
        ActionResponse::from_result("move_item", result)
    }

    /// Returns the number of removed items.
    pub fn delete_item(
        &self,
        caller: &Caller,
        item_id: ItemId,
        mode: DeleteMode,
    ) -> ActionResponse<usize> {
        let result = self
            .tree()
            .and_then(|service| service.delete_item(caller, item_id, mode));
        ActionResponse::from_result("delete_item", result)
    }

    pub fn get_item(&self, caller: &Caller, item_id: ItemId) -> ActionResponse<Item> {
        let result = self
            .tree()
            .and_then(|service| service.get_item(caller, item_id));
        ActionResponse::from_result("get_item", result)
    }

    pub fn list_children(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        parent_id: Option<ItemId>,
    ) -> ActionResponse<Vec<Item>> {
        let result = self
            .tree()
            .and_then(|service| service.list_children(caller, desktop_id, parent_id));
        ActionResponse::from_result("list_children", result)
    }

    pub fn list_items(&self, caller: &Caller, desktop_id: DesktopId) -> ActionResponse<Vec<Item>> {
        let result = self
            .tree()
            .and_then(|service| service.list_items(caller, desktop_id));
        ActionResponse::from_result("list_items", result)
    }

    // Ordering

    pub fn reorder_siblings(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        rows: &[OrderRow],
    ) -> ActionResponse<Vec<Item>> {
        let result = self
            .ordering()
            .and_then(|service| service.reorder_siblings(caller, desktop_id, rows));
        ActionResponse::from_result("reorder_siblings", result)
    }

    pub fn reposition_items(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        rows: &[PositionRow],
    ) -> ActionResponse<Vec<Item>> {
        let result = self
            .ordering()
            .and_then(|service| service.reposition_items(caller, desktop_id, rows));
        ActionResponse::from_result("reposition_items", result)
    }

    pub fn reorder_dock(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        rows: &[OrderRow],
    ) -> ActionResponse<Vec<DockItem>> {
        let result = self
            .ordering()
            .and_then(|service| service.reorder_dock(caller, desktop_id, rows));
        ActionResponse::from_result("reorder_dock", result)
    }

    pub fn bring_to_front(&self, caller: &Caller, item_id: ItemId) -> ActionResponse<Item> {
        let result = self
            .ordering()
            .and_then(|service| service.bring_to_front(caller, item_id));
        ActionResponse::from_result("bring_to_front", result)
    }

    // Dock

    pub fn add_dock_item(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        input: NewDockItem,
    ) -> ActionResponse<DockItem> {
        let result = self
            .dock()
            .and_then(|service| service.add_dock_item(caller, desktop_id, input));
        ActionResponse::from_result("add_dock_item", result)
    }

    pub fn remove_dock_item(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        dock_id: DockItemId,
    ) -> ActionResponse<()> {
        let result = self
            .dock()
            .and_then(|service| service.remove_dock_item(caller, desktop_id, dock_id));
        ActionResponse::from_result("remove_dock_item", result)
    }

    pub fn list_dock(&self, caller: &Caller, desktop_id: DesktopId) -> ActionResponse<Vec<DockItem>> {
        let result = self
            .dock()
            .and_then(|service| service.list_dock(caller, desktop_id));
        ActionResponse::from_result("list_dock", result)
    }

    // Access

    pub fn publish(&self, caller: &Caller, item_id: ItemId) -> ActionResponse<Item> {
        let result = self
            .access()
            .and_then(|service| service.publish(caller, item_id));
        ActionResponse::from_result("publish", result)
    }

    pub fn unpublish(&self, caller: &Caller, item_id: ItemId) -> ActionResponse<Item> {
        let result = self
            .access()
            .and_then(|service| service.unpublish(caller, item_id));
        ActionResponse::from_result("unpublish", result)
    }

    pub fn lock(&self, caller: &Caller, item_id: ItemId) -> ActionResponse<Item> {
        let result = self
            .access()
            .and_then(|service| service.lock(caller, item_id));
        ActionResponse::from_result("lock", result)
    }

    pub fn unlock(&self, caller: &Caller, item_id: ItemId) -> ActionResponse<Item> {
        let result = self
            .access()
            .and_then(|service| service.unlock(caller, item_id));
        ActionResponse::from_result("unlock", result)
    }

    /// Records a desktop-wide unlock for `email` and returns the item content.
    pub fn visitor_unlock(
        &self,
        handle: &str,
        item_id: ItemId,
        email: &str,
    ) -> ActionResponse<ItemContent> {
        let result = self
            .access()
            .and_then(|service| service.visitor_unlock(handle, item_id, email));
        ActionResponse::from_result("visitor_unlock", result)
    }

    pub fn check_unlock(&self, email: &str, desktop_id: DesktopId) -> ActionResponse<bool> {
        let result = self
            .access()
            .and_then(|service| service.is_unlocked(email, desktop_id));
        ActionResponse::from_result("check_unlock", result)
    }

    pub fn fetch_item_for_visitor(
        &self,
        caller: &Caller,
        handle: &str,
        item_id: ItemId,
        email: Option<&str>,
    ) -> ActionResponse<ItemContent> {
        let result = self.access().and_then(|service| {
            service.fetch_item_for_visitor(caller, handle, item_id, email)
        });
        ActionResponse::from_result("fetch_item_for_visitor", result)
    }

    // Views

    pub fn get_view_settings(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
    ) -> ActionResponse<ViewSettings> {
        let result = self
            .views()
            .and_then(|service| service.get_view_settings(caller, desktop_id));
        ActionResponse::from_result("get_view_settings", result)
    }

    pub fn set_view_settings(
        &self,
        caller: &Caller,
        desktop_id: DesktopId,
        patch: ViewSettingsPatch,
    ) -> ActionResponse<ViewSettings> {
        let result = self
            .views()
            .and_then(|service| service.set_view_settings(caller, desktop_id, patch));
        ActionResponse::from_result("set_view_settings", result)
    }

    pub fn fetch_view(
        &self,
        handle: &str,
        mode: Option<ViewMode>,
        viewer: &Viewer,
        folder_id: Option<ItemId>,
    ) -> ActionResponse<ProjectedView> {
        let result = self
            .views()
            .and_then(|service| service.fetch_view(handle, mode, viewer, folder_id));
        ActionResponse::from_result("fetch_view", result)
    }

    // Content

    pub fn add_tab(&self, caller: &Caller, item_id: ItemId, label: &str) -> ActionResponse<Tab> {
        let result = self
            .content()
            .and_then(|service| service.add_tab(caller, item_id, label));
        ActionResponse::from_result("add_tab", result)
    }

    pub fn rename_tab(&self, caller: &Caller, tab_id: TabId, label: &str) -> ActionResponse<Tab> {
        let result = self
            .content()
            .and_then(|service| service.rename_tab(caller, tab_id, label));
        ActionResponse::from_result("rename_tab", result)
    }

    pub fn delete_tab(&self, caller: &Caller, tab_id: TabId) -> ActionResponse<()> {
        let result = self
            .content()
            .and_then(|service| service.delete_tab(caller, tab_id));
        ActionResponse::from_result("delete_tab", result)
    }

    pub fn reorder_tabs(
        &self,
        caller: &Caller,
        item_id: ItemId,
        rows: &[OrderRow],
    ) -> ActionResponse<Vec<Tab>> {
        let result = self
            .content()
            .and_then(|service| service.reorder_tabs(caller, item_id, rows));
        ActionResponse::from_result("reorder_tabs", result)
    }

    pub fn add_block(
        &self,
        caller: &Caller,
        item_id: ItemId,
        tab_id: Option<TabId>,
        payload: BlockPayload,
    ) -> ActionResponse<Block> {
        let result = self
            .content()
            .and_then(|service| service.add_block(caller, item_id, tab_id, payload));
        ActionResponse::from_result("add_block", result)
    }

    pub fn update_block(
        &self,
        caller: &Caller,
        block_id: BlockId,
        payload: BlockPayload,
    ) -> ActionResponse<Block> {
        let result = self
            .content()
            .and_then(|service| service.update_block(caller, block_id, payload));
        ActionResponse::from_result("update_block", result)
    }

    pub fn delete_block(&self, caller: &Caller, block_id: BlockId) -> ActionResponse<()> {
        let result = self
            .content()
            .and_then(|service| service.delete_block(caller, block_id));
        ActionResponse::from_result("delete_block", result)
    }

    pub fn reorder_blocks(
        &self,
        caller: &Caller,
        item_id: ItemId,
        tab_id: Option<TabId>,
        rows: &[OrderRow],
    ) -> ActionResponse<ItemContent> {
        let result = self
            .content()
            .and_then(|service| service.reorder_blocks(caller, item_id, tab_id, rows));
        ActionResponse::from_result("reorder_blocks", result)
    }

    pub fn load_item_content(&self, caller: &Caller, item_id: ItemId) -> ActionResponse<ItemContent> {
        let result = self
            .content()
            .and_then(|service| service.load_item_content(caller, item_id));
        ActionResponse::from_result("load_item_content", result)
    }

    fn desktop_repo(&self) -> ServiceResult<Desktops<'_>> {
        Ok(SqliteDesktopRepository::try_new(&self.conn)?)
    }

    fn item_repo(&self) -> ServiceResult<Items<'_>> {
        Ok(SqliteItemRepository::try_new(&self.conn)?)
    }

    fn desktops(&self) -> ServiceResult<DesktopService<Desktops<'_>>> {
        Ok(DesktopService::new(self.desktop_repo()?))
    }

    fn tree(&self) -> ServiceResult<TreeService<Desktops<'_>, Items<'_>>> {
        Ok(TreeService::new(
            self.desktop_repo()?,
            self.item_repo()?,
            self.limits,
        ))
    }

    fn ordering(
        &self,
    ) -> ServiceResult<OrderingService<Desktops<'_>, Items<'_>, SqliteDockRepository<'_>>> {
        Ok(OrderingService::new(
            self.desktop_repo()?,
            self.item_repo()?,
            SqliteDockRepository::try_new(&self.conn)?,
            self.limits,
        ))
    }

    fn dock(&self) -> ServiceResult<DockService<Desktops<'_>, SqliteDockRepository<'_>>> {
        Ok(DockService::new(
            self.desktop_repo()?,
            SqliteDockRepository::try_new(&self.conn)?,
            self.limits,
        ))
    }

    fn access(
        &self,
    ) -> ServiceResult<
        AccessService<
            Desktops<'_>,
            Items<'_>,
            SqliteContentRepository<'_>,
            SqliteUnlockRepository<'_>,
        >,
    > {
        Ok(AccessService::new(
            self.desktop_repo()?,
            self.item_repo()?,
            SqliteContentRepository::try_new(&self.conn)?,
            SqliteUnlockRepository::try_new(&self.conn)?,
        ))
    }

    fn views(
        &self,
    ) -> ServiceResult<
        ViewService<Desktops<'_>, SqliteViewRepository<'_>, SqliteUnlockRepository<'_>>,
    > {
        Ok(ViewService::new(
            self.desktop_repo()?,
            SqliteViewRepository::try_new(&self.conn)?,
            SqliteUnlockRepository::try_new(&self.conn)?,
        ))
    }

    fn content(
        &self,
    ) -> ServiceResult<ContentService<Desktops<'_>, Items<'_>, SqliteContentRepository<'_>>> {
        Ok(ContentService::new(
            self.desktop_repo()?,
            self.item_repo()?,
            SqliteContentRepository::try_new(&self.conn)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping, DeskApi};
    use crate::config::ApiConfig;
    use deskfolio_core::model::item::{FileType, ItemKind, NewItem};
    use deskfolio_core::model::view::ViewMode;
    use deskfolio_core::service::view_service::Viewer;
    use deskfolio_core::{Caller, CoreLimits, ErrorCode, ProjectedView};
    use serde_json::Value;
    use tempfile::TempDir;

    fn owner() -> Caller {
        Caller::account("acct-owner")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
        assert!(!core_version().is_empty());
    }

    #[test]
    fn file_backed_api_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let config = ApiConfig {
            db_path: dir.path().join("desk.sqlite3"),
            ..ApiConfig::default()
        };

        let first = DeskApi::open(&config).unwrap();
        let desktop = first.ensure_desktop(&owner(), "maker").into_result().unwrap();
        drop(first);

        let second = DeskApi::open(&config).unwrap();
        let again = second.ensure_desktop(&owner(), "maker").into_result().unwrap();
        assert_eq!(again.id, desktop.id);
    }

    #[test]
    fn anonymous_create_is_unauthorized_envelope() {
        let api = DeskApi::open_in_memory().unwrap();
        let desktop = api.ensure_desktop(&owner(), "maker").into_result().unwrap();

        let response = api.create_item(
            &Caller::Anonymous,
            desktop.id,
            NewItem::new(ItemKind::ContentFile(FileType::Note), "note"),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], Value::Bool(false));
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn quota_comes_from_configured_limits() {
        let api = DeskApi::open_in_memory().unwrap().with_limits(CoreLimits {
            max_content_files: 1,
            ..CoreLimits::default()
        });
        let desktop = api.ensure_desktop(&owner(), "maker").into_result().unwrap();
        let note = || NewItem::new(ItemKind::ContentFile(FileType::Note), "note");

        assert!(api.create_item(&owner(), desktop.id, note()).success);
        let response = api.create_item(&owner(), desktop.id, note());
        assert_eq!(response.error_code(), Some(ErrorCode::LimitReached));
    }

    #[test]
    fn published_note_reaches_the_page_projection() {
        let api = DeskApi::open_in_memory().unwrap();
        let desktop = api.ensure_desktop(&owner(), "maker").into_result().unwrap();
        let note = api
            .create_item(
                &owner(),
                desktop.id,
                NewItem::new(ItemKind::ContentFile(FileType::Note), "hello"),
            )
            .into_result()
            .unwrap();
        assert!(api.publish(&owner(), note.id).success);

        let view = api
            .fetch_view("maker", Some(ViewMode::Page), &Viewer::anonymous(), None)
            .into_result()
            .unwrap();
        match view {
            ProjectedView::Page(page) => {
                assert_eq!(page.items.len(), 1);
                assert_eq!(page.items[0].id, note.id);
            }
            other => panic!("expected page view, got {other:?}"),
        }
    }
}
