//! Spatial canvas projection.
//!
//! # Invariants
//! - Paint order is `z_index ASC`, ties broken by sibling `order`, then id.
//! - Only direct children of the scope (root or one folder) are placed.

use crate::model::dock::DockItem;
use crate::model::item::{AccessLevel, ItemId, ItemKind, PublishStatus};
use crate::projection::snapshot::{TreeSnapshot, ViewerAccess};
use crate::projection::ProjectionError;
use serde::{Deserialize, Serialize};

/// One item placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub title: String,
    pub icon: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z_index: i64,
    pub order: i64,
    pub publish_status: PublishStatus,
    pub access_level: AccessLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopView {
    /// Folder being browsed; `None` for the root canvas.
    pub folder_id: Option<ItemId>,
    /// Items in paint order, back to front.
    pub items: Vec<PlacedItem>,
    pub dock: Vec<DockItem>,
}

/// Places the visible children of `folder_id` (root when `None`).
pub fn project_desktop(
    snapshot: &TreeSnapshot,
    access: ViewerAccess,
    folder_id: Option<ItemId>,
) -> Result<DesktopView, ProjectionError> {
    if let Some(folder_id) = folder_id {
        let folder = snapshot
            .item(folder_id)
            .filter(|folder| access.can_see(folder))
            .ok_or(ProjectionError::FolderNotFound(folder_id))?;
        if !folder.is_folder() {
            return Err(ProjectionError::NotAFolder(folder_id));
        }
    }

    let mut visible: Vec<_> = snapshot
        .items
        .iter()
        .filter(|item| item.parent_id == folder_id && access.can_see(item))
        .collect();
    visible.sort_by(|left, right| {
        left.z_index
            .cmp(&right.z_index)
            .then(left.order.cmp(&right.order))
            .then(left.id.cmp(&right.id))
    });

    Ok(DesktopView {
        folder_id,
        items: visible
            .into_iter()
            .map(|item| PlacedItem {
                id: item.id,
                kind: item.kind,
                title: item.title.clone(),
                icon: item.icon.clone(),
                x: item.position.x,
                y: item.position.y,
                z_index: item.z_index,
                order: item.order,
                publish_status: item.publish_status,
                access_level: item.access_level,
            })
            .collect(),
        dock: snapshot.dock.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::project_desktop;
    use crate::model::item::{FileType, Item, ItemKind};
    use crate::model::view::ViewSettings;
    use crate::projection::snapshot::fixtures::{desktop, locked, note, snapshot};
    use crate::projection::{ProjectionError, ViewerAccess};

    #[test]
    fn paint_order_is_z_index_then_sibling_order() {
        let desktop = desktop();
        let mut back = note(&desktop, "back", Some(1));
        back.z_index = 0;
        back.order = 5;
        let mut tie_low = note(&desktop, "tie-low", Some(1));
        tie_low.z_index = 2;
        tie_low.order = 0;
        let mut tie_high = note(&desktop, "tie-high", Some(1));
        tie_high.z_index = 2;
        tie_high.order = 1;
        let settings = ViewSettings::defaults(desktop.id);
        let snap = snapshot(
            desktop,
            vec![tie_high.clone(), back.clone(), tie_low.clone()],
            settings,
        );

        let view = project_desktop(&snap, ViewerAccess::Owner, None).unwrap();
        let ids: Vec<_> = view.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![back.id, tie_low.id, tie_high.id]);
    }

    #[test]
    fn visitors_do_not_see_drafts_or_locked_items() {
        let desktop = desktop();
        let draft = note(&desktop, "draft", None);
        let open = note(&desktop, "open", Some(1));
        let gated = locked(note(&desktop, "gated", Some(2)));
        let settings = ViewSettings::defaults(desktop.id);
        let snap = snapshot(desktop, vec![draft, open.clone(), gated.clone()], settings);

        let visitor = project_desktop(&snap, ViewerAccess::Visitor { unlocked: false }, None)
            .unwrap();
        assert_eq!(visitor.items.len(), 1);
        assert_eq!(visitor.items[0].id, open.id);

        let unlocked =
            project_desktop(&snap, ViewerAccess::Visitor { unlocked: true }, None).unwrap();
        assert!(unlocked.items.iter().any(|item| item.id == gated.id));

        let owner = project_desktop(&snap, ViewerAccess::Owner, None).unwrap();
        assert_eq!(owner.items.len(), 3);
    }

    #[test]
    fn folder_scope_lists_direct_children_only() {
        let desktop = desktop();
        let mut folder = Item::new(
            desktop.id,
            None,
            ItemKind::ContentFile(FileType::Folder),
            "folder",
        );
        folder.publish_status = crate::model::item::PublishStatus::Published;
        let mut child = note(&desktop, "child", Some(1));
        child.parent_id = Some(folder.id);
        let root_note = note(&desktop, "root", Some(1));
        let settings = ViewSettings::defaults(desktop.id);
        let snap = snapshot(
            desktop,
            vec![folder.clone(), child.clone(), root_note.clone()],
            settings,
        );

        let root = project_desktop(&snap, ViewerAccess::Owner, None).unwrap();
        assert_eq!(root.items.len(), 2);

        let inside = project_desktop(&snap, ViewerAccess::Owner, Some(folder.id)).unwrap();
        assert_eq!(inside.items.len(), 1);
        assert_eq!(inside.items[0].id, child.id);

        assert_eq!(
            project_desktop(&snap, ViewerAccess::Owner, Some(root_note.id)),
            Err(ProjectionError::NotAFolder(root_note.id))
        );
    }
}
