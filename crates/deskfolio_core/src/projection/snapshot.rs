//! Read-only input shared by the three projections.

use crate::model::desktop::Desktop;
use crate::model::dock::DockItem;
use crate::model::item::{FileType, Item, ItemId, ItemKind};
use crate::model::view::ViewSettings;
use std::collections::HashMap;

/// What the current viewer is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAccess {
    /// Desktop owner: sees drafts and locked items.
    Owner,
    /// Anyone else. `unlocked` is the ledger result for the visitor's email.
    Visitor { unlocked: bool },
}

impl ViewerAccess {
    /// Visibility of one item, ignoring projection-specific filters.
    pub fn can_see(self, item: &Item) -> bool {
        match self {
            Self::Owner => true,
            Self::Visitor { unlocked } => item.is_published() && (!item.is_locked() || unlocked),
        }
    }
}

/// Consistent view of one desktop, loaded in a single read transaction.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    pub desktop: Desktop,
    /// Every item of the desktop in sibling order.
    pub items: Vec<Item>,
    pub dock: Vec<DockItem>,
    pub settings: ViewSettings,
    index: HashMap<ItemId, usize>,
}

impl TreeSnapshot {
    pub fn new(
        desktop: Desktop,
        items: Vec<Item>,
        dock: Vec<DockItem>,
        settings: ViewSettings,
    ) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id, position))
            .collect();
        Self {
            desktop,
            items,
            dock,
            settings,
            index,
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.index.get(&id).map(|position| &self.items[*position])
    }

    /// Published notes and case studies visible to `access`.
    pub(crate) fn linear_candidates(&self, access: ViewerAccess) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| {
                matches!(
                    item.kind,
                    ItemKind::ContentFile(FileType::Note)
                        | ItemKind::ContentFile(FileType::CaseStudy)
                )
            })
            .filter(|item| item.is_published() && access.can_see(item))
            .collect()
    }
}
