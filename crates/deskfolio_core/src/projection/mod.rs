//! Read-side projections of one desktop tree.
//!
//! # Responsibility
//! - Turn a `TreeSnapshot` plus viewer access into render-ready lists for
//!   the desktop canvas, the page view and the present slideshow.
//! - Drive the slideshow timer (`PresentPlayer`).
//!
//! # Invariants
//! - Every projection is a pure function of its inputs; no I/O.
//! - Visitors never receive draft items, and never receive locked items
//!   unless their email is in the desktop's unlock ledger.

use crate::model::item::ItemId;
use crate::model::view::ViewMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod desktop;
pub mod page;
pub mod present;
pub mod snapshot;

pub use desktop::{project_desktop, DesktopView, PlacedItem};
pub use page::{project_page, PageView};
pub use present::{project_present, PlayerState, PresentPlayer, PresentView};
pub use snapshot::{TreeSnapshot, ViewerAccess};

/// Projection failures caused by the request, not by stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// Folder scope is missing or hidden from this viewer.
    FolderNotFound(ItemId),
    /// Folder scope names an item that is not a folder.
    NotAFolder(ItemId),
    /// Slide index outside the current deck.
    SlideOutOfRange { index: usize, len: usize },
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::NotAFolder(id) => write!(f, "item is not a folder: {id}"),
            Self::SlideOutOfRange { index, len } => {
                write!(f, "slide {index} out of range for {len} slides")
            }
        }
    }
}

impl Error for ProjectionError {}

/// One projection result, tagged by view mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "view", rename_all = "snake_case")]
pub enum ProjectedView {
    Desktop(DesktopView),
    Page(PageView),
    Present(PresentView),
}

impl ProjectedView {
    pub fn mode(&self) -> ViewMode {
        match self {
            Self::Desktop(_) => ViewMode::Desktop,
            Self::Page(_) => ViewMode::Page,
            Self::Present(_) => ViewMode::Present,
        }
    }
}
