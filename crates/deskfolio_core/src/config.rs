//! Quotas enforced by the core.
//!
//! Services receive a `CoreLimits` at construction; `Default` carries the
//! product limits.

pub const DEFAULT_MAX_DESKTOP_ICONS: usize = 20;
pub const DEFAULT_MAX_CONTENT_FILES: usize = 100;
pub const DEFAULT_MAX_DOCK_ITEMS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreLimits {
    /// Per-desktop cap on generic desktop icons.
    pub max_desktop_icons: usize,
    /// Per-desktop cap on content files of any type.
    pub max_content_files: usize,
    /// Per-desktop cap on dock shortcuts.
    pub max_dock_items: usize,
}

impl Default for CoreLimits {
    fn default() -> Self {
        Self {
            max_desktop_icons: DEFAULT_MAX_DESKTOP_ICONS,
            max_content_files: DEFAULT_MAX_CONTENT_FILES,
            max_dock_items: DEFAULT_MAX_DOCK_ITEMS,
        }
    }
}
