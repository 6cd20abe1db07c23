//! Per-desktop view settings shared by the three projections.

use crate::model::desktop::DesktopId;
use crate::model::item::ItemId;
use crate::model::patch::Patch;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const PRESENT_DELAY_MIN_MS: u32 = 1_000;
pub const PRESENT_DELAY_MAX_MS: u32 = 30_000;
pub const PRESENT_DELAY_DEFAULT_MS: u32 = 5_000;

/// Which projection visitors land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Desktop,
    Page,
    Present,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Page => "page",
            Self::Present => "present",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "desktop" => Some(Self::Desktop),
            "page" => Some(Self::Page),
            "present" => Some(Self::Present),
            _ => None,
        }
    }
}

/// Slideshow behaviour after the last slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentWrap {
    /// Continue from the first slide.
    Loop,
    /// Stay on the last slide and stop auto-advancing.
    Stop,
}

impl PresentWrap {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Stop => "stop",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "loop" => Some(Self::Loop),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    pub desktop_id: DesktopId,
    pub active_mode: ViewMode,
    /// Projection-specific order for the page view; independent of tree order.
    pub page_order: Vec<ItemId>,
    /// Projection-specific order for the present view.
    pub present_order: Vec<ItemId>,
    pub present_auto: bool,
    /// Auto-advance delay, always within the present delay bounds.
    pub present_delay_ms: u32,
    pub present_wrap: PresentWrap,
}

impl ViewSettings {
    /// Settings synthesised for desktops that never stored any.
    pub fn defaults(desktop_id: DesktopId) -> Self {
        Self {
            desktop_id,
            active_mode: ViewMode::Desktop,
            page_order: Vec::new(),
            present_order: Vec::new(),
            present_auto: true,
            present_delay_ms: PRESENT_DELAY_DEFAULT_MS,
            present_wrap: PresentWrap::Loop,
        }
    }

    /// Merges a patch. `null` resets a field to its default.
    pub fn apply_patch(&mut self, patch: ViewSettingsPatch) {
        let defaults = Self::defaults(self.desktop_id);
        patch
            .active_mode
            .apply_or_reset(&mut self.active_mode, defaults.active_mode);
        patch
            .page_order
            .map(dedupe_ids)
            .apply_or_reset(&mut self.page_order, defaults.page_order);
        patch
            .present_order
            .map(dedupe_ids)
            .apply_or_reset(&mut self.present_order, defaults.present_order);
        patch
            .present_auto
            .apply_or_reset(&mut self.present_auto, defaults.present_auto);
        patch
            .present_delay_ms
            .map(clamp_present_delay)
            .apply_or_reset(&mut self.present_delay_ms, defaults.present_delay_ms);
        patch
            .present_wrap
            .apply_or_reset(&mut self.present_wrap, defaults.present_wrap);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSettingsPatch {
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub active_mode: Patch<ViewMode>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub page_order: Patch<Vec<ItemId>>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub present_order: Patch<Vec<ItemId>>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub present_auto: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub present_delay_ms: Patch<u32>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub present_wrap: Patch<PresentWrap>,
}

pub fn clamp_present_delay(value: u32) -> u32 {
    value.clamp(PRESENT_DELAY_MIN_MS, PRESENT_DELAY_MAX_MS)
}

/// Drops repeated ids, keeping the first occurrence.
pub fn dedupe_ids(ids: Vec<ItemId>) -> Vec<ItemId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::{ViewMode, ViewSettings, ViewSettingsPatch, PRESENT_DELAY_MAX_MS};
    use crate::model::patch::Patch;
    use uuid::Uuid;

    #[test]
    fn patch_clamps_delay_and_dedupes_orders() {
        let id = Uuid::new_v4();
        let mut settings = ViewSettings::defaults(Uuid::new_v4());
        settings.apply_patch(ViewSettingsPatch {
            active_mode: Patch::Set(ViewMode::Present),
            page_order: Patch::Set(vec![id, id]),
            present_delay_ms: Patch::Set(90_000),
            ..ViewSettingsPatch::default()
        });
        assert_eq!(settings.active_mode, ViewMode::Present);
        assert_eq!(settings.page_order, vec![id]);
        assert_eq!(settings.present_delay_ms, PRESENT_DELAY_MAX_MS);
    }

    #[test]
    fn null_resets_to_default() {
        let mut settings = ViewSettings::defaults(Uuid::new_v4());
        settings.present_auto = false;
        settings.apply_patch(serde_json::from_str(r#"{"present_auto": null}"#).unwrap());
        assert!(settings.present_auto);
    }
}
