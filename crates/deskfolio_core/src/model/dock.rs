//! Dock model: a small, capped, flat list of shortcut actions.

use crate::model::desktop::DesktopId;
use crate::model::validation::{
    normalize_required, validate_http_url, ValidationError, MAX_TITLE_CHARS, MAX_URL_CHARS,
};
use crate::model::visitor::VisitorEmail;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DockItemId = Uuid;

/// What a dock shortcut does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockAction {
    OpenUrl,
    ComposeEmail,
    TriggerDownload,
}

impl DockAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenUrl => "open_url",
            Self::ComposeEmail => "compose_email",
            Self::TriggerDownload => "trigger_download",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open_url" => Some(Self::OpenUrl),
            "compose_email" => Some(Self::ComposeEmail),
            "trigger_download" => Some(Self::TriggerDownload),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockItem {
    pub id: DockItemId,
    pub desktop_id: DesktopId,
    pub icon: String,
    pub label: String,
    pub action: DockAction,
    pub target: String,
    pub order: i64,
}

/// Creation input for one dock shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDockItem {
    pub icon: String,
    pub label: String,
    pub action: DockAction,
    pub target: String,
}

impl NewDockItem {
    /// Normalises fields and checks the target against the action.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let icon = normalize_required(&self.icon, "icon", MAX_URL_CHARS)?;
        let label = normalize_required(&self.label, "label", MAX_TITLE_CHARS)?;
        let raw_target = normalize_required(&self.target, "target", MAX_URL_CHARS)?;
        let target = match self.action {
            DockAction::OpenUrl | DockAction::TriggerDownload => {
                validate_http_url(&raw_target, "target")?;
                raw_target
            }
            DockAction::ComposeEmail => VisitorEmail::parse(&raw_target)?.as_str().to_string(),
        };
        Ok(Self {
            icon,
            label,
            action: self.action,
            target,
        })
    }
}
