//! Desktop model: the owner-scoped container for items, dock and settings.

use crate::model::patch::Patch;
use crate::model::validation::{
    normalize_optional, normalize_required, ValidationError, MAX_SHORT_TEXT_CHARS,
    MAX_TITLE_CHARS, MAX_URL_CHARS,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable desktop identifier.
pub type DesktopId = Uuid;

/// Account identifier issued by the external identity provider.
pub type AccountId = String;

pub const DEFAULT_THEME_ID: &str = "default";

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{1,31}$").expect("valid handle regex"));

/// Resolved identity of whoever issued a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No identity attached.
    Anonymous,
    /// Authenticated account.
    Account(AccountId),
}

impl Caller {
    pub fn account(id: impl Into<AccountId>) -> Self {
        Self::Account(id.into())
    }

    pub fn account_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Account(id) => Some(id.as_str()),
        }
    }
}

/// One desktop with its display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Desktop {
    pub id: DesktopId,
    pub owner_id: AccountId,
    /// Public handle visitors address the desktop by.
    pub handle: String,
    pub theme_id: String,
    pub background: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Desktop {
    pub fn is_owned_by(&self, caller: &Caller) -> bool {
        caller.account_id() == Some(self.owner_id.as_str())
    }

    /// Merges a settings patch. On error the desktop is left unchanged.
    pub fn apply_settings(&mut self, patch: DesktopSettingsPatch) -> Result<(), ValidationError> {
        let mut next = self.clone();
        patch
            .theme_id
            .apply_or_reset(&mut next.theme_id, DEFAULT_THEME_ID.to_string());
        patch.background.apply_to(&mut next.background);
        patch.title.apply_to(&mut next.title);
        patch.description.apply_to(&mut next.description);
        patch.is_public.apply_required(&mut next.is_public, "is_public")?;

        next.theme_id = normalize_required(&next.theme_id, "theme_id", MAX_TITLE_CHARS)?;
        next.background =
            normalize_optional(next.background.as_deref(), "background", MAX_URL_CHARS)?;
        next.title = normalize_optional(next.title.as_deref(), "title", MAX_TITLE_CHARS)?;
        next.description = normalize_optional(
            next.description.as_deref(),
            "description",
            MAX_SHORT_TEXT_CHARS,
        )?;
        *self = next;
        Ok(())
    }
}

/// Partial update for desktop display settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesktopSettingsPatch {
    /// `null` resets to the default theme.
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub theme_id: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub background: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub is_public: Patch<bool>,
}

/// Lower-cases and checks a desktop handle.
pub fn normalize_handle(value: &str) -> Result<String, ValidationError> {
    let normalized = value.trim().to_ascii_lowercase();
    if !HANDLE_RE.is_match(&normalized) {
        return Err(ValidationError::InvalidHandle(value.to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::{normalize_handle, Caller};

    #[test]
    fn handle_is_lowercased_and_shape_checked() {
        assert_eq!(normalize_handle(" Jane_Doe ").unwrap(), "jane_doe");
        assert!(normalize_handle("x").is_err());
        assert!(normalize_handle("has space").is_err());
    }

    #[test]
    fn anonymous_caller_has_no_account() {
        assert_eq!(Caller::Anonymous.account_id(), None);
        assert_eq!(Caller::account("acc-1").account_id(), Some("acc-1"));
    }
}
