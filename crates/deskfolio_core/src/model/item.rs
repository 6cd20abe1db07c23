//! Item domain model: one node of a desktop's content tree.
//!
//! # Responsibility
//! - Define the item record shared by the tree store, ordering and projections.
//! - Merge partial patches with explicit-null-clears semantics.
//!
//! # Invariants
//! - `parent_id`, when set, names a folder item of the same desktop
//!   (enforced by the tree service, which can see other rows).
//! - `position.x` / `position.y` stay within `[0, 100]`.
//! - `published_at` is never cleared by unpublishing.

use crate::model::desktop::DesktopId;
use crate::model::patch::Patch;
use crate::model::validation::{
    check_entries, normalize_optional, normalize_required, validate_currency, validate_http_url,
    ValidationError, MAX_BODY_CHARS, MAX_LIST_ENTRIES, MAX_SHORT_TEXT_CHARS, MAX_TITLE_CHARS,
    MAX_URL_CHARS,
};
use crate::time::now_epoch_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable item identifier.
pub type ItemId = Uuid;

pub const POSITION_MIN: f64 = 0.0;
pub const POSITION_MAX: f64 = 100.0;

/// Content file flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Note,
    CaseStudy,
    Folder,
    Image,
    Link,
    Embed,
    Download,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::CaseStudy => "case_study",
            Self::Folder => "folder",
            Self::Image => "image",
            Self::Link => "link",
            Self::Embed => "embed",
            Self::Download => "download",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "note" => Some(Self::Note),
            "case_study" => Some(Self::CaseStudy),
            "folder" => Some(Self::Folder),
            "image" => Some(Self::Image),
            "link" => Some(Self::Link),
            "embed" => Some(Self::Embed),
            "download" => Some(Self::Download),
            _ => None,
        }
    }
}

/// Item variant. Content files additionally carry their file type.
///
/// Serialized as `{"variant": "desktop_icon"}` or
/// `{"variant": "content_file", "file_type": "note"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "variant", content = "file_type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Generic desktop shortcut icon.
    DesktopIcon,
    /// Typed content file.
    ContentFile(FileType),
}

impl ItemKind {
    pub fn variant_str(self) -> &'static str {
        match self {
            Self::DesktopIcon => "desktop_icon",
            Self::ContentFile(_) => "content_file",
        }
    }

    pub fn file_type(self) -> Option<FileType> {
        match self {
            Self::DesktopIcon => None,
            Self::ContentFile(file_type) => Some(file_type),
        }
    }

    pub fn is_folder(self) -> bool {
        self == Self::ContentFile(FileType::Folder)
    }

    /// Label used in logs and validation messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::DesktopIcon => "desktop_icon",
            Self::ContentFile(file_type) => file_type.as_str(),
        }
    }
}

/// Percentage placement on the spatial canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Builds a position, clamping each axis into `[0, 100]`.
    ///
    /// Drag overshoot is tolerated; only NaN/infinite input is rejected.
    pub fn clamped(x: f64, y: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            x: clamp_axis(x, "x")?,
            y: clamp_axis(y, "y")?,
        })
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

fn clamp_axis(value: f64, axis: &'static str) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteCoordinate(axis));
    }
    Ok(value.clamp(POSITION_MIN, POSITION_MAX))
}

/// Publish workflow state. Orthogonal to [`AccessLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Draft,
    Published,
}

impl PublishStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// Visitor access gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Free,
    Locked,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Locked => "locked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "locked" => Some(Self::Locked),
            _ => None,
        }
    }
}

/// Monetisation price in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount_minor: i64,
    /// ISO-4217 style three-letter code, upper case.
    pub currency: String,
}

impl Price {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount_minor < 0 {
            return Err(ValidationError::NegativePrice(self.amount_minor));
        }
        validate_currency(&self.currency)
    }
}

/// One label/value row of the structured detail list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

/// One gallery image, referenced by URL only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// One external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub label: String,
    pub url: String,
}

/// Canonical item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub desktop_id: DesktopId,
    /// `None` means root level.
    pub parent_id: Option<ItemId>,
    pub kind: ItemKind,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    /// Rich-text body.
    pub body: Option<String>,
    pub header_image: Option<String>,
    /// Icon reference for desktop icons and folder glyph overrides.
    pub icon: Option<String>,
    /// Target for link/embed/download files and desktop icons.
    pub url: Option<String>,
    pub details: Vec<DetailEntry>,
    pub gallery: Vec<GalleryImage>,
    pub links: Vec<ExternalLink>,
    /// Sibling order key within `(desktop_id, parent_id)`.
    pub order: i64,
    pub position: Position,
    /// Paint order for overlapping windows.
    pub z_index: i64,
    pub publish_status: PublishStatus,
    /// Epoch ms of the most recent publish. Kept on unpublish.
    pub published_at: Option<i64>,
    pub access_level: AccessLevel,
    pub price: Option<Price>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Item {
    /// Creates a draft, free item at the canvas origin.
    pub fn new(
        desktop_id: DesktopId,
        parent_id: Option<ItemId>,
        kind: ItemKind,
        title: impl Into<String>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            desktop_id,
            parent_id,
            kind,
            title: title.into(),
            subtitle: None,
            description: None,
            body: None,
            header_image: None,
            icon: None,
            url: None,
            details: Vec::new(),
            gallery: Vec::new(),
            links: Vec::new(),
            order: 0,
            position: Position::origin(),
            z_index: 0,
            publish_status: PublishStatus::Draft,
            published_at: None,
            access_level: AccessLevel::Free,
            price: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    pub fn is_published(&self) -> bool {
        self.publish_status == PublishStatus::Published
    }

    pub fn is_locked(&self) -> bool {
        self.access_level == AccessLevel::Locked
    }

    /// Checks field shapes. Trims text fields in place.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.title = normalize_required(&self.title, "title", MAX_TITLE_CHARS)?;
        self.subtitle = normalize_optional(self.subtitle.as_deref(), "subtitle", MAX_TITLE_CHARS)?;
        self.description = normalize_optional(
            self.description.as_deref(),
            "description",
            MAX_SHORT_TEXT_CHARS,
        )?;
        self.body = normalize_optional(self.body.as_deref(), "body", MAX_BODY_CHARS)?;
        self.header_image =
            normalize_optional(self.header_image.as_deref(), "header_image", MAX_URL_CHARS)?;
        self.icon = normalize_optional(self.icon.as_deref(), "icon", MAX_URL_CHARS)?;
        self.url = normalize_optional(self.url.as_deref(), "url", MAX_URL_CHARS)?;

        if let Some(url) = self.url.as_deref() {
            if matches!(
                self.kind,
                ItemKind::ContentFile(FileType::Link) | ItemKind::ContentFile(FileType::Embed)
            ) {
                validate_http_url(url, "url")?;
            }
        }
        if self.is_folder() && self.body.is_some() {
            return Err(ValidationError::UnsupportedForKind {
                field: "body",
                kind: self.kind.label(),
            });
        }

        check_entries(&self.details, "details", MAX_LIST_ENTRIES)?;
        for entry in &mut self.details {
            entry.label = normalize_required(&entry.label, "details.label", MAX_TITLE_CHARS)?;
            entry.value = entry.value.trim().to_string();
        }
        check_entries(&self.gallery, "gallery", MAX_LIST_ENTRIES)?;
        for image in &mut self.gallery {
            image.url = normalize_required(&image.url, "gallery.url", MAX_URL_CHARS)?;
            image.caption =
                normalize_optional(image.caption.as_deref(), "gallery.caption", MAX_TITLE_CHARS)?;
        }
        check_entries(&self.links, "links", MAX_LIST_ENTRIES)?;
        for link in &mut self.links {
            link.label = normalize_required(&link.label, "links.label", MAX_TITLE_CHARS)?;
            link.url = link.url.trim().to_string();
            validate_http_url(&link.url, "links.url")?;
        }

        self.position = Position::clamped(self.position.x, self.position.y)?;
        if let Some(price) = &self.price {
            price.validate()?;
        }
        Ok(())
    }

    /// Merges a partial patch, then re-validates the whole record.
    ///
    /// On error the item is left unchanged.
    pub fn apply_patch(&mut self, patch: ItemPatch) -> Result<(), ValidationError> {
        let mut next = self.clone();
        patch.title.apply_required(&mut next.title, "title")?;
        patch.subtitle.apply_to(&mut next.subtitle);
        patch.description.apply_to(&mut next.description);
        patch.body.apply_to(&mut next.body);
        patch.header_image.apply_to(&mut next.header_image);
        patch.icon.apply_to(&mut next.icon);
        patch.url.apply_to(&mut next.url);
        patch.details.apply_list(&mut next.details);
        patch.gallery.apply_list(&mut next.gallery);
        patch.links.apply_list(&mut next.links);
        patch.position.apply_required(&mut next.position, "position")?;
        patch.z_index.apply_required(&mut next.z_index, "z_index")?;
        patch.price.apply_to(&mut next.price);
        next.validate()?;
        next.updated_at = now_epoch_ms();
        *self = next;
        Ok(())
    }
}

/// Creation input for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub kind: ItemKind,
    #[serde(default)]
    pub parent_id: Option<ItemId>,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub header_image: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub details: Vec<DetailEntry>,
    #[serde(default)]
    pub gallery: Vec<GalleryImage>,
    #[serde(default)]
    pub links: Vec<ExternalLink>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub z_index: Option<i64>,
    #[serde(default)]
    pub access_level: Option<AccessLevel>,
    #[serde(default)]
    pub price: Option<Price>,
}

impl NewItem {
    pub fn new(kind: ItemKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            parent_id: None,
            title: title.into(),
            subtitle: None,
            description: None,
            body: None,
            header_image: None,
            icon: None,
            url: None,
            details: Vec::new(),
            gallery: Vec::new(),
            links: Vec::new(),
            position: None,
            z_index: None,
            access_level: None,
            price: None,
        }
    }

    pub fn under(mut self, parent_id: ItemId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position { x, y });
        self
    }

    /// Materialises the item record; order is assigned by storage.
    pub fn into_item(self, desktop_id: DesktopId) -> Result<Item, ValidationError> {
        let mut item = Item::new(desktop_id, self.parent_id, self.kind, self.title);
        item.subtitle = self.subtitle;
        item.description = self.description;
        item.body = self.body;
        item.header_image = self.header_image;
        item.icon = self.icon;
        item.url = self.url;
        item.details = self.details;
        item.gallery = self.gallery;
        item.links = self.links;
        if let Some(position) = self.position {
            item.position = position;
        }
        item.z_index = self.z_index.unwrap_or(0);
        item.access_level = self.access_level.unwrap_or(AccessLevel::Free);
        item.price = self.price;
        item.validate()?;
        Ok(item)
    }
}

/// Partial update for item content fields.
///
/// Tree placement, ordering and workflow state have dedicated operations
/// and are not patchable here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub subtitle: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub body: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub header_image: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub icon: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub url: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub details: Patch<Vec<DetailEntry>>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub gallery: Patch<Vec<GalleryImage>>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub links: Patch<Vec<ExternalLink>>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub position: Patch<Position>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub z_index: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub price: Patch<Price>,
}
