//! Rich content attached to items: ordered tabs owning ordered blocks.
//!
//! # Invariants
//! - A block belongs to exactly one item, and optionally to one tab of that item.
//! - Block payload shape is fixed by its `type` tag.

use crate::model::item::{GalleryImage, Item, ItemId};
use crate::model::validation::{
    check_entries, check_length, normalize_required, validate_http_url, ValidationError,
    MAX_BODY_CHARS, MAX_LIST_ENTRIES, MAX_TITLE_CHARS, MAX_URL_CHARS,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TabId = Uuid;
pub type BlockId = Uuid;

/// Ordered sub-grouping of an item's blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub item_id: ItemId,
    pub label: String,
    pub order: i64,
}

/// Typed block payload keyed by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BlockPayload {
    Text {
        body: String,
    },
    Heading {
        text: String,
        level: u8,
    },
    Image {
        url: String,
        #[serde(default)]
        alt: Option<String>,
        #[serde(default)]
        caption: Option<String>,
    },
    Gallery {
        images: Vec<GalleryImage>,
    },
    Quote {
        text: String,
        #[serde(default)]
        attribution: Option<String>,
    },
    Embed {
        url: String,
        #[serde(default)]
        height: Option<u32>,
    },
    Link {
        url: String,
        label: String,
    },
    Code {
        #[serde(default)]
        language: Option<String>,
        source: String,
    },
    Divider,
}

impl BlockPayload {
    /// Stable tag persisted next to the payload.
    pub fn block_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Heading { .. } => "heading",
            Self::Image { .. } => "image",
            Self::Gallery { .. } => "gallery",
            Self::Quote { .. } => "quote",
            Self::Embed { .. } => "embed",
            Self::Link { .. } => "link",
            Self::Code { .. } => "code",
            Self::Divider => "divider",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Text { body } => {
                normalize_required(body, "text.body", MAX_BODY_CHARS)?;
            }
            Self::Heading { text, level } => {
                normalize_required(text, "heading.text", MAX_TITLE_CHARS)?;
                if !(1..=3).contains(level) {
                    return Err(ValidationError::InvalidHeadingLevel(*level));
                }
            }
            Self::Image { url, .. } => {
                normalize_required(url, "image.url", MAX_URL_CHARS)?;
            }
            Self::Gallery { images } => {
                check_entries(images, "gallery.images", MAX_LIST_ENTRIES)?;
                for image in images {
                    normalize_required(&image.url, "gallery.images.url", MAX_URL_CHARS)?;
                }
            }
            Self::Quote { text, .. } => {
                normalize_required(text, "quote.text", MAX_BODY_CHARS)?;
            }
            Self::Embed { url, .. } => validate_http_url(url, "embed.url")?,
            Self::Link { url, label } => {
                normalize_required(label, "link.label", MAX_TITLE_CHARS)?;
                validate_http_url(url, "link.url")?;
            }
            Self::Code { source, .. } => check_length(source, "code.source", MAX_BODY_CHARS)?,
            Self::Divider => {}
        }
        Ok(())
    }
}

/// One content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub item_id: ItemId,
    /// `None` means the block sits directly on the item.
    pub tab_id: Option<TabId>,
    pub order: i64,
    pub payload: BlockPayload,
}

/// Tab with its ordered blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabContent {
    pub tab: Tab,
    pub blocks: Vec<Block>,
}

/// Full render payload of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemContent {
    pub item: Item,
    /// Top-level blocks, by order.
    pub blocks: Vec<Block>,
    /// Tabs by order, each with its blocks by order.
    pub tabs: Vec<TabContent>,
}

#[cfg(test)]
mod tests {
    use super::BlockPayload;
    use crate::model::validation::ValidationError;

    #[test]
    fn payload_round_trips_through_type_tag() {
        let payload = BlockPayload::Heading {
            text: "Intro".to_string(),
            level: 2,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "heading", "data": {"text": "Intro", "level": 2}})
        );
        let divider: BlockPayload = serde_json::from_str(r#"{"type": "divider"}"#).unwrap();
        assert_eq!(divider, BlockPayload::Divider);
    }

    #[test]
    fn payload_validation_is_per_type() {
        let heading = BlockPayload::Heading {
            text: "x".to_string(),
            level: 5,
        };
        assert_eq!(
            heading.validate(),
            Err(ValidationError::InvalidHeadingLevel(5))
        );
        let embed = BlockPayload::Embed {
            url: "ftp://files".to_string(),
            height: None,
        };
        assert!(matches!(
            embed.validate(),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }
}
