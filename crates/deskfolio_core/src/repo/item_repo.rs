//! Item tree repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist items, their tree placement and every ordering dimension.
//! - Run quota checks, reparenting, subtree deletes and batch reorders
//!   inside single transactions.
//!
//! # Invariants
//! - Child listing is deterministic: `sort_order ASC, item_uuid ASC`.
//! - New items and moved items are appended after their new siblings.
//! - Batch order/position writes are all-or-nothing.

use crate::model::desktop::DesktopId;
use crate::model::item::{
    AccessLevel, FileType, Item, ItemId, ItemKind, Position, Price, PublishStatus,
};
use crate::repo::{
    apply_order_rows, ensure_connection_ready, from_json, parse_uuid, to_json, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

const ITEM_SELECT_SQL: &str = "SELECT
    item_uuid,
    desktop_uuid,
    parent_uuid,
    variant,
    file_type,
    title,
    subtitle,
    description,
    body,
    header_image,
    icon,
    url,
    details_json,
    gallery_json,
    links_json,
    sort_order,
    pos_x,
    pos_y,
    z_index,
    publish_status,
    published_at,
    access_level,
    price_amount,
    price_currency,
    created_at,
    updated_at
FROM items";

const ITEM_REQUIRED_COLUMNS: &[&str] = &[
    "item_uuid",
    "desktop_uuid",
    "parent_uuid",
    "variant",
    "file_type",
    "sort_order",
    "pos_x",
    "pos_y",
    "z_index",
    "publish_status",
    "published_at",
    "access_level",
];

/// How descendants are treated when an item is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Remove the item and its whole subtree, with tabs and blocks.
    #[default]
    Cascade,
    /// Remove the item only; direct children move to the item's parent and
    /// are appended after existing siblings there.
    Dissolve,
}

/// One clamped position write of a reposition batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionUpdate {
    pub id: ItemId,
    pub position: Position,
    /// Optional sibling order written in the same row update.
    pub order: Option<i64>,
}

/// Repository interface for item tree operations.
pub trait ItemRepository {
    /// Inserts an item appended after its siblings, unless the desktop already
    /// holds `quota` items of the same variant.
    fn insert_item(&self, item: &Item, quota: usize) -> RepoResult<Item>;
    /// Loads one item by id.
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Lists children of `parent_id` (root when `None`) in sibling order.
    fn list_children(
        &self,
        desktop_id: DesktopId,
        parent_id: Option<ItemId>,
    ) -> RepoResult<Vec<Item>>;
    /// Lists every item of a desktop in sibling order.
    fn list_desktop_items(&self, desktop_id: DesktopId) -> RepoResult<Vec<Item>>;
    /// Writes content fields, position, z-index and price of an existing item.
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    /// Reparents an item, appending it after its new siblings.
    fn move_item(&self, id: ItemId, new_parent_id: Option<ItemId>) -> RepoResult<Item>;
    /// Deletes an item; returns the number of removed items.
    fn delete_item(&self, id: ItemId, mode: DeleteMode) -> RepoResult<usize>;
    /// Writes the publish axis only. `published_at` is stamped when `stamp`
    /// is given and kept otherwise.
    fn set_publish_status(
        &self,
        id: ItemId,
        publish_status: PublishStatus,
        stamp: Option<i64>,
    ) -> RepoResult<Item>;
    /// Writes the access axis only.
    fn set_access_level(&self, id: ItemId, access_level: AccessLevel) -> RepoResult<Item>;
    /// Applies sibling orders atomically.
    fn apply_sibling_orders(&self, desktop_id: DesktopId, rows: &[(ItemId, i64)])
        -> RepoResult<()>;
    /// Applies positions (and optional orders) atomically.
    fn apply_positions(&self, desktop_id: DesktopId, rows: &[PositionUpdate]) -> RepoResult<()>;
    /// Raises one item above every other item of its desktop; returns the new z-index.
    fn bring_to_front(&self, desktop_id: DesktopId, id: ItemId) -> RepoResult<i64>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "items", ITEM_REQUIRED_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn insert_item(&self, item: &Item, quota: usize) -> RepoResult<Item> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = count_variant(&tx, item.desktop_id, item.kind)?;
        if existing >= quota {
            return Err(RepoError::LimitReached {
                entity: item.kind.variant_str(),
                max: quota,
            });
        }

        let sort_order = next_sort_order(&tx, item.desktop_id, item.parent_id)?;
        tx.execute(
            "INSERT INTO items (
                item_uuid,
                desktop_uuid,
                parent_uuid,
                variant,
                file_type,
                title,
                subtitle,
                description,
                body,
                header_image,
                icon,
                url,
                details_json,
                gallery_json,
                links_json,
                sort_order,
                pos_x,
                pos_y,
                z_index,
                publish_status,
                published_at,
                access_level,
                price_amount,
                price_currency,
                created_at,
                updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26
            );",
            params![
                item.id.to_string(),
                item.desktop_id.to_string(),
                item.parent_id.map(|value| value.to_string()),
                item.kind.variant_str(),
                item.kind.file_type().map(FileType::as_str),
                item.title.as_str(),
                item.subtitle.as_deref(),
                item.description.as_deref(),
                item.body.as_deref(),
                item.header_image.as_deref(),
                item.icon.as_deref(),
                item.url.as_deref(),
                to_json(&item.details, "items.details_json")?,
                to_json(&item.gallery, "items.gallery_json")?,
                to_json(&item.links, "items.links_json")?,
                sort_order,
                item.position.x,
                item.position.y,
                item.z_index,
                item.publish_status.as_str(),
                item.published_at,
                item.access_level.as_str(),
                item.price.as_ref().map(|price| price.amount_minor),
                item.price.as_ref().map(|price| price.currency.as_str()),
                item.created_at,
                item.updated_at,
            ],
        )?;
        tx.commit()?;

        load_required_item(self.conn, item.id)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        load_item(self.conn, id)
    }

    fn list_children(
        &self,
        desktop_id: DesktopId,
        parent_id: Option<ItemId>,
    ) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE desktop_uuid = ?1
               AND parent_uuid IS ?2
             ORDER BY sort_order ASC, item_uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            desktop_id.to_string(),
            parent_id.map(|value| value.to_string()),
        ])?;
        collect_items(&mut rows)
    }

    fn list_desktop_items(&self, desktop_id: DesktopId) -> RepoResult<Vec<Item>> {
        list_desktop_items(self.conn, desktop_id)
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE items
             SET
                title = ?2,
                subtitle = ?3,
                description = ?4,
                body = ?5,
                header_image = ?6,
                icon = ?7,
                url = ?8,
                details_json = ?9,
                gallery_json = ?10,
                links_json = ?11,
                pos_x = ?12,
                pos_y = ?13,
                z_index = ?14,
                price_amount = ?15,
                price_currency = ?16,
                updated_at = ?17
             WHERE item_uuid = ?1;",
            params![
                item.id.to_string(),
                item.title.as_str(),
                item.subtitle.as_deref(),
                item.description.as_deref(),
                item.body.as_deref(),
                item.header_image.as_deref(),
                item.icon.as_deref(),
                item.url.as_deref(),
                to_json(&item.details, "items.details_json")?,
                to_json(&item.gallery, "items.gallery_json")?,
                to_json(&item.links, "items.links_json")?,
                item.position.x,
                item.position.y,
                item.z_index,
                item.price.as_ref().map(|price| price.amount_minor),
                item.price.as_ref().map(|price| price.currency.as_str()),
                item.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "item",
                id: item.id,
            });
        }
        Ok(())
    }

    fn move_item(&self, id: ItemId, new_parent_id: Option<ItemId>) -> RepoResult<Item> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let item = load_item(&tx, id)?.ok_or(RepoError::NotFound { entity: "item", id })?;
        let sort_order = if item.parent_id == new_parent_id {
            item.order
        } else {
            next_sort_order(&tx, item.desktop_id, new_parent_id)?
        };

        tx.execute(
            "UPDATE items
             SET parent_uuid = ?2,
                 sort_order = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE item_uuid = ?1;",
            params![
                id.to_string(),
                new_parent_id.map(|value| value.to_string()),
                sort_order,
            ],
        )?;
        tx.commit()?;

        load_required_item(self.conn, id)
    }

    fn delete_item(&self, id: ItemId, mode: DeleteMode) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let item = load_item(&tx, id)?.ok_or(RepoError::NotFound { entity: "item", id })?;

        let removed = match mode {
            DeleteMode::Cascade => count_subtree(&tx, id)?,
            DeleteMode::Dissolve => {
                let children = list_child_ids(&tx, item.desktop_id, Some(id))?;
                let base_order = next_sort_order(&tx, item.desktop_id, item.parent_id)?;
                for (index, child_id) in children.into_iter().enumerate() {
                    tx.execute(
                        "UPDATE items
                         SET parent_uuid = ?2,
                             sort_order = ?3,
                             updated_at = (strftime('%s', 'now') * 1000)
                         WHERE item_uuid = ?1;",
                        params![
                            child_id.to_string(),
                            item.parent_id.map(|value| value.to_string()),
                            base_order + index as i64,
                        ],
                    )?;
                }
                1
            }
        };

        // Remaining descendants, tabs and blocks go with the row via ON DELETE CASCADE.
        tx.execute("DELETE FROM items WHERE item_uuid = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(removed)
    }

    fn set_publish_status(
        &self,
        id: ItemId,
        publish_status: PublishStatus,
        stamp: Option<i64>,
    ) -> RepoResult<Item> {
        let changed = self.conn.execute(
            "UPDATE items
             SET publish_status = ?2,
                 published_at = COALESCE(?3, published_at),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE item_uuid = ?1;",
            params![id.to_string(), publish_status.as_str(), stamp],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "item", id });
        }
        load_required_item(self.conn, id)
    }

    fn set_access_level(&self, id: ItemId, access_level: AccessLevel) -> RepoResult<Item> {
        let changed = self.conn.execute(
            "UPDATE items
             SET access_level = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE item_uuid = ?1;",
            params![id.to_string(), access_level.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "item", id });
        }
        load_required_item(self.conn, id)
    }

    fn apply_sibling_orders(
        &self,
        desktop_id: DesktopId,
        rows: &[(ItemId, i64)],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        apply_order_rows(
            &tx,
            "UPDATE items
             SET sort_order = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE item_uuid = ?1
               AND desktop_uuid = ?3;",
            "item",
            desktop_id,
            rows,
        )?;
        tx.commit()?;
        Ok(())
    }

    fn apply_positions(&self, desktop_id: DesktopId, rows: &[PositionUpdate]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "UPDATE items
                 SET pos_x = ?2,
                     pos_y = ?3,
                     sort_order = COALESCE(?4, sort_order),
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE item_uuid = ?1
                   AND desktop_uuid = ?5;",
            )?;
            for row in rows {
                let changed = stmt.execute(params![
                    row.id.to_string(),
                    row.position.x,
                    row.position.y,
                    row.order,
                    desktop_id.to_string(),
                ])?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: "item",
                        id: row.id,
                    });
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn bring_to_front(&self, desktop_id: DesktopId, id: ItemId) -> RepoResult<i64> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let top: i64 = tx.query_row(
            "SELECT COALESCE(MAX(z_index), 0) + 1
             FROM items
             WHERE desktop_uuid = ?1;",
            [desktop_id.to_string()],
            |row| row.get(0),
        )?;
        let changed = tx.execute(
            "UPDATE items
             SET z_index = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE item_uuid = ?1
               AND desktop_uuid = ?3;",
            params![id.to_string(), top, desktop_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "item", id });
        }
        tx.commit()?;
        Ok(top)
    }
}

/// Loads every item of a desktop in sibling order.
pub(crate) fn list_desktop_items(
    conn: &Connection,
    desktop_id: DesktopId,
) -> RepoResult<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "{ITEM_SELECT_SQL}
         WHERE desktop_uuid = ?1
         ORDER BY sort_order ASC, item_uuid ASC;"
    ))?;
    let mut rows = stmt.query([desktop_id.to_string()])?;
    collect_items(&mut rows)
}

fn load_item(conn: &Connection, id: ItemId) -> RepoResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE item_uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_item_row(row)?));
    }
    Ok(None)
}

fn load_required_item(conn: &Connection, id: ItemId) -> RepoResult<Item> {
    load_item(conn, id)?.ok_or(RepoError::NotFound { entity: "item", id })
}

fn collect_items(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Item>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_item_row(row)?);
    }
    Ok(items)
}

fn list_child_ids(
    conn: &Connection,
    desktop_id: DesktopId,
    parent_id: Option<ItemId>,
) -> RepoResult<Vec<ItemId>> {
    let mut stmt = conn.prepare(
        "SELECT item_uuid
         FROM items
         WHERE desktop_uuid = ?1
           AND parent_uuid IS ?2
         ORDER BY sort_order ASC, item_uuid ASC;",
    )?;
    let mut rows = stmt.query(params![
        desktop_id.to_string(),
        parent_id.map(|value| value.to_string()),
    ])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "items.item_uuid")?);
    }
    Ok(ids)
}

fn next_sort_order(
    conn: &Connection,
    desktop_id: DesktopId,
    parent_id: Option<ItemId>,
) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1
         FROM items
         WHERE desktop_uuid = ?1
           AND parent_uuid IS ?2;",
        params![
            desktop_id.to_string(),
            parent_id.map(|value| value.to_string()),
        ],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn count_variant(conn: &Connection, desktop_id: DesktopId, kind: ItemKind) -> RepoResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM items
         WHERE desktop_uuid = ?1
           AND variant = ?2;",
        params![desktop_id.to_string(), kind.variant_str()],
        |row| row.get(0),
    )?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative item count `{count}`")))
}

fn count_subtree(conn: &Connection, id: ItemId) -> RepoResult<usize> {
    let count: i64 = conn.query_row(
        "WITH RECURSIVE subtree(item_uuid) AS (
            SELECT item_uuid
            FROM items
            WHERE item_uuid = ?1
            UNION ALL
            SELECT child.item_uuid
            FROM items child
            INNER JOIN subtree parent ON child.parent_uuid = parent.item_uuid
        )
        SELECT COUNT(*) FROM subtree;",
        [id.to_string()],
        |row| row.get(0),
    )?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative subtree count `{count}`")))
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id = parse_uuid(&row.get::<_, String>("item_uuid")?, "items.item_uuid")?;
    let desktop_id = parse_uuid(&row.get::<_, String>("desktop_uuid")?, "items.desktop_uuid")?;
    let parent_id = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "items.parent_uuid"))
        .transpose()?;

    let variant: String = row.get("variant")?;
    let file_type: Option<String> = row.get("file_type")?;
    let kind = parse_kind(&variant, file_type.as_deref())?;

    let publish_text: String = row.get("publish_status")?;
    let publish_status = PublishStatus::parse(&publish_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid publish status `{publish_text}` in items.publish_status"
        ))
    })?;
    let access_text: String = row.get("access_level")?;
    let access_level = AccessLevel::parse(&access_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid access level `{access_text}` in items.access_level"
        ))
    })?;

    let price = match (
        row.get::<_, Option<i64>>("price_amount")?,
        row.get::<_, Option<String>>("price_currency")?,
    ) {
        (Some(amount_minor), Some(currency)) => Some(Price {
            amount_minor,
            currency,
        }),
        (None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(format!(
                "item {id} has a partial price"
            )))
        }
    };

    Ok(Item {
        id,
        desktop_id,
        parent_id,
        kind,
        title: row.get("title")?,
        subtitle: row.get("subtitle")?,
        description: row.get("description")?,
        body: row.get("body")?,
        header_image: row.get("header_image")?,
        icon: row.get("icon")?,
        url: row.get("url")?,
        details: from_json(&row.get::<_, String>("details_json")?, "items.details_json")?,
        gallery: from_json(&row.get::<_, String>("gallery_json")?, "items.gallery_json")?,
        links: from_json(&row.get::<_, String>("links_json")?, "items.links_json")?,
        order: row.get("sort_order")?,
        position: Position {
            x: row.get("pos_x")?,
            y: row.get("pos_y")?,
        },
        z_index: row.get("z_index")?,
        publish_status,
        published_at: row.get("published_at")?,
        access_level,
        price,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_kind(variant: &str, file_type: Option<&str>) -> RepoResult<ItemKind> {
    match (variant, file_type) {
        ("desktop_icon", None) => Ok(ItemKind::DesktopIcon),
        ("content_file", Some(value)) => FileType::parse(value)
            .map(ItemKind::ContentFile)
            .ok_or_else(|| {
                RepoError::InvalidData(format!("invalid file type `{value}` in items.file_type"))
            }),
        (other, file_type) => Err(RepoError::InvalidData(format!(
            "invalid item variant `{other}` with file type `{file_type:?}`"
        ))),
    }
}

