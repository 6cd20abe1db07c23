//! Tab/block repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Tabs are ordered per item; blocks are ordered per container, where a
//!   container is either the item itself (`tab_uuid IS NULL`) or one tab.
//! - `block_type` always mirrors the tag inside `payload_json`.

use crate::model::content::{Block, BlockId, BlockPayload, Tab, TabId};
use crate::model::item::ItemId;
use crate::repo::{
    apply_order_rows, ensure_connection_ready, from_json, parse_uuid, to_json, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const TAB_SELECT_SQL: &str = "SELECT tab_uuid, item_uuid, label, sort_order FROM item_tabs";
const BLOCK_SELECT_SQL: &str =
    "SELECT block_uuid, item_uuid, tab_uuid, block_type, payload_json, sort_order FROM item_blocks";

/// Repository interface for item tabs and blocks.
pub trait ContentRepository {
    fn insert_tab(&self, item_id: ItemId, label: &str) -> RepoResult<Tab>;
    fn get_tab(&self, id: TabId) -> RepoResult<Option<Tab>>;
    fn rename_tab(&self, id: TabId, label: &str) -> RepoResult<Tab>;
    /// Deletes a tab together with its blocks.
    fn delete_tab(&self, id: TabId) -> RepoResult<()>;
    fn list_tabs(&self, item_id: ItemId) -> RepoResult<Vec<Tab>>;
    /// Applies tab orders of one item atomically.
    fn apply_tab_orders(&self, item_id: ItemId, rows: &[(TabId, i64)]) -> RepoResult<()>;
    /// Appends a block to its container.
    fn insert_block(
        &self,
        item_id: ItemId,
        tab_id: Option<TabId>,
        payload: &BlockPayload,
    ) -> RepoResult<Block>;
    fn get_block(&self, id: BlockId) -> RepoResult<Option<Block>>;
    fn update_block_payload(&self, id: BlockId, payload: &BlockPayload) -> RepoResult<Block>;
    fn delete_block(&self, id: BlockId) -> RepoResult<()>;
    /// Lists every block of an item, by container then order.
    fn list_blocks(&self, item_id: ItemId) -> RepoResult<Vec<Block>>;
    /// Applies block orders within one container atomically.
    fn apply_block_orders(
        &self,
        item_id: ItemId,
        tab_id: Option<TabId>,
        rows: &[(BlockId, i64)],
    ) -> RepoResult<()>;
}

/// SQLite-backed tab/block repository.
pub struct SqliteContentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "item_tabs", &["tab_uuid", "item_uuid", "sort_order"])?;
        ensure_connection_ready(
            conn,
            "item_blocks",
            &["block_uuid", "item_uuid", "tab_uuid", "block_type", "payload_json"],
        )?;
        Ok(Self { conn })
    }
}

impl ContentRepository for SqliteContentRepository<'_> {
    fn insert_tab(&self, item_id: ItemId, label: &str) -> RepoResult<Tab> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM item_tabs WHERE item_uuid = ?1;",
            [item_id.to_string()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO item_tabs (tab_uuid, item_uuid, label, sort_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), item_id.to_string(), label, sort_order],
        )?;
        tx.commit()?;
        self.get_tab(id)?
            .ok_or(RepoError::NotFound { entity: "tab", id })
    }

    fn get_tab(&self, id: TabId) -> RepoResult<Option<Tab>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TAB_SELECT_SQL} WHERE tab_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tab_row(row)?));
        }
        Ok(None)
    }

    fn rename_tab(&self, id: TabId, label: &str) -> RepoResult<Tab> {
        let changed = self.conn.execute(
            "UPDATE item_tabs
             SET label = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE tab_uuid = ?1;",
            params![id.to_string(), label],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "tab", id });
        }
        self.get_tab(id)?
            .ok_or(RepoError::NotFound { entity: "tab", id })
    }

    fn delete_tab(&self, id: TabId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM item_tabs WHERE tab_uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "tab", id });
        }
        Ok(())
    }

    fn list_tabs(&self, item_id: ItemId) -> RepoResult<Vec<Tab>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TAB_SELECT_SQL}
             WHERE item_uuid = ?1
             ORDER BY sort_order ASC, tab_uuid ASC;"
        ))?;
        let mut rows = stmt.query([item_id.to_string()])?;
        let mut tabs = Vec::new();
        while let Some(row) = rows.next()? {
            tabs.push(parse_tab_row(row)?);
        }
        Ok(tabs)
    }

    fn apply_tab_orders(&self, item_id: ItemId, rows: &[(TabId, i64)]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        apply_order_rows(
            &tx,
            "UPDATE item_tabs
             SET sort_order = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE tab_uuid = ?1
               AND item_uuid = ?3;",
            "tab",
            item_id,
            rows,
        )?;
        tx.commit()?;
        Ok(())
    }

    fn insert_block(
        &self,
        item_id: ItemId,
        tab_id: Option<TabId>,
        payload: &BlockPayload,
    ) -> RepoResult<Block> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1
             FROM item_blocks
             WHERE item_uuid = ?1
               AND tab_uuid IS ?2;",
            params![item_id.to_string(), tab_id.map(|value| value.to_string())],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO item_blocks (
                block_uuid,
                item_uuid,
                tab_uuid,
                block_type,
                payload_json,
                sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                item_id.to_string(),
                tab_id.map(|value| value.to_string()),
                payload.block_type(),
                to_json(payload, "item_blocks.payload_json")?,
                sort_order,
            ],
        )?;
        tx.commit()?;
        self.get_block(id)?
            .ok_or(RepoError::NotFound { entity: "block", id })
    }

    fn get_block(&self, id: BlockId) -> RepoResult<Option<Block>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BLOCK_SELECT_SQL} WHERE block_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_block_row(row)?));
        }
        Ok(None)
    }

    fn update_block_payload(&self, id: BlockId, payload: &BlockPayload) -> RepoResult<Block> {
        let changed = self.conn.execute(
            "UPDATE item_blocks
             SET block_type = ?2,
                 payload_json = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE block_uuid = ?1;",
            params![
                id.to_string(),
                payload.block_type(),
                to_json(payload, "item_blocks.payload_json")?,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "block", id });
        }
        self.get_block(id)?
            .ok_or(RepoError::NotFound { entity: "block", id })
    }

    fn delete_block(&self, id: BlockId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM item_blocks WHERE block_uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "block", id });
        }
        Ok(())
    }

    fn list_blocks(&self, item_id: ItemId) -> RepoResult<Vec<Block>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BLOCK_SELECT_SQL}
             WHERE item_uuid = ?1
             ORDER BY tab_uuid ASC, sort_order ASC, block_uuid ASC;"
        ))?;
        let mut rows = stmt.query([item_id.to_string()])?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next()? {
            blocks.push(parse_block_row(row)?);
        }
        Ok(blocks)
    }

    fn apply_block_orders(
        &self,
        item_id: ItemId,
        tab_id: Option<TabId>,
        rows: &[(BlockId, i64)],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(
                "UPDATE item_blocks
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE block_uuid = ?1
                   AND item_uuid = ?3
                   AND tab_uuid IS ?4;",
            )?;
            for (id, order) in rows {
                let changed = stmt.execute(params![
                    id.to_string(),
                    order,
                    item_id.to_string(),
                    tab_id.map(|value| value.to_string()),
                ])?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: "block",
                        id: *id,
                    });
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_tab_row(row: &Row<'_>) -> RepoResult<Tab> {
    Ok(Tab {
        id: parse_uuid(&row.get::<_, String>("tab_uuid")?, "item_tabs.tab_uuid")?,
        item_id: parse_uuid(&row.get::<_, String>("item_uuid")?, "item_tabs.item_uuid")?,
        label: row.get("label")?,
        order: row.get("sort_order")?,
    })
}

fn parse_block_row(row: &Row<'_>) -> RepoResult<Block> {
    let id = parse_uuid(&row.get::<_, String>("block_uuid")?, "item_blocks.block_uuid")?;
    let payload: BlockPayload = from_json(
        &row.get::<_, String>("payload_json")?,
        "item_blocks.payload_json",
    )?;
    let block_type: String = row.get("block_type")?;
    if payload.block_type() != block_type {
        return Err(RepoError::InvalidData(format!(
            "block {id} is tagged `{block_type}` but carries a `{}` payload",
            payload.block_type()
        )));
    }

    Ok(Block {
        id,
        item_id: parse_uuid(&row.get::<_, String>("item_uuid")?, "item_blocks.item_uuid")?,
        tab_id: row
            .get::<_, Option<String>>("tab_uuid")?
            .map(|value| parse_uuid(&value, "item_blocks.tab_uuid"))
            .transpose()?,
        order: row.get("sort_order")?,
        payload,
    })
}
