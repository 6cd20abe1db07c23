use deskfolio_core::db::open_db_in_memory;
use deskfolio_core::model::content::BlockPayload;
use deskfolio_core::model::item::{FileType, ItemKind, NewItem};
use deskfolio_core::repo::content_repo::SqliteContentRepository;
use deskfolio_core::repo::desktop_repo::SqliteDesktopRepository;
use deskfolio_core::repo::item_repo::{DeleteMode, SqliteItemRepository};
use deskfolio_core::service::content_service::ContentService;
use deskfolio_core::service::desktop_service::DesktopService;
use deskfolio_core::service::ordering_service::OrderRow;
use deskfolio_core::service::tree_service::TreeService;
use deskfolio_core::{Caller, CoreLimits, ErrorCode, Item};
use rusqlite::Connection;
use uuid::Uuid;

type Content<'conn> = ContentService<
    SqliteDesktopRepository<'conn>,
    SqliteItemRepository<'conn>,
    SqliteContentRepository<'conn>,
>;

fn owner() -> Caller {
    Caller::account("acct-owner")
}

fn setup() -> (Connection, Item) {
    let conn = open_db_in_memory().unwrap();
    let desk = DesktopService::new(SqliteDesktopRepository::try_new(&conn).unwrap())
        .ensure_desktop(&owner(), "owner")
        .unwrap();
    let item = tree(&conn)
        .create_item(
            &owner(),
            desk.id,
            NewItem::new(ItemKind::ContentFile(FileType::CaseStudy), "study"),
        )
        .unwrap();
    (conn, item)
}

fn tree(
    conn: &Connection,
) -> TreeService<SqliteDesktopRepository<'_>, SqliteItemRepository<'_>> {
    TreeService::new(
        SqliteDesktopRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
        CoreLimits::default(),
    )
}

fn content(conn: &Connection) -> Content<'_> {
    ContentService::new(
        SqliteDesktopRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
        SqliteContentRepository::try_new(conn).unwrap(),
    )
}

fn text(body: &str) -> BlockPayload {
    BlockPayload::Text {
        body: body.to_string(),
    }
}

#[test]
fn blocks_and_tabs_load_in_order() {
    let (conn, item) = setup();
    let service = content(&conn);

    let intro = service.add_block(&owner(), item.id, None, text("intro")).unwrap();
    let outro = service.add_block(&owner(), item.id, None, text("outro")).unwrap();
    let overview = service.add_tab(&owner(), item.id, " Overview ").unwrap();
    let results = service.add_tab(&owner(), item.id, "Results").unwrap();
    service
        .add_block(&owner(), item.id, Some(results.id), BlockPayload::Divider)
        .unwrap();
    service
        .add_block(
            &owner(),
            item.id,
            Some(overview.id),
            BlockPayload::Heading {
                text: "Goal".to_string(),
                level: 2,
            },
        )
        .unwrap();

    assert_eq!(overview.label, "Overview");
    assert_eq!((intro.order, outro.order), (0, 1));

    let loaded = service.load_item_content(&owner(), item.id).unwrap();
    let top: Vec<_> = loaded.blocks.iter().map(|block| block.id).collect();
    assert_eq!(top, vec![intro.id, outro.id]);
    let labels: Vec<_> = loaded.tabs.iter().map(|tab| tab.tab.label.as_str()).collect();
    assert_eq!(labels, vec!["Overview", "Results"]);
    assert_eq!(loaded.tabs[0].blocks.len(), 1);
    assert_eq!(loaded.tabs[0].blocks[0].order, 0);
}

#[test]
fn block_reorder_stays_in_container() {
    let (conn, item) = setup();
    let service = content(&conn);
    let first = service.add_block(&owner(), item.id, None, text("1")).unwrap();
    let second = service.add_block(&owner(), item.id, None, text("2")).unwrap();
    let tab = service.add_tab(&owner(), item.id, "Tab").unwrap();
    let tabbed = service
        .add_block(&owner(), item.id, Some(tab.id), text("t"))
        .unwrap();

    let loaded = service
        .reorder_blocks(
            &owner(),
            item.id,
            None,
            &[
                OrderRow {
                    id: second.id,
                    order: 0,
                },
                OrderRow {
                    id: first.id,
                    order: 1,
                },
            ],
        )
        .unwrap();
    let ids: Vec<_> = loaded.blocks.iter().map(|block| block.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    let err = service
        .reorder_blocks(
            &owner(),
            item.id,
            None,
            &[
                OrderRow {
                    id: first.id,
                    order: 0,
                },
                OrderRow {
                    id: tabbed.id,
                    order: 1,
                },
            ],
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    let unchanged = service.load_item_content(&owner(), item.id).unwrap();
    let ids: Vec<_> = unchanged.blocks.iter().map(|block| block.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn tab_lifecycle_and_cascade() {
    let (conn, item) = setup();
    let service = content(&conn);
    let a = service.add_tab(&owner(), item.id, "A").unwrap();
    let b = service.add_tab(&owner(), item.id, "B").unwrap();
    service
        .add_block(&owner(), item.id, Some(a.id), text("in a"))
        .unwrap();

    let tabs = service
        .reorder_tabs(
            &owner(),
            item.id,
            &[OrderRow { id: b.id, order: 0 }, OrderRow { id: a.id, order: 1 }],
        )
        .unwrap();
    assert_eq!(tabs[0].id, b.id);

    let renamed = service.rename_tab(&owner(), a.id, "Alpha").unwrap();
    assert_eq!(renamed.label, "Alpha");
    let err = service.rename_tab(&owner(), a.id, "  ").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    service.delete_tab(&owner(), a.id).unwrap();
    let blocks: i64 = conn
        .query_row("SELECT COUNT(*) FROM item_blocks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(blocks, 0);
}

#[test]
fn block_payloads_are_validated_and_replaceable() {
    let (conn, item) = setup();
    let service = content(&conn);

    let err = service
        .add_block(
            &owner(),
            item.id,
            None,
            BlockPayload::Heading {
                text: "too deep".to_string(),
                level: 6,
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let err = service
        .add_block(&owner(), item.id, Some(Uuid::new_v4()), text("orphan"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let block = service.add_block(&owner(), item.id, None, text("v1")).unwrap();
    let updated = service
        .update_block(
            &owner(),
            block.id,
            BlockPayload::Quote {
                text: "v2".to_string(),
                attribution: None,
            },
        )
        .unwrap();
    assert_eq!(updated.payload.block_type(), "quote");

    service.delete_block(&owner(), block.id).unwrap();
    let err = service.delete_block(&owner(), block.id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[test]
fn deleting_item_removes_its_content() {
    let (conn, item) = setup();
    let service = content(&conn);
    let tab = service.add_tab(&owner(), item.id, "Tab").unwrap();
    service
        .add_block(&owner(), item.id, Some(tab.id), text("x"))
        .unwrap();
    service.add_block(&owner(), item.id, None, text("y")).unwrap();

    tree(&conn)
        .delete_item(&owner(), item.id, DeleteMode::Cascade)
        .unwrap();
    let remaining: i64 = conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM item_tabs) + (SELECT COUNT(*) FROM item_blocks);",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn content_is_owner_only() {
    let (conn, item) = setup();
    let err = content(&conn)
        .add_tab(&Caller::account("intruder"), item.id, "Sneaky")
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
