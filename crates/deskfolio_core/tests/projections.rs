use deskfolio_core::db::open_db_in_memory;
use deskfolio_core::model::item::{FileType, ItemKind, NewItem};
use deskfolio_core::model::patch::Patch;
use deskfolio_core::model::view::{PresentWrap, ViewMode, ViewSettingsPatch};
use deskfolio_core::projection::{PlayerState, PresentPlayer, ProjectedView};
use deskfolio_core::repo::content_repo::SqliteContentRepository;
use deskfolio_core::repo::desktop_repo::SqliteDesktopRepository;
use deskfolio_core::repo::item_repo::SqliteItemRepository;
use deskfolio_core::repo::unlock_repo::SqliteUnlockRepository;
use deskfolio_core::repo::view_repo::SqliteViewRepository;
use deskfolio_core::service::access_service::AccessService;
use deskfolio_core::service::desktop_service::DesktopService;
use deskfolio_core::service::tree_service::TreeService;
use deskfolio_core::service::view_service::{ViewService, Viewer};
use deskfolio_core::{Caller, CoreLimits, Desktop, ErrorCode, Item};
use rusqlite::Connection;
use std::collections::HashSet;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn owner() -> Caller {
    Caller::account("acct-owner")
}

fn desktop(conn: &Connection) -> Desktop {
    DesktopService::new(SqliteDesktopRepository::try_new(conn).unwrap())
        .ensure_desktop(&owner(), "owner")
        .unwrap()
}

fn views(
    conn: &Connection,
) -> ViewService<
    SqliteDesktopRepository<'_>,
    SqliteViewRepository<'_>,
    SqliteUnlockRepository<'_>,
> {
    ViewService::new(
        SqliteDesktopRepository::try_new(conn).unwrap(),
        SqliteViewRepository::try_new(conn).unwrap(),
        SqliteUnlockRepository::try_new(conn).unwrap(),
    )
}

fn create(conn: &Connection, desk: &Desktop, input: NewItem) -> Item {
    TreeService::new(
        SqliteDesktopRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
        CoreLimits::default(),
    )
    .create_item(&owner(), desk.id, input)
    .unwrap()
}

fn publish(conn: &Connection, item: &Item) -> Item {
    AccessService::new(
        SqliteDesktopRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
        SqliteContentRepository::try_new(conn).unwrap(),
        SqliteUnlockRepository::try_new(conn).unwrap(),
    )
    .publish(&owner(), item.id)
    .unwrap()
}

fn published_note(conn: &Connection, desk: &Desktop, title: &str) -> Item {
    let item = create(
        conn,
        desk,
        NewItem::new(ItemKind::ContentFile(FileType::Note), title),
    );
    publish(conn, &item)
}

#[test]
fn desktop_projection_paints_by_z_index_for_visitors() {
    let conn = setup();
    let desk = desktop(&conn);
    let mut high = NewItem::new(ItemKind::DesktopIcon, "high").at(5.0, 5.0);
    high.z_index = Some(3);
    let high = publish(&conn, &create(&conn, &desk, high));
    let low = publish(
        &conn,
        &create(&conn, &desk, NewItem::new(ItemKind::DesktopIcon, "low")),
    );
    create(&conn, &desk, NewItem::new(ItemKind::DesktopIcon, "draft"));

    let view = views(&conn)
        .fetch_view("owner", Some(ViewMode::Desktop), &Viewer::anonymous(), None)
        .unwrap();
    let ProjectedView::Desktop(canvas) = view else {
        panic!("expected desktop view");
    };
    let ids: Vec<_> = canvas.items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![low.id, high.id]);
    assert_eq!((canvas.items[1].x, canvas.items[1].y), (5.0, 5.0));

    let owner_view = views(&conn)
        .fetch_view("owner", Some(ViewMode::Desktop), &Viewer::caller(owner()), None)
        .unwrap();
    let ProjectedView::Desktop(owner_canvas) = owner_view else {
        panic!("expected desktop view");
    };
    assert_eq!(owner_canvas.items.len(), 3);
}

#[test]
fn folder_scope_requires_visible_folder() {
    let conn = setup();
    let desk = desktop(&conn);
    let folder = create(
        &conn,
        &desk,
        NewItem::new(ItemKind::ContentFile(FileType::Folder), "drafts"),
    );
    create(
        &conn,
        &desk,
        NewItem::new(ItemKind::ContentFile(FileType::Note), "inside").under(folder.id),
    );

    let err = views(&conn)
        .fetch_view(
            "owner",
            Some(ViewMode::Desktop),
            &Viewer::anonymous(),
            Some(folder.id),
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let view = views(&conn)
        .fetch_view(
            "owner",
            Some(ViewMode::Desktop),
            &Viewer::caller(owner()),
            Some(folder.id),
        )
        .unwrap();
    let ProjectedView::Desktop(canvas) = view else {
        panic!("expected desktop view");
    };
    assert_eq!(canvas.folder_id, Some(folder.id));
    assert_eq!(canvas.items.len(), 1);
}

#[test]
fn page_projection_dedupes_and_orders() {
    let conn = setup();
    let desk = desktop(&conn);
    let first = published_note(&conn, &desk, "first");
    std::thread::sleep(std::time::Duration::from_millis(3));
    let second = published_note(&conn, &desk, "second");
    std::thread::sleep(std::time::Duration::from_millis(3));
    let third = published_note(&conn, &desk, "third");

    views(&conn)
        .set_view_settings(
            &owner(),
            desk.id,
            ViewSettingsPatch {
                page_order: Patch::Set(vec![first.id, first.id]),
                ..ViewSettingsPatch::default()
            },
        )
        .unwrap();

    let view = views(&conn)
        .fetch_view("owner", Some(ViewMode::Page), &Viewer::anonymous(), None)
        .unwrap();
    let ProjectedView::Page(page) = view else {
        panic!("expected page view");
    };
    let ids: Vec<_> = page.items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![first.id, third.id, second.id]);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
}

#[test]
fn fetch_view_defaults_to_active_mode() {
    let conn = setup();
    let desk = desktop(&conn);
    published_note(&conn, &desk, "slide");

    let default_view = views(&conn)
        .fetch_view("owner", None, &Viewer::anonymous(), None)
        .unwrap();
    assert_eq!(default_view.mode(), ViewMode::Desktop);

    views(&conn)
        .set_view_settings(
            &owner(),
            desk.id,
            ViewSettingsPatch {
                active_mode: Patch::Set(ViewMode::Present),
                ..ViewSettingsPatch::default()
            },
        )
        .unwrap();
    let present = views(&conn)
        .fetch_view("OWNER", None, &Viewer::anonymous(), None)
        .unwrap();
    assert_eq!(present.mode(), ViewMode::Present);
}

#[test]
fn present_deck_auto_advances_and_wraps() {
    let conn = setup();
    let desk = desktop(&conn);
    for title in ["one", "two", "three"] {
        published_note(&conn, &desk, title);
    }
    views(&conn)
        .set_view_settings(
            &owner(),
            desk.id,
            ViewSettingsPatch {
                present_auto: Patch::Set(true),
                present_delay_ms: Patch::Set(5_000),
                ..ViewSettingsPatch::default()
            },
        )
        .unwrap();

    let view = views(&conn)
        .fetch_view("owner", Some(ViewMode::Present), &Viewer::anonymous(), None)
        .unwrap();
    let ProjectedView::Present(deck) = view else {
        panic!("expected present view");
    };
    assert_eq!(deck.slides.len(), 3);
    assert_eq!(deck.wrap, PresentWrap::Loop);

    let mut player = PresentPlayer::new(&deck);
    assert_eq!(player.state(), PlayerState::Playing);
    assert_eq!(player.current(), Some(0));
    assert_eq!(player.tick(5_000), Some(1));
    assert_eq!(player.tick(5_000), Some(2));
    assert_eq!(player.tick(5_000), Some(0));
}

#[test]
fn private_desktop_is_not_found_for_visitors() {
    let conn = setup();
    let desk = desktop(&conn);
    DesktopService::new(SqliteDesktopRepository::try_new(&conn).unwrap())
        .update_desktop_settings(
            &owner(),
            desk.id,
            serde_json::from_str(r#"{"is_public": false}"#).unwrap(),
        )
        .unwrap();

    let err = views(&conn)
        .fetch_view("owner", None, &Viewer::anonymous(), None)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(views(&conn)
        .fetch_view("owner", None, &Viewer::caller(owner()), None)
        .is_ok());
}
