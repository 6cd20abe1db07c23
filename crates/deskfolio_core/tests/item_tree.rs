use deskfolio_core::db::open_db_in_memory;
use deskfolio_core::model::item::{DetailEntry, FileType, ItemKind, NewItem, Position};
use deskfolio_core::model::patch::Patch;
use deskfolio_core::repo::desktop_repo::SqliteDesktopRepository;
use deskfolio_core::repo::item_repo::{DeleteMode, SqliteItemRepository};
use deskfolio_core::service::desktop_service::DesktopService;
use deskfolio_core::service::tree_service::TreeService;
use deskfolio_core::{Caller, CoreLimits, Desktop, ErrorCode, ItemPatch};
use rusqlite::Connection;
use uuid::Uuid;

type Tree<'conn> = TreeService<SqliteDesktopRepository<'conn>, SqliteItemRepository<'conn>>;

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

fn tree(conn: &Connection) -> Tree<'_> {
    tree_with(conn, CoreLimits::default())
}

fn tree_with(conn: &Connection, limits: CoreLimits) -> Tree<'_> {
    TreeService::new(
        SqliteDesktopRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
        limits,
    )
}

fn folder(title: &str) -> NewItem {
    NewItem::new(ItemKind::ContentFile(FileType::Folder), title)
}

fn note(title: &str) -> NewItem {
    NewItem::new(ItemKind::ContentFile(FileType::Note), title)
}

#[test]
fn create_assigns_next_sibling_order() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    let f = service.create_item(&owner(), desk.id, folder("F")).unwrap();
    let n1 = service
        .create_item(&owner(), desk.id, note("N1").under(f.id).at(10.0, 10.0))
        .unwrap();
    let n2 = service
        .create_item(&owner(), desk.id, note("N2").under(f.id).at(20.0, 10.0))
        .unwrap();

    assert_eq!(f.order, 0);
    assert_eq!(n1.order, 0);
    assert_eq!(n2.order, 1);
    assert_eq!(n1.position, Position { x: 10.0, y: 10.0 });
}

#[test]
fn create_clamps_extreme_positions() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    let far = service
        .create_item(&owner(), desk.id, note("far").at(1_000.0, -50.0))
        .unwrap();
    assert_eq!(far.position, Position { x: 100.0, y: 0.0 });

    let err = service
        .create_item(&owner(), desk.id, note("nan").at(f64::NAN, 1.0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[test]
fn parent_must_be_folder_on_same_desktop() {
    let conn = setup();
    let desk = desktop(&conn);
    let other_owner = Caller::account("acct-other");
    let other = DesktopService::new(SqliteDesktopRepository::try_new(&conn).unwrap())
        .ensure_desktop(&other_owner, "other")
        .unwrap();
    let service = tree(&conn);

    let plain = service.create_item(&owner(), desk.id, note("plain")).unwrap();
    let foreign = service
        .create_item(&other_owner, other.id, folder("foreign"))
        .unwrap();

    for parent in [plain.id, foreign.id, Uuid::new_v4()] {
        let err = service
            .create_item(&owner(), desk.id, note("child").under(parent))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParent);
    }
}

#[test]
fn ownership_is_required() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    let err = service
        .create_item(&Caller::Anonymous, desk.id, note("x"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unauthorized);

    let err = service
        .create_item(&Caller::account("intruder"), desk.id, note("x"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);

    let item = service.create_item(&owner(), desk.id, note("mine")).unwrap();
    let err = service
        .update_item(&Caller::account("intruder"), item.id, ItemPatch::default())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[test]
fn desktop_icon_quota_allows_twenty() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    for index in 0..20 {
        service
            .create_item(
                &owner(),
                desk.id,
                NewItem::new(ItemKind::DesktopIcon, format!("icon {index}")),
            )
            .unwrap();
    }
    let err = service
        .create_item(
            &owner(),
            desk.id,
            NewItem::new(ItemKind::DesktopIcon, "icon 21"),
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LimitReached);

    // Content files have their own budget.
    service.create_item(&owner(), desk.id, note("still ok")).unwrap();
}

#[test]
fn content_file_quota_is_enforced() {
    let conn = setup();
    let desk = desktop(&conn);
    let limits = CoreLimits {
        max_content_files: 20,
        ..CoreLimits::default()
    };
    let service = tree_with(&conn, limits);

    for index in 0..20 {
        service
            .create_item(&owner(), desk.id, note(&format!("note {index}")))
            .unwrap();
    }
    let err = service
        .create_item(&owner(), desk.id, note("note 21"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LimitReached);
}

#[test]
fn patch_distinguishes_null_from_absent() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    let mut input = note("with lists");
    input.subtitle = Some("sub".to_string());
    input.details = vec![DetailEntry {
        label: "Role".to_string(),
        value: "Lead".to_string(),
    }];
    let item = service.create_item(&owner(), desk.id, input).unwrap();

    let patch: ItemPatch = serde_json::from_str(r#"{"title": "renamed"}"#).unwrap();
    let updated = service.update_item(&owner(), item.id, patch).unwrap();
    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.subtitle.as_deref(), Some("sub"));
    assert_eq!(updated.details.len(), 1);

    let patch: ItemPatch = serde_json::from_str(r#"{"subtitle": null, "details": null}"#).unwrap();
    let cleared = service.update_item(&owner(), item.id, patch).unwrap();
    assert_eq!(cleared.subtitle, None);
    assert!(cleared.details.is_empty());
    assert_eq!(cleared.title, "renamed");

    let err = service
        .update_item(
            &owner(),
            item.id,
            ItemPatch {
                title: Patch::Clear,
                ..ItemPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[test]
fn move_rejects_cycles_and_non_folders() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    let outer = service.create_item(&owner(), desk.id, folder("outer")).unwrap();
    let inner = service
        .create_item(&owner(), desk.id, folder("inner").under(outer.id))
        .unwrap();
    let deepest = service
        .create_item(&owner(), desk.id, folder("deepest").under(inner.id))
        .unwrap();
    let leaf = service.create_item(&owner(), desk.id, note("leaf")).unwrap();

    for target in [outer.id, inner.id, deepest.id] {
        let err = service
            .move_item(&owner(), outer.id, Some(target))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParent);
    }
    let err = service
        .move_item(&owner(), inner.id, Some(leaf.id))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParent);

    let moved = service.move_item(&owner(), deepest.id, None).unwrap();
    assert_eq!(moved.parent_id, None);
    assert_eq!(moved.order, 2);
}

#[test]
fn move_appends_after_new_siblings() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    let target = service.create_item(&owner(), desk.id, folder("target")).unwrap();
    service
        .create_item(&owner(), desk.id, note("a").under(target.id))
        .unwrap();
    service
        .create_item(&owner(), desk.id, note("b").under(target.id))
        .unwrap();
    let loose = service.create_item(&owner(), desk.id, note("loose")).unwrap();

    let moved = service
        .move_item(&owner(), loose.id, Some(target.id))
        .unwrap();
    assert_eq!(moved.parent_id, Some(target.id));
    assert_eq!(moved.order, 2);

    let children = service
        .list_children(&owner(), desk.id, Some(target.id))
        .unwrap();
    let titles: Vec<_> = children.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b", "loose"]);
}

#[test]
fn cascade_delete_removes_subtree() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    let top = service.create_item(&owner(), desk.id, folder("top")).unwrap();
    let sub = service
        .create_item(&owner(), desk.id, folder("sub").under(top.id))
        .unwrap();
    service
        .create_item(&owner(), desk.id, note("deep").under(sub.id))
        .unwrap();
    let keep = service.create_item(&owner(), desk.id, note("keep")).unwrap();

    let removed = service
        .delete_item(&owner(), top.id, DeleteMode::default())
        .unwrap();
    assert_eq!(removed, 3);

    let remaining = service.list_items(&owner(), desk.id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
}

#[test]
fn dissolve_delete_reparents_children() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);

    let existing = service.create_item(&owner(), desk.id, note("existing")).unwrap();
    let bag = service.create_item(&owner(), desk.id, folder("bag")).unwrap();
    let first = service
        .create_item(&owner(), desk.id, note("first").under(bag.id))
        .unwrap();
    let second = service
        .create_item(&owner(), desk.id, note("second").under(bag.id))
        .unwrap();

    let removed = service
        .delete_item(&owner(), bag.id, DeleteMode::Dissolve)
        .unwrap();
    assert_eq!(removed, 1);

    let root = service.list_children(&owner(), desk.id, None).unwrap();
    let ids: Vec<_> = root.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![existing.id, first.id, second.id]);

    let err = service
        .delete_item(&owner(), first.id, DeleteMode::Dissolve)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[test]
fn concurrent_updates_are_last_write_wins() {
    // No concurrency token exists: the second writer silently overwrites the first.
    let conn = setup();
    let desk = desktop(&conn);
    let service = tree(&conn);
    let item = service.create_item(&owner(), desk.id, note("base")).unwrap();

    let first = ItemPatch {
        title: Patch::Set("from tab one".to_string()),
        ..ItemPatch::default()
    };
    let second = ItemPatch {
        title: Patch::Set("from tab two".to_string()),
        ..ItemPatch::default()
    };
    service.update_item(&owner(), item.id, first).unwrap();
    service.update_item(&owner(), item.id, second).unwrap();

    let stored = service.get_item(&owner(), item.id).unwrap();
    assert_eq!(stored.title, "from tab two");
}
