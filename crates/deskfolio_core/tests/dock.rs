use deskfolio_core::db::open_db_in_memory;
use deskfolio_core::model::dock::{DockAction, NewDockItem};
use deskfolio_core::repo::desktop_repo::SqliteDesktopRepository;
use deskfolio_core::repo::dock_repo::SqliteDockRepository;
use deskfolio_core::service::desktop_service::DesktopService;
use deskfolio_core::service::dock_service::DockService;
use deskfolio_core::{Caller, CoreLimits, Desktop, ErrorCode};
use rusqlite::Connection;
use uuid::Uuid;

fn owner() -> Caller {
    Caller::account("acct-owner")
}

fn setup() -> (Connection, Desktop) {
    let conn = open_db_in_memory().unwrap();
    let desk = DesktopService::new(SqliteDesktopRepository::try_new(&conn).unwrap())
        .ensure_desktop(&owner(), "owner")
        .unwrap();
    (conn, desk)
}

fn dock(conn: &Connection) -> DockService<SqliteDesktopRepository<'_>, SqliteDockRepository<'_>> {
    DockService::new(
        SqliteDesktopRepository::try_new(conn).unwrap(),
        SqliteDockRepository::try_new(conn).unwrap(),
        CoreLimits::default(),
    )
}

fn link(target: &str) -> NewDockItem {
    NewDockItem {
        icon: "globe".to_string(),
        label: " Site ".to_string(),
        action: DockAction::OpenUrl,
        target: target.to_string(),
    }
}

#[test]
fn dock_items_append_in_order() {
    let (conn, desk) = setup();
    let service = dock(&conn);
    let first = service
        .add_dock_item(&owner(), desk.id, link("https://a.example"))
        .unwrap();
    let mail = service
        .add_dock_item(
            &owner(),
            desk.id,
            NewDockItem {
                icon: "mail".to_string(),
                label: "Mail".to_string(),
                action: DockAction::ComposeEmail,
                target: " Me@Example.COM ".to_string(),
            },
        )
        .unwrap();

    assert_eq!(first.label, "Site");
    assert_eq!(mail.target, "me@example.com");
    assert_eq!((first.order, mail.order), (0, 1));
    let ids: Vec<_> = service
        .list_dock(&owner(), desk.id)
        .unwrap()
        .iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ids, vec![first.id, mail.id]);
}

#[test]
fn ninth_dock_item_hits_the_cap() {
    let (conn, desk) = setup();
    let service = dock(&conn);
    for n in 0..8 {
        service
            .add_dock_item(&owner(), desk.id, link(&format!("https://{n}.example")))
            .unwrap();
    }
    let err = service
        .add_dock_item(&owner(), desk.id, link("https://9.example"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::LimitReached);
    assert_eq!(service.list_dock(&owner(), desk.id).unwrap().len(), 8);
}

#[test]
fn repeated_action_and_target_is_a_duplicate() {
    let (conn, desk) = setup();
    let service = dock(&conn);
    service
        .add_dock_item(&owner(), desk.id, link("https://a.example"))
        .unwrap();
    let err = service
        .add_dock_item(&owner(), desk.id, link("https://a.example"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Duplicate);
}

#[test]
fn targets_are_checked_against_the_action() {
    let (conn, desk) = setup();
    let service = dock(&conn);
    let err = service
        .add_dock_item(&owner(), desk.id, link("not a url"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let err = service
        .add_dock_item(
            &owner(),
            desk.id,
            NewDockItem {
                icon: "mail".to_string(),
                label: "Mail".to_string(),
                action: DockAction::ComposeEmail,
                target: "nobody".to_string(),
            },
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[test]
fn remove_is_scoped_to_the_desktop() {
    let (conn, desk) = setup();
    let service = dock(&conn);
    let item = service
        .add_dock_item(&owner(), desk.id, link("https://a.example"))
        .unwrap();

    let err = service
        .remove_dock_item(&owner(), desk.id, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = service
        .remove_dock_item(&Caller::account("intruder"), desk.id, item.id)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);

    service.remove_dock_item(&owner(), desk.id, item.id).unwrap();
    assert!(service.list_dock(&owner(), desk.id).unwrap().is_empty());
}
