use deskfolio_core::db::open_db_in_memory;
use deskfolio_core::model::patch::Patch;
use deskfolio_core::model::view::{
    PresentWrap, ViewMode, ViewSettings, ViewSettingsPatch, PRESENT_DELAY_MAX_MS,
    PRESENT_DELAY_MIN_MS,
};
use deskfolio_core::repo::desktop_repo::SqliteDesktopRepository;
use deskfolio_core::repo::unlock_repo::SqliteUnlockRepository;
use deskfolio_core::repo::view_repo::{SqliteViewRepository, ViewRepository};
use deskfolio_core::service::desktop_service::DesktopService;
use deskfolio_core::service::view_service::ViewService;
use deskfolio_core::{Caller, Desktop, ErrorCode};
use rusqlite::Connection;

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

#[test]
fn defaults_are_synthesised_not_stored() {
    let conn = setup();
    let desk = desktop(&conn);

    let settings = views(&conn).get_view_settings(&owner(), desk.id).unwrap();
    assert_eq!(settings, ViewSettings::defaults(desk.id));
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM view_settings;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn delay_is_clamped_on_write() {
    let conn = setup();
    let desk = desktop(&conn);
    let service = views(&conn);

    let high = service
        .set_view_settings(
            &owner(),
            desk.id,
            ViewSettingsPatch {
                present_delay_ms: Patch::Set(120_000),
                ..ViewSettingsPatch::default()
            },
        )
        .unwrap();
    assert_eq!(high.present_delay_ms, PRESENT_DELAY_MAX_MS);

    let low = service
        .set_view_settings(
            &owner(),
            desk.id,
            ViewSettingsPatch {
                present_delay_ms: Patch::Set(10),
                ..ViewSettingsPatch::default()
            },
        )
        .unwrap();
    assert_eq!(low.present_delay_ms, PRESENT_DELAY_MIN_MS);
}

#[test]
fn settings_round_trip_through_storage() {
    let conn = setup();
    let desk = desktop(&conn);
    let patch: ViewSettingsPatch = serde_json::from_str(
        r#"{"active_mode": "page", "present_auto": false, "present_wrap": "stop"}"#,
    )
    .unwrap();
    views(&conn)
        .set_view_settings(&owner(), desk.id, patch)
        .unwrap();

    let stored = SqliteViewRepository::try_new(&conn)
        .unwrap()
        .get_view_settings(desk.id)
        .unwrap();
    assert_eq!(stored.active_mode, ViewMode::Page);
    assert!(!stored.present_auto);
    assert_eq!(stored.present_wrap, PresentWrap::Stop);

    let reset: ViewSettingsPatch = serde_json::from_str(r#"{"active_mode": null}"#).unwrap();
    let settings = views(&conn)
        .set_view_settings(&owner(), desk.id, reset)
        .unwrap();
    assert_eq!(settings.active_mode, ViewMode::Desktop);
    assert_eq!(settings.present_wrap, PresentWrap::Stop);
}

#[test]
fn unknown_mode_is_rejected_at_the_boundary() {
    let parsed = serde_json::from_str::<ViewSettingsPatch>(r#"{"active_mode": "gallery"}"#);
    assert!(parsed.is_err());
}

#[test]
fn settings_are_owner_only() {
    let conn = setup();
    let desk = desktop(&conn);
    let err = views(&conn)
        .get_view_settings(&Caller::account("intruder"), desk.id)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
