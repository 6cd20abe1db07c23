//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `deskfolio_core` and `deskfolio_api` linkage end to end.
//! - Seed an in-memory desktop and print its page projection as JSON.

use deskfolio_api::{ApiConfig, DeskApi};
use deskfolio_core::model::item::{FileType, ItemKind, NewItem};
use deskfolio_core::model::view::ViewMode;
use deskfolio_core::service::view_service::Viewer;
use deskfolio_core::Caller;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("deskfolio_core ping={}", deskfolio_api::ping());
    println!("deskfolio_core version={}", deskfolio_api::core_version());

    let config = ApiConfig::from_env();
    if let Some(log_dir) = config.log_dir.as_deref() {
        deskfolio_core::init_logging(&config.log_level, log_dir)?;
    }
    let api = DeskApi::open_in_memory()?;

    let owner = Caller::account("demo-owner");
    let desktop = api.ensure_desktop(&owner, "demo").into_result()?;
    for (title, file_type) in [
        ("Hello", FileType::Note),
        ("Launch retrospective", FileType::CaseStudy),
    ] {
        let item = api
            .create_item(
                &owner,
                desktop.id,
                NewItem::new(ItemKind::ContentFile(file_type), title),
            )
            .into_result()?;
        api.publish(&owner, item.id).into_result()?;
    }

    let page = api.fetch_view("demo", Some(ViewMode::Page), &Viewer::anonymous(), None);
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
