//! Linear page projection.
//!
//! # Invariants
//! - Input is limited to published notes and case studies.
//! - Ids listed in `page_order` come first, in that order; the rest follow
//!   most-recently-published first. No id appears twice.

use crate::model::item::{Item, ItemId};
use crate::projection::snapshot::{TreeSnapshot, ViewerAccess};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub items: Vec<Item>,
}

pub fn project_page(snapshot: &TreeSnapshot, access: ViewerAccess) -> PageView {
    PageView {
        items: ordered_linear(snapshot, access, &snapshot.settings.page_order),
    }
}

/// Applies an explicit id order over the linear candidates, appending the
/// unlisted remainder by `published_at DESC`.
pub(crate) fn ordered_linear(
    snapshot: &TreeSnapshot,
    access: ViewerAccess,
    explicit: &[ItemId],
) -> Vec<Item> {
    let candidates = snapshot.linear_candidates(access);
    let by_id: HashMap<ItemId, &Item> = candidates.iter().map(|item| (item.id, *item)).collect();

    let mut seen = HashSet::with_capacity(candidates.len());
    let mut ordered = Vec::with_capacity(candidates.len());
    for id in explicit {
        if let Some(item) = by_id.get(id) {
            if seen.insert(*id) {
                ordered.push((*item).clone());
            }
        }
    }

    let mut rest: Vec<&Item> = candidates
        .into_iter()
        .filter(|item| !seen.contains(&item.id))
        .collect();
    rest.sort_by(|left, right| {
        right
            .published_at
            .cmp(&left.published_at)
            .then(left.order.cmp(&right.order))
            .then(left.id.cmp(&right.id))
    });
    ordered.extend(rest.into_iter().cloned());
    ordered
}
