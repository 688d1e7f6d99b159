//! Reviewer selection over an ownership view.
//!
//! Selection runs in three passes, each inserting on its own layer so the
//! final list keeps the most specific picks first:
//!
//! 1. one leaf reviewer per distinct owners file (layer 0)
//! 2. more leaf reviewers from any touched owners file (layer 1)
//! 3. anyone listed for the touched files, closest owners first (layer 2)
//!
//! Required reviewers are collected during pass 1 and returned separately.

mod availability;
mod layered;

pub use availability::{find_reviewer, AvailabilityOracle};
pub use layered::LayeredSet;

#[cfg(test)]
pub(crate) use availability::tests::StubOracle;

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

const LAYER_OWNERS_FILE: u32 = 0;
const LAYER_LEAF_POOL: u32 = 1;
const LAYER_FULL_POOL: u32 = 2;

/// What the selector needs to know about ownership of a path.
///
/// Implemented once over reviewers and once over approvers, so the same
/// passes can fall back to approvers.
pub trait OwnersView: Send + Sync {
    /// Identifier of the owners file governing `path`
    fn owners_file(&self, path: &str) -> String;

    /// Candidates declared at the most specific level for `path`
    fn leaf(&self, path: &str) -> BTreeSet<String>;

    /// Every candidate for `path`, closest level on the lowest layer
    fn full(&self, path: &str) -> LayeredSet;

    /// Logins that must always be requested for `path`
    fn required(&self, path: &str) -> BTreeSet<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Ordered by layer, then pick order
    pub reviewers: Vec<String>,
    pub required: Vec<String>,
}

/// Picks up to `min_reviewers` reviewers for a change touching `files`.
///
/// `author` never appears in the result. With an `availability` oracle,
/// users reporting limited availability are skipped.
pub async fn select_reviewers<V, R>(
    view: &V,
    files: &[String],
    author: &str,
    min_reviewers: usize,
    availability: Option<&dyn AvailabilityOracle>,
    rng: &mut R,
) -> Selection
where
    V: OwnersView + ?Sized,
    R: Rng + Send,
{
    let mut reviewers = LayeredSet::new();
    let mut required = BTreeSet::new();
    let mut leaf_pool = LayeredSet::new();
    let mut busy = BTreeSet::new();
    let mut owners_seen = BTreeSet::new();

    if min_reviewers == 0 {
        return Selection::default();
    }

    for file in files {
        let owners_file = view.owners_file(file);
        if !owners_seen.insert(owners_file) {
            continue;
        }

        required.extend(view.required(file).into_iter().filter(|l| l != author));

        let mut file_leafs = LayeredSet::from_layer(0, view.leaf(file))
            .difference(|login| reviewers.contains(login) || login == author);
        if file_leafs.is_empty() {
            continue;
        }
        leaf_pool = leaf_pool.union(&file_leafs);
        if let Some(picked) = find_reviewer(&mut file_leafs, &mut busy, availability, rng).await {
            debug!("picked {} for owners of {}", picked, file);
            reviewers.insert(LAYER_OWNERS_FILE, picked);
        }
    }

    let mut unused_leafs = leaf_pool.difference(|login| reviewers.contains(login));
    while reviewers.len() < min_reviewers && !unused_leafs.is_empty() {
        if let Some(picked) = find_reviewer(&mut unused_leafs, &mut busy, availability, rng).await {
            reviewers.insert(LAYER_LEAF_POOL, picked);
        }
    }

    for file in files {
        if reviewers.len() >= min_reviewers {
            break;
        }
        let mut file_reviewers = view
            .full(file)
            .difference(|login| reviewers.contains(login) || login == author);
        while reviewers.len() < min_reviewers && !file_reviewers.is_empty() {
            if let Some(picked) =
                find_reviewer(&mut file_reviewers, &mut busy, availability, rng).await
            {
                reviewers.insert(LAYER_FULL_POOL, picked);
            }
        }
    }

    Selection {
        reviewers: reviewers.to_vec(),
        required: required.into_iter().collect(),
    }
}

/// Required reviewers for `files` without picking anyone else
pub fn required_reviewers<V>(view: &V, files: &[String], author: &str) -> Vec<String>
where
    V: OwnersView + ?Sized,
{
    let mut owners_seen = BTreeSet::new();
    let mut required = BTreeSet::new();
    for file in files {
        if owners_seen.insert(view.owners_file(file)) {
            required.extend(view.required(file).into_iter().filter(|l| l != author));
        }
    }
    required.into_iter().collect()
}
