use super::layered::LayeredSet;
use crate::error::GitHubError;
use async_trait::async_trait;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, error};

/// Reports whether a user has flagged limited availability.
#[async_trait]
pub trait AvailabilityOracle: Send + Sync {
    async fn is_busy(&self, login: &str) -> Result<bool, GitHubError>;
}

/// Pop candidates from `pool` until one is not busy.
///
/// Without an oracle the first random pop wins. Lookup errors count as
/// available. Users found busy are remembered in `busy` so later pools in
/// the same selection skip them without another lookup.
pub async fn find_reviewer<R: Rng + Send>(
    pool: &mut LayeredSet,
    busy: &mut BTreeSet<String>,
    oracle: Option<&dyn AvailabilityOracle>,
    rng: &mut R,
) -> Option<String> {
    let Some(oracle) = oracle else {
        return pool.pop_random(rng);
    };

    while let Some(candidate) = pool.pop_random(rng) {
        if busy.contains(&candidate) {
            continue;
        }
        let is_busy = match oracle.is_busy(&candidate).await {
            Ok(is_busy) => is_busy,
            Err(e) => {
                error!("error checking availability of {}: {}", candidate, e);
                false
            }
        };
        if !is_busy {
            return Some(candidate);
        }
        debug!("{} has limited availability, skipping", candidate);
        busy.insert(candidate);
    }
    None
}
