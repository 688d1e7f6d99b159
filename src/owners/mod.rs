//! OWNERS files and the per-repository ownership index built from them.

mod file;
mod index;
mod local;
mod remote;
mod view;

pub use file::{normalize_login, Aliases, OwnersFile};
pub use index::{canonicalize, RepoOwners};
pub use local::LocalOwnersSource;
pub use remote::GitHubOwnersSource;
pub use view::{ApproverView, ReviewerView};

use crate::error::OwnersError;
use async_trait::async_trait;
use tracing::debug;

/// Loads the ownership index of a repository at a given ref.
#[async_trait]
pub trait OwnersSource: Send + Sync {
    async fn load(&self, org: &str, repo: &str, base_ref: &str) -> Result<RepoOwners, OwnersError>;
}

/// Raw content of an OWNERS or aliases file and its repository path.
#[derive(Debug, Clone)]
pub struct OwnersDocument {
    pub path: String,
    pub content: String,
}

/// Parse `documents` (OWNERS files) and an optional aliases file into an index
pub fn build_index(
    aliases: Option<&OwnersDocument>,
    documents: &[OwnersDocument],
) -> Result<RepoOwners, OwnersError> {
    let aliases = match aliases {
        Some(doc) => Aliases::parse(&doc.path, &doc.content)?,
        None => Aliases::default(),
    };

    let mut owners = RepoOwners::new(aliases);
    for doc in documents {
        let file = OwnersFile::parse(&doc.path, &doc.content)?;
        owners.add(parent_dir(&doc.path), &file, &doc.path)?;
    }
    if owners.is_empty() {
        debug!("No OWNERS files found");
    } else {
        debug!("Indexed {} OWNERS files", owners.len());
    }
    Ok(owners)
}

fn parent_dir(path: &str) -> &str {
    let path = path.trim_matches('/');
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}
