use super::{build_index, OwnersDocument, OwnersSource, RepoOwners};
use crate::error::OwnersError;
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads OWNERS files from a local checkout. The ref is ignored: whatever
/// is checked out is what gets indexed.
#[derive(Debug, Clone)]
pub struct LocalOwnersSource {
    pub root: PathBuf,
    pub filename: String,
    pub aliases_filename: String,
}

impl LocalOwnersSource {
    pub fn new(root: PathBuf, filename: String, aliases_filename: String) -> Self {
        Self {
            root,
            filename,
            aliases_filename,
        }
    }

    /// Walk the checkout and index every OWNERS file found
    pub fn load_sync(&self) -> Result<RepoOwners, OwnersError> {
        let mut documents = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_exclude(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() || entry.file_name() != self.filename.as_str() {
                continue;
            }
            documents.push(self.read(path)?);
        }
        documents.sort_by(|a, b| a.path.cmp(&b.path));

        let aliases_path = self.root.join(&self.aliases_filename);
        let aliases = if aliases_path.is_file() {
            Some(self.read(&aliases_path)?)
        } else {
            None
        };

        debug!(
            "Found {} {} files under {}",
            documents.len(),
            self.filename,
            self.root.display()
        );
        build_index(aliases.as_ref(), &documents)
    }

    fn read(&self, path: &Path) -> Result<OwnersDocument, OwnersError> {
        let content = std::fs::read_to_string(path).map_err(|e| OwnersError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let rel_path = path.strip_prefix(&self.root).unwrap_or(path);
        Ok(OwnersDocument {
            path: rel_path.to_string_lossy().replace('\\', "/"),
            content,
        })
    }
}

#[async_trait]
impl OwnersSource for LocalOwnersSource {
    async fn load(&self, org: &str, repo: &str, base_ref: &str) -> Result<RepoOwners, OwnersError> {
        debug!(
            "Loading OWNERS for {}/{}@{} from {}",
            org,
            repo,
            base_ref,
            self.root.display()
        );
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.load_sync())
            .await
            .unwrap_or_else(|e| {
                Err(OwnersError::Read {
                    path: self.root.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, e),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owners::index::Role;
    use std::fs;

    fn checkout() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("OWNERS"), "approvers: [lead]\nreviewers: [team]\n").unwrap();
        fs::write(
            dir.path().join("OWNERS_ALIASES"),
            "aliases:\n  team: [alice, bob]\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("src/net")).unwrap();
        fs::write(
            dir.path().join("src/net/OWNERS"),
            "reviewers: [carol]\nrequired_reviewers: [dave]\n",
        )
        .unwrap();
        dir
    }

    fn source(root: &Path) -> LocalOwnersSource {
        LocalOwnersSource::new(
            root.to_path_buf(),
            "OWNERS".to_string(),
            "OWNERS_ALIASES".to_string(),
        )
    }

    #[test]
    fn test_load_sync_indexes_tree() {
        let dir = checkout();
        let owners = source(dir.path()).load_sync().unwrap();

        assert_eq!(owners.len(), 2);
        assert_eq!(owners.owners_file_for("src/net/udp.rs", Role::Reviewers), "src/net");
        assert!(owners.leaf("README.md", Role::Reviewers).contains("alice"));
        assert!(owners
            .all("src/net/udp.rs", Role::RequiredReviewers)
            .contains("dave"));
    }

    #[tokio::test]
    async fn test_async_load() {
        let dir = checkout();
        let owners = source(dir.path()).load("org", "repo", "main").await.unwrap();
        assert!(!owners.is_empty());
    }

    #[test]
    fn test_parse_failure_aborts() {
        let dir = checkout();
        fs::write(dir.path().join("src/OWNERS"), "reviewers: [oops").unwrap();
        assert!(source(dir.path()).load_sync().is_err());
    }
}
