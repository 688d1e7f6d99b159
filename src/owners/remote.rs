use super::{build_index, OwnersDocument, OwnersSource, RepoOwners};
use crate::error::OwnersError;
use crate::github::GitHubClient;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

/// Reads OWNERS files straight from GitHub at the pull request's base ref.
#[derive(Clone)]
pub struct GitHubOwnersSource {
    client: Arc<GitHubClient>,
    filename: String,
    aliases_filename: String,
    concurrency: usize,
}

impl GitHubOwnersSource {
    pub fn new(
        client: Arc<GitHubClient>,
        filename: String,
        aliases_filename: String,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            filename,
            aliases_filename,
            concurrency: concurrency.max(1),
        }
    }

    fn is_owners_file(&self, path: &str) -> bool {
        path.rsplit('/').next() == Some(self.filename.as_str())
    }
}

#[async_trait]
impl OwnersSource for GitHubOwnersSource {
    async fn load(&self, org: &str, repo: &str, base_ref: &str) -> Result<RepoOwners, OwnersError> {
        let tree = self.client.get_tree(org, repo, base_ref).await?;
        let paths: Vec<String> = tree
            .into_iter()
            .filter(|e| e.entry_type == "blob" && self.is_owners_file(&e.path))
            .map(|e| e.path)
            .collect();
        debug!(
            "Fetching {} {} files from {}/{}@{}",
            paths.len(),
            self.filename,
            org,
            repo,
            base_ref
        );

        let mut documents: Vec<OwnersDocument> = stream::iter(paths)
            .map(|path| {
                let client = self.client.clone();
                let (org, repo, base_ref) =
                    (org.to_string(), repo.to_string(), base_ref.to_string());
                async move {
                    let content = client.get_file(&org, &repo, &path, &base_ref).await?;
                    Ok::<_, OwnersError>(content.map(|content| OwnersDocument { path, content }))
                }
            })
            .buffer_unordered(self.concurrency)
            .try_filter_map(|doc| async move { Ok(doc) })
            .try_collect()
            .await?;
        documents.sort_by(|a, b| a.path.cmp(&b.path));

        let aliases = self
            .client
            .get_file(org, repo, &self.aliases_filename, base_ref)
            .await?
            .map(|content| OwnersDocument {
                path: self.aliases_filename.clone(),
                content,
            });

        build_index(aliases.as_ref(), &documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::GitHubClientConfig;

    #[test]
    fn test_is_owners_file() {
        let client = GitHubClient::new(GitHubClientConfig {
            api_url: "https://api.github.com".to_string(),
            token: "t".to_string(),
            timeout_secs: 5,
            dry_run: true,
        })
        .unwrap();
        let source = GitHubOwnersSource::new(
            Arc::new(client),
            "OWNERS".to_string(),
            "OWNERS_ALIASES".to_string(),
            0,
        );
        assert!(source.is_owners_file("OWNERS"));
        assert!(source.is_owners_file("src/net/OWNERS"));
        assert!(!source.is_owners_file("src/OWNERS_ALIASES"));
        assert!(!source.is_owners_file("src/NOT_OWNERS"));
        assert_eq!(source.concurrency, 1);
    }
}
