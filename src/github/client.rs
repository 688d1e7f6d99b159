//! GitHub REST/GraphQL client.

use super::types::{
    GraphQlResponse, PullRequest, PullRequestFile, ReviewRequest, Tree, TreeEntry, UserStatusData,
};
use super::{GitHubApi, PullRequestSource, ReviewRequestSink};
use crate::error::GitHubError;
use crate::selector::AvailabilityOracle;
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

const PER_PAGE: usize = 100;

const USER_STATUS_QUERY: &str =
    "query($login: String!) { user(login: $login) { status { indicatesLimitedAvailability } } }";

#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// REST base URL, e.g. `https://api.github.com` or `https://ghe.example.com/api/v3`
    pub api_url: String,
    pub token: String,
    pub timeout_secs: u64,
    /// Skip mutating calls, logging them instead
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubClientConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> Result<Self, GitHubError> {
        let mut headers = header::HeaderMap::new();

        let auth = header::HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| GitHubError::InvalidToken("token contains invalid characters".into()))?;
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("blunderbuss/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn dry_run(&self) -> bool {
        self.config.dry_run
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Base URL plus `segments`, each percent-encoded. A `/` inside a segment
    /// still separates path components.
    fn segments_url(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let base = &self.config.api_url;
        let mut url =
            Url::parse(base).map_err(|e| GitHubError::InvalidUrl(format!("{}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidUrl(base.clone()))?
            .pop_if_empty()
            .extend(segments.iter().flat_map(|s| s.split('/')));
        Ok(url)
    }

    /// GitHub Enterprise serves GraphQL beside, not under, the v3 REST root
    fn graphql_url(&self) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        match base.strip_suffix("/v3") {
            Some(api_root) => format!("{}/graphql", api_root),
            None => format!("{}/graphql", base),
        }
    }

    async fn error_for(response: Response, endpoint: &str) -> GitHubError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or(body);
        GitHubError::Api {
            status,
            endpoint: endpoint.to_string(),
            message,
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, GitHubError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(Self::error_for(response, endpoint).await)
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GitHubError> {
        let response = self.client.get(self.api_url(endpoint)).send().await?;
        self.handle_response(response, endpoint).await
    }

    /// Recursive tree listing of `git_ref`
    pub async fn get_tree(
        &self,
        org: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<Vec<TreeEntry>, GitHubError> {
        let mut url = self.segments_url(&["repos", org, repo, "git", "trees", git_ref])?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let endpoint = url.path().to_string();
        let response = self.client.get(url).send().await?;
        let tree: Tree = self.handle_response(response, &endpoint).await?;
        if tree.truncated {
            tracing::warn!(
                "Tree of {}/{}@{} is truncated; some OWNERS files may be missing",
                org,
                repo,
                git_ref
            );
        }
        Ok(tree.tree)
    }

    /// Raw file content at `git_ref`, `None` if the file does not exist
    pub async fn get_file(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>, GitHubError> {
        let url = self.segments_url(&["repos", org, repo, "contents", path])?;
        let endpoint = url.path().to_string();
        let response = self
            .client
            .get(url)
            .query(&[("ref", git_ref)])
            .header(header::ACCEPT, "application/vnd.github.raw")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text().await?)),
            _ => Err(Self::error_for(response, &endpoint).await),
        }
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn get_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError> {
        self.get(&format!("/repos/{}/{}/pulls/{}", org, repo, number))
            .await
    }

    async fn get_changed_files(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<String>, GitHubError> {
        let mut files = Vec::new();
        let mut page = 1usize;
        loop {
            let endpoint = format!(
                "/repos/{}/{}/pulls/{}/files?per_page={}&page={}",
                org, repo, number, PER_PAGE, page
            );
            let batch: Vec<PullRequestFile> = self.get(&endpoint).await?;
            let len = batch.len();
            files.extend(batch.into_iter().map(|f| f.filename));
            if len < PER_PAGE {
                break;
            }
            page += 1;
        }
        debug!("PR {}/{}#{} touches {} files", org, repo, number, files.len());
        Ok(files)
    }
}

#[async_trait]
impl ReviewRequestSink for GitHubClient {
    async fn request_review(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> Result<(), GitHubError> {
        if self.config.dry_run {
            info!(
                "[dry-run] would request reviews on {}/{}#{} from {:?}",
                org, repo, number, logins
            );
            return Ok(());
        }

        let endpoint = format!("/repos/{}/{}/pulls/{}/requested_reviewers", org, repo, number);
        let response = self
            .client
            .post(self.api_url(&endpoint))
            .json(&ReviewRequest::from_logins(logins))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(response, &endpoint).await)
        }
    }
}

#[async_trait]
impl AvailabilityOracle for GitHubClient {
    async fn is_busy(&self, login: &str) -> Result<bool, GitHubError> {
        let body = serde_json::json!({
            "query": USER_STATUS_QUERY,
            "variables": { "login": login },
        });
        let response = self.client.post(self.graphql_url()).json(&body).send().await?;
        let parsed: GraphQlResponse<UserStatusData> =
            self.handle_response(response, "/graphql").await?;

        if let Some(first) = parsed.errors.first() {
            return Err(GitHubError::GraphQl(first.message.clone()));
        }

        Ok(parsed
            .data
            .and_then(|d| d.user)
            .and_then(|u| u.status)
            .map(|s| s.indicates_limited_availability)
            .unwrap_or(false))
    }
}

impl GitHubApi for GitHubClient {
    fn availability(&self) -> &dyn AvailabilityOracle {
        self
    }
}
