mod client;
pub mod events;
pub mod types;

pub use client::{GitHubClient, GitHubClientConfig};
pub use types::PullRequest;

use crate::error::GitHubError;
use crate::selector::AvailabilityOracle;
use async_trait::async_trait;

#[async_trait]
pub trait PullRequestSource: Send + Sync {
    async fn get_pull_request(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError>;

    async fn get_changed_files(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<String>, GitHubError>;
}

/// Requests reviews. Repeating a request for the same logins is harmless.
#[async_trait]
pub trait ReviewRequestSink: Send + Sync {
    async fn request_review(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> Result<(), GitHubError>;
}

/// Everything the dispatcher needs from GitHub.
pub trait GitHubApi: PullRequestSource + ReviewRequestSink {
    fn availability(&self) -> &dyn AvailabilityOracle;
}
