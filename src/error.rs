use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read secret file '{path}': {source}")]
    ReadSecret {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid server address '{0}'")]
    InvalidAddress(String),

    #[error("owners.source is 'local' but owners.local_root is not set")]
    MissingLocalRoot,
}

#[derive(Error, Debug)]
pub enum OwnersError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid filter pattern '{pattern}' in '{path}': {source}")]
    FilterPattern {
        path: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to walk checkout: {0}")]
    Walk(#[from] ignore::Error),

    #[error("Failed to fetch owners from GitHub: {0}")]
    GitHub(#[from] GitHubError),
}

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API returned {status} for {endpoint}: {message}")]
    Api {
        status: u16,
        endpoint: String,
        message: String,
    },

    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    #[error("Signature mismatch")]
    InvalidSignature,

    #[error("Unsupported signature format: {0}")]
    SignatureFormat(String),

    #[error("Failed to decode {event} payload: {source}")]
    Decode {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to load OWNERS for {org}/{repo}@{base_ref}: {source}")]
    LoadOwners {
        org: String,
        repo: String,
        base_ref: String,
        #[source]
        source: OwnersError,
    },

    #[error("Failed to load pull request #{number}: {source}")]
    LoadPullRequest {
        number: u64,
        #[source]
        source: GitHubError,
    },

    #[error("Failed to list changes of pull request #{number}: {source}")]
    LoadChanges {
        number: u64,
        #[source]
        source: GitHubError,
    },

    #[error("Failed to request reviews on pull request #{number}: {source}")]
    RequestReview {
        number: u64,
        #[source]
        source: GitHubError,
    },

    #[error("Failed to acquire handler permit: {0}")]
    Semaphore(#[from] tokio::sync::AcquireError),
}
