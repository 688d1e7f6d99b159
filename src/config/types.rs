use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub owners: OwnersConfig,

    #[serde(default)]
    pub blunderbuss: BlunderbussConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,

    /// File holding the shared webhook secret
    #[serde(default = "default_hmac_secret_file")]
    pub hmac_secret_file: PathBuf,

    /// Upper bound on webhook handlers running at once (0 = unbounded)
    #[serde(default = "default_max_concurrent_handlers")]
    pub max_concurrent_handlers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            hmac_secret_file: default_hmac_secret_file(),
            max_concurrent_handlers: default_max_concurrent_handlers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GithubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,

    /// Read from GitHub but never mutate
    #[serde(default = "default_true")]
    pub dry_run: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_file: default_token_file(),
            timeout_sec: default_timeout_sec(),
            dry_run: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OwnersSourceKind {
    #[default]
    Github,
    Local,
}

impl std::fmt::Display for OwnersSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnersSourceKind::Github => write!(f, "github"),
            OwnersSourceKind::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct OwnersConfig {
    #[serde(default)]
    pub source: OwnersSourceKind,

    /// Checkout root used when `source` is `local`
    #[serde(default)]
    pub local_root: Option<PathBuf>,

    #[serde(default = "default_owners_filename")]
    pub filename: String,

    #[serde(default = "default_aliases_filename")]
    pub aliases_filename: String,

    /// Parallel OWNERS downloads when reading from GitHub
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl Default for OwnersConfig {
    fn default() -> Self {
        Self {
            source: OwnersSourceKind::default(),
            local_root: None,
            filename: default_owners_filename(),
            aliases_filename: default_aliases_filename(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

/// Review request policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct BlunderbussConfig {
    /// Number of reviewers to request; an explicit null disables review
    /// requests. Omitting the key requests 2, as the hosted plugin does.
    #[serde(default = "default_request_count", alias = "reviewer_count")]
    pub request_count: Option<usize>,

    /// Cap on requested reviewers, required reviewers excluded (0 = unlimited)
    #[serde(default, alias = "max_reviewer_count")]
    pub max_request_count: usize,

    /// Never fall back to approvers when reviewers run short
    #[serde(default)]
    pub exclude_approvers: bool,

    /// Skip users whose GitHub status indicates limited availability
    #[serde(default)]
    pub use_status_availability: bool,

    /// Still request required reviewers when `request_count` is null or 0
    #[serde(default)]
    pub request_required_when_disabled: bool,
}

impl Default for BlunderbussConfig {
    fn default() -> Self {
        Self {
            request_count: default_request_count(),
            max_request_count: 0,
            exclude_approvers: false,
            use_status_availability: false,
            request_required_when_disabled: false,
        }
    }
}

impl BlunderbussConfig {
    /// False when `request_count` is unset or 0
    pub fn requests_enabled(&self) -> bool {
        self.request_count.unwrap_or(0) > 0
    }

    /// Sentence shown in the plugin help
    pub fn describe(&self) -> String {
        match self.request_count {
            None => "Blunderbuss is currently configured to not request reviews.".to_string(),
            Some(count) => {
                let suffix = if count > 1 { "s" } else { "" };
                format!(
                    "Blunderbuss is currently configured to request reviews from {} reviewer{}.",
                    count, suffix
                )
            }
        }
    }
}
