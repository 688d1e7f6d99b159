use std::path::PathBuf;

pub fn default_address() -> String {
    "0.0.0.0:8787".to_string()
}

pub fn default_hmac_secret_file() -> PathBuf {
    PathBuf::from("/etc/webhook/hmac")
}

pub fn default_max_concurrent_handlers() -> usize {
    16
}

pub fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

pub fn default_token_file() -> PathBuf {
    PathBuf::from("/etc/github/oauth")
}

pub fn default_timeout_sec() -> u64 {
    30
}

pub fn default_owners_filename() -> String {
    "OWNERS".to_string()
}

pub fn default_aliases_filename() -> String {
    "OWNERS_ALIASES".to_string()
}

pub fn default_fetch_concurrency() -> usize {
    8
}

pub fn default_request_count() -> Option<usize> {
    Some(2)
}

pub fn default_true() -> bool {
    true
}
