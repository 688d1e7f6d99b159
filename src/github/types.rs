use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Repository {
    pub name: String,
    pub owner: User,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BaseRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PullRequest {
    pub number: u64,

    #[serde(default)]
    pub draft: bool,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub state: String,

    pub user: User,

    pub base: BaseRef,
}

impl PullRequest {
    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

/// Entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Serialize)]
pub struct ReviewRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub team_reviewers: Vec<String>,
}

impl ReviewRequest {
    /// `org/team` entries become team slugs, everything else a user login
    pub fn from_logins(logins: &[String]) -> Self {
        let mut reviewers = Vec::new();
        let mut team_reviewers = Vec::new();
        for login in logins {
            match login.split_once('/') {
                Some((_, team)) => team_reviewers.push(team.to_string()),
                None => reviewers.push(login.clone()),
            }
        }
        Self {
            reviewers,
            team_reviewers,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UserStatusData {
    pub user: Option<UserStatusUser>,
}

#[derive(Debug, Deserialize)]
pub struct UserStatusUser {
    pub status: Option<UserStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    #[serde(default)]
    pub indicates_limited_availability: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_request_splits_teams() {
        let request = ReviewRequest::from_logins(&[
            "alice".to_string(),
            "kubernetes/sig-net".to_string(),
        ]);
        assert_eq!(request.reviewers, vec!["alice"]);
        assert_eq!(request.team_reviewers, vec!["sig-net"]);

        let json = serde_json::to_value(ReviewRequest::from_logins(&["bob".to_string()])).unwrap();
        assert_eq!(json, serde_json::json!({"reviewers": ["bob"]}));
    }

    #[test]
    fn test_user_status_decodes() {
        let raw = r#"{"data":{"user":{"status":{"indicatesLimitedAvailability":true}}}}"#;
        let parsed: GraphQlResponse<UserStatusData> = serde_json::from_str(raw).unwrap();
        let status = parsed.data.unwrap().user.unwrap().status.unwrap();
        assert!(status.indicates_limited_availability);
    }

    #[test]
    fn test_pull_request_defaults() {
        let raw = r#"{"number":7,"user":{"login":"eve"},"base":{"ref":"main"}}"#;
        let pr: PullRequest = serde_json::from_str(raw).unwrap();
        assert!(!pr.draft);
        assert_eq!(pr.body(), "");
        assert_eq!(pr.base.ref_name, "main");
    }
}
