//! Webhook payloads for the events the dispatcher reacts to.

use super::types::{PullRequest, Repository};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub state: String,
    /// Present only when the issue is a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReviewEvent {
    pub action: String,
    pub review: Review,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReviewCommentEvent {
    pub action: String,
    pub comment: Comment,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
}

impl CommentAction {
    fn from_action(action: &str) -> Option<Self> {
        match action {
            // reviews are "submitted" rather than "created"
            "created" | "submitted" => Some(Self::Created),
            "edited" => Some(Self::Edited),
            "deleted" | "dismissed" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// A comment on an issue or pull request, whichever event carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericCommentEvent {
    pub action: CommentAction,
    pub is_pr: bool,
    pub number: u64,
    pub issue_state: String,
    pub body: String,
    pub org: String,
    pub repo: String,
}

impl IssueCommentEvent {
    pub fn to_generic(&self) -> Option<GenericCommentEvent> {
        Some(GenericCommentEvent {
            action: CommentAction::from_action(&self.action)?,
            is_pr: self.issue.pull_request.is_some(),
            number: self.issue.number,
            issue_state: self.issue.state.clone(),
            body: self.comment.body.clone().unwrap_or_default(),
            org: self.repository.owner.login.clone(),
            repo: self.repository.name.clone(),
        })
    }
}

impl PullRequestReviewEvent {
    pub fn to_generic(&self) -> Option<GenericCommentEvent> {
        Some(GenericCommentEvent {
            action: CommentAction::from_action(&self.action)?,
            is_pr: true,
            number: self.pull_request.number,
            issue_state: self.pull_request.state.clone(),
            body: self.review.body.clone().unwrap_or_default(),
            org: self.repository.owner.login.clone(),
            repo: self.repository.name.clone(),
        })
    }
}

impl PullRequestReviewCommentEvent {
    pub fn to_generic(&self) -> Option<GenericCommentEvent> {
        Some(GenericCommentEvent {
            action: CommentAction::from_action(&self.action)?,
            is_pr: true,
            number: self.pull_request.number,
            issue_state: self.pull_request.state.clone(),
            body: self.comment.body.clone().unwrap_or_default(),
            org: self.repository.owner.login.clone(),
            repo: self.repository.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPO: &str = r#""repository":{"name":"widgets","owner":{"login":"acme"}}"#;

    #[test]
    fn test_issue_comment_on_pr() {
        let raw = format!(
            r#"{{"action":"created","issue":{{"number":12,"state":"open","pull_request":{{"url":"x"}}}},"comment":{{"body":"/auto-cc"}},{}}}"#,
            REPO
        );
        let event: IssueCommentEvent = serde_json::from_str(&raw).unwrap();
        let generic = event.to_generic().unwrap();
        assert!(generic.is_pr);
        assert_eq!(generic.action, CommentAction::Created);
        assert_eq!(generic.number, 12);
        assert_eq!(generic.org, "acme");
        assert_eq!(generic.repo, "widgets");
    }

    #[test]
    fn test_issue_comment_on_plain_issue() {
        let raw = format!(
            r#"{{"action":"created","issue":{{"number":3,"state":"open"}},"comment":{{"body":"hi"}},{}}}"#,
            REPO
        );
        let event: IssueCommentEvent = serde_json::from_str(&raw).unwrap();
        assert!(!event.to_generic().unwrap().is_pr);
    }

    #[test]
    fn test_review_submitted_counts_as_created() {
        let raw = format!(
            r#"{{"action":"submitted","review":{{"body":null}},"pull_request":{{"number":5,"state":"open","user":{{"login":"eve"}},"base":{{"ref":"main"}}}},{}}}"#,
            REPO
        );
        let event: PullRequestReviewEvent = serde_json::from_str(&raw).unwrap();
        let generic = event.to_generic().unwrap();
        assert_eq!(generic.action, CommentAction::Created);
        assert_eq!(generic.body, "");
    }

    #[test]
    fn test_unknown_action_ignored() {
        let raw = format!(
            r#"{{"action":"pinned","issue":{{"number":3,"state":"open"}},"comment":{{"body":"hi"}},{}}}"#,
            REPO
        );
        let event: IssueCommentEvent = serde_json::from_str(&raw).unwrap();
        assert!(event.to_generic().is_none());
    }
}
