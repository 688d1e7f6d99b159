//! Event handling: decides whether an event should trigger review requests,
//! and if so plans and sends them.

mod commands;
mod plan;

pub use commands::{has_cc_command, is_auto_cc};
pub use plan::{plan_reviews, ReviewPlan};

use crate::config::BlunderbussConfig;
use crate::error::DispatchError;
use crate::github::events::{CommentAction, GenericCommentEvent, PullRequestEvent};
use crate::github::{GitHubApi, PullRequest};
use crate::owners::OwnersSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, Instrument, Span};

/// An event the dispatcher understands.
#[derive(Debug, Clone)]
pub enum Event {
    PullRequest(PullRequestEvent),
    GenericComment(GenericCommentEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored(&'static str),
    NoReviewers,
    Requested(Vec<String>),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ignored(reason) => write!(f, "ignored: {}", reason),
            Outcome::NoReviewers => write!(f, "no reviewers found"),
            Outcome::Requested(logins) => write!(f, "requested reviews from {}", logins.join(", ")),
        }
    }
}

pub struct Dispatcher {
    github: Arc<dyn GitHubApi>,
    owners: Arc<dyn OwnersSource>,
    policy: BlunderbussConfig,
    seed: Option<u64>,
    permits: Option<Semaphore>,
}

impl Dispatcher {
    pub fn new(
        github: Arc<dyn GitHubApi>,
        owners: Arc<dyn OwnersSource>,
        policy: BlunderbussConfig,
    ) -> Self {
        Self {
            github,
            owners,
            policy,
            seed: None,
            permits: None,
        }
    }

    /// Fixed seed for reproducible selection; every event starts from it
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Bound the number of events handled at once. 0 means unbounded.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.permits = (max > 0).then(|| Semaphore::new(max));
        self
    }

    pub fn policy(&self) -> &BlunderbussConfig {
        &self.policy
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Handle `event` on a background task inside the current span
    pub fn spawn(self: &Arc<Self>, event: Event) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(
            async move {
                match dispatcher.run(event).await {
                    Ok(outcome) => info!("{}", outcome),
                    Err(e) => error!("{}", e),
                }
            }
            .instrument(Span::current()),
        )
    }

    async fn run(&self, event: Event) -> Result<Outcome, DispatchError> {
        let _permit = match &self.permits {
            Some(permits) => Some(permits.acquire().await?),
            None => None,
        };
        self.handle_event(event).await
    }

    pub async fn handle_event(&self, event: Event) -> Result<Outcome, DispatchError> {
        match event {
            Event::PullRequest(event) => self.handle_pull_request(&event).await,
            Event::GenericComment(event) => self.handle_generic_comment(&event).await,
        }
    }

    /// Newly opened or ready-for-review PRs without an explicit `/cc`
    pub async fn handle_pull_request(
        &self,
        event: &PullRequestEvent,
    ) -> Result<Outcome, DispatchError> {
        if event.action != "opened" && event.action != "ready_for_review" {
            return Ok(Outcome::Ignored("pull request action"));
        }
        if has_cc_command(event.pull_request.body()) {
            return Ok(Outcome::Ignored("body has an explicit /cc"));
        }

        self.handle(
            &event.repository.owner.login,
            &event.repository.name,
            &event.pull_request,
        )
        .await
    }

    /// `/auto-cc` comments on open pull requests
    pub async fn handle_generic_comment(
        &self,
        event: &GenericCommentEvent,
    ) -> Result<Outcome, DispatchError> {
        if event.action != CommentAction::Created {
            return Ok(Outcome::Ignored("comment action"));
        }
        if !event.is_pr {
            return Ok(Outcome::Ignored("not a pull request"));
        }
        if event.issue_state == "closed" {
            return Ok(Outcome::Ignored("pull request is closed"));
        }
        if !is_auto_cc(&event.body) {
            return Ok(Outcome::Ignored("no /auto-cc command"));
        }

        let pr = self
            .github
            .get_pull_request(&event.org, &event.repo, event.number)
            .await
            .map_err(|source| DispatchError::LoadPullRequest {
                number: event.number,
                source,
            })?;

        self.handle(&event.org, &event.repo, &pr).await
    }

    async fn handle(
        &self,
        org: &str,
        repo: &str,
        pr: &PullRequest,
    ) -> Result<Outcome, DispatchError> {
        if pr.draft {
            return Ok(Outcome::Ignored("draft pull request"));
        }
        if !self.policy.requests_enabled() && !self.policy.request_required_when_disabled {
            return Ok(Outcome::Ignored("review requests disabled"));
        }

        let base_ref = &pr.base.ref_name;
        let owners = self
            .owners
            .load(org, repo, base_ref)
            .await
            .map_err(|source| DispatchError::LoadOwners {
                org: org.to_string(),
                repo: repo.to_string(),
                base_ref: base_ref.clone(),
                source,
            })?;

        let files = self
            .github
            .get_changed_files(org, repo, pr.number)
            .await
            .map_err(|source| DispatchError::LoadChanges {
                number: pr.number,
                source,
            })?;
        debug!("{}/{}#{} changes {} files", org, repo, pr.number, files.len());

        let availability = self
            .policy
            .use_status_availability
            .then(|| self.github.availability());
        let mut rng = self.rng();
        let plan = plan_reviews(
            &owners,
            &files,
            &pr.user.login,
            &self.policy,
            availability,
            &mut rng,
        )
        .await;

        if plan.is_empty() {
            return Ok(Outcome::NoReviewers);
        }

        let logins = plan.logins();
        self.github
            .request_review(org, repo, pr.number, &logins)
            .await
            .map_err(|source| DispatchError::RequestReview {
                number: pr.number,
                source,
            })?;
        Ok(Outcome::Requested(logins))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{GitHubError, OwnersError};
    use crate::github::types::{BaseRef, Repository, User};
    use crate::github::{PullRequestSource, ReviewRequestSink};
    use crate::owners::{build_index, OwnersDocument, RepoOwners};
    use crate::selector::{AvailabilityOracle, StubOracle};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub(crate) type Request = (String, String, u64, Vec<String>);

    #[derive(Default)]
    pub(crate) struct StubGitHub {
        pub pulls: HashMap<u64, PullRequest>,
        pub files: Vec<String>,
        pub fail_requests: bool,
        pub oracle: StubOracle,
        pub requests: Mutex<Vec<Request>>,
    }

    impl StubGitHub {
        pub fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PullRequestSource for StubGitHub {
        async fn get_pull_request(
            &self,
            _org: &str,
            _repo: &str,
            number: u64,
        ) -> Result<PullRequest, GitHubError> {
            self.pulls.get(&number).cloned().ok_or(GitHubError::Api {
                status: 404,
                endpoint: format!("/pulls/{}", number),
                message: "Not Found".to_string(),
            })
        }

        async fn get_changed_files(
            &self,
            _org: &str,
            _repo: &str,
            _number: u64,
        ) -> Result<Vec<String>, GitHubError> {
            Ok(self.files.clone())
        }
    }

    #[async_trait]
    impl ReviewRequestSink for StubGitHub {
        async fn request_review(
            &self,
            org: &str,
            repo: &str,
            number: u64,
            logins: &[String],
        ) -> Result<(), GitHubError> {
            if self.fail_requests {
                return Err(GitHubError::Api {
                    status: 422,
                    endpoint: "/requested_reviewers".to_string(),
                    message: "Reviews may only be requested from collaborators".to_string(),
                });
            }
            self.requests.lock().unwrap().push((
                org.to_string(),
                repo.to_string(),
                number,
                logins.to_vec(),
            ));
            Ok(())
        }
    }

    impl GitHubApi for StubGitHub {
        fn availability(&self) -> &dyn AvailabilityOracle {
            &self.oracle
        }
    }

    pub(crate) struct StubOwners {
        documents: Vec<OwnersDocument>,
        fail: bool,
        loads: Mutex<Vec<String>>,
    }

    impl StubOwners {
        pub fn new(files: &[(&str, &str)]) -> Self {
            Self {
                documents: files
                    .iter()
                    .map(|(path, content)| OwnersDocument {
                        path: path.to_string(),
                        content: content.to_string(),
                    })
                    .collect(),
                fail: false,
                loads: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(&[])
            }
        }
    }

    #[async_trait]
    impl OwnersSource for StubOwners {
        async fn load(
            &self,
            _org: &str,
            _repo: &str,
            base_ref: &str,
        ) -> Result<RepoOwners, OwnersError> {
            self.loads.lock().unwrap().push(base_ref.to_string());
            if self.fail {
                return Err(OwnersError::GitHub(GitHubError::Api {
                    status: 500,
                    endpoint: "/git/trees".to_string(),
                    message: "boom".to_string(),
                }));
            }
            build_index(None, &self.documents)
        }
    }

    pub(crate) fn pull_request(number: u64, body: &str) -> PullRequest {
        PullRequest {
            number,
            draft: false,
            body: Some(body.to_string()),
            state: "open".to_string(),
            user: User {
                login: "eve".to_string(),
            },
            base: BaseRef {
                ref_name: "main".to_string(),
            },
        }
    }

    fn repository() -> Repository {
        Repository {
            name: "widgets".to_string(),
            owner: User {
                login: "acme".to_string(),
            },
        }
    }

    fn opened(pr: PullRequest) -> PullRequestEvent {
        PullRequestEvent {
            action: "opened".to_string(),
            pull_request: pr,
            repository: repository(),
        }
    }

    fn comment(number: u64, body: &str) -> GenericCommentEvent {
        GenericCommentEvent {
            action: CommentAction::Created,
            is_pr: true,
            number,
            issue_state: "open".to_string(),
            body: body.to_string(),
            org: "acme".to_string(),
            repo: "widgets".to_string(),
        }
    }

    pub(crate) fn scenario_owners() -> StubOwners {
        StubOwners::new(&[
            ("src/a/OWNERS", "reviewers: [alice, bob]"),
            ("src/b/OWNERS", "reviewers: [carol]\nrequired_reviewers: [dave]"),
        ])
    }

    pub(crate) fn scenario_github() -> StubGitHub {
        StubGitHub {
            files: vec!["src/a/a.go".to_string(), "src/b/b.go".to_string()],
            pulls: HashMap::from([(7, pull_request(7, ""))]),
            ..StubGitHub::default()
        }
    }

    fn policy(count: Option<usize>) -> BlunderbussConfig {
        BlunderbussConfig {
            request_count: count,
            ..BlunderbussConfig::default()
        }
    }

    fn dispatcher(
        github: Arc<StubGitHub>,
        owners: Arc<StubOwners>,
        policy: BlunderbussConfig,
    ) -> Dispatcher {
        Dispatcher::new(github, owners, policy).with_seed(Some(42))
    }

    #[tokio::test]
    async fn test_opened_pr_requests_reviews() {
        let github = Arc::new(scenario_github());
        let owners = Arc::new(scenario_owners());
        let d = dispatcher(github.clone(), owners.clone(), policy(Some(2)));

        let outcome = d
            .handle_pull_request(&opened(pull_request(7, "Adds widgets")))
            .await
            .unwrap();

        let requests = github.requests();
        assert_eq!(requests.len(), 1);
        let (org, repo, number, logins) = &requests[0];
        assert_eq!((org.as_str(), repo.as_str(), *number), ("acme", "widgets", 7));
        assert_eq!(logins.len(), 3);
        assert!(["alice", "bob"].contains(&logins[0].as_str()));
        assert_eq!(logins[1], "carol");
        assert_eq!(logins[2], "dave");
        assert_eq!(outcome, Outcome::Requested(logins.clone()));
        assert_eq!(*owners.loads.lock().unwrap(), vec!["main"]);
    }

    #[tokio::test]
    async fn test_ready_for_review_is_handled() {
        let github = Arc::new(scenario_github());
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)));
        let mut event = opened(pull_request(7, ""));
        event.action = "ready_for_review".to_string();

        d.handle_pull_request(&event).await.unwrap();
        assert_eq!(github.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_other_pr_actions_ignored() {
        let github = Arc::new(scenario_github());
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)));
        for action in ["closed", "synchronize", "edited", "labeled"] {
            let mut event = opened(pull_request(7, ""));
            event.action = action.to_string();
            let outcome = d.handle_pull_request(&event).await.unwrap();
            assert!(matches!(outcome, Outcome::Ignored(_)));
        }
        assert!(github.requests().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_cc_in_body_skips() {
        let github = Arc::new(scenario_github());
        let owners = Arc::new(scenario_owners());
        let d = dispatcher(github.clone(), owners.clone(), policy(Some(2)));

        let outcome = d
            .handle_pull_request(&opened(pull_request(7, "Fixes #3\n/cc @frank")))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Ignored(_)));
        assert!(github.requests().is_empty());
        assert!(owners.loads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_draft_skipped() {
        let github = Arc::new(scenario_github());
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)));
        let mut pr = pull_request(7, "");
        pr.draft = true;

        let outcome = d.handle_pull_request(&opened(pr)).await.unwrap();
        assert_eq!(outcome, Outcome::Ignored("draft pull request"));
        assert!(github.requests().is_empty());
    }

    #[tokio::test]
    async fn test_auto_cc_comment_fetches_pr_and_requests() {
        let github = Arc::new(scenario_github());
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)));

        let outcome = d
            .handle_generic_comment(&comment(7, "OWNERS changed\n/auto-cc"))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Requested(_)));
        assert_eq!(github.requests().len(), 1);
        assert_eq!(github.requests()[0].2, 7);
    }

    #[tokio::test]
    async fn test_comment_filters() {
        let github = Arc::new(scenario_github());
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)));

        let mut edited = comment(7, "/auto-cc");
        edited.action = CommentAction::Edited;
        let mut issue = comment(7, "/auto-cc");
        issue.is_pr = false;
        let mut closed = comment(7, "/auto-cc");
        closed.issue_state = "closed".to_string();
        let plain = comment(7, "looks good to me");

        for event in [edited, issue, closed, plain] {
            let outcome = d.handle_generic_comment(&event).await.unwrap();
            assert!(matches!(outcome, Outcome::Ignored(_)), "{:?}", event);
        }
        assert!(github.requests().is_empty());
    }

    #[tokio::test]
    async fn test_auto_cc_on_missing_pr_fails() {
        let github = Arc::new(scenario_github());
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)));
        let result = d.handle_generic_comment(&comment(99, "/auto-cc")).await;
        assert!(matches!(
            result,
            Err(DispatchError::LoadPullRequest { number: 99, .. })
        ));
    }

    #[tokio::test]
    async fn test_repeated_dispatch_is_stable() {
        let github = Arc::new(scenario_github());
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)));
        let event = opened(pull_request(7, ""));

        d.handle_pull_request(&event).await.unwrap();
        d.handle_pull_request(&event).await.unwrap();

        let requests = github.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_owners_load_failure_requests_nothing() {
        let github = Arc::new(scenario_github());
        let d = dispatcher(github.clone(), Arc::new(StubOwners::failing()), policy(Some(2)));

        let result = d.handle_pull_request(&opened(pull_request(7, ""))).await;
        assert!(matches!(result, Err(DispatchError::LoadOwners { .. })));
        assert!(github.requests().is_empty());
    }

    #[tokio::test]
    async fn test_request_failure_surfaces() {
        let github = Arc::new(StubGitHub {
            fail_requests: true,
            ..scenario_github()
        });
        let d = dispatcher(github, Arc::new(scenario_owners()), policy(Some(2)));
        let result = d.handle_pull_request(&opened(pull_request(7, ""))).await;
        assert!(matches!(
            result,
            Err(DispatchError::RequestReview { number: 7, .. })
        ));
    }

    #[tokio::test]
    async fn test_no_reviewers_no_request() {
        let github = Arc::new(scenario_github());
        let owners = Arc::new(StubOwners::new(&[("OWNERS", "reviewers: [eve]")]));
        let d = dispatcher(github.clone(), owners, policy(Some(2)));

        let outcome = d
            .handle_pull_request(&opened(pull_request(7, "")))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::NoReviewers);
        assert!(github.requests().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_count_skips_owners_load() {
        let github = Arc::new(scenario_github());
        let owners = Arc::new(scenario_owners());
        let d = dispatcher(github.clone(), owners.clone(), policy(None));

        let outcome = d
            .handle_pull_request(&opened(pull_request(7, "")))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Ignored("review requests disabled"));
        assert!(owners.loads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_count_can_request_required_only() {
        let github = Arc::new(scenario_github());
        let mut config = policy(None);
        config.request_required_when_disabled = true;
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), config);

        d.handle_pull_request(&opened(pull_request(7, "")))
            .await
            .unwrap();
        assert_eq!(github.requests()[0].3, vec!["dave"]);
    }

    #[tokio::test]
    async fn test_availability_consulted_when_enabled() {
        let github = Arc::new(StubGitHub {
            oracle: StubOracle::busy(["alice"]),
            ..scenario_github()
        });
        let mut config = policy(Some(2));
        config.use_status_availability = true;
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), config);

        d.handle_pull_request(&opened(pull_request(7, "")))
            .await
            .unwrap();
        assert_eq!(github.requests()[0].3, vec!["bob", "carol", "dave"]);
        assert!(github.oracle.call_count() > 0);
    }

    #[tokio::test]
    async fn test_availability_not_consulted_by_default() {
        let github = Arc::new(StubGitHub {
            oracle: StubOracle::busy(["alice", "bob"]),
            ..scenario_github()
        });
        let d = dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)));

        d.handle_pull_request(&opened(pull_request(7, "")))
            .await
            .unwrap();
        assert_eq!(github.oracle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_spawned_events_complete_under_concurrency_limit() {
        let github = Arc::new(scenario_github());
        let d = Arc::new(
            dispatcher(github.clone(), Arc::new(scenario_owners()), policy(Some(2)))
                .with_max_concurrency(1),
        );

        let handles: Vec<_> = (0..4)
            .map(|_| d.spawn(Event::PullRequest(opened(pull_request(7, "")))))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(github.requests().len(), 4);
    }
}
