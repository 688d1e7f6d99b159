use crate::config::BlunderbussConfig;
use crate::owners::{normalize_login, ApproverView, RepoOwners, ReviewerView};
use crate::selector::{required_reviewers, select_reviewers, AvailabilityOracle};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

/// Who to ask for review on one pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewPlan {
    /// Selected reviewers after the max cap, best picks first
    pub reviewers: Vec<String>,
    /// Required reviewers not already among `reviewers`
    pub required: Vec<String>,
    /// How many approvers were added as reviewers by the fallback
    pub approvers_added: usize,
}

impl ReviewPlan {
    /// Logins to request, reviewers first
    pub fn logins(&self) -> Vec<String> {
        self.reviewers
            .iter()
            .chain(self.required.iter())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.reviewers.is_empty() && self.required.is_empty()
    }
}

/// Run selection for `files`, fall back to approvers if reviewers run short,
/// cap at `max_request_count` and append required reviewers.
pub async fn plan_reviews<R: Rng + Send>(
    owners: &RepoOwners,
    files: &[String],
    author: &str,
    policy: &BlunderbussConfig,
    availability: Option<&dyn AvailabilityOracle>,
    rng: &mut R,
) -> ReviewPlan {
    let author = normalize_login(author);
    let mut reviewers: Vec<String> = Vec::new();
    let mut required: Vec<String> = Vec::new();
    let mut approvers_added = 0;

    match policy.request_count {
        Some(count) if count > 0 => {
            let selection =
                select_reviewers(&ReviewerView(owners), files, &author, count, availability, rng)
                    .await;
            reviewers = selection.reviewers;
            required = selection.required;

            if reviewers.len() < count && !policy.exclude_approvers {
                // Same target, not the gap: approvers are often reviewers too,
                // and duplicates would otherwise end the search early.
                let fallback =
                    select_reviewers(&ApproverView(owners), files, &author, count, availability, rng)
                        .await;
                for approver in fallback.reviewers {
                    if !reviewers.contains(&approver) {
                        reviewers.push(approver);
                        approvers_added += 1;
                    }
                }
                info!(
                    "Added {} approvers as reviewers. {}/{} reviewers found.",
                    approvers_added,
                    reviewers.len(),
                    count
                );
            }

            if reviewers.len() < count {
                debug!(
                    "Not enough reviewers found in OWNERS files for files touched by this PR. {}/{} reviewers found.",
                    reviewers.len(),
                    count
                );
            }
        }
        _ if policy.request_required_when_disabled => {
            required = required_reviewers(&ReviewerView(owners), files, &author);
        }
        _ => {}
    }

    if policy.max_request_count > 0 && reviewers.len() > policy.max_request_count {
        info!(
            "Limiting request of {} reviewers to {} maxReviewers.",
            reviewers.len(),
            policy.max_request_count
        );
        reviewers.truncate(policy.max_request_count);
    }

    required.retain(|login| !reviewers.contains(login));

    ReviewPlan {
        reviewers,
        required,
        approvers_added,
    }
}
