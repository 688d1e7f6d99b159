use super::index::{RepoOwners, Role};
use crate::selector::{LayeredSet, OwnersView};
use std::collections::BTreeSet;

/// Reviewers as declared in OWNERS files.
pub struct ReviewerView<'a>(pub &'a RepoOwners);

/// Approvers standing in for reviewers, used when reviewers run short.
/// Required reviewers stay those of the reviewer view.
pub struct ApproverView<'a>(pub &'a RepoOwners);

impl OwnersView for ReviewerView<'_> {
    fn owners_file(&self, path: &str) -> String {
        self.0.owners_file_for(path, Role::Reviewers)
    }

    fn leaf(&self, path: &str) -> BTreeSet<String> {
        self.0.leaf(path, Role::Reviewers)
    }

    fn full(&self, path: &str) -> LayeredSet {
        self.0.layered(path, Role::Reviewers)
    }

    fn required(&self, path: &str) -> BTreeSet<String> {
        self.0.all(path, Role::RequiredReviewers)
    }
}

impl OwnersView for ApproverView<'_> {
    fn owners_file(&self, path: &str) -> String {
        self.0.owners_file_for(path, Role::Approvers)
    }

    fn leaf(&self, path: &str) -> BTreeSet<String> {
        self.0.leaf(path, Role::Approvers)
    }

    fn full(&self, path: &str) -> LayeredSet {
        self.0.layered(path, Role::Approvers)
    }

    fn required(&self, path: &str) -> BTreeSet<String> {
        self.0.all(path, Role::RequiredReviewers)
    }
}
