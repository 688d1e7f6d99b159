use super::file::{Aliases, OwnersEntry, OwnersFile};
use crate::error::OwnersError;
use crate::selector::LayeredSet;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Approvers,
    Reviewers,
    RequiredReviewers,
}

#[derive(Debug, Clone)]
struct Rule {
    /// None matches every path under the directory
    pattern: Option<Regex>,
    logins: BTreeSet<String>,
}

impl Rule {
    fn matches(&self, relative: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|re| re.is_match(relative))
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default)]
struct DirOwners {
    approvers: Vec<Rule>,
    reviewers: Vec<Rule>,
    required_reviewers: Vec<Rule>,
    no_parent_owners: bool,
}

impl DirOwners {
    fn rules(&self, role: Role) -> &[Rule] {
        match role {
            Role::Approvers => &self.approvers,
            Role::Reviewers => &self.reviewers,
            Role::RequiredReviewers => &self.required_reviewers,
        }
    }

    fn push(&mut self, pattern: Option<Regex>, entry: &OwnersEntry, aliases: &Aliases) {
        let lists = [
            (Role::Approvers, &entry.approvers),
            (Role::Reviewers, &entry.reviewers),
            (Role::RequiredReviewers, &entry.required_reviewers),
        ];
        for (role, names) in lists {
            let logins = aliases.expand(names);
            if logins.is_empty() {
                continue;
            }
            let rule = Rule {
                pattern: pattern.clone(),
                logins,
            };
            match role {
                Role::Approvers => self.approvers.push(rule),
                Role::Reviewers => self.reviewers.push(rule),
                Role::RequiredReviewers => self.required_reviewers.push(rule),
            }
        }
    }
}

/// Ownership index for one repository at one ref.
///
/// Directory keys are canonical: `""` is the repository root, no leading or
/// trailing slashes.
#[derive(Debug, Clone, Default)]
pub struct RepoOwners {
    dirs: HashMap<String, DirOwners>,
    aliases: Aliases,
}

impl RepoOwners {
    pub fn new(aliases: Aliases) -> Self {
        Self {
            dirs: HashMap::new(),
            aliases,
        }
    }

    /// Register the OWNERS file governing `dir`. `origin` names the file in errors.
    pub fn add(&mut self, dir: &str, file: &OwnersFile, origin: &str) -> Result<(), OwnersError> {
        let dir = canonicalize(dir);
        let mut owners = DirOwners {
            no_parent_owners: file.options.no_parent_owners,
            ..DirOwners::default()
        };

        let top_level = OwnersEntry {
            approvers: file.approvers.clone(),
            reviewers: file.reviewers.clone(),
            required_reviewers: file.required_reviewers.clone(),
        };
        owners.push(None, &top_level, &self.aliases);

        for (pattern, entry) in &file.filters {
            // ".*" is the conventional catch-all filter
            let compiled = if pattern == ".*" {
                None
            } else {
                Some(
                    Regex::new(pattern).map_err(|e| OwnersError::FilterPattern {
                        path: origin.to_string(),
                        pattern: pattern.clone(),
                        source: e,
                    })?,
                )
            };
            owners.push(compiled, entry, &self.aliases);
        }

        self.dirs.insert(dir, owners);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Number of directories carrying an OWNERS file
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Nearest directory, starting at `path` itself, with a `role` rule
    /// matching `path`. Files with no such directory resolve to `""`.
    pub fn owners_file_for(&self, path: &str, role: Role) -> String {
        let path = canonicalize(path);
        for dir in ancestors(&path) {
            let Some(owners) = self.dirs.get(&dir) else {
                continue;
            };
            let relative = relative_to(&dir, &path);
            if owners.rules(role).iter().any(|r| r.matches(relative)) {
                return dir;
            }
            if owners.no_parent_owners {
                break;
            }
        }
        String::new()
    }

    /// Entries of the most specific directory that has any for `path`
    pub fn leaf(&self, path: &str, role: Role) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.walk(path, role, |_, logins| {
            out.extend(logins.iter().cloned());
            out.is_empty()
        });
        out
    }

    /// Entries from every applicable directory; layer 0 is the closest one
    pub fn layered(&self, path: &str, role: Role) -> LayeredSet {
        let mut out = LayeredSet::new();
        self.walk(path, role, |layer, logins| {
            for login in logins {
                out.insert(layer, login.clone());
            }
            true
        });
        out
    }

    /// Entries from every applicable directory
    pub fn all(&self, path: &str, role: Role) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.walk(path, role, |_, logins| {
            out.extend(logins.iter().cloned());
            true
        });
        out
    }

    /// Walk from `path` to the root, handing each contributing directory's
    /// matching logins to `visit` with its layer. Stops when `visit` returns
    /// false or a directory disables parent owners.
    fn walk<F>(&self, path: &str, role: Role, mut visit: F)
    where
        F: FnMut(u32, &BTreeSet<String>) -> bool,
    {
        let path = canonicalize(path);
        let mut layer = 0u32;
        for dir in ancestors(&path) {
            let Some(owners) = self.dirs.get(&dir) else {
                continue;
            };

            let relative = relative_to(&dir, &path);
            let mut matched = BTreeSet::new();
            for rule in owners.rules(role).iter().filter(|r| r.matches(relative)) {
                matched.extend(rule.logins.iter().cloned());
            }

            if !matched.is_empty() {
                if !visit(layer, &matched) {
                    return;
                }
                layer += 1;
            }

            if owners.no_parent_owners {
                return;
            }
        }
    }
}

/// Strip `./`, leading and trailing slashes. The root becomes `""`.
pub fn canonicalize(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches("./").trim_matches('/');
    if trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// `path`, each parent directory, and finally the root `""`.
fn ancestors(path: &str) -> Vec<String> {
    let path = canonicalize(path);
    let mut out = Vec::new();
    let mut current = path.as_str();
    while !current.is_empty() {
        out.push(current.to_string());
        current = match current.rfind('/') {
            Some(idx) => &current[..idx],
            None => "",
        };
    }
    out.push(String::new());
    out
}

fn relative_to<'a>(dir: &str, path: &'a str) -> &'a str {
    if dir.is_empty() {
        return path;
    }
    match path.strip_prefix(dir) {
        Some(rest) if rest.is_empty() => ".",
        Some(rest) => rest.trim_start_matches('/'),
        None => path,
    }
}
