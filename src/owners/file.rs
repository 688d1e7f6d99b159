use crate::error::OwnersError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// One `OWNERS` file as written in a repository.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnersFile {
    #[serde(default)]
    pub approvers: Vec<String>,

    #[serde(default)]
    pub reviewers: Vec<String>,

    #[serde(default)]
    pub required_reviewers: Vec<String>,

    #[serde(default)]
    pub options: OwnersOptions,

    /// Entries that only apply to paths matching the regex key
    #[serde(default)]
    pub filters: BTreeMap<String, OwnersEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnersOptions {
    #[serde(default)]
    pub no_parent_owners: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnersEntry {
    #[serde(default)]
    pub approvers: Vec<String>,

    #[serde(default)]
    pub reviewers: Vec<String>,

    #[serde(default)]
    pub required_reviewers: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AliasesFile {
    #[serde(default)]
    aliases: BTreeMap<String, Vec<String>>,
}

/// Team aliases from `OWNERS_ALIASES`, keyed by lower-cased alias name.
#[derive(Debug, Clone, Default)]
pub struct Aliases {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl Aliases {
    pub fn parse(origin: &str, content: &str) -> Result<Self, OwnersError> {
        let file: AliasesFile =
            serde_yaml::from_str(content).map_err(|e| OwnersError::Parse {
                path: origin.to_string(),
                source: e,
            })?;

        let groups = file
            .aliases
            .into_iter()
            .map(|(name, members)| {
                let members = members.iter().map(|m| normalize_login(m)).collect();
                (name.trim().to_lowercase(), members)
            })
            .collect();
        Ok(Self { groups })
    }

    /// Normalize each name and expand aliases to their members
    pub fn expand(&self, names: &[String]) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for name in names {
            let login = normalize_login(name);
            if login.is_empty() {
                continue;
            }
            match self.groups.get(&login) {
                Some(members) => out.extend(members.iter().cloned()),
                None => {
                    out.insert(login);
                }
            }
        }
        out
    }
}

impl OwnersFile {
    pub fn parse(origin: &str, content: &str) -> Result<Self, OwnersError> {
        // An empty OWNERS file is valid and declares nobody
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| OwnersError::Parse {
            path: origin.to_string(),
            source: e,
        })
    }
}

/// GitHub logins are case-insensitive; OWNERS files may prefix them with `@`.
pub fn normalize_login(login: &str) -> String {
    login.trim().trim_start_matches('@').to_lowercase()
}
