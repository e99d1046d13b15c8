use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Bearer credential issued by the OAuth exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Manual Debug impl to avoid leaking the token
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// `owner/name` pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A repository owned by or accessible to the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    pub full_name: String,
    pub owner_login: String,
    pub description: Option<String>,
    pub html_url: String,
    pub stars: u64,
    pub forks: u64,
    pub private: bool,
    pub language: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub authored_at: DateTime<Utc>,
    pub html_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub state: PullState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub html_url: String,
}

impl PullRequestRecord {
    /// Time from opening to merge. Merged is decided by the merge timestamp
    /// alone, not by `state`.
    pub fn merge_duration(&self) -> Option<Duration> {
        self.merged_at.map(|merged_at| merged_at - self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorRecord {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u64,
}

/// Bytes of code per language.
pub type LanguageBreakdown = BTreeMap<String, u64>;

/// The four repository-scoped resources fetched per selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Commits,
    Languages,
    Pulls,
    Contributors,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Commits,
        Resource::Languages,
        Resource::Pulls,
        Resource::Contributors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Commits => "commits",
            Resource::Languages => "languages",
            Resource::Pulls => "pulls",
            Resource::Contributors => "contributors",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("gho_supersecret");
        let debug = format!("{token:?}");
        assert!(!debug.contains("gho_supersecret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_repo_ref_parse() {
        assert_eq!(
            RepoRef::parse("octocat/hello-world"),
            Some(RepoRef::new("octocat", "hello-world"))
        );
        assert_eq!(RepoRef::parse("octocat"), None);
        assert_eq!(RepoRef::parse("/hello"), None);
        assert_eq!(RepoRef::parse("a/b/c"), None);
    }
}
