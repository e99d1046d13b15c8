//! Response shapes of the GitHub REST endpoints the dashboard reads.
//!
//! Only the fields the dashboard uses are declared; serde ignores the rest.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::platform::types::PullState;

/// `GET /user/repos` item.
#[derive(Debug, Deserialize)]
pub struct RepoPayload {
    pub name: String,
    pub full_name: String,
    pub owner: UserPayload,
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub private: bool,
    pub language: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub login: String,
}

/// `GET /repos/{owner}/{repo}/commits` item.
#[derive(Debug, Deserialize)]
pub struct CommitPayload {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: Option<GitActor>,
    pub committer: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
pub struct GitActor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// `GET /repos/{owner}/{repo}/pulls` item.
#[derive(Debug, Deserialize)]
pub struct PullPayload {
    pub number: u64,
    pub title: String,
    pub user: Option<UserPayload>,
    pub state: PullState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub html_url: String,
}

/// `GET /repos/{owner}/{repo}/contributors` item.
#[derive(Debug, Deserialize)]
pub struct ContributorPayload {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u64,
}

/// Body of `POST /login/oauth/access_token`.
///
/// GitHub answers 200 even for a rejected code; in that case `error` is set
/// and `access_token` is absent.
#[derive(Deserialize)]
pub struct TokenPayload {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
