pub mod github;
pub mod relay;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// Read access to a user's GitHub data, authenticated per call by the
/// user's own access token.
#[async_trait]
pub trait Platform: Send + Sync {
    /// List repositories owned by or accessible to the token's user.
    async fn list_repositories(&self, token: &AccessToken) -> Result<Vec<RepositorySummary>>;

    /// List recent commits on a repository's default branch.
    async fn list_commits(&self, token: &AccessToken, repo: &RepoRef)
        -> Result<Vec<CommitRecord>>;

    /// Fetch the byte count per language.
    async fn get_languages(&self, token: &AccessToken, repo: &RepoRef)
        -> Result<LanguageBreakdown>;

    /// List pull requests in any state.
    async fn list_pulls(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<Vec<PullRequestRecord>>;

    /// List contributors with their contribution counts.
    async fn list_contributors(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<Vec<ContributorRecord>>;
}
