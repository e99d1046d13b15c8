use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::{mapper, wire};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// GitHub REST API v3, authenticated with the user's OAuth token.
#[derive(Clone)]
pub struct GitHubPlatform {
    http: Client,
    base_url: String,
    per_page: u8,
}

impl GitHubPlatform {
    pub fn new(http: Client, config: &GitHubConfig) -> Self {
        Self::with_base_url(http, &config.api_base_url, config.per_page)
    }

    pub fn with_base_url(http: Client, base_url: &str, per_page: u8) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page,
        }
    }

    fn repo_path(repo: &RepoRef, resource: &str) -> String {
        format!(
            "/repos/{}/{}/{resource}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        )
    }

    /// GET `path` and decode the body. A 204 decodes to `T::default()`,
    /// which is how GitHub answers list endpoints on empty repositories.
    async fn get_json<T>(&self, token: &AccessToken, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(path = %path, "GitHub API request");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("{path}: {e}")))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(T::default()),
            status if status.is_success() => Ok(response.json().await?),
            _ => Err(classify_failure(path, response).await),
        }
    }
}

/// Turn a non-success GitHub response into the matching error category.
async fn classify_failure(path: &str, response: Response) -> AppError {
    let status = response.status();
    let rate_limit_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        == Some(0);
    let message = extract_error_message(
        &response
            .text()
            .await
            .unwrap_or_else(|_| format!("HTTP {status}")),
    );

    let err = match status.as_u16() {
        401 => AppError::UpstreamAuth(message),
        429 => AppError::UpstreamRateLimited,
        403 if rate_limit_exhausted => AppError::UpstreamRateLimited,
        403 => AppError::UpstreamAuth(message),
        404 => AppError::UpstreamNotFound(path.to_string()),
        500..=599 => AppError::UpstreamUnavailable(format!("HTTP {status}: {message}")),
        code => AppError::UpstreamRejected {
            status: code,
            message,
        },
    };

    tracing::warn!(path = %path, status = %status, error = %err, "GitHub API request failed");
    err
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn list_repositories(&self, token: &AccessToken) -> Result<Vec<RepositorySummary>> {
        let path = format!("/user/repos?sort=updated&per_page={}", self.per_page);
        let repos: Vec<wire::RepoPayload> = self.get_json(token, &path).await?;
        Ok(repos.into_iter().map(mapper::map_repository).collect())
    }

    async fn list_commits(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<Vec<CommitRecord>> {
        let path = format!(
            "{}?per_page={}",
            Self::repo_path(repo, "commits"),
            self.per_page
        );
        let commits: Vec<wire::CommitPayload> = self.get_json(token, &path).await?;
        commits.into_iter().map(mapper::map_commit).collect()
    }

    async fn get_languages(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<LanguageBreakdown> {
        self.get_json(token, &Self::repo_path(repo, "languages"))
            .await
    }

    async fn list_pulls(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<Vec<PullRequestRecord>> {
        let path = format!(
            "{}?state=all&per_page={}",
            Self::repo_path(repo, "pulls"),
            self.per_page
        );
        let pulls: Vec<wire::PullPayload> = self.get_json(token, &path).await?;
        Ok(pulls.into_iter().map(mapper::map_pull_request).collect())
    }

    async fn list_contributors(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<Vec<ContributorRecord>> {
        let path = format!(
            "{}?per_page={}",
            Self::repo_path(repo, "contributors"),
            self.per_page
        );
        let contributors: Vec<wire::ContributorPayload> = self.get_json(token, &path).await?;
        Ok(contributors
            .into_iter()
            .map(mapper::map_contributor)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn platform(server: &MockServer) -> GitHubPlatform {
        GitHubPlatform::with_base_url(Client::new(), &server.uri(), 100)
    }

    fn token() -> AccessToken {
        AccessToken::new("gho_test")
    }

    #[tokio::test]
    async fn test_list_repositories_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .and(header("authorization", "Bearer gho_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": "hello",
                "full_name": "octocat/hello",
                "owner": {"login": "octocat"},
                "description": "My first repo",
                "html_url": "https://github.com/octocat/hello",
                "stargazers_count": 42,
                "forks_count": 7,
                "private": false,
                "language": "Rust",
                "updated_at": "2024-03-01T12:00:00Z"
            }])))
            .mount(&server)
            .await;

        let repos = platform(&server).list_repositories(&token()).await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].owner_login, "octocat");
        assert_eq!(repos[0].stars, 42);
        assert_eq!(repos[0].forks, 7);
    }

    #[tokio::test]
    async fn test_401_is_upstream_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
            )
            .mount(&server)
            .await;

        let result = platform(&server).list_repositories(&token()).await;
        assert!(matches!(result, Err(AppError::UpstreamAuth(ref m)) if m == "Bad credentials"));
    }

    #[tokio::test]
    async fn test_403_with_zero_remaining_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/repos"))
            .respond_with(
                ResponseTemplate::new(403)
                    .append_header("x-ratelimit-remaining", "0")
                    .set_body_json(json!({"message": "API rate limit exceeded"})),
            )
            .mount(&server)
            .await;

        let result = platform(&server).list_repositories(&token()).await;
        assert!(matches!(result, Err(AppError::UpstreamRateLimited)));
    }

    #[tokio::test]
    async fn test_500_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/commits"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = platform(&server)
            .list_commits(&token(), &RepoRef::new("octocat", "hello"))
            .await;
        assert!(matches!(result, Err(AppError::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_pulls_request_all_states() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/pulls"))
            .and(query_param("state", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "number": 1,
                "title": "Add feature",
                "user": {"login": "ada"},
                "state": "closed",
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-03T00:00:00Z",
                "merged_at": "2024-01-03T00:00:00Z",
                "html_url": "https://github.com/octocat/hello/pull/1"
            }])))
            .mount(&server)
            .await;

        let pulls = platform(&server)
            .list_pulls(&token(), &RepoRef::new("octocat", "hello"))
            .await
            .unwrap();
        assert_eq!(pulls.len(), 1);
        assert!(pulls[0].merge_duration().is_some());
    }

    #[tokio::test]
    async fn test_contributors_204_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/empty/contributors"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let contributors = platform(&server)
            .list_contributors(&token(), &RepoRef::new("octocat", "empty"))
            .await
            .unwrap();
        assert!(contributors.is_empty());
    }

    #[tokio::test]
    async fn test_languages_decode_to_map() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/languages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Rust": 9000, "Shell": 1000})),
            )
            .mount(&server)
            .await;

        let languages = platform(&server)
            .get_languages(&token(), &RepoRef::new("octocat", "hello"))
            .await
            .unwrap();
        assert_eq!(languages.get("Rust"), Some(&9000));
        assert_eq!(languages.len(), 2);
    }
}
