use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{AppError, ErrorBody, Result};
use crate::platform::types::*;
use crate::platform::Platform;

/// Reads GitHub data through a running relay's `/api` endpoints instead of
/// calling GitHub directly. The token travels as the `token` query
/// parameter, as the browser front end sends it.
#[derive(Clone)]
pub struct RelayPlatform {
    http: Client,
    base_url: String,
}

impl RelayPlatform {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn resource_path(repo: &RepoRef, resource: Resource) -> String {
        format!(
            "/api/repositories/{}/{}/{resource}",
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &AccessToken, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("token", token.expose())])
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamUnavailable(format!("relay {path}: {}", e.without_url()))
            })?;

        // reqwest errors carry the request URL, token included.
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AppError::from(e.without_url()));
        }

        let text = response.text().await.unwrap_or_default();
        let err = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => AppError::from_body(body, status.as_u16()),
            Err(_) => AppError::UpstreamRejected {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            },
        };
        tracing::warn!(path = %path, status = %status, error = %err, "Relay request failed");
        Err(err)
    }
}

#[async_trait]
impl Platform for RelayPlatform {
    async fn list_repositories(&self, token: &AccessToken) -> Result<Vec<RepositorySummary>> {
        self.get_json(token, "/api/repositories").await
    }

    async fn list_commits(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<Vec<CommitRecord>> {
        self.get_json(token, &Self::resource_path(repo, Resource::Commits))
            .await
    }

    async fn get_languages(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<LanguageBreakdown> {
        self.get_json(token, &Self::resource_path(repo, Resource::Languages))
            .await
    }

    async fn list_pulls(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<Vec<PullRequestRecord>> {
        self.get_json(token, &Self::resource_path(repo, Resource::Pulls))
            .await
    }

    async fn list_contributors(
        &self,
        token: &AccessToken,
        repo: &RepoRef,
    ) -> Result<Vec<ContributorRecord>> {
        self.get_json(token, &Self::resource_path(repo, Resource::Contributors))
            .await
    }
}
