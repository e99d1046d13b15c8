use reqwest::{Client, Url};

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::github::wire::TokenPayload;
use crate::platform::types::AccessToken;

/// The server-side half of GitHub's authorization-code flow.
///
/// Holds the client secret so the browser never sees it.
#[derive(Clone)]
pub struct OAuthClient {
    http: Client,
    config: GitHubConfig,
}

impl OAuthClient {
    pub fn new(http: Client, config: &GitHubConfig) -> Self {
        Self {
            http,
            config: config.clone(),
        }
    }

    /// Build the provider URL the browser is sent to by `/login`.
    pub fn authorization_url(&self, state: Option<&str>) -> Result<String> {
        let mut url = Url::parse(&self.config.authorize_url).map_err(|e| {
            AppError::Config(format!(
                "Invalid authorize URL {}: {e}",
                self.config.authorize_url
            ))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.callback_url)
                .append_pair("scope", &self.config.scope);
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }

        Ok(url.to_string())
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Every failure, whether transport, HTTP status, a provider `error`
    /// field or a missing token, comes back as [`AppError::TokenExchange`].
    #[tracing::instrument(skip_all, name = "OAuthClient::exchange_code")]
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        tracing::debug!("Exchanging authorization code for access token");

        let response = self
            .http
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenExchange(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::TokenExchange(format!(
                "Token endpoint returned {status}"
            )));
        }

        let payload: TokenPayload = response
            .json()
            .await
            .map_err(|e| AppError::TokenExchange(format!("Unreadable token response: {e}")))?;

        if let Some(error) = payload.error {
            let message = payload.error_description.unwrap_or(error);
            return Err(AppError::TokenExchange(message));
        }

        payload
            .access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| AppError::TokenExchange("No access token in response".to_string()))
    }
}
