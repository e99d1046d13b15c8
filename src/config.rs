use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::platform::github::client::GITHUB_API_BASE;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub github: GitHubConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u8,
    /// Enables the signed `state` parameter on the OAuth round trip.
    #[serde(default)]
    pub state_secret: Option<String>,
}

// Manual Debug impl to avoid leaking the client secret
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .field("scope", &self.scope)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("per_page", &self.per_page)
            .field(
                "state_secret",
                &self.state_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FrontendConfig {
    #[serde(default = "default_frontend_url")]
    pub base_url: String,
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            base_url: default_frontend_url(),
            dashboard_path: default_dashboard_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_callback_url() -> String {
    "http://localhost:4000/callback".to_string()
}

fn default_scope() -> String {
    "repo,user".to_string()
}

fn default_authorize_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://github.com/login/oauth/access_token".to_string()
}

fn default_api_base_url() -> String {
    GITHUB_API_BASE.to_string()
}

fn default_per_page() -> u8 {
    100
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_dashboard_path() -> String {
    "/dashboard".to_string()
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("devflow").required(false));
        }

        // Environment variable overrides, e.g. DEVFLOW_GITHUB__CLIENT_SECRET
        builder = builder.add_source(
            config::Environment::with_prefix("DEVFLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.github.client_id.trim().is_empty() {
            return Err(AppError::Config("github.client_id is empty".to_string()));
        }
        if self.github.client_secret.trim().is_empty() {
            return Err(AppError::Config("github.client_secret is empty".to_string()));
        }
        if !(1..=100).contains(&self.github.per_page) {
            return Err(AppError::Config(format!(
                "github.per_page must be between 1 and 100, got {}",
                self.github.per_page
            )));
        }
        if self.github.state_secret.as_deref() == Some("") {
            return Err(AppError::Config(
                "github.state_secret is set but empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Where the browser lands after a successful exchange, without the token.
    pub fn dashboard_url(&self) -> String {
        format!(
            "{}{}",
            self.frontend.base_url.trim_end_matches('/'),
            self.frontend.dashboard_path
        )
    }
}
