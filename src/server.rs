use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::AppConfig;
use crate::platform::github::GitHubPlatform;
use crate::relay::{handler, OAuthClient};

pub const USER_AGENT: &str = concat!("devflow/", env!("CARGO_PKG_VERSION"));

/// Read-only state shared by all requests. The relay keeps no sessions.
pub struct AppState {
    pub config: AppConfig,
    pub oauth: OAuthClient,
    pub platform: GitHubPlatform,
}

impl AppState {
    pub fn new(config: AppConfig) -> crate::error::Result<Self> {
        let http = build_http_client()?;
        Ok(Self::with_client(config, http))
    }

    pub fn with_client(config: AppConfig, http: reqwest::Client) -> Self {
        let oauth = OAuthClient::new(http.clone(), &config.github);
        let platform = GitHubPlatform::new(http, &config.github);

        Self {
            config,
            oauth,
            platform,
        }
    }
}

pub fn build_http_client() -> crate::error::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/login", get(handler::login))
        .route("/auth/github", get(handler::login))
        .route("/callback", get(handler::callback))
        .route("/auth/github/callback", get(handler::callback))
        .route("/api/repositories", get(api::list_repositories))
        .route("/api/repos", get(api::list_repositories))
        .route("/api/commits", get(api::legacy_commits))
        .route(
            "/api/repositories/:owner/:name/commits",
            get(api::list_commits),
        )
        .route(
            "/api/repositories/:owner/:name/languages",
            get(api::get_languages),
        )
        .route("/api/repositories/:owner/:name/pulls", get(api::list_pulls))
        .route(
            "/api/repositories/:owner/:name/contributors",
            get(api::list_contributors),
        )
        .route(
            "/api/repositories/:owner/:name/selection",
            get(api::get_selection),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span with the path only. Query strings carry access tokens and
/// OAuth codes and must stay out of the logs.
fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

async fn root() -> &'static str {
    "DevFlow relay running"
}

async fn health_check() -> &'static str {
    "ok"
}
