//! Pass-through endpoints: each forwards one GitHub REST call made with the
//! caller's `?token=` and answers with the typed records.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::FixedOffset;
use serde::Deserialize;

use crate::dashboard::{fetch_selection, SelectionReport};
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

impl TokenQuery {
    fn require(self) -> Result<AccessToken> {
        non_empty(self.token)
            .map(AccessToken::new)
            .ok_or(AppError::MissingToken)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn list_repositories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<RepositorySummary>>> {
    let token = query.require()?;
    Ok(Json(state.platform.list_repositories(&token).await?))
}

pub async fn list_commits(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<CommitRecord>>> {
    let token = query.require()?;
    let repo = RepoRef::new(owner, name);
    Ok(Json(state.platform.list_commits(&token, &repo).await?))
}

pub async fn get_languages(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<LanguageBreakdown>> {
    let token = query.require()?;
    let repo = RepoRef::new(owner, name);
    Ok(Json(state.platform.get_languages(&token, &repo).await?))
}

pub async fn list_pulls(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<PullRequestRecord>>> {
    let token = query.require()?;
    let repo = RepoRef::new(owner, name);
    Ok(Json(state.platform.list_pulls(&token, &repo).await?))
}

pub async fn list_contributors(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<ContributorRecord>>> {
    let token = query.require()?;
    let repo = RepoRef::new(owner, name);
    Ok(Json(state.platform.list_contributors(&token, &repo).await?))
}

#[derive(Debug, Deserialize)]
pub struct SelectionQuery {
    pub token: Option<String>,
    /// Minutes behind UTC, as JavaScript's `Date#getTimezoneOffset` reports.
    pub tz_offset_minutes: Option<i32>,
}

/// UTC when the viewer sends no offset.
fn viewer_zone(offset_minutes: Option<i32>) -> Result<FixedOffset> {
    let minutes = offset_minutes.unwrap_or(0);
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::west_opt)
        .ok_or_else(|| {
            AppError::InvalidRequest(format!("tz_offset_minutes out of range: {minutes}"))
        })
}

/// All four resources in one response. Per-resource failures are reported
/// inside the body, so this answers 200 whenever the token is present.
/// Commit activity is bucketed by the viewer's calendar days.
pub async fn get_selection(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<SelectionQuery>,
) -> Result<Json<SelectionReport>> {
    let token = TokenQuery { token: query.token }.require()?;
    let zone = viewer_zone(query.tz_offset_minutes)?;
    let repo = RepoRef::new(owner, name);

    let data = fetch_selection(&state.platform, &token, &repo).await;
    if let Some(failure) = data.failure() {
        tracing::warn!(repo = %repo, error = %failure, "Selection partially failed");
    }
    Ok(Json(SelectionReport::in_zone(data, &zone)))
}

#[derive(Debug, Deserialize)]
pub struct LegacyCommitsQuery {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
}

/// `GET /api/commits?token&owner&repo`, the query-string form of the commits
/// endpoint.
pub async fn legacy_commits(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LegacyCommitsQuery>,
) -> Result<Json<Vec<CommitRecord>>> {
    let (token, owner, name) = match (
        non_empty(query.token),
        non_empty(query.owner),
        non_empty(query.repo),
    ) {
        (Some(token), Some(owner), Some(name)) => (AccessToken::new(token), owner, name),
        (None, _, _) => return Err(AppError::MissingToken),
        _ => {
            return Err(AppError::InvalidRequest(
                "Missing required query parameters".to_string(),
            ))
        }
    };

    let repo = RepoRef::new(owner, name);
    Ok(Json(state.platform.list_commits(&token, &repo).await?))
}
