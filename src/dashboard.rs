//! Aggregation client: the dashboard's view of one user's GitHub data.
//!
//! Selecting a repository fetches its commits, languages, pull requests and
//! contributors concurrently. Each resource settles independently into a
//! [`Panel`], so one failed fetch leaves the other three intact. Every
//! selection gets a fresh [`SelectionId`]; a result is applied only while its
//! id is still the current one, so a slow response for an earlier selection
//! can never overwrite a newer one.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::analytics::{
    compute_commit_activity, compute_contributor_ranking, compute_language_shares,
    compute_pull_request_summary, CommitActivity, LanguageShare, PullRequestSummary,
    RankedContributor,
};
use crate::error::{AppError, ErrorKind, Result};
use crate::platform::types::*;
use crate::platform::Platform;

/// Outcome of one resource fetch within a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready { data: T },
    Unavailable { error: ErrorKind, message: String },
}

impl<T> Panel<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Panel::Ready { data },
            Err(e) => Panel::Unavailable {
                error: e.kind(),
                message: e.to_string(),
            },
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Panel::Ready { data } => Some(data),
            Panel::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready { .. })
    }
}

/// The four resources of one repository, fetched together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionData {
    pub repo: RepoRef,
    pub commits: Panel<Vec<CommitRecord>>,
    pub languages: Panel<LanguageBreakdown>,
    pub pulls: Panel<Vec<PullRequestRecord>>,
    pub contributors: Panel<Vec<ContributorRecord>>,
}

impl SelectionData {
    pub fn failed_resources(&self) -> Vec<Resource> {
        let ready = [
            self.commits.is_ready(),
            self.languages.is_ready(),
            self.pulls.is_ready(),
            self.contributors.is_ready(),
        ];
        Resource::ALL
            .into_iter()
            .zip(ready)
            .filter(|(_, ok)| !ok)
            .map(|(resource, _)| resource)
            .collect()
    }

    /// `Some(PartialAggregationFailure)` when any panel failed.
    pub fn failure(&self) -> Option<AppError> {
        let failed = self.failed_resources();
        if failed.is_empty() {
            None
        } else {
            Some(AppError::PartialAggregationFailure { failed })
        }
    }

    /// Aggregates with commit activity bucketed in the local time zone.
    pub fn aggregates(&self) -> SelectionAggregates {
        self.aggregates_in(&Local)
    }

    /// Aggregates with commit activity bucketed by calendar day in `tz`.
    pub fn aggregates_in<Tz: TimeZone>(&self, tz: &Tz) -> SelectionAggregates {
        SelectionAggregates {
            commit_activity: self.commits.data().map(|c| compute_commit_activity(c, tz)),
            contributor_ranking: self
                .contributors
                .data()
                .map(|c| compute_contributor_ranking(c)),
            pull_requests: self.pulls.data().map(|p| compute_pull_request_summary(p)),
            languages: self.languages.data().map(compute_language_shares),
        }
    }
}

/// Derived views, present only for panels that loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionAggregates {
    pub commit_activity: Option<Vec<CommitActivity>>,
    pub contributor_ranking: Option<Vec<RankedContributor>>,
    pub pull_requests: Option<PullRequestSummary>,
    pub languages: Option<Vec<LanguageShare>>,
}

/// A selection plus its aggregates, as served by the relay's selection
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    #[serde(flatten)]
    pub data: SelectionData,
    pub aggregates: SelectionAggregates,
    pub failed: Vec<Resource>,
}

impl SelectionReport {
    /// Report for a viewer in `tz`; commit activity uses that zone's days.
    pub fn in_zone<Tz: TimeZone>(data: SelectionData, tz: &Tz) -> Self {
        let aggregates = data.aggregates_in(tz);
        let failed = data.failed_resources();
        Self {
            data,
            aggregates,
            failed,
        }
    }
}

/// Fetch the four resources of `repo` concurrently and wait for all of them.
pub async fn fetch_selection<P>(
    platform: &P,
    token: &AccessToken,
    repo: &RepoRef,
) -> SelectionData
where
    P: Platform + ?Sized,
{
    let (commits, languages, pulls, contributors) = tokio::join!(
        platform.list_commits(token, repo),
        platform.get_languages(token, repo),
        platform.list_pulls(token, repo),
        platform.list_contributors(token, repo),
    );

    SelectionData {
        repo: repo.clone(),
        commits: Panel::from_result(commits),
        languages: Panel::from_result(languages),
        pulls: Panel::from_result(pulls),
        contributors: Panel::from_result(contributors),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Applied(SelectionId),
    /// A newer selection started before this one settled; its result was
    /// dropped.
    Superseded(SelectionId),
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoriesView {
    #[default]
    NotLoaded,
    Loaded {
        repositories: Vec<RepositorySummary>,
    },
    Failed {
        error: ErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectionPhase {
    Loading,
    Settled {
        data: SelectionData,
        aggregates: SelectionAggregates,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionView {
    pub id: SelectionId,
    pub repo: RepoRef,
    pub phase: SelectionPhase,
}

/// Immutable copy of the dashboard state at one point in time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSnapshot {
    pub repositories: RepositoriesView,
    pub selection: Option<SelectionView>,
}

#[derive(Default)]
struct DashboardState {
    generation: u64,
    snapshot: DashboardSnapshot,
}

pub struct Dashboard<P: ?Sized> {
    token: AccessToken,
    state: RwLock<DashboardState>,
    platform: Arc<P>,
}

impl<P> Dashboard<P>
where
    P: Platform + ?Sized,
{
    pub fn new(platform: Arc<P>, token: AccessToken) -> Self {
        Self {
            token,
            state: RwLock::new(DashboardState::default()),
            platform,
        }
    }

    /// Fetch the repository list. A failure is recorded as a visible
    /// `Failed` view rather than an empty list.
    pub async fn load_repositories(&self) -> Result<Vec<RepositorySummary>> {
        let result = self.platform.list_repositories(&self.token).await;

        let view = match &result {
            Ok(repositories) => {
                tracing::info!(count = repositories.len(), "Repositories loaded");
                RepositoriesView::Loaded {
                    repositories: repositories.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load repositories");
                RepositoriesView::Failed {
                    error: e.kind(),
                    message: e.to_string(),
                }
            }
        };
        self.state.write().await.snapshot.repositories = view;

        result
    }

    /// Make `repo` the current selection, clearing all four panels.
    pub async fn begin_selection(&self, repo: &RepoRef) -> SelectionId {
        let mut state = self.state.write().await;
        state.generation += 1;
        let id = SelectionId(state.generation);
        state.snapshot.selection = Some(SelectionView {
            id,
            repo: repo.clone(),
            phase: SelectionPhase::Loading,
        });
        id
    }

    /// Store `data` if `id` is still the current selection.
    pub async fn complete_selection(
        &self,
        id: SelectionId,
        data: SelectionData,
    ) -> SelectionOutcome {
        let mut state = self.state.write().await;
        if state.generation != id.0 {
            tracing::debug!(
                selection = id.0,
                current = state.generation,
                repo = %data.repo,
                "Discarding superseded selection"
            );
            return SelectionOutcome::Superseded(id);
        }

        if let Some(view) = state.snapshot.selection.as_mut() {
            let aggregates = data.aggregates();
            view.phase = SelectionPhase::Settled { data, aggregates };
        }
        SelectionOutcome::Applied(id)
    }

    /// Select `repo`: clear, fan out, and apply unless superseded.
    pub async fn select(&self, repo: &RepoRef) -> SelectionOutcome {
        let id = self.begin_selection(repo).await;
        tracing::info!(repo = %repo, selection = id.0, "Repository selected");

        let data = fetch_selection(self.platform.as_ref(), &self.token, repo).await;
        if let Some(failure) = data.failure() {
            tracing::warn!(repo = %repo, error = %failure, "Selection partially failed");
        }

        self.complete_selection(id, data).await
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.state.read().await.snapshot.clone()
    }
}
