use crate::error::{AppError, Result};
use crate::platform::types;

use super::wire;

/// Map a `/user/repos` item to our RepositorySummary.
pub fn map_repository(repo: wire::RepoPayload) -> types::RepositorySummary {
    types::RepositorySummary {
        name: repo.name,
        full_name: repo.full_name,
        owner_login: repo.owner.login,
        description: repo.description.filter(|d| !d.is_empty()),
        html_url: repo.html_url,
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        private: repo.private,
        language: repo.language,
        updated_at: repo.updated_at,
    }
}

/// Map a commit listing item. The author date falls back to the committer
/// date; a commit with neither cannot be placed on the activity timeline.
pub fn map_commit(commit: wire::CommitPayload) -> Result<types::CommitRecord> {
    let wire::CommitPayload {
        sha,
        html_url,
        commit,
    } = commit;

    let authored_at = commit
        .author
        .as_ref()
        .and_then(|a| a.date)
        .or_else(|| commit.committer.as_ref().and_then(|c| c.date))
        .ok_or_else(|| AppError::UpstreamRejected {
            status: 200,
            message: format!("commit {sha} has no author date"),
        })?;

    let (author_name, author_email) = match commit.author {
        Some(author) => (
            author.name.unwrap_or_else(|| "unknown".to_string()),
            author.email,
        ),
        None => ("unknown".to_string(), None),
    };

    Ok(types::CommitRecord {
        sha,
        message: commit.message,
        author_name,
        author_email,
        authored_at,
        html_url,
    })
}

pub fn map_pull_request(pr: wire::PullPayload) -> types::PullRequestRecord {
    types::PullRequestRecord {
        number: pr.number,
        title: pr.title,
        author: pr
            .user
            .map(|u| u.login)
            .unwrap_or_else(|| "ghost".to_string()),
        state: pr.state,
        created_at: pr.created_at,
        updated_at: pr.updated_at,
        merged_at: pr.merged_at,
        html_url: pr.html_url,
    }
}

pub fn map_contributor(c: wire::ContributorPayload) -> types::ContributorRecord {
    types::ContributorRecord {
        login: c.login,
        avatar_url: c.avatar_url,
        html_url: c.html_url,
        contributions: c.contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_commit_uses_author_date() {
        let payload: wire::CommitPayload = serde_json::from_value(json!({
            "sha": "abc123",
            "html_url": "https://github.com/o/r/commit/abc123",
            "commit": {
                "message": "Fix parser",
                "author": {"name": "Ada", "email": "ada@example.com", "date": "2024-01-02T10:00:00Z"},
                "committer": {"name": "GitHub", "email": "noreply@github.com", "date": "2024-01-03T10:00:00Z"}
            }
        }))
        .unwrap();

        let commit = map_commit(payload).unwrap();
        assert_eq!(commit.author_name, "Ada");
        assert_eq!(commit.author_email.as_deref(), Some("ada@example.com"));
        assert_eq!(commit.authored_at.to_rfc3339(), "2024-01-02T10:00:00+00:00");
    }

    #[test]
    fn test_map_commit_without_any_date_is_rejected() {
        let payload: wire::CommitPayload = serde_json::from_value(json!({
            "sha": "abc123",
            "html_url": "https://github.com/o/r/commit/abc123",
            "commit": {"message": "x", "author": null, "committer": null}
        }))
        .unwrap();

        assert!(matches!(
            map_commit(payload),
            Err(AppError::UpstreamRejected { .. })
        ));
    }

    #[test]
    fn test_map_pull_request_without_user() {
        let payload: wire::PullPayload = serde_json::from_value(json!({
            "number": 7,
            "title": "Add docs",
            "user": null,
            "state": "closed",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "merged_at": null,
            "html_url": "https://github.com/o/r/pull/7"
        }))
        .unwrap();

        let pr = map_pull_request(payload);
        assert_eq!(pr.author, "ghost");
        assert_eq!(pr.state, types::PullState::Closed);
        assert_eq!(pr.merge_duration(), None);
    }

    #[test]
    fn test_map_repository_drops_empty_description() {
        let payload: wire::RepoPayload = serde_json::from_value(json!({
            "name": "hello",
            "full_name": "octocat/hello",
            "owner": {"login": "octocat"},
            "description": "",
            "html_url": "https://github.com/octocat/hello",
            "stargazers_count": 3,
            "forks_count": 1
        }))
        .unwrap();

        let repo = map_repository(payload);
        assert_eq!(repo.description, None);
        assert_eq!(repo.owner_login, "octocat");
    }
}
