//! Display-ready aggregates derived from fetched repository data.
//!
//! Percentages and averages are rounded to one decimal, half away from zero
//! (`f64::round`).

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::platform::types::{
    CommitRecord, ContributorRecord, LanguageBreakdown, PullRequestRecord, PullState,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of commits authored on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitActivity {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedContributor {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
    pub contributions: u64,
    pub share_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub open_count: usize,
    pub merged_count: usize,
    pub closed_unmerged_count: usize,
    /// `None` when nothing has been merged yet.
    pub average_merge_duration_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    pub share_percent: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

/// Commits per calendar day in the viewer's zone `tz`, oldest day first.
pub fn compute_commit_activity<Tz: TimeZone>(
    commits: &[CommitRecord],
    tz: &Tz,
) -> Vec<CommitActivity> {
    let mut buckets: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for commit in commits {
        let date = commit.authored_at.with_timezone(tz).date_naive();
        *buckets.entry(date).or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|(date, count)| CommitActivity { date, count })
        .collect()
}

/// Contributors by contribution count, largest first, with their share of
/// the total. Equal counts are ordered by login.
pub fn compute_contributor_ranking(contributors: &[ContributorRecord]) -> Vec<RankedContributor> {
    let total: u64 = contributors.iter().map(|c| c.contributions).sum();

    let mut ranked: Vec<RankedContributor> = contributors
        .iter()
        .map(|c| RankedContributor {
            login: c.login.clone(),
            avatar_url: c.avatar_url.clone(),
            html_url: c.html_url.clone(),
            contributions: c.contributions,
            share_percent: percent(c.contributions, total),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.contributions
            .cmp(&a.contributions)
            .then_with(|| a.login.cmp(&b.login))
    });
    ranked
}

pub fn compute_pull_request_summary(pulls: &[PullRequestRecord]) -> PullRequestSummary {
    let mut open_count = 0;
    let mut closed_unmerged_count = 0;
    let mut merge_days = Vec::new();

    for pr in pulls {
        match (pr.merge_duration(), pr.state) {
            (Some(duration), _) => {
                let seconds = duration.num_seconds() as f64;
                merge_days.push(seconds / SECONDS_PER_DAY);
            }
            (None, PullState::Open) => open_count += 1,
            (None, PullState::Closed) => closed_unmerged_count += 1,
        }
    }

    let average_merge_duration_days = if merge_days.is_empty() {
        None
    } else {
        Some(round1(
            merge_days.iter().sum::<f64>() / merge_days.len() as f64,
        ))
    };

    PullRequestSummary {
        open_count,
        merged_count: merge_days.len(),
        closed_unmerged_count,
        average_merge_duration_days,
    }
}

/// Languages by byte count, largest first, with their share of the total.
pub fn compute_language_shares(languages: &LanguageBreakdown) -> Vec<LanguageShare> {
    let total: u64 = languages.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<LanguageShare> = languages
        .iter()
        .map(|(language, &bytes)| LanguageShare {
            language: language.clone(),
            bytes,
            share_percent: percent(bytes, total),
        })
        .collect();

    // BTreeMap iteration already orders ties by name; the sort is stable.
    shares.sort_by(|a, b| b.bytes.cmp(&a.bytes));
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Utc};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn commit(sha: &str, date: &str) -> CommitRecord {
        CommitRecord {
            sha: sha.to_string(),
            message: format!("commit {sha}"),
            author_name: "Ada".to_string(),
            author_email: None,
            authored_at: ts(date),
            html_url: format!("https://github.com/o/r/commit/{sha}"),
        }
    }

    fn contributor(login: &str, contributions: u64) -> ContributorRecord {
        ContributorRecord {
            login: login.to_string(),
            avatar_url: format!("https://avatars.example/{login}"),
            html_url: format!("https://github.com/{login}"),
            contributions,
        }
    }

    fn pull(state: PullState, created: &str, merged: Option<&str>) -> PullRequestRecord {
        PullRequestRecord {
            number: 1,
            title: "PR".to_string(),
            author: "ada".to_string(),
            state,
            created_at: ts(created),
            updated_at: ts(created),
            merged_at: merged.map(ts),
            html_url: "https://github.com/o/r/pull/1".to_string(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_commit_activity_groups_and_sorts() {
        let commits = vec![
            commit("c", "2024-01-03T09:00:00Z"),
            commit("a", "2024-01-01T09:00:00Z"),
            commit("b", "2024-01-03T18:00:00Z"),
        ];

        let activity = compute_commit_activity(&commits, &Utc);
        assert_eq!(
            activity,
            vec![
                CommitActivity { date: date("2024-01-01"), count: 1 },
                CommitActivity { date: date("2024-01-03"), count: 2 },
            ]
        );
    }

    #[test]
    fn test_commit_activity_is_order_independent() {
        let commits = vec![
            commit("a", "2024-02-01T10:00:00Z"),
            commit("b", "2024-02-03T10:00:00Z"),
            commit("c", "2024-02-01T23:00:00Z"),
            commit("d", "2024-01-30T01:00:00Z"),
        ];
        let expected = compute_commit_activity(&commits, &Utc);

        let mut reversed = commits.clone();
        reversed.reverse();
        assert_eq!(compute_commit_activity(&reversed, &Utc), expected);

        let mut rotated = commits.clone();
        rotated.rotate_left(2);
        assert_eq!(compute_commit_activity(&rotated, &Utc), expected);

        // Applying it twice gives the same answer.
        assert_eq!(compute_commit_activity(&commits, &Utc), expected);
    }

    #[test]
    fn test_commit_activity_uses_viewer_time_zone() {
        let commits = vec![commit("a", "2024-01-01T23:30:00Z")];
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        assert_eq!(compute_commit_activity(&commits, &Utc)[0].date, date("2024-01-01"));
        assert_eq!(compute_commit_activity(&commits, &tokyo)[0].date, date("2024-01-02"));
    }

    #[test]
    fn test_commit_activity_empty() {
        assert!(compute_commit_activity(&[], &Utc).is_empty());
    }

    #[test]
    fn test_contributor_ranking_sorted_with_shares() {
        let ranking = compute_contributor_ranking(&[
            contributor("bob", 25),
            contributor("ada", 50),
            contributor("cy", 25),
        ]);

        let logins: Vec<&str> = ranking.iter().map(|r| r.login.as_str()).collect();
        assert_eq!(logins, vec!["ada", "bob", "cy"]);
        assert_eq!(ranking[0].share_percent, 50.0);
        assert_eq!(ranking[1].share_percent, 25.0);
    }

    #[test]
    fn test_contributor_ranking_sums_to_100() {
        let ranking = compute_contributor_ranking(&[
            contributor("a", 1),
            contributor("b", 1),
            contributor("c", 1),
            contributor("d", 7),
            contributor("e", 13),
        ]);

        let sum: f64 = ranking.iter().map(|r| r.share_percent).sum();
        // One decimal per entry, so at most 0.05 drift each.
        assert!((sum - 100.0).abs() <= 0.05 * ranking.len() as f64, "sum = {sum}");
    }

    #[test]
    fn test_contributor_ranking_empty() {
        assert!(compute_contributor_ranking(&[]).is_empty());
    }

    #[test]
    fn test_contributor_ranking_zero_total() {
        let ranking = compute_contributor_ranking(&[contributor("a", 0)]);
        assert_eq!(ranking[0].share_percent, 0.0);
    }

    #[test]
    fn test_pull_request_summary_fixture() {
        let summary = compute_pull_request_summary(&[
            pull(PullState::Closed, "2024-01-01T00:00:00Z", Some("2024-01-03T00:00:00Z")),
            pull(PullState::Closed, "2024-01-01T00:00:00Z", None),
            pull(PullState::Open, "2024-01-05T00:00:00Z", None),
        ]);

        assert_eq!(
            summary,
            PullRequestSummary {
                open_count: 1,
                merged_count: 1,
                closed_unmerged_count: 1,
                average_merge_duration_days: Some(2.0),
            }
        );
    }

    #[test]
    fn test_merged_decided_by_timestamp_not_state() {
        // A merged PR reported with state "open" still counts as merged.
        let summary = compute_pull_request_summary(&[pull(
            PullState::Open,
            "2024-01-01T00:00:00Z",
            Some("2024-01-01T12:00:00Z"),
        )]);
        assert_eq!(summary.open_count, 0);
        assert_eq!(summary.merged_count, 1);
        assert_eq!(summary.average_merge_duration_days, Some(0.5));
    }

    #[test]
    fn test_pull_request_summary_without_merges_has_no_average() {
        let summary =
            compute_pull_request_summary(&[pull(PullState::Open, "2024-01-01T00:00:00Z", None)]);
        assert_eq!(summary.average_merge_duration_days, None);
        assert_eq!(compute_pull_request_summary(&[]).average_merge_duration_days, None);
    }

    #[test]
    fn test_language_shares() {
        let mut languages = LanguageBreakdown::new();
        languages.insert("Shell".to_string(), 250);
        languages.insert("Rust".to_string(), 750);

        let shares = compute_language_shares(&languages);
        assert_eq!(shares[0].language, "Rust");
        assert_eq!(shares[0].share_percent, 75.0);
        assert_eq!(shares[1].share_percent, 25.0);

        assert!(compute_language_shares(&LanguageBreakdown::new()).is_empty());
    }
}
