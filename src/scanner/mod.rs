//! Problem discovery.
//!
//! An [`IssueSource`] answers search queries with raw issue records;
//! [`ProblemScanner`] turns those into scored [`Problem`]s and drops the ones
//! the store already knows.

pub mod github;
pub mod scoring;

use crate::error::{NexusError, Result};
use crate::model::{Metadata, Problem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub use github::GitHubSearch;
use scoring::IssueSignals;

/// Anything that can answer an issue search query.
pub trait IssueSource {
    /// Short source name, used as the id prefix (e.g. `github`).
    fn name(&self) -> &str;
    fn search(&self, query: &str) -> Result<Vec<RawIssue>>;
}

/// An issue record as returned by the search API.
///
/// Only `id` is required; everything else defaults when missing or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIssue {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repository_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: RawUser,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<RawLabel>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: i64,
    /// Reaction name to count. GitHub also sends `url` and `total_count` here.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactions: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLabel {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "issue id must be a string or number, got {}",
            other
        ))),
    }
}

impl RawIssue {
    pub fn label_names(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|l| l.name.clone())
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Total reactions. Prefers GitHub's `total_count`, otherwise sums the
    /// numeric entries.
    pub fn total_reactions(&self) -> i64 {
        if let Some(total) = self.reactions.get("total_count").and_then(|v| v.as_i64()) {
            return total.max(0);
        }
        self.reactions
            .values()
            .filter_map(|v| v.as_i64())
            .filter(|n| *n > 0)
            .sum()
    }

    pub fn signals(&self) -> IssueSignals {
        IssueSignals::new(
            self.comments,
            self.total_reactions(),
            self.label_names(),
            self.body.chars().count(),
        )
    }
}

/// Decode search result items one by one, skipping malformed records.
pub fn decode_issues(items: Vec<serde_json::Value>) -> Vec<RawIssue> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawIssue>(item) {
            Ok(issue) => Some(issue),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed issue record");
                None
            }
        })
        .collect()
}

/// Stable problem id: `<source>-<first 12 hex chars of sha256("<source>:<external id>")>`.
pub fn problem_id(source: &str, external_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b":");
    hasher.update(external_id.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", source, hex)
}

pub struct ProblemScanner {
    source: Box<dyn IssueSource>,
}

impl ProblemScanner {
    pub fn new(source: Box<dyn IssueSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Run every query and return new problems, skipping ids in `known`.
    ///
    /// A failing query is logged and contributes nothing; this never fails.
    pub fn discover(
        &self,
        queries: &[String],
        known: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<Problem> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut problems = Vec::new();

        for query in queries {
            tracing::info!(source = self.source.name(), query = %query, "Searching for issues");
            let issues = match self.source.search(query) {
                Ok(issues) => issues,
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "Issue search failed, skipping query");
                    continue;
                }
            };

            for issue in &issues {
                let problem = self.to_problem(issue, now);
                if known.contains(&problem.id) || !seen.insert(problem.id.clone()) {
                    continue;
                }
                if problem.title.trim().is_empty() {
                    tracing::debug!(id = %problem.id, "Skipping issue without a title");
                    continue;
                }
                problems.push(problem);
            }
        }

        tracing::info!(new = problems.len(), "Discovery finished");
        problems
    }

    /// Convert one raw issue into a DISCOVERED problem.
    pub fn to_problem(&self, issue: &RawIssue, now: DateTime<Utc>) -> Problem {
        let source = self.source.name();
        let signals = issue.signals();
        let labels = issue.label_names();

        let mut metadata = Metadata::new();
        metadata.insert("external_id".into(), issue.id.clone().into());
        metadata.insert("repo".into(), issue.repository_url.clone().into());
        metadata.insert("user".into(), issue.user.login.clone().into());
        metadata.insert("labels".into(), labels.clone().into());
        metadata.insert("comments".into(), issue.comments.max(0).into());
        metadata.insert(
            "reactions".into(),
            serde_json::Value::Object(
                issue
                    .reactions
                    .iter()
                    .filter(|(_, v)| v.is_number())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        );

        Problem::new(
            problem_id(source, &issue.id),
            issue.title.trim().to_string(),
            source.to_string(),
            now,
        )
        .with_description(issue.body.clone())
        .with_url(issue.html_url.clone())
        .with_priority(scoring::priority(&signals))
        .with_estimated_effort(scoring::estimate_effort(&signals))
        .with_tags(labels)
        .with_metadata(metadata)
    }
}

/// Serves issues from a saved search response instead of the network.
///
/// The file holds either a GitHub search response (`{"items": [...]}`) or a
/// bare array of issues; every query returns all of them.
pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: &Path) -> Self {
        Self {
            name: "github".to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl IssueSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn search(&self, _query: &str) -> Result<Vec<RawIssue>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            NexusError::Network(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| NexusError::Parse(format!("{}: {}", self.path.display(), e)))?;
        let items = match value {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(mut obj) => match obj.remove("items") {
                Some(serde_json::Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(decode_issues(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, ProblemStatus};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Answers from a fixed table; unknown queries fail like a network error.
    struct MockSource {
        answers: HashMap<String, Vec<RawIssue>>,
        calls: RefCell<Vec<String>>,
    }

    impl MockSource {
        fn new(answers: Vec<(&str, Vec<RawIssue>)>) -> Self {
            Self {
                answers: answers
                    .into_iter()
                    .map(|(q, issues)| (q.to_string(), issues))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl IssueSource for MockSource {
        fn name(&self) -> &str {
            "github"
        }

        fn search(&self, query: &str) -> Result<Vec<RawIssue>> {
            self.calls.borrow_mut().push(query.to_string());
            self.answers
                .get(query)
                .cloned()
                .ok_or_else(|| NexusError::Network(format!("timed out: {}", query)))
        }
    }

    fn issue(id: u64, title: &str) -> RawIssue {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "html_url": format!("https://github.com/o/r/issues/{}", id),
            "repository_url": "https://api.github.com/repos/o/r",
            "user": {"login": "octocat"},
        }))
        .unwrap()
    }

    fn queries(qs: &[&str]) -> Vec<String> {
        qs.iter().map(|q| q.to_string()).collect()
    }

    #[test]
    fn test_problem_id_is_deterministic() {
        let a = problem_id("github", "1234");
        assert_eq!(a, problem_id("github", "1234"));
        assert_ne!(a, problem_id("github", "1235"));
        assert_ne!(a, problem_id("gitlab", "1234"));
        assert!(a.starts_with("github-"));
        assert_eq!(a.len(), "github-".len() + 12);
    }

    #[test]
    fn test_minimal_record_decodes_with_defaults() {
        let issue: RawIssue = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "Crash",
            "body": null,
            "labels": null,
        }))
        .unwrap();
        assert_eq!(issue.id, "7");
        assert_eq!(issue.body, "");
        assert!(issue.labels.is_empty());
        assert_eq!(issue.comments, 0);
        assert_eq!(issue.total_reactions(), 0);
        assert_eq!(issue.user.login, "");
    }

    #[test]
    fn test_reaction_totals() {
        let github_style: RawIssue = serde_json::from_value(serde_json::json!({
            "id": 1,
            "reactions": {"url": "https://api.github.com/x", "total_count": 9, "+1": 6, "heart": 3}
        }))
        .unwrap();
        assert_eq!(github_style.total_reactions(), 9);

        let plain: RawIssue = serde_json::from_value(serde_json::json!({
            "id": 2,
            "reactions": {"+1": 25, "rocket": 2}
        }))
        .unwrap();
        assert_eq!(plain.total_reactions(), 27);
    }

    #[test]
    fn test_decode_skips_malformed_items() {
        let items = vec![
            serde_json::json!({"id": 1, "title": "ok"}),
            serde_json::json!({"title": "no id"}),
            serde_json::json!("not an object"),
        ];
        let issues = decode_issues(items);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "1");
    }

    #[test]
    fn test_to_problem_scores_and_fills_metadata() {
        let scanner = ProblemScanner::new(Box::new(MockSource::new(vec![])));
        let raw: RawIssue = serde_json::from_value(serde_json::json!({
            "id": 99,
            "title": "  Memory leak  ",
            "body": "x".repeat(600),
            "html_url": "https://github.com/o/r/issues/99",
            "repository_url": "https://api.github.com/repos/o/r",
            "user": {"login": "octocat"},
            "labels": [{"name": "bug"}],
            "comments": 60,
            "reactions": {"+1": 25}
        }))
        .unwrap();

        let now = Utc::now();
        let problem = scanner.to_problem(&raw, now);
        assert_eq!(problem.id, problem_id("github", "99"));
        assert_eq!(problem.title, "Memory leak");
        assert_eq!(problem.status, ProblemStatus::Discovered);
        assert_eq!(problem.priority, Priority::Critical);
        assert_eq!(problem.estimated_effort, 8);
        assert!(problem.tags.contains("bug"));
        assert_eq!(problem.metadata["user"], "octocat");
        assert_eq!(problem.metadata["comments"], 60);
        assert_eq!(problem.metadata["reactions"]["+1"], 25);
        assert_eq!(problem.created_at, now);
    }

    #[test]
    fn test_failed_query_yields_nothing_but_others_continue() {
        let source = MockSource::new(vec![("good", vec![issue(1, "One"), issue(2, "Two")])]);
        let scanner = ProblemScanner::new(Box::new(source));

        let problems = scanner.discover(&queries(&["broken", "good"]), &HashSet::new(), Utc::now());
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_all_queries_failing_is_empty_not_error() {
        let scanner = ProblemScanner::new(Box::new(MockSource::new(vec![])));
        let problems = scanner.discover(&queries(&["a", "b"]), &HashSet::new(), Utc::now());
        assert!(problems.is_empty());
    }

    #[test]
    fn test_known_and_repeated_ids_are_dropped() {
        let source = MockSource::new(vec![
            ("first", vec![issue(1, "One"), issue(2, "Two")]),
            ("second", vec![issue(2, "Two"), issue(3, "Three")]),
        ]);
        let scanner = ProblemScanner::new(Box::new(source));
        let known: HashSet<String> = [problem_id("github", "1")].into_iter().collect();

        let problems = scanner.discover(&queries(&["first", "second"]), &known, Utc::now());
        let ids: Vec<_> = problems.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![problem_id("github", "2"), problem_id("github", "3")]);
    }

    #[test]
    fn test_untitled_issues_are_skipped() {
        let source = MockSource::new(vec![("q", vec![issue(1, "   "), issue(2, "Real")])]);
        let scanner = ProblemScanner::new(Box::new(source));
        let problems = scanner.discover(&queries(&["q"]), &HashSet::new(), Utc::now());
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].title, "Real");
    }

    #[test]
    fn test_json_file_source_reads_search_response() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("issues.json");
        std::fs::write(
            &path,
            serde_json::json!({"total_count": 2, "items": [{"id": 1, "title": "a"}, {"id": 2, "title": "b"}]})
                .to_string(),
        )
        .unwrap();

        let source = JsonFileSource::new(&path);
        assert_eq!(source.search("anything").unwrap().len(), 2);

        let missing = JsonFileSource::new(&temp_dir.path().join("nope.json"));
        assert!(matches!(missing.search("q"), Err(NexusError::Network(_))));
    }
}
