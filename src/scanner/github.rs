use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::{IssueSource, RawIssue, decode_issues};
use crate::config::GitHubSettings;
use crate::error::{NexusError, Result};

/// GitHub issue search over the REST API.
pub struct GitHubSearch {
    client: reqwest::blocking::Client,
    api_url: String,
    per_page: u32,
    token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

impl GitHubSearch {
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        // reqwest is built without a bundled crypto provider
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("nexus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NexusError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            per_page: settings.per_page.clamp(1, 100),
            token: settings.resolved_token(),
        })
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let per_page = self.per_page.to_string();
        Url::parse_with_params(
            &format!("{}/search/issues", self.api_url),
            &[
                ("q", query),
                ("sort", "reactions"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ],
        )
        .map_err(|e| NexusError::Config(format!("Invalid GitHub API url {}: {}", self.api_url, e)))
    }
}

impl IssueSource for GitHubSearch {
    fn name(&self) -> &str {
        "github"
    }

    fn search(&self, query: &str) -> Result<Vec<RawIssue>> {
        let url = self.search_url(query)?;
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                NexusError::Network(format!("GitHub search timed out: {}", e))
            } else {
                NexusError::Network(format!("GitHub search failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(NexusError::Network(format!(
                "GitHub search returned {}: {}",
                status, snippet
            )));
        }

        let body: SearchResponse = response
            .json()
            .map_err(|e| NexusError::Network(format!("Failed to decode GitHub response: {}", e)))?;

        let issues = decode_issues(body.items);
        tracing::debug!(query = %query, count = issues.len(), "GitHub search returned issues");
        Ok(issues)
    }
}
