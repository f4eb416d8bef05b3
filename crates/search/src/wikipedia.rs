use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".to_string(),
            request_timeout_secs: 15,
            user_agent: "knowledge-graph-api/0.1".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search query must not be empty")]
    EmptyQuery,

    #[error("No Wikipedia page matches \"{0}\"")]
    NotFound(String),

    #[error("\"{0}\" may refer to several pages; try a more specific query")]
    Ambiguous(String),

    #[error("Wikipedia request failed: {0}")]
    Upstream(String),
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    page_type: String,
    #[serde(default)]
    extract: String,
}

#[derive(Clone)]
pub struct WikipediaClient {
    base_url: reqwest::Url,
    client: reqwest::Client,
}

impl WikipediaClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let base_url = reqwest::Url::parse(&config.base_url)
            .map_err(|e| SearchError::Upstream(format!("invalid base URL {}: {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SearchError::Upstream(format!("HTTP client error: {}", e)))?;

        Ok(Self { base_url, client })
    }

    /// Plain-text summary of the best matching page
    pub async fn summary(&self, query: &str) -> Result<String, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let title = self.resolve_title(query).await?;
        let summary = self.fetch_summary(&title).await?;

        if summary.page_type == "disambiguation" {
            return Err(SearchError::Ambiguous(query.to_string()));
        }
        if summary.extract.trim().is_empty() {
            return Err(SearchError::NotFound(query.to_string()));
        }

        info!(query, title = %title, chars = summary.extract.chars().count(), "Fetched Wikipedia summary");
        Ok(summary.extract)
    }

    async fn resolve_title(&self, query: &str) -> Result<String, SearchError> {
        let url = self.endpoint(&["w", "api.php"])?;

        let response = self.client
            .get(url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Upstream(format!("search returned {}", response.status())));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Upstream(format!("invalid search response: {}", e)))?;

        body.query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title)
            .ok_or_else(|| SearchError::NotFound(query.to_string()))
    }

    async fn fetch_summary(&self, title: &str) -> Result<PageSummary, SearchError> {
        let page = title.replace(' ', "_");
        let url = self.endpoint(&["api", "rest_v1", "page", "summary", &page])?;

        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Upstream(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SearchError::NotFound(title.to_string()));
        }
        if !status.is_success() {
            return Err(SearchError::Upstream(format!("summary returned {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::Upstream(format!("invalid summary response: {}", e)))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, SearchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SearchError::Upstream(format!("base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
