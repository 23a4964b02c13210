//! Web search and page crawling capabilities
//!
//! `web_search` queries Tavily when an API key is configured and falls back to
//! DuckDuckGo through the daedra crate otherwise. `crawl` fetches a page as
//! markdown through a reader proxy (Jina Reader by default).

use crate::tools::registry::{parse_args, Tool};
use crate::types::{AppError, Result};
use crate::utils::config::{CrawlConfig, SearchConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One search hit as handed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

enum SearchBackend {
    Tavily {
        http_client: reqwest::Client,
        url: String,
        api_key: String,
    },
    #[cfg(feature = "duckduckgo")]
    DuckDuckGo,
}

/// Web search tool
pub struct WebSearchTool {
    backend: SearchBackend,
    max_results: usize,
}

impl WebSearchTool {
    /// Tavily-backed search against `url`.
    pub fn tavily(api_key: String, url: String, max_results: usize) -> Self {
        Self {
            backend: SearchBackend::Tavily {
                http_client: reqwest::Client::new(),
                url,
                api_key,
            },
            max_results,
        }
    }

    /// DuckDuckGo search via daedra.
    #[cfg(feature = "duckduckgo")]
    pub fn duckduckgo(max_results: usize) -> Self {
        Self {
            backend: SearchBackend::DuckDuckGo,
            max_results,
        }
    }

    /// Pick the backend from configuration: Tavily when its key is set.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        if let Some(api_key) = config.tavily_api_key() {
            return Ok(Self::tavily(
                api_key,
                config.tavily_url.clone(),
                config.max_results,
            ));
        }

        Self::fallback(config)
    }

    #[cfg(feature = "duckduckgo")]
    fn fallback(config: &SearchConfig) -> Result<Self> {
        tracing::info!("No Tavily API key configured, using DuckDuckGo search");
        Ok(Self::duckduckgo(config.max_results))
    }

    #[cfg(not(feature = "duckduckgo"))]
    fn fallback(config: &SearchConfig) -> Result<Self> {
        Err(AppError::Configuration(format!(
            "web search needs {} to be set (or the duckduckgo feature)",
            config.tavily_api_key_env
        )))
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            SearchBackend::Tavily { .. } => "tavily",
            #[cfg(feature = "duckduckgo")]
            SearchBackend::DuckDuckGo => "duckduckgo",
        }
    }

    async fn search_tavily(
        http_client: &reqwest::Client,
        url: &str,
        api_key: &str,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>> {
        let response = http_client
            .post(url)
            .json(&json!({
                "api_key": api_key,
                "query": query,
                "max_results": max_results,
            }))
            .send()
            .await
            .map_err(|e| AppError::tool("web_search", format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::tool(
                "web_search",
                format!("Tavily returned {}: {}", status, text),
            ));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::tool("web_search", format!("Invalid Tavily response: {}", e)))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
            })
            .collect())
    }

    #[cfg(feature = "duckduckgo")]
    async fn search_duckduckgo(query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: max_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::tool("web_search", format!("Search failed: {}", e)))?;

        Ok(response
            .data
            .iter()
            .map(|r| SearchHit {
                title: r.title.clone(),
                url: r.url.clone(),
                content: r.description.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and return the most relevant results with title, url and a content snippet"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let args: SearchArgs = parse_args(self.name(), args)?;
        let max_results = args.max_results.unwrap_or(self.max_results).max(1);

        tracing::debug!(query = %args.query, backend = self.backend_name(), "Running web search");

        let hits = match &self.backend {
            SearchBackend::Tavily {
                http_client,
                url,
                api_key,
            } => Self::search_tavily(http_client, url, api_key, &args.query, max_results).await?,
            #[cfg(feature = "duckduckgo")]
            SearchBackend::DuckDuckGo => {
                Self::search_duckduckgo(&args.query, max_results).await?
            }
        };

        serde_json::to_string(&hits).map_err(|e| AppError::tool("web_search", e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct CrawlArgs {
    url: String,
}

/// Fetch a page as markdown through a reader proxy.
pub struct CrawlTool {
    http_client: reqwest::Client,
    reader_url: String,
}

impl CrawlTool {
    pub fn new(reader_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            reader_url: reader_url.into(),
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.reader_url.clone())
    }
}

#[async_trait]
impl Tool for CrawlTool {
    fn name(&self) -> &str {
        "crawl"
    }

    fn description(&self) -> &str {
        "Crawl a URL and return its readable content as markdown"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to crawl"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let args: CrawlArgs = parse_args(self.name(), args)?;
        let target = format!("{}{}", self.reader_url, args.url);

        tracing::debug!(url = %args.url, "Crawling page");

        let response = self
            .http_client
            .get(&target)
            .send()
            .await
            .map_err(|e| AppError::tool("crawl", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::tool(
                "crawl",
                format!("failed to crawl {}: status {}", args.url, status),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::tool("crawl", format!("Failed to read body: {}", e)))
    }
}
