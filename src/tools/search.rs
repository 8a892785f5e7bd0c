//! Tavily web search tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::AgentToolParameters;
use crate::config::BotConfig;
use crate::error::{BackendError, BotError, Result};
use crate::provider::http::{bearer_headers, read_error_body, shared_client, transport_error};
use crate::util::retry::RetryPolicy;

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
pub const SEARCH_TOOL_NAME: &str = "tavily_search";

/// Web search through the Tavily API.
pub struct TavilySearch {
    api_key: String,
    base_url: String,
    max_results: u32,
    parameters: AgentToolParameters,
    retry_policy: RetryPolicy,
}

impl TavilySearch {
    pub fn new(api_key: String, base_url: Option<String>, max_results: u32) -> Self {
        Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            max_results,
            parameters: AgentToolParameters::object()
                .string("query", "Search query to look up", true)
                .integer("max_results", "Maximum number of results to return", false)
                .build(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Build from config, requiring a non-empty `TAVILY_API_KEY`.
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        let api_key = config.require_api_key("tavily")?;
        Ok(Self::new(
            api_key,
            config.get_base_url("tavily").map(str::to_string),
            config.search_max_results,
        ))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn search_once(&self, body: &SearchRequest<'_>) -> std::result::Result<SearchResponse, BackendError> {
        let url = format!("{}/search", self.base_url);
        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(read_error_body(status, resp).await);
        }
        resp.json::<SearchResponse>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Tool for TavilySearch {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "A search engine optimized for comprehensive, accurate, and trusted results. \
         Useful for when you need to answer questions about current events. \
         Input should be a search query."
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value> {
        let query = args.get_str("query")?;
        let max_results = args
            .get_u64_opt("max_results")
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(self.max_results);

        debug!(query, max_results, "Tavily search");

        let body = SearchRequest { query, max_results };
        let response = self
            .retry_policy
            .execute(|| self.search_once(&body))
            .await
            .map_err(|e| BotError::tool_backend(SEARCH_TOOL_NAME, e.to_string()))?;

        Ok(serde_json::to_value(response.results)?)
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}
