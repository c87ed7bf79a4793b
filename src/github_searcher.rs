use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::OrchestratorConfig;
use crate::error::TransportError;
use crate::filters::RequestDescriptor;
use crate::format::seconds_until;
use crate::types::RateWindow;

pub const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// A search request as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub descriptor: RequestDescriptor,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<String>,
}

/// Any HTTP response, successful or not. Interpreting it is up to the caller.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn status_text(&self) -> &str {
        self.status.canonical_reason().unwrap_or("")
    }
}

/// Transport to the repository search provider.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Issues the request and returns whatever response arrives. Only failure to
    /// get a response at all is an error. Dropping the future aborts the request.
    async fn search(&self, request: &SearchRequest) -> Result<HttpResponse, TransportError>;
}

pub struct GitHubSearcher {
    client: Client,
    endpoint: String,
}

impl GitHubSearcher {
    /// Create a new GitHubSearcher for the configured endpoint
    pub fn new(config: &OrchestratorConfig) -> Result<Self, TransportError> {
        let client = Client::builder().user_agent(config.user_agent.as_str()).build()?;

        Ok(GitHubSearcher {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Log the quota carried by a response
    fn log_rate_limit(headers: &HeaderMap) {
        let rate = RateWindow::from_headers(headers);
        if let (Some(remaining), Some(limit)) = (rate.remaining, rate.limit) {
            debug!("Rate limit: {}/{}", remaining, limit);
        }
        if rate.is_exhausted() {
            match rate.reset {
                Some(reset) => warn!(
                    "Rate limit reached. Resets in {} seconds",
                    seconds_until(reset).saturating_add(1)
                ),
                None => warn!("Rate limit reached"),
            }
        }
    }

    /// Build the outbound request: query parameters, `Accept`, API version and
    /// an optional bearer token
    fn build_request(&self, request: &SearchRequest) -> Result<reqwest::Request, TransportError> {
        let pairs = request.descriptor.query_pairs();
        debug!("Requesting {} with {:?}", self.endpoint, pairs);

        let mut builder = self
            .client
            .get(&self.endpoint)
            .query(&pairs)
            .header(ACCEPT, ACCEPT_GITHUB_JSON)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION);
        if let Some(token) = &request.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl SearchClient for GitHubSearcher {
    async fn search(&self, request: &SearchRequest) -> Result<HttpResponse, TransportError> {
        let outbound = self.build_request(request)?;
        let response = self.client.execute(outbound).await?;
        let status = response.status();
        let headers = response.headers().clone();
        GitHubSearcher::log_rate_limit(&headers);

        let body = response.text().await?;
        if !status.is_success() {
            debug!("Search returned {} for q={:?}", status, request.descriptor.query);
        }
        Ok(HttpResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterState, Order, Sort};
    use std::collections::HashMap;

    fn searcher() -> GitHubSearcher {
        GitHubSearcher::new(&OrchestratorConfig::default()).unwrap()
    }

    fn request(filters: &FilterState, term: &str, token: Option<&str>) -> SearchRequest {
        SearchRequest {
            descriptor: RequestDescriptor::derive(filters, term),
            token: token.map(str::to_string),
        }
    }

    fn query_of(outbound: &reqwest::Request) -> HashMap<String, String> {
        outbound.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn best_match_request_without_token() {
        let outbound = searcher()
            .build_request(&request(&FilterState::default(), "react", None))
            .unwrap();

        assert_eq!(outbound.method(), reqwest::Method::GET);
        assert!(outbound.url().as_str().starts_with(crate::config::DEFAULT_ENDPOINT));
        assert_eq!(outbound.headers()[ACCEPT], ACCEPT_GITHUB_JSON);
        assert_eq!(outbound.headers()["x-github-api-version"], GITHUB_API_VERSION);
        assert!(outbound.headers().get(AUTHORIZATION).is_none());

        let query = query_of(&outbound);
        assert_eq!(query["q"], "react in:name");
        assert_eq!(query["per_page"], "10");
        assert_eq!(query["page"], "1");
        assert!(!query.contains_key("sort"));
        assert!(!query.contains_key("order"));
    }

    #[test]
    fn sorted_request_with_token() {
        let filters = FilterState {
            sort: Sort::Stars,
            order: Order::Asc,
            page: 3,
            language: "Rust".to_string(),
            ..FilterState::default()
        };
        let outbound = searcher()
            .build_request(&request(&filters, "", Some("ghp_secret")))
            .unwrap();

        assert_eq!(outbound.headers()[AUTHORIZATION], "Bearer ghp_secret");
        assert_eq!(outbound.headers()[ACCEPT], ACCEPT_GITHUB_JSON);

        let query = query_of(&outbound);
        assert_eq!(query["q"], "stars:>5000 language:Rust");
        assert_eq!(query["sort"], "stars");
        assert_eq!(query["order"], "asc");
        assert_eq!(query["per_page"], "10");
        assert_eq!(query["page"], "3");
    }
}
