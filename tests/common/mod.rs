#![allow(dead_code)]

use async_trait::async_trait;
use github_repo_search::{
    HttpResponse, MemoryStorage, MemoryUrl, OrchestratorConfig, SearchClient, SearchOrchestrator,
    SearchRequest, TransportError,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub enum Reply {
    Respond { delay: Duration, response: HttpResponse },
    Fail(String),
}

impl Reply {
    pub fn now(response: HttpResponse) -> Self {
        Reply::Respond {
            delay: Duration::ZERO,
            response,
        }
    }

    pub fn after(delay: Duration, response: HttpResponse) -> Self {
        Reply::Respond { delay, response }
    }
}

/// Scripted search transport: replies are consumed in order, then `fallback`
/// is used for every further request.
pub struct FakeClient {
    requests: Mutex<Vec<SearchRequest>>,
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
}

impl FakeClient {
    pub fn new(fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            fallback,
        })
    }

    pub fn push(&self, reply: Reply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> SearchRequest {
        self.requests().last().cloned().expect("no request was issued")
    }
}

#[async_trait]
impl SearchClient for FakeClient {
    async fn search(&self, request: &SearchRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Respond { delay, response } => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(response)
            }
            Reply::Fail(message) => Err(TransportError::Request(message)),
        }
    }
}

pub fn repo(id: u64, full_name: &str) -> serde_json::Value {
    let owner = full_name.split('/').next().unwrap_or(full_name);
    json!({
        "id": id,
        "full_name": full_name,
        "description": "test repository",
        "stargazers_count": 123,
        "html_url": format!("https://github.com/{}", full_name),
        "updated_at": "2024-01-02T03:04:05Z",
        "owner": { "login": owner, "avatar_url": "https://example.com/avatar.png" }
    })
}

pub fn response(status: u16, body: serde_json::Value, headers: &[(&'static str, String)]) -> HttpResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(*name, HeaderValue::from_str(value).unwrap());
    }
    HttpResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers: map,
        body: body.to_string(),
    }
}

pub fn results(total: u64, items: Vec<serde_json::Value>) -> HttpResponse {
    response(
        200,
        json!({ "total_count": total, "incomplete_results": false, "items": items }),
        &[
            ("x-ratelimit-limit", "10".to_string()),
            ("x-ratelimit-remaining", "9".to_string()),
            ("x-ratelimit-reset", "1700000000".to_string()),
        ],
    )
}

pub fn status(code: u16) -> HttpResponse {
    response(code, json!({ "message": "failure" }), &[])
}

pub struct Harness {
    pub search: SearchOrchestrator,
    pub client: Arc<FakeClient>,
    pub url: Arc<MemoryUrl>,
    pub storage: Arc<MemoryStorage>,
}

pub fn harness(url: &str, fallback: Reply) -> Harness {
    harness_with(url, fallback, OrchestratorConfig::default(), Arc::new(MemoryStorage::new()))
}

pub fn harness_with(
    url: &str,
    fallback: Reply,
    config: OrchestratorConfig,
    storage: Arc<MemoryStorage>,
) -> Harness {
    let client = FakeClient::new(fallback);
    let url = Arc::new(MemoryUrl::new(url));
    let search = SearchOrchestrator::new(config, url.clone(), storage.clone(), client.clone());
    Harness {
        search,
        client,
        url,
        storage,
    }
}

/// Types `text` one character at a time, `gap` apart.
pub async fn type_text(search: &mut SearchOrchestrator, text: &str, gap: Duration) {
    let mut typed = search.filters().term.clone();
    for c in text.chars() {
        typed.push(c);
        search.set_term(&typed);
        tokio::time::advance(gap).await;
    }
}
