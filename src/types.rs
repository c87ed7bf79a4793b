use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub id: u64,
    pub full_name: String,
    pub description: Option<String>,
    pub stargazers_count: u64,
    pub html_url: String,
    pub updated_at: String,
    pub owner: Owner,
}

/// One page of search results, replaced wholesale on every successful response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    pub total_count: u64,
    #[serde(default, rename = "incomplete_results")]
    pub truncated: bool,
    pub items: Vec<Repo>,
}

/// Quota snapshot from the most recent response's headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateWindow {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Epoch seconds.
    pub reset: Option<i64>,
}

impl RateWindow {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: header_number(headers, "x-ratelimit-limit"),
            remaining: header_number(headers, "x-ratelimit-remaining"),
            reset: header_number(headers, "x-ratelimit-reset"),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Percentage of the quota still available, when both numbers are known.
    pub fn percent_remaining(&self) -> Option<u32> {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => {
                Some(((u64::from(remaining) * 100) / u64::from(limit)) as u32)
            }
            (Some(_), Some(_)) => Some(100),
            _ => None,
        }
    }
}

fn header_number<N: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<N> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
