//! Two-way mapping between the filters and a URL query string.
//!
//! Parameters: `q`, `sort`, `order`, `per_page`, `page`, `lang`. A parameter
//! equal to its default is left out, and an absent one means the default.

use std::sync::Mutex;
use url::form_urlencoded;

use crate::filters::{FilterState, PageSize, Sort};

/// Where the current query string lives (the browser location, in a web front-end).
pub trait UrlSync: Send + Sync {
    /// Current query string, without the leading `?`.
    fn read(&self) -> String;

    /// Replaces the current history entry's query string. Never adds an entry.
    fn replace(&self, query: &str);
}

/// Raw parameter values as found in the URL, before clamping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub per_page: Option<String>,
    pub page: Option<String>,
    pub lang: Option<String>,
}

impl UrlParams {
    pub fn parse(query: &str) -> Self {
        let mut params = UrlParams::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "q" => &mut params.q,
                "sort" => &mut params.sort,
                "order" => &mut params.order,
                "per_page" => &mut params.per_page,
                "page" => &mut params.page,
                "lang" => &mut params.lang,
                _ => continue,
            };
            // First occurrence wins, as with URLSearchParams::get.
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Page number from the URL; anything that is not a positive integer means page 1.
    pub fn page_number(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

/// Query string for `filters`, with `term` standing in for the search term.
pub fn encode_filters(filters: &FilterState, term: &str) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if !term.is_empty() {
        pairs.push(("q", term.to_string()));
    }
    if filters.sort != Sort::Best {
        pairs.push(("sort", filters.sort.to_string()));
        pairs.push(("order", filters.order.to_string()));
    }
    if filters.page_size != PageSize::DEFAULT {
        pairs.push(("per_page", filters.page_size.to_string()));
    }
    if filters.page != 1 {
        pairs.push(("page", filters.page.to_string()));
    }
    if !filters.language.is_empty() {
        pairs.push(("lang", filters.language.clone()));
    }
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// In-memory location. Counts replacements so tests can check that no
/// history entries are pushed.
#[derive(Debug, Default)]
pub struct MemoryUrl {
    query: Mutex<String>,
    replacements: Mutex<usize>,
}

impl MemoryUrl {
    pub fn new(initial: &str) -> Self {
        Self {
            query: Mutex::new(initial.strip_prefix('?').unwrap_or(initial).to_string()),
            replacements: Mutex::new(0),
        }
    }

    pub fn replacements(&self) -> usize {
        self.replacements.lock().map(|n| *n).unwrap_or(0)
    }

    pub fn params(&self) -> UrlParams {
        UrlParams::parse(&self.read())
    }
}

impl UrlSync for MemoryUrl {
    fn read(&self) -> String {
        self.query.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn replace(&self, query: &str) {
        if let Ok(mut current) = self.query.lock() {
            *current = query.to_string();
        }
        if let Ok(mut n) = self.replacements.lock() {
            *n += 1;
        }
    }
}
