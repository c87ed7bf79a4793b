//! # GitHub Repository Search
//!
//! A Rust library for searching GitHub repositories with filters that stay in
//! sync with a shareable URL, persisted preferences, saved queries and the
//! request in flight, with debounced input, cancellation of superseded
//! requests and rate-limit awareness.
//!
//! ## Main Components
//!
//! - [`SearchOrchestrator`]: The core state machine tying everything together
//! - [`GitHubSearcher`]: The reqwest-backed [`SearchClient`] for the GitHub Search API
//! - [`Storage`] and [`UrlSync`]: Ports for persistent client storage and the location
//! - Pure helpers: [`build_search_query`], [`page_window`], [`clamp_prefs`], [`Debouncer`]
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use github_repo_search::{
//!     GitHubSearcher, MemoryStorage, MemoryUrl, OrchestratorConfig, SearchOrchestrator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = OrchestratorConfig::from_env();
//!     let client = Arc::new(GitHubSearcher::new(&config)?);
//!     let url = Arc::new(MemoryUrl::new("q=tokio&lang=Rust"));
//!
//!     let mut search =
//!         SearchOrchestrator::new(config, url, Arc::new(MemoryStorage::new()), client);
//!     search.hydrate();
//!     search.settle().await;
//!
//!     for repo in search.results().map(|r| r.items.as_slice()).unwrap_or_default() {
//!         println!("{} ({} stars)", repo.full_name, repo.stargazers_count);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod debounce;
mod error;
mod filters;
mod format;
mod github_searcher;
mod orchestrator;
mod pagination;
mod prefs;
mod query;
mod saved;
mod storage;
mod token;
mod types;
mod url_sync;

// Re-export main components for documentation and external use
pub use crate::config::{Features, OrchestratorConfig, DEFAULT_ENDPOINT};
pub use crate::debounce::Debouncer;
pub use crate::error::{SearchError, StorageError, TransportError};
pub use crate::filters::{
    FilterState, Order, PageSize, RequestDescriptor, Sort, ALLOWED_PAGE_SIZES, LANGUAGES,
};
pub use crate::format::{format_reset, format_timestamp, seconds_until};
pub use crate::github_searcher::{
    GitHubSearcher, HttpResponse, SearchClient, SearchRequest, ACCEPT_GITHUB_JSON,
};
pub use crate::orchestrator::{
    interpret_response, EmptyState, KeyCommand, KeyOutcome, Phase, SearchOrchestrator, Update,
};
pub use crate::pagination::{max_page, page_window, total_pages, HARD_LIMIT};
pub use crate::prefs::{clamp_prefs, PreferenceStore, PrefsPatch, UserPrefs, PREFS_KEY};
pub use crate::query::{build_search_query, DISCOVERY_QUERY};
pub use crate::saved::{badge_text, QuerySnapshot, SavedQuery, SavedQueryStore, SAVED_KEY};
pub use crate::storage::{FileStorage, MemoryStorage, Storage};
pub use crate::token::{
    is_likely_github_token, is_valid_draft, redact_token, TokenStore, TOKEN_KEY,
};
pub use crate::types::{Owner, RateWindow, Repo, ResultSet};
pub use crate::url_sync::{encode_filters, MemoryUrl, UrlParams, UrlSync};
