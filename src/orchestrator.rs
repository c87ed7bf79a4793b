//! Search orchestration: keeps the filters, the URL, persisted preferences and
//! the in-flight request consistent with each other.
//!
//! The orchestrator is driven from a single event loop. User input arrives
//! through the mutation methods (`set_term`, `set_sort`, `next_page`, ...),
//! which are synchronous. Debounced terms and request settlements arrive
//! through [`SearchOrchestrator::next_update`], the only suspension point.
//!
//! At most one request is current. Issuing a request cancels the previous
//! one's [`CancellationToken`], and settlements carrying a cancelled token are
//! dropped without touching state, so a late response can never overwrite the
//! result of a newer request.

use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::debounce::Debouncer;
use crate::error::{SearchError, TransportError};
use crate::filters::{FilterState, Order, PageSize, RequestDescriptor, Sort};
use crate::format::format_reset;
use crate::github_searcher::{HttpResponse, SearchClient, SearchRequest};
use crate::pagination::{max_page, page_window, total_pages};
use crate::prefs::{clamp_prefs, PreferenceStore, PrefsPatch};
use crate::saved::{QuerySnapshot, SavedQuery, SavedQueryStore};
use crate::storage::Storage;
use crate::token::{is_valid_draft, TokenStore};
use crate::types::{RateWindow, ResultSet};
use crate::url_sync::{encode_filters, UrlParams, UrlSync};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Hydrating,
    Idle,
    Loading,
    Error,
}

/// Why a settled search shows no repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    /// Nothing was searched for and the discovery query came back empty.
    NoQuery,
    /// The user's term matched nothing.
    NoMatches { term: String },
}

/// Keyboard shortcuts. They dispatch into the same mutations as the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Global combo (Ctrl+K or `/`).
    FocusSearch,
    Escape,
    PreviousPage,
    NextPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The presentation layer should focus the search input.
    FocusSearch,
    Handled,
    Ignored,
}

/// What [`SearchOrchestrator::next_update`] observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// The debounced term settled. `changed` is false when it settled back on
    /// the value already being searched.
    TermSettled { term: String, changed: bool },
    /// The current request finished with results or an error.
    Settled,
}

struct InFlight {
    cancel: CancellationToken,
    descriptor: RequestDescriptor,
}

struct Settlement {
    cancel: CancellationToken,
    outcome: Result<HttpResponse, TransportError>,
}

enum Event {
    Term(String),
    Settled(Settlement),
}

pub struct SearchOrchestrator {
    config: OrchestratorConfig,
    url: Arc<dyn UrlSync>,
    client: Arc<dyn SearchClient>,
    prefs: PreferenceStore,
    tokens: TokenStore,
    saved: SavedQueryStore,

    phase: Phase,
    filters: FilterState,
    /// The term requests are built from; lags `filters.term` by the debounce.
    debounced_term: String,
    debouncer: Debouncer<String>,

    results: Option<ResultSet>,
    /// Total of the last successful response, kept while the next one loads.
    total_count: u64,
    rate: RateWindow,
    error: Option<SearchError>,

    in_flight: Option<InFlight>,
    last_request: Option<RequestDescriptor>,
    settled_tx: mpsc::UnboundedSender<Settlement>,
    settled_rx: mpsc::UnboundedReceiver<Settlement>,
}

impl SearchOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        url: Arc<dyn UrlSync>,
        storage: Arc<dyn Storage>,
        client: Arc<dyn SearchClient>,
    ) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        Self {
            debouncer: Debouncer::new(config.debounce),
            prefs: PreferenceStore::new(storage.clone()),
            tokens: TokenStore::load(storage.clone()),
            saved: SavedQueryStore::load(storage),
            config,
            url,
            client,
            phase: Phase::Uninitialized,
            filters: FilterState::default(),
            debounced_term: String::new(),
            results: None,
            total_count: 0,
            rate: RateWindow::default(),
            error: None,
            in_flight: None,
            last_request: None,
            settled_tx,
            settled_rx,
        }
    }

    /// Initializes the filters from the URL, then stored preferences, then
    /// defaults, and issues the first request. Runs once; later calls are ignored.
    pub fn hydrate(&mut self) {
        if self.phase != Phase::Uninitialized {
            warn!("Ignoring repeated hydration");
            return;
        }
        self.phase = Phase::Hydrating;

        let params = UrlParams::parse(&self.url.read());
        let stored = self.prefs.read();
        let mut raw = serde_json::to_value(&stored).unwrap_or(Value::Null);
        if let Value::Object(fields) = &mut raw {
            // Invalid URL values fall through to the stored preference.
            let overrides = [
                (
                    "sort",
                    params.sort.as_ref().filter(|s| s.parse::<Sort>().is_ok()),
                ),
                (
                    "order",
                    params.order.as_ref().filter(|o| o.parse::<Order>().is_ok()),
                ),
                (
                    "perPage",
                    params.per_page.as_ref().filter(|n| {
                        n.trim().parse::<u32>().ok().and_then(PageSize::new).is_some()
                    }),
                ),
                ("language", params.lang.as_ref()),
            ];
            for (key, value) in overrides {
                if let Some(value) = value {
                    fields.insert(key.to_string(), Value::String(value.clone()));
                }
            }
        }
        let prefs = clamp_prefs(&raw);

        let term = params.q.clone().unwrap_or_default();
        self.filters = FilterState {
            term: term.clone(),
            sort: prefs.sort,
            order: prefs.order,
            page_size: prefs.per_page,
            page: params.page_number().min(max_page(prefs.per_page.get())),
            language: prefs.language,
        };
        self.debounced_term = term;
        info!("Hydrated filters {:?}", self.filters);

        self.phase = Phase::Idle;
        self.refresh();
    }

    fn is_hydrated(&self) -> bool {
        !matches!(self.phase, Phase::Uninitialized | Phase::Hydrating)
    }

    /// Updates the live search input. The request follows once the term has
    /// been stable for the debounce delay.
    pub fn set_term(&mut self, term: &str) {
        if !self.is_hydrated() || self.filters.term == term {
            return;
        }
        self.filters.term = term.to_string();
        self.debouncer.push(term.to_string());
    }

    pub fn set_sort(&mut self, sort: Sort) {
        self.change_filters(PrefsPatch {
            sort: Some(sort),
            ..PrefsPatch::default()
        });
    }

    pub fn set_order(&mut self, order: Order) {
        self.change_filters(PrefsPatch {
            order: Some(order),
            ..PrefsPatch::default()
        });
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.change_filters(PrefsPatch {
            per_page: Some(page_size),
            ..PrefsPatch::default()
        });
    }

    pub fn set_language(&mut self, language: &str) {
        self.change_filters(PrefsPatch {
            language: Some(language.to_string()),
            ..PrefsPatch::default()
        });
    }

    /// Applies a change to the persisted filter fields: back to page 1,
    /// persist, sync the URL, re-request.
    fn change_filters(&mut self, patch: PrefsPatch) {
        if !self.is_hydrated() {
            return;
        }
        let before = self.filters.clone();
        if let Some(sort) = patch.sort {
            self.filters.sort = sort;
        }
        if let Some(order) = patch.order {
            self.filters.order = order;
        }
        if let Some(page_size) = patch.per_page {
            self.filters.page_size = page_size;
        }
        if let Some(language) = patch.language {
            self.filters.language = language;
        }
        if self.filters == before {
            return;
        }

        self.filters.page = 1;
        self.persist_preferences();
        self.sync_url();
        self.refresh();
    }

    pub fn go_to_page(&mut self, page: u32) {
        if !self.is_hydrated() {
            return;
        }
        let page = page.clamp(1, self.total_pages());
        if page == self.filters.page {
            return;
        }
        self.filters.page = page;
        self.sync_url();
        self.refresh();
    }

    pub fn next_page(&mut self) {
        if self.can_next() {
            self.go_to_page(self.filters.page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        if self.can_prev() {
            self.go_to_page(self.filters.page - 1);
        }
    }

    /// Re-issues the last request unchanged.
    pub fn retry(&mut self) {
        if !self.is_hydrated() {
            return;
        }
        match self.last_request.clone() {
            Some(descriptor) => {
                info!("Retrying q={:?} page {}", descriptor.query, descriptor.page);
                self.issue(descriptor);
            }
            None => self.refresh(),
        }
    }

    pub fn handle_key(&mut self, key: KeyCommand) -> KeyOutcome {
        match key {
            KeyCommand::FocusSearch => KeyOutcome::FocusSearch,
            KeyCommand::Escape if !self.filters.term.is_empty() => {
                self.set_term("");
                KeyOutcome::Handled
            }
            KeyCommand::PreviousPage if self.can_prev() => {
                self.prev_page();
                KeyOutcome::Handled
            }
            KeyCommand::NextPage if self.can_next() => {
                self.next_page();
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Waits for the next debounced term or request settlement and applies it.
    /// Responses from superseded requests are dropped here without returning.
    ///
    /// Cancel-safe, so it can race user input in a `tokio::select!`.
    pub async fn next_update(&mut self) -> Update {
        loop {
            let event = tokio::select! {
                term = self.debouncer.settled() => Event::Term(term),
                Some(settlement) = self.settled_rx.recv() => Event::Settled(settlement),
            };
            if let Some(update) = self.apply(event) {
                return update;
            }
        }
    }

    /// Processes updates until no term is pending and no request is in flight.
    pub async fn settle(&mut self) {
        while self.debouncer.is_pending() || self.in_flight.is_some() {
            self.next_update().await;
        }
    }

    fn apply(&mut self, event: Event) -> Option<Update> {
        match event {
            Event::Term(term) => {
                let changed = term != self.debounced_term;
                if changed {
                    debug!("Search term settled on {:?}", term);
                    self.debounced_term = term.clone();
                    self.filters.page = 1;
                    self.sync_url();
                    self.refresh();
                }
                Some(Update::TermSettled { term, changed })
            }
            Event::Settled(settlement) => {
                if settlement.cancel.is_cancelled() {
                    debug!("Dropping settlement of a superseded request");
                    return None;
                }
                let descriptor = match self.in_flight.take() {
                    Some(in_flight) => in_flight.descriptor,
                    None => return None,
                };
                self.settle_request(&descriptor, settlement.outcome);
                Some(Update::Settled)
            }
        }
    }

    fn settle_request(
        &mut self,
        descriptor: &RequestDescriptor,
        outcome: Result<HttpResponse, TransportError>,
    ) {
        let response = match outcome {
            Ok(response) => response,
            Err(TransportError::Cancelled) => {
                self.phase = Phase::Idle;
                return;
            }
            Err(TransportError::Request(message)) => {
                warn!("Search for q={:?} failed: {}", descriptor.query, message);
                self.fail(SearchError::Transport(message));
                return;
            }
        };

        self.rate = RateWindow::from_headers(&response.headers);
        match interpret_response(&response, &self.rate) {
            Ok(results) => {
                info!(
                    "{} results for q={:?} page {} ({} shown)",
                    results.total_count,
                    descriptor.query,
                    descriptor.page,
                    results.items.len()
                );
                self.total_count = results.total_count;
                self.results = Some(results);
                self.error = None;
                self.phase = Phase::Idle;
            }
            Err(err) => {
                warn!("Search for q={:?} failed: {}", descriptor.query, err);
                self.fail(err);
            }
        }
    }

    fn fail(&mut self, err: SearchError) {
        self.results = None;
        self.error = Some(err);
        self.phase = Phase::Error;
    }

    /// Issues a request if the derived descriptor differs from the last one.
    fn refresh(&mut self) {
        let descriptor = RequestDescriptor::derive(&self.filters, &self.debounced_term);
        if self.last_request.as_ref() == Some(&descriptor) {
            return;
        }
        self.issue(descriptor);
    }

    fn issue(&mut self, descriptor: RequestDescriptor) {
        if let Some(previous) = self.in_flight.take() {
            debug!("Cancelling request for q={:?}", previous.descriptor.query);
            previous.cancel.cancel();
        }

        let token = (self.config.features.credentials && self.tokens.is_set())
            .then(|| self.tokens.read().to_string());
        let request = SearchRequest {
            descriptor: descriptor.clone(),
            token,
        };
        debug!(
            "Issuing request q={:?} page {} per_page {}",
            descriptor.query, descriptor.page, descriptor.page_size
        );

        let cancel = CancellationToken::new();
        self.results = None;
        self.error = None;
        self.phase = Phase::Loading;
        self.in_flight = Some(InFlight {
            cancel: cancel.clone(),
            descriptor: descriptor.clone(),
        });
        self.last_request = Some(descriptor);

        let client = self.client.clone();
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            if cancel.is_cancelled() {
                let _ = settled_tx.send(Settlement {
                    cancel,
                    outcome: Err(TransportError::Cancelled),
                });
                return;
            }
            // The transport runs in its own task so a panic there still settles.
            let mut search = tokio::spawn(async move { client.search(&request).await });
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    search.abort();
                    Err(TransportError::Cancelled)
                }
                joined = &mut search => match joined {
                    Ok(response) => response,
                    Err(e) => Err(TransportError::Request(format!("search task failed: {}", e))),
                },
            };
            // The receiver is gone once the orchestrator is dropped.
            let _ = settled_tx.send(Settlement { cancel, outcome });
        });
    }

    fn persist_preferences(&self) {
        self.prefs.write(PrefsPatch {
            sort: Some(self.filters.sort),
            order: Some(self.filters.order),
            per_page: Some(self.filters.page_size),
            language: Some(self.filters.language.clone()),
        });
    }

    fn sync_url(&self) {
        let query = encode_filters(&self.filters, &self.debounced_term);
        if query != self.url.read() {
            self.url.replace(&query);
        }
    }

    /// Cancels any in-flight request and pending term.
    pub fn shutdown(&mut self) {
        self.debouncer.cancel();
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
    }

    // Saved queries

    fn current_snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            term: self.debounced_term.clone(),
            language: self.filters.language.clone(),
            sort: self.filters.sort,
            order: self.filters.order,
            page_size: self.filters.page_size,
        }
    }

    /// Saves the filters currently searched. Returns false if the feature is
    /// off or the query was already saved.
    pub fn save_current_query(&mut self) -> bool {
        if !self.config.features.saved_queries {
            return false;
        }
        let snapshot = self.current_snapshot();
        self.saved.add(&snapshot)
    }

    pub fn is_current_query_saved(&self) -> bool {
        self.saved.is_saved_for(&self.current_snapshot())
    }

    pub fn remove_saved_query(&mut self, id: &str) -> bool {
        self.saved.remove(id)
    }

    /// Most recent first.
    pub fn saved_queries(&self) -> Vec<SavedQuery> {
        self.saved.list()
    }

    /// Loads a saved query at page 1 in a single transition, without waiting
    /// out the debounce.
    pub fn apply_saved(&mut self, saved: &SavedQuery) {
        if !self.is_hydrated() {
            return;
        }
        self.debouncer.cancel();
        self.debounced_term = saved.term.clone();
        self.filters = FilterState {
            term: saved.term.clone(),
            sort: saved.sort,
            order: saved.order,
            page_size: saved.per_page,
            page: 1,
            language: saved.language.clone(),
        };
        self.persist_preferences();
        self.sync_url();
        self.refresh();
    }

    // Token

    /// Saves a token draft if it looks like a token (or is empty, which
    /// clears it). Returns whether it was accepted.
    pub fn save_token(&mut self, draft: &str) -> bool {
        if !is_valid_draft(draft) {
            return false;
        }
        self.tokens.save(draft);
        true
    }

    pub fn clear_token(&mut self) {
        self.tokens.clear();
    }

    pub fn has_token(&self) -> bool {
        self.tokens.is_set()
    }

    pub fn redacted_token(&self) -> String {
        self.tokens.redacted()
    }

    // Read-only view

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn debounced_term(&self) -> &str {
        &self.debounced_term
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn rate(&self) -> &RateWindow {
        &self.rate
    }

    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    pub fn last_request(&self) -> Option<&RequestDescriptor> {
        self.last_request.as_ref()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.filters.page_size.get())
    }

    pub fn can_prev(&self) -> bool {
        self.filters.page > 1
    }

    pub fn can_next(&self) -> bool {
        self.filters.page < self.total_pages()
    }

    pub fn page_window(&self) -> Vec<u32> {
        page_window(self.filters.page, self.total_pages(), self.config.page_radius)
    }

    /// Set when a search settled successfully with no items.
    pub fn empty_state(&self) -> Option<EmptyState> {
        let results = self.results.as_ref()?;
        if !results.items.is_empty() {
            return None;
        }
        let term = self.debounced_term.trim();
        if term.is_empty() {
            Some(EmptyState::NoQuery)
        } else {
            Some(EmptyState::NoMatches {
                term: term.to_string(),
            })
        }
    }
}

impl Drop for SearchOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Maps a provider response onto results or a user-facing error.
pub fn interpret_response(
    response: &HttpResponse,
    rate: &RateWindow,
) -> Result<ResultSet, SearchError> {
    match response.status {
        StatusCode::FORBIDDEN => {
            let reset_at = if rate.is_exhausted() {
                rate.reset.and_then(format_reset)
            } else {
                None
            };
            Err(SearchError::RateLimited { reset_at })
        }
        StatusCode::UNAUTHORIZED => Err(SearchError::Unauthorized),
        StatusCode::UNPROCESSABLE_ENTITY => Err(SearchError::InvalidQuery),
        status if !status.is_success() => Err(SearchError::Http {
            status: status.as_u16(),
            status_text: response.status_text().to_string(),
        }),
        _ => serde_json::from_str(&response.body).map_err(|e| SearchError::Decode(e.to_string())),
    }
}
