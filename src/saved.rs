//! Named filter snapshots the user chose to keep.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::filters::{Order, PageSize, Sort};
use crate::storage::Storage;

pub const SAVED_KEY: &str = "gh:saved";

/// The filter fields that identify a saved query. Page is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySnapshot {
    pub term: String,
    pub language: String,
    pub sort: Sort,
    pub order: Order,
    pub page_size: PageSize,
}

impl QuerySnapshot {
    /// Deterministic id: the five fields joined by `|`, escaped so distinct
    /// snapshots can never share an id.
    pub fn id(&self) -> String {
        [
            escape(&self.term),
            escape(&self.language),
            self.sort.to_string(),
            self.order.to_string(),
            self.page_size.to_string(),
        ]
        .join("|")
    }
}

fn escape(field: &str) -> String {
    field.replace('\\', "\\\\").replace('|', "\\|")
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub id: String,
    #[serde(rename = "q")]
    pub term: String,
    pub language: String,
    pub sort: Sort,
    pub order: Order,
    pub per_page: PageSize,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl SavedQuery {
    pub fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            term: self.term.clone(),
            language: self.language.clone(),
            sort: self.sort,
            order: self.order,
            page_size: self.per_page,
        }
    }

    /// `“react” • TypeScript • stars / desc • 20/page`
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if !self.term.is_empty() {
            parts.push(format!("“{}”", self.term));
        }
        if !self.language.is_empty() {
            parts.push(self.language.clone());
        }
        parts.push(format!("{} / {}", self.sort, self.order));
        parts.push(format!("{}/page", self.per_page));
        parts.join(" • ")
    }
}

/// Badge text for a count of saved queries.
pub fn badge_text(count: usize) -> String {
    if count > 99 {
        "99+".to_string()
    } else {
        count.to_string()
    }
}

/// Keeps every well-formed entry; malformed ones are skipped.
fn parse_entries(raw: &str) -> Vec<SavedQuery> {
    let values: Vec<Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            warn!("Saved queries are corrupt, starting empty: {}", e);
            return Vec::new();
        }
    };
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<SavedQuery>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping malformed saved query: {}", e);
                None
            }
        })
        .collect()
}

pub struct SavedQueryStore {
    storage: Arc<dyn Storage>,
    /// Insertion order, as persisted.
    entries: Vec<SavedQuery>,
}

impl SavedQueryStore {
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let entries = match storage.get(SAVED_KEY) {
            Ok(Some(raw)) => parse_entries(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read saved queries: {}", e);
                Vec::new()
            }
        };
        Self { storage, entries }
    }

    /// Adds the snapshot unless one with the same id exists. Returns whether
    /// anything was added.
    pub fn add(&mut self, snapshot: &QuerySnapshot) -> bool {
        self.add_at(snapshot, Utc::now().timestamp_millis())
    }

    pub fn add_at(&mut self, snapshot: &QuerySnapshot, created_at: i64) -> bool {
        let id = snapshot.id();
        if self.entries.iter().any(|entry| entry.id == id) {
            debug!("Query {} already saved", id);
            return false;
        }
        self.entries.push(SavedQuery {
            id,
            term: snapshot.term.clone(),
            language: snapshot.language.clone(),
            sort: snapshot.sort,
            order: snapshot.order,
            per_page: snapshot.page_size,
            created_at,
        });
        self.persist();
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn is_saved_for(&self, snapshot: &QuerySnapshot) -> bool {
        let id = snapshot.id();
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&SavedQuery> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Most recent first.
    pub fn list(&self) -> Vec<SavedQuery> {
        let mut list = self.entries.clone();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("Could not serialize saved queries: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(SAVED_KEY, &json) {
            warn!("Could not persist saved queries: {}", e);
        }
    }
}
