//! Persisted user preferences: sort, order, page size and language.
//!
//! Anything read from storage or the URL is untrusted and goes through
//! [`clamp_prefs`] before use.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::filters::{Order, PageSize, Sort};
use crate::storage::Storage;

pub const PREFS_KEY: &str = "gh:prefs";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserPrefs {
    pub sort: Sort,
    pub order: Order,
    pub per_page: PageSize,
    pub language: String,
}

/// Fields to merge onto the stored preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefsPatch {
    pub sort: Option<Sort>,
    pub order: Option<Order>,
    pub per_page: Option<PageSize>,
    pub language: Option<String>,
}

impl PrefsPatch {
    fn apply(self, prefs: &mut UserPrefs) {
        if let Some(sort) = self.sort {
            prefs.sort = sort;
        }
        if let Some(order) = self.order {
            prefs.order = order;
        }
        if let Some(per_page) = self.per_page {
            prefs.per_page = per_page;
        }
        if let Some(language) = self.language {
            prefs.language = language;
        }
    }
}

pub fn clamp_sort(value: Option<&Value>) -> Sort {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

pub fn clamp_order(value: Option<&Value>) -> Order {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

/// Accepts numbers and numeric strings, as long as they land in the allowed set.
pub fn clamp_page_size(value: Option<&Value>) -> PageSize {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
        .and_then(|n| PageSize::new(n as u32))
        .unwrap_or_default()
}

pub fn clamp_language(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Coerces arbitrary JSON into valid preferences. Non-objects and missing or
/// out-of-set fields fall back to defaults. Idempotent.
pub fn clamp_prefs(raw: &Value) -> UserPrefs {
    UserPrefs {
        sort: clamp_sort(raw.get("sort")),
        order: clamp_order(raw.get("order")),
        per_page: clamp_page_size(raw.get("perPage")),
        language: clamp_language(raw.get("language")),
    }
}

pub struct PreferenceStore {
    storage: Arc<dyn Storage>,
}

impl PreferenceStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Stored preferences, or defaults if storage is absent, corrupt or unavailable.
    pub fn read(&self) -> UserPrefs {
        let raw = match self.storage.get(PREFS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return UserPrefs::default(),
            Err(e) => {
                warn!("Could not read preferences, using defaults: {}", e);
                return UserPrefs::default();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => clamp_prefs(&value),
            Err(e) => {
                warn!("Stored preferences are corrupt, using defaults: {}", e);
                UserPrefs::default()
            }
        }
    }

    /// Merges `patch` onto the stored value and persists the result, which is
    /// returned even if it could not be written.
    pub fn write(&self, patch: PrefsPatch) -> UserPrefs {
        let mut next = self.read();
        patch.apply(&mut next);

        match serde_json::to_string(&next) {
            Ok(json) => {
                if let Err(e) = self.storage.set(PREFS_KEY, &json) {
                    warn!("Could not persist preferences: {}", e);
                } else {
                    debug!("Persisted preferences {:?}", next);
                }
            }
            Err(e) => warn!("Could not serialize preferences: {}", e),
        }
        next
    }
}
