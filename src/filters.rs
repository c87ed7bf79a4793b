//! User-adjustable search filters and the request derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::query::build_search_query;

/// Page sizes the provider accepts from the page-size control.
pub const ALLOWED_PAGE_SIZES: [u32; 5] = [10, 20, 30, 50, 100];

/// Language filter values offered by the front-end. The filter accepts any string.
pub const LANGUAGES: [&str; 6] = ["TypeScript", "JavaScript", "Python", "Java", "Go", "Rust"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    /// Provider relevance ranking. `order` is ignored by the provider.
    #[default]
    Best,
    Stars,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

impl Sort {
    pub fn as_str(self) -> &'static str {
        match self {
            Sort::Best => "best",
            Sort::Stars => "stars",
            Sort::Updated => "updated",
        }
    }
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best" => Ok(Sort::Best),
            "stars" => Ok(Sort::Stars),
            "updated" => Ok(Sort::Updated),
            other => Err(format!("unknown sort '{}'", other)),
        }
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(format!("unknown order '{}'", other)),
        }
    }
}

/// A page size from [`ALLOWED_PAGE_SIZES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub struct PageSize(u32);

impl PageSize {
    pub const DEFAULT: PageSize = PageSize(10);

    pub fn new(n: u32) -> Option<Self> {
        ALLOWED_PAGE_SIZES.contains(&n).then_some(PageSize(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> u32 {
        size.0
    }
}

impl TryFrom<u32> for PageSize {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        PageSize::new(n).ok_or_else(|| format!("page size {} is not one of {:?}", n, ALLOWED_PAGE_SIZES))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The user-adjustable search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub term: String,
    pub sort: Sort,
    pub order: Order,
    pub page_size: PageSize,
    /// 1-based.
    pub page: u32,
    pub language: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            term: String::new(),
            sort: Sort::Best,
            order: Order::Desc,
            page_size: PageSize::DEFAULT,
            page: 1,
            language: String::new(),
        }
    }
}

/// Read-only shape of a single outgoing search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub query: String,
    pub sort: Sort,
    pub order: Order,
    pub page_size: PageSize,
    pub page: u32,
}

impl RequestDescriptor {
    /// Derives the request from the filters, using `term` (the debounced term)
    /// in place of the live input.
    pub fn derive(filters: &FilterState, term: &str) -> Self {
        Self {
            query: build_search_query(term, &filters.language),
            sort: filters.sort,
            order: filters.order,
            page_size: filters.page_size,
            page: filters.page,
        }
    }

    /// Query parameters for the provider. `sort`/`order` are left out for
    /// relevance ranking, which ignores them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.query.clone())];
        if self.sort != Sort::Best {
            pairs.push(("sort", self.sort.to_string()));
            pairs.push(("order", self.order.to_string()));
        }
        pairs.push(("per_page", self.page_size.to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_accepts_only_allowed_values() {
        assert_eq!(PageSize::new(20).map(PageSize::get), Some(20));
        assert!(PageSize::new(15).is_none());
        assert!(PageSize::new(0).is_none());
        assert_eq!(PageSize::default().get(), 10);
    }

    #[test]
    fn sort_and_order_parse_their_wire_names() {
        assert_eq!("stars".parse::<Sort>(), Ok(Sort::Stars));
        assert_eq!("asc".parse::<Order>(), Ok(Order::Asc));
        assert!("STARS".parse::<Sort>().is_err());
        assert!("sideways".parse::<Order>().is_err());
    }

    #[test]
    fn descriptor_uses_given_term_not_live_input() {
        let filters = FilterState {
            term: "reac".to_string(),
            language: "TypeScript".to_string(),
            ..FilterState::default()
        };
        let descriptor = RequestDescriptor::derive(&filters, "react");
        assert_eq!(descriptor.query, "react in:name language:TypeScript");
        assert_eq!(descriptor.page, 1);
    }

    #[test]
    fn best_match_omits_sort_and_order_parameters() {
        let mut filters = FilterState::default();
        let pairs = RequestDescriptor::derive(&filters, "").query_pairs();
        assert!(pairs.iter().all(|(k, _)| *k != "sort" && *k != "order"));

        filters.sort = Sort::Stars;
        filters.order = Order::Asc;
        filters.page = 3;
        let pairs = RequestDescriptor::derive(&filters, "").query_pairs();
        assert!(pairs.contains(&("sort", "stars".to_string())));
        assert!(pairs.contains(&("order", "asc".to_string())));
        assert!(pairs.contains(&("page", "3".to_string())));
        assert!(pairs.contains(&("per_page", "10".to_string())));
    }
}
