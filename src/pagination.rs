//! Page-number windowing and page-count bounds.

/// The provider never returns more than this many results for one query.
pub const HARD_LIMIT: u64 = 1000;

/// Page numbers within `radius` of `current`, clamped to `1..=total`.
///
/// Windows near either end come out shorter rather than shifted. Rendering
/// "first"/"last" shortcuts outside the window is up to the caller.
pub fn page_window(current: u32, total: u32, radius: u32) -> Vec<u32> {
    let start = current.saturating_sub(radius).max(1);
    let end = current.saturating_add(radius).min(total);
    (start..=end).collect()
}

/// Number of reachable pages for `total_count` results, at least 1 and never
/// past the provider's [`HARD_LIMIT`].
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let by_count = total_count.div_ceil(page_size);
    let by_limit = HARD_LIMIT.div_ceil(page_size);
    let pages = by_count.min(by_limit).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Last page the provider will serve at this page size.
pub fn max_page(page_size: u32) -> u32 {
    total_pages(HARD_LIMIT, page_size)
}
