mod common;

use common::{harness, repo, response, results, type_text, Reply};
use github_repo_search::{
    format_reset, EmptyState, Phase, Sort, UrlSync, DISCOVERY_QUERY,
};
use serde_json::json;
use std::time::Duration;

const TYPING_GAP: Duration = Duration::from_millis(50);

fn one_repo() -> Reply {
    Reply::now(results(42, vec![repo(1, "acme/widgets")]))
}

#[tokio::test(start_paused = true)]
async fn initial_load_searches_popular_repositories() {
    let mut h = harness("", one_repo());
    h.search.hydrate();
    h.search.settle().await;

    let requests = h.client.requests();
    assert_eq!(requests.len(), 1);
    let descriptor = &requests[0].descriptor;
    assert_eq!(descriptor.query, DISCOVERY_QUERY);
    assert_eq!(descriptor.page, 1);
    assert_eq!(descriptor.page_size.get(), 10);
    assert_eq!(descriptor.sort, Sort::Best);

    assert_eq!(h.search.phase(), Phase::Idle);
    assert_eq!(h.search.results().unwrap().items[0].full_name, "acme/widgets");
    assert_eq!(h.url.read(), "");
}

#[tokio::test(start_paused = true)]
async fn typing_a_term_searches_by_name_after_the_debounce() {
    let mut h = harness("?page=3", one_repo());
    h.search.hydrate();
    h.search.settle().await;
    assert_eq!(h.client.requests().len(), 1);
    assert_eq!(h.search.filters().page, 3);

    type_text(&mut h.search, "react", TYPING_GAP).await;
    assert_eq!(h.client.requests().len(), 1, "no request while typing");

    h.search.settle().await;
    let requests = h.client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].descriptor.query, "react in:name");
    assert_eq!(requests[1].descriptor.page, 1);
    assert_eq!(h.search.filters().page, 1);
    assert!(h.url.read().contains("q=react"));
    assert!(!h.url.read().contains("page="));
}

#[tokio::test(start_paused = true)]
async fn choosing_a_language_without_term_filters_popular_repositories() {
    let mut h = harness("?page=2", one_repo());
    h.search.hydrate();
    h.search.settle().await;

    h.search.set_language("TypeScript");
    h.search.settle().await;

    let last = h.client.last_request();
    assert_eq!(last.descriptor.query, "stars:>5000 language:TypeScript");
    assert_eq!(last.descriptor.page, 1);
    assert_eq!(h.search.filters().page, 1);
    assert!(h.url.read().contains("lang=TypeScript"));
}

#[tokio::test(start_paused = true)]
async fn next_page_moves_to_page_two() {
    let mut h = harness("", one_repo());
    h.search.hydrate();
    h.search.settle().await;
    assert_eq!(h.search.total_pages(), 5);
    assert!(!h.search.can_prev());
    assert!(h.search.can_next());

    h.search.next_page();
    h.search.settle().await;

    assert_eq!(h.search.filters().page, 2);
    assert!(h.url.read().contains("page=2"));
    assert_eq!(h.client.last_request().descriptor.page, 2);
    assert!(h.search.can_prev());
}

#[tokio::test(start_paused = true)]
async fn exhausted_rate_limit_reports_reset_time() {
    let reset = chrono::Utc::now().timestamp() + 60;
    let limited = response(
        403,
        json!({ "message": "rate limited" }),
        &[
            ("x-ratelimit-limit", "10".to_string()),
            ("x-ratelimit-remaining", "0".to_string()),
            ("x-ratelimit-reset", reset.to_string()),
        ],
    );
    let mut h = harness("", Reply::now(limited));
    h.search.hydrate();
    h.search.settle().await;

    assert_eq!(h.search.phase(), Phase::Error);
    let err = h.search.error().expect("rate limit error");
    assert!(err.is_rate_limit());
    assert_eq!(err.status(), Some(403));
    let rendered = format_reset(reset).unwrap();
    assert!(err.to_string().contains(&rendered), "{}", err);
    assert!(err.to_string().contains("token"));

    let rate = h.search.rate();
    assert_eq!(rate.remaining, Some(0));
    assert_eq!(rate.limit, Some(10));
    assert_eq!(rate.reset, Some(reset));
    assert!(h.search.results().is_none());
}

#[tokio::test(start_paused = true)]
async fn zero_results_for_a_term_is_distinct_from_no_query() {
    let mut h = harness("", Reply::now(results(0, vec![])));
    h.search.hydrate();
    h.search.settle().await;
    assert_eq!(h.search.empty_state(), Some(EmptyState::NoQuery));

    type_text(&mut h.search, "nothing-here", TYPING_GAP).await;
    h.search.settle().await;

    assert_eq!(
        h.search.empty_state(),
        Some(EmptyState::NoMatches {
            term: "nothing-here".to_string()
        })
    );
    assert!(h.search.error().is_none());
    assert_eq!(h.search.total_pages(), 1);
    assert!(!h.search.can_next());
}
