//! Search orchestrator scenarios against a scripted storefront page

mod utils;

use std::sync::Arc;
use std::time::Duration;
use title_locator::modules::search::application::ports::{IdleState, PageError};
use title_locator::modules::search::domain::services::QueryVariantGenerator;
use title_locator::modules::search::infrastructure::SitePoliteness;
use title_locator::modules::search::{
    RetryPolicy, SearchFailure, SearchOrchestrator, SearchStatus, SiteHints,
};
use title_locator::modules::title::domain::services::SimilarityScorer;
use title_locator::MatchTier;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use utils::factories::{base_url, SiteFactory, RESULT_SELECTOR};
use utils::fake_page::{FakePage, Listing};

fn orchestrator() -> SearchOrchestrator {
    SearchOrchestrator::new(Arc::new(SimilarityScorer::default()))
}

fn budget_of(ms: u64) -> RetryPolicy {
    RetryPolicy {
        book_budget_ms: ms,
        ..RetryPolicy::immediate()
    }
}

fn filtered_site() -> title_locator::SiteConfig {
    SiteFactory::new("engine")
        .hints(SiteHints {
            site_filter: Some("books.example.jp".to_string()),
            ..SiteHints::default()
        })
        .build()
}

fn search_url(site_id: &str, query: &str) -> String {
    format!("{}/search?q={}", base_url(site_id), urlencoding::encode(query))
}

#[tokio::test]
async fn test_third_result_selector_supplies_candidates() {
    let site = SiteFactory::new("shop")
        .result_selectors(&[".grid .item", ".list li a", ".legacy td a", ".never"])
        .build();
    let page = FakePage::new().with_listing(
        ".legacy td a",
        vec![
            Listing::new("Unrelated Almanac", "/p/1"),
            Listing::new("Frieren", "/p/2"),
        ],
    );

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::Accepted);
    assert_eq!(outcome.url.as_deref(), Some("https://shop.example.com/p/2"));
    assert_eq!(outcome.tier, Some(MatchTier::Exact));
    assert_eq!(
        page.queried_selectors(),
        vec![".grid .item", ".list li a", ".legacy td a"]
    );
}

#[tokio::test]
async fn test_timed_out_selector_is_skipped() {
    let site = SiteFactory::new("shop")
        .result_selectors(&[".slow", RESULT_SELECTOR])
        .build();
    let page = FakePage::new()
        .with_timeout_selector(".slow")
        .with_listing(RESULT_SELECTOR, vec![Listing::new("Frieren", "/p/1")]);

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert!(outcome.is_accepted());
}

#[tokio::test]
async fn test_transient_timeouts_then_success_counts_every_try() {
    let site = SiteFactory::new("shop").build();
    let max_attempts = site.retry.max_attempts_per_variant;
    let page = FakePage::new()
        .failing_navigations(
            (max_attempts - 1) as usize,
            PageError::Timeout("navigation timed out".to_string()),
        )
        .with_listing(RESULT_SELECTOR, vec![Listing::new("Frieren", "/p/1")]);

    let orchestrator = orchestrator();
    let outcome = orchestrator
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::Accepted);
    assert_eq!(outcome.attempts, max_attempts);
    assert_eq!(page.navigations().len(), max_attempts as usize);

    let metrics = orchestrator.metrics().snapshot();
    assert_eq!(metrics.transient_failures, (max_attempts - 1) as u64);
    assert_eq!(metrics.accepted, 1);
}

#[tokio::test]
async fn test_persistent_timeouts_surface_as_transient_failure() {
    let site = SiteFactory::new("shop").build();
    let page = FakePage::new().failing_navigations(100, PageError::Timeout("slow".to_string()));

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::NoResults);
    assert_eq!(outcome.attempts, site.retry.max_attempts_per_variant);
    assert!(matches!(
        outcome.failure,
        Some(SearchFailure::TransientNetworkFailure(_))
    ));
}

#[tokio::test]
async fn test_fatal_error_is_not_retried() {
    let site = SiteFactory::new("shop").build();
    let page = FakePage::new()
        .failing_navigations(1, PageError::SiteUnavailable("HTTP 503".to_string()))
        .with_listing(RESULT_SELECTOR, vec![Listing::new("Frieren", "/p/1")]);

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::Error);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(page.navigations().len(), 1);
    assert!(page.queried_selectors().is_empty());
}

#[tokio::test]
async fn test_cancellation_stops_further_calls() {
    let site = SiteFactory::new("shop").build();
    let cancel = CancellationToken::new();
    let page = FakePage::new()
        .cancelling_on_navigation(1, cancel.clone())
        .with_listing(RESULT_SELECTOR, vec![Listing::new("Frieren", "/p/1")]);

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &cancel)
        .await;

    assert_eq!(outcome.status, SearchStatus::Cancelled);
    assert_eq!(outcome.failure, Some(SearchFailure::Cancelled));
    assert!(page.queried_selectors().is_empty());
}

#[tokio::test]
async fn test_volume_notation_variant_finds_listing() {
    let title = "葬送のフリーレン 3";
    let site = SiteFactory::new("shop").build();
    let page = FakePage::new().with_listing_for_query(
        "葬送のフリーレン③",
        RESULT_SELECTOR,
        vec![Listing::new("葬送のフリーレン③", "/item?id=3&utm_source=feed")],
    );

    let outcome = orchestrator()
        .find_best_match(&page, title, &site, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::Accepted);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.url.as_deref(), Some("https://shop.example.com/item?id=3"));
    assert_eq!(
        page.navigations(),
        vec![search_url("shop", title), search_url("shop", "葬送のフリーレン③")]
    );
}

#[tokio::test]
async fn test_low_confidence_after_every_variant() {
    let title = "葬送のフリーレン 3";
    let site = SiteFactory::new("shop").build();
    let page = FakePage::new().with_listing(
        RESULT_SELECTOR,
        vec![Listing::new("Gardening Almanac 2024", "/p/9")],
    );

    let outcome = orchestrator()
        .find_best_match(&page, title, &site, &CancellationToken::new())
        .await;

    let variant_count = QueryVariantGenerator::new(site.retry.max_variants)
        .generate_variants(title, Some(&site.hints))
        .len();
    assert_eq!(outcome.status, SearchStatus::LowConfidence);
    assert_eq!(outcome.attempts as usize, variant_count);
    assert_eq!(outcome.url.as_deref(), Some("https://shop.example.com/p/9"));
    assert!(outcome.accepted_url().is_none());
    assert!(matches!(
        outcome.failure,
        Some(SearchFailure::LowConfidenceMatch { .. })
    ));
}

#[tokio::test]
async fn test_no_listings_is_no_candidates() {
    let site = SiteFactory::new("shop").build();
    let page = FakePage::new();

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::NoResults);
    assert_eq!(outcome.failure, Some(SearchFailure::NoCandidatesFound));
    assert!(outcome.url.is_none());
}

#[tokio::test]
async fn test_form_search_types_into_first_existing_input() {
    let site = SiteFactory::new("shop").form(&["#search", "input[name='q']"]).build();
    let page = FakePage::new()
        .with_search_input("input[name='q']")
        .with_submit_button("button[type='submit']")
        .with_idle_state(IdleState::TimedOut)
        .with_listing(RESULT_SELECTOR, vec![Listing::new("Frieren", "/p/1")]);

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert!(outcome.is_accepted());
    let calls = page.calls();
    assert_eq!(calls[0], "navigate https://shop.example.com");
    assert_eq!(calls[1], "type_into #search Frieren");
    assert_eq!(calls[2], "type_into input[name='q'] Frieren");
    assert_eq!(calls[3], "submit button[type='submit']");
}

#[tokio::test]
async fn test_site_filter_prefixes_queries() {
    let site = SiteFactory::new("engine")
        .hints(SiteHints {
            site_filter: Some("books.example.jp".to_string()),
            ..SiteHints::default()
        })
        .build();
    let page = FakePage::new();

    orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert_eq!(
        page.navigations(),
        vec![search_url("engine", "site:books.example.jp Frieren")]
    );
}

#[tokio::test]
async fn test_verification_accepts_matching_detail_page() {
    let site = SiteFactory::new("shop").verified().build();
    let page = FakePage::new()
        .with_listing(RESULT_SELECTOR, vec![Listing::new("Frieren", "/p/1")])
        .with_detail_page("https://shop.example.com/p/1", "Frieren 【Special Edition】");

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert!(outcome.is_accepted());
    assert_eq!(page.navigations().last().map(String::as_str), Some("https://shop.example.com/p/1"));
}

#[tokio::test]
async fn test_verification_rejects_mismatched_detail_page() {
    let site = SiteFactory::new("shop").verified().build();
    let page = FakePage::new()
        .with_listing(RESULT_SELECTOR, vec![Listing::new("Frieren", "/p/1")])
        .with_detail_page("https://shop.example.com/p/1", "Gardening Almanac");

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::LowConfidence);
    assert!(outcome.score.unwrap() < 0.6);
}

#[tokio::test]
async fn test_site_threshold_overrides_default() {
    let site = SiteFactory::new("strict").threshold(0.95).build();
    let page = FakePage::new().with_listing(
        RESULT_SELECTOR,
        vec![Listing::new("Frieren Beyond Journey's End", "/p/1")],
    );

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &site, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::LowConfidence);
    assert_eq!(outcome.tier, Some(MatchTier::ContainmentForward));
}

#[tokio::test]
async fn test_site_filter_drops_off_domain_links() {
    let page = FakePage::new().with_listing(
        RESULT_SELECTOR,
        vec![
            Listing::new("Frieren", "https://elsewhere.example.org/p/1"),
            Listing::new("Frieren", "https://shop.books.example.jp/p/2"),
        ],
    );

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &filtered_site(), &CancellationToken::new())
        .await;

    assert!(outcome.is_accepted());
    assert_eq!(
        outcome.url.as_deref(),
        Some("https://shop.books.example.jp/p/2")
    );
}

#[tokio::test]
async fn test_site_filter_with_only_foreign_links_finds_nothing() {
    let page = FakePage::new().with_listing(
        RESULT_SELECTOR,
        vec![
            Listing::new("Frieren", "https://elsewhere.example.org/p/1"),
            Listing::new("Frieren", "/p/2"),
        ],
    );

    let outcome = orchestrator()
        .find_best_match(&page, "Frieren", &filtered_site(), &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, SearchStatus::NoResults);
    assert_eq!(outcome.failure, Some(SearchFailure::NoCandidatesFound));
    assert!(outcome.url.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_site_stops_at_book_budget() {
    let title = "葬送のフリーレン 3";
    let budget = Duration::from_millis(1_000);
    let site = SiteFactory::new("slow").retry(budget_of(1_000)).build();
    let page = FakePage::new().with_latency(Duration::from_millis(400));

    let started = Instant::now();
    let outcome = orchestrator()
        .find_best_match(&page, title, &site, &CancellationToken::new())
        .await;

    let variant_count = QueryVariantGenerator::new(site.retry.max_variants)
        .generate_variants(title, Some(&site.hints))
        .len();
    assert!(started.elapsed() <= budget + Duration::from_millis(10));
    assert_eq!(outcome.status, SearchStatus::NoResults);
    assert_eq!(outcome.attempts, 3);
    assert!((outcome.attempts as usize) < variant_count);
    assert_eq!(page.navigations().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_politeness_wait_stops_at_book_budget() {
    let title = "葬送のフリーレン 3";
    let budget = Duration::from_millis(1_000);
    let site = SiteFactory::new("polite").retry(budget_of(1_000)).build();
    let page = FakePage::new().with_listing(
        RESULT_SELECTOR,
        vec![Listing::new("Gardening Almanac 2024", "/p/9")],
    );
    // One submission per minute: the second variant has to wait far past the budget
    let orchestrator =
        orchestrator().with_politeness(Arc::new(SitePoliteness::new(1, 1, Duration::ZERO)));

    let started = Instant::now();
    let outcome = orchestrator
        .find_best_match(&page, title, &site, &CancellationToken::new())
        .await;

    assert!(started.elapsed() <= budget + Duration::from_millis(10));
    assert_eq!(outcome.status, SearchStatus::LowConfidence);
    assert_eq!(outcome.url.as_deref(), Some("https://polite.example.com/p/9"));
    assert_eq!(outcome.attempts, 2);
    assert_eq!(page.navigations().len(), 1);
}
