// tests/ingest_collect.rs
mod common;

use async_trait::async_trait;
use common::{rss_feed, search_listing, StaticFetcher};
use lead_scraper::ingest::error::{AggregationError, FetchError};
use lead_scraper::ingest::providers::providers_from_registry;
use lead_scraper::ingest::types::{Fetch, LeadProvider};
use lead_scraper::ingest::{collect_leads, collect_leads_until};
use lead_scraper::{SourceRegistry, SourceSpec};
use std::time::Duration;

const BASE: &str = "http://search.test";

fn registry() -> SourceRegistry {
    SourceRegistry::new(
        BASE,
        vec![
            SourceSpec::search("r/VPN", "VPN", "help"),
            SourceSpec::search("r/privacy", "privacy", "vpn"),
            SourceSpec::feed("Forum A", "https://a.test/rss"),
            SourceSpec::feed("Forum B", "https://b.test/rss"),
        ],
    )
}

fn search_url(sub: &str, q: &str, limit: usize) -> String {
    format!("{BASE}/r/{sub}/search.json?q={q}&restrict_sr=1&sort=new&limit={limit}")
}

#[tokio::test]
async fn failing_sources_do_not_block_the_rest() {
    let providers = providers_from_registry(&registry());
    let fetcher = StaticFetcher::new()
        .with_body(&search_url("VPN", "help", 4), search_listing(6, 1_715_100_000))
        // r/privacy unreachable (not registered)
        .with_body("https://a.test/rss", rss_feed(2, true))
        .with_body("https://b.test/rss", "not xml at all <");

    let out = collect_leads(&providers, &fetcher, 4).await.expect("collect");

    assert_eq!(out.leads.len(), 4 + 2);
    assert!(!out.interrupted);
    let failed: Vec<_> = out.diagnostics.iter().map(|d| d.source.as_str()).collect();
    assert_eq!(failed, vec!["r/privacy", "Forum B"]);
    assert_eq!(fetcher.requested().len(), 4);
}

#[tokio::test]
async fn merged_output_is_newest_first() {
    let providers = providers_from_registry(&registry());
    // Search posts: 2024-05-07 16:40 UTC and earlier; feed: 2024-05-07 20:00/19:00 UTC.
    let fetcher = StaticFetcher::new()
        .with_body(&search_url("VPN", "help", 5), search_listing(5, 1_715_100_000))
        .with_body(&search_url("privacy", "vpn", 5), search_listing(3, 1_715_090_000))
        .with_body("https://a.test/rss", rss_feed(2, true))
        .with_body("https://b.test/rss", rss_feed(1, true));

    let out = collect_leads(&providers, &fetcher, 5).await.expect("collect");

    assert_eq!(out.leads.len(), 5 + 3 + 2 + 1);
    assert!(out.diagnostics.is_empty());
    for pair in out.leads.windows(2) {
        assert!(pair[0].created() >= pair[1].created());
    }
    assert_eq!(out.leads[0].source(), "Forum A");
}

#[tokio::test]
async fn zero_limit_is_fatal() {
    let providers = providers_from_registry(&registry());
    let fetcher = StaticFetcher::new();
    let err = collect_leads(&providers, &fetcher, 0).await.unwrap_err();
    assert_eq!(err, AggregationError::InvalidLimit(0));
    assert!(fetcher.requested().is_empty());
}

#[tokio::test]
async fn no_providers_is_fatal() {
    let providers: Vec<Box<dyn LeadProvider>> = vec![];
    let err = collect_leads(&providers, &StaticFetcher::new(), 5)
        .await
        .unwrap_err();
    assert_eq!(err, AggregationError::NoSources);
}

#[tokio::test]
async fn immediate_shutdown_queries_nothing() {
    let providers = providers_from_registry(&registry());
    let fetcher = StaticFetcher::new();

    let out = collect_leads_until(&providers, &fetcher, 5, std::future::ready(()))
        .await
        .expect("collect");

    assert!(out.interrupted);
    assert!(out.leads.is_empty());
    assert!(fetcher.requested().is_empty());
}

/// Answers the first feed at once and hangs on everything else.
struct HangingFetcher {
    inner: StaticFetcher,
}

#[async_trait]
impl Fetch for HangingFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if url != "https://a.test/rss" {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.fetch(url).await
    }
}

#[tokio::test]
async fn shutdown_mid_pass_keeps_what_was_collected() {
    let registry = SourceRegistry::new(
        BASE,
        vec![
            SourceSpec::feed("Forum A", "https://a.test/rss"),
            SourceSpec::feed("Forum B", "https://b.test/rss"),
        ],
    );
    let providers = providers_from_registry(&registry);
    let fetcher = HangingFetcher {
        inner: StaticFetcher::new().with_body("https://a.test/rss", rss_feed(3, true)),
    };

    let out = collect_leads_until(
        &providers,
        &fetcher,
        5,
        tokio::time::sleep(Duration::from_millis(200)),
    )
    .await
    .expect("collect");

    assert!(out.interrupted);
    assert_eq!(out.leads.len(), 3);
    assert!(out.leads.iter().all(|l| l.source() == "Forum A"));
}
