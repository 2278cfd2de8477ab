// tests/providers_rss.rs
mod common;

use chrono::Utc;
use common::{rss_feed, StaticFetcher};
use lead_scraper::ingest::providers::rss_feed::RssFeedProvider;
use lead_scraper::ingest::types::LeadProvider;
use std::fs;

const FEED_URL: &str = "https://forum.test/index.rss";

fn provider() -> RssFeedProvider {
    RssFeedProvider::new("Wilders Security", FEED_URL)
}

#[test]
fn fixture_parses_and_skips_items_without_link() {
    let xml = fs::read("tests/fixtures/rss_feed.xml").expect("fixture");
    let before = Utc::now();
    let leads = provider().parse_feed(&xml, 10).expect("parse ok");
    let after = Utc::now();

    assert_eq!(leads.len(), 3);
    assert_eq!(leads[0].title(), "Which VPN keeps no logs?");
    assert_eq!(leads[0].created().to_rfc3339(), "2024-05-07T09:15:00+00:00");
    assert_eq!(leads[1].title(), "DNS leaks with WireGuard client");
    assert_eq!(leads[1].created().to_rfc3339(), "2024-05-06T20:40:00+00:00");

    // Undated item is kept, stamped with the time of parsing.
    assert_eq!(leads[2].title(), "Undated thread");
    assert!(leads[2].created() >= before && leads[2].created() <= after);
}

#[test]
fn document_without_channel_yields_nothing() {
    let xml = fs::read("tests/fixtures/rss_no_channel.xml").expect("fixture");
    let leads = provider().parse_feed(&xml, 5).expect("no channel is not an error");
    assert!(leads.is_empty());
}

#[tokio::test]
async fn takes_first_items_in_feed_order() {
    let fetcher = StaticFetcher::new().with_body(FEED_URL, rss_feed(10, true));

    let leads = provider().produce_leads(&fetcher, 3).await.expect("leads");

    let titles: Vec<_> = leads.iter().map(|l| l.title()).collect();
    assert_eq!(titles, vec!["Thread 0", "Thread 1", "Thread 2"]);
}

#[tokio::test]
async fn limit_applies_before_incomplete_items_are_dropped() {
    let xml = r#"<rss><channel>
        <item><title>no link</title></item>
        <item><title>ok</title><link>https://forum.test/t/1</link></item>
        <item><title>beyond limit</title><link>https://forum.test/t/2</link></item>
    </channel></rss>"#;
    let fetcher = StaticFetcher::new().with_body(FEED_URL, xml);

    let leads = provider().produce_leads(&fetcher, 2).await.expect("leads");
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].url(), "https://forum.test/t/1");
}

#[tokio::test]
async fn http_error_and_bad_xml_become_diagnostics() {
    let fetcher = StaticFetcher::new().with_status(FEED_URL, 503);
    let diag = provider().produce_leads(&fetcher, 5).await.unwrap_err();
    assert_eq!(
        diag.to_string(),
        "[warning] server answered HTTP 503 for Wilders Security."
    );

    let fetcher = StaticFetcher::new().with_body(FEED_URL, "<rss><channel><item>");
    let diag = provider().produce_leads(&fetcher, 5).await.unwrap_err();
    assert!(diag.cause.starts_with("invalid RSS"));
}
