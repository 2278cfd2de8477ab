// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use lead_scraper::ingest::error::FetchError;
use lead_scraper::ingest::types::Fetch;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory fetcher: exact URL -> body. Unknown URLs fail like a refused
/// connection. Every requested URL is recorded.
#[derive(Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, Vec<u8>>,
    failures: HashMap<String, u16>,
    pub requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.failures.insert(url.to_string(), status);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(code) = self.failures.get(url) {
            return Err(FetchError::Status(*code));
        }
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Transport("connection refused".into()))
    }
}

/// Search listing JSON with `n` posts, newest first, one hour apart.
pub fn search_listing(n: usize, newest_ts: i64) -> String {
    let children: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "kind": "t3",
                "data": {
                    "title": format!("Post {i}"),
                    "permalink": format!("/r/VPN/comments/{i}/post_{i}/"),
                    "created_utc": (newest_ts - 3600 * i as i64) as f64,
                }
            })
        })
        .collect();
    serde_json::json!({ "kind": "Listing", "data": { "children": children } }).to_string()
}

/// RSS document with `n` items (no dates unless `with_dates`).
pub fn rss_feed(n: usize, with_dates: bool) -> String {
    let items: String = (0..n)
        .map(|i| {
            let date = if with_dates {
                format!("<pubDate>Tue, 07 May 2024 {:02}:00:00 +0000</pubDate>", 20 - i.min(20))
            } else {
                String::new()
            };
            format!(
                "<item><title>Thread {i}</title><link>https://forum.test/t/{i}</link>{date}</item>"
            )
        })
        .collect();
    format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Forum</title>{items}</channel></rss>"#)
}
