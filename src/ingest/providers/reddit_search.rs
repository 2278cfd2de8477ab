// src/ingest/providers/reddit_search.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;
use serde_json::Value;

use crate::ingest::error::{FetchError, ParseError};
use crate::ingest::normalize_title;
use crate::ingest::types::{Diagnostic, Fetch, Lead, LeadProvider};

pub const DEFAULT_SEARCH_BASE: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    data: ListingData,
}

#[derive(Debug, Deserialize, Default)]
struct ListingData {
    // Kept untyped so one odd post cannot sink the whole listing.
    #[serde(default)]
    children: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: Option<String>,
    permalink: Option<String>,
    created_utc: Option<Value>,
}

/// Newest-first subreddit search, first page only.
pub struct RedditSearchProvider {
    name: String,
    subreddit: String,
    query: String,
    base_url: String,
}

impl RedditSearchProvider {
    pub fn new(name: &str, subreddit: &str, query: &str) -> Self {
        Self::with_base_url(name, subreddit, query, DEFAULT_SEARCH_BASE)
    }

    /// Point the provider at another host (mirrors, mock servers).
    pub fn with_base_url(name: &str, subreddit: &str, query: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            subreddit: subreddit.to_string(),
            query: query.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/r/{subreddit}/search.json?q=..&restrict_sr=1&sort=new&limit=N`
    ///
    /// The subreddit is pushed as one path segment, so `/`, `?` or `#` in it
    /// are percent-encoded instead of reshaping the request.
    pub fn search_url(&self, limit: usize) -> Result<String, FetchError> {
        let mut url = url::Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{} ({e})", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(format!("{} (cannot be a base)", self.base_url)))?
            .pop_if_empty()
            .push("r")
            .push(&self.subreddit)
            .push("search.json");
        url.query_pairs_mut()
            .append_pair("q", &self.query)
            .append_pair("restrict_sr", "1")
            .append_pair("sort", "new")
            .append_pair("limit", &limit.to_string());
        Ok(url.into())
    }

    /// Parse a search listing. Posts missing a title, permalink or
    /// timestamp are skipped; at most `limit` leads come back.
    pub fn parse_listing(&self, payload: &[u8], limit: usize) -> Result<Vec<Lead>, ParseError> {
        let t0 = std::time::Instant::now();
        let listing: Listing = serde_json::from_slice(payload)?;

        let out: Vec<Lead> = listing
            .data
            .children
            .into_iter()
            .filter_map(|child| self.lead_from_child(child))
            .take(limit)
            .collect();

        histogram!("leads_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }

    fn lead_from_child(&self, mut child: Value) -> Option<Lead> {
        let post: Post = serde_json::from_value(child.get_mut("data")?.take()).ok()?;
        // The search API HTML-escapes titles (`&amp;`, `&lt;`), once.
        let title = normalize_title(&html_escape::decode_html_entities(post.title.as_deref()?));
        let permalink = post.permalink.filter(|p| !p.trim().is_empty())?;
        let created = post.created_utc.as_ref().and_then(unix_to_utc)?;

        Lead::new(
            self.name.as_str(),
            title,
            format!("{}{}", self.base_url, permalink.trim()),
            created,
        )
    }
}

/// `created_utc` arrives as a float, an integer or occasionally a string.
/// Zero counts as missing.
fn unix_to_utc(v: &Value) -> Option<DateTime<Utc>> {
    let secs = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !secs.is_finite() || secs == 0.0 {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(whole, nanos)
}

#[async_trait]
impl LeadProvider for RedditSearchProvider {
    async fn produce_leads(
        &self,
        fetcher: &dyn Fetch,
        limit: usize,
    ) -> Result<Vec<Lead>, Diagnostic> {
        let url = self
            .search_url(limit)
            .map_err(|e| Diagnostic::new(&self.name, e))?;

        let payload = fetcher.fetch(&url).await.map_err(|e| {
            counter!("leads_fetch_errors_total").increment(1);
            Diagnostic::new(&self.name, e)
        })?;

        self.parse_listing(&payload, limit).map_err(|e| {
            counter!("leads_parse_errors_total").increment(1);
            Diagnostic::new(&self.name, e)
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
