// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ingest::error::{FetchError, InvalidLead};

/// A normalized reference to one external discussion.
///
/// Fields are private: the only way in is [`Lead::new`], which refuses
/// blank values, so every `Lead` in circulation is fully populated.
/// Deserialization goes through the same check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "LeadRecord")]
pub struct Lead {
    source: String,
    title: String,
    url: String,
    created: DateTime<Utc>,
}

impl Lead {
    /// Returns `None` if `source`, `title` or `url` is blank after trimming.
    pub fn new(
        source: impl Into<String>,
        title: impl AsRef<str>,
        url: impl AsRef<str>,
        created: DateTime<Utc>,
    ) -> Option<Self> {
        let source = source.into();
        let title = title.as_ref().trim();
        let url = url.as_ref().trim();
        if source.trim().is_empty() || title.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self {
            source,
            title: title.to_string(),
            url: url.to_string(),
            created,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

#[derive(Deserialize)]
struct LeadRecord {
    source: String,
    title: String,
    url: String,
    created: DateTime<Utc>,
}

impl TryFrom<LeadRecord> for Lead {
    type Error = InvalidLead;

    fn try_from(r: LeadRecord) -> Result<Self, Self::Error> {
        Lead::new(r.source, r.title, r.url, r.created).ok_or(InvalidLead)
    }
}

/// How a source is queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Subreddit search (`/r/{subreddit}/search.json`).
    Search { subreddit: String, query: String },
    /// RSS 2.0 feed.
    Feed { url: String },
}

/// One queryable source. Built at startup, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub kind: SourceKind,
}

impl SourceSpec {
    pub fn search(name: &str, subreddit: &str, query: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SourceKind::Search {
                subreddit: subreddit.to_string(),
                query: query.to_string(),
            },
        }
    }

    pub fn feed(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SourceKind::Feed {
                url: url.to_string(),
            },
        }
    }
}

/// A non-fatal, per-source failure. Printed as
/// `[warning] <cause> for <source>.`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub source: String,
    pub cause: String,
}

impl Diagnostic {
    pub fn new(source: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            source: source.into(),
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[warning] {} for {}.", self.cause, self.source)
    }
}

/// Single GET returning the raw body.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Turns one source's payload into leads. A failed fetch or unreadable
/// payload is reported as a [`Diagnostic`]; malformed entries are skipped.
#[async_trait::async_trait]
pub trait LeadProvider: Send + Sync {
    async fn produce_leads(&self, fetcher: &dyn Fetch, limit: usize)
        -> Result<Vec<Lead>, Diagnostic>;
    fn name(&self) -> &str;
}
