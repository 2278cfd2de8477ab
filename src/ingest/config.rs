// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::providers::reddit_search::DEFAULT_SEARCH_BASE;
use crate::ingest::types::SourceSpec;

pub const ENV_PATH: &str = "LEAD_SOURCES_PATH";

/// Immutable source table: searches first, then feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    search_base: String,
    sources: Vec<SourceSpec>,
}

impl SourceRegistry {
    pub fn new(search_base: &str, sources: Vec<SourceSpec>) -> Self {
        Self {
            search_base: search_base.trim_end_matches('/').to_string(),
            sources,
        }
    }

    /// Subreddit searches and forum feeds that surface VPN questions.
    pub fn builtin() -> Self {
        let sources = vec![
            SourceSpec::search(
                "r/VPN — Troubleshooting & help",
                "VPN",
                "help OR recommendation",
            ),
            SourceSpec::search(
                "r/Privacy — VPN shopping threads",
                "privacy",
                "vpn recommendation",
            ),
            SourceSpec::search(
                "r/cordcutters — Streaming blocks",
                "cordcutters",
                "vpn netflix OR vpn hulu",
            ),
            SourceSpec::feed(
                "Wilders Security — Privacy & Anonymity",
                "https://www.wilderssecurity.com/forums/privacy-anonymity.44/index.rss",
            ),
            SourceSpec::feed(
                "Linus Tech Tips — Networking",
                "https://linustechtips.com/rss/7-networking.xml",
            ),
            SourceSpec::feed(
                "Tom's Hardware — Networking",
                "https://www.tomshardware.com/feeds/all",
            ),
        ];
        Self::new(DEFAULT_SEARCH_BASE, sources)
    }

    pub fn search_base(&self) -> &str {
        &self.search_base
    }

    pub fn sources(&self) -> &[SourceSpec] {
        &self.sources
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_sources(&content, ext.as_str())
            .with_context(|| format!("parsing sources from {}", path.display()))
    }

    /// Resolve the table using env var + fallbacks:
    /// 1) $LEAD_SOURCES_PATH
    /// 2) config/lead_sources.toml
    /// 3) config/lead_sources.json
    /// 4) built-in table
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        let toml_p = PathBuf::from("config/lead_sources.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/lead_sources.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::builtin())
    }
}

fn default_search_base() -> String {
    DEFAULT_SEARCH_BASE.to_string()
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default = "default_search_base")]
    search_base: String,
    #[serde(default)]
    search: Vec<SearchEntry>,
    #[serde(default)]
    feed: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    name: String,
    subreddit: String,
    query: String,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    name: String,
    url: String,
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<SourceRegistry> {
    let file: SourcesFile = match hint_ext {
        "json" => serde_json::from_str(s)?,
        "toml" => toml::from_str(s)?,
        // Unknown extension: TOML first, JSON as a fallback.
        _ => match toml::from_str(s) {
            Ok(v) => v,
            Err(toml_err) => serde_json::from_str(s)
                .map_err(|_| anyhow!("unsupported sources format: {toml_err}"))?,
        },
    };
    clean_registry(file)
}

/// Trim every field, drop entries with a blank one.
fn clean_registry(file: SourcesFile) -> Result<SourceRegistry> {
    let mut sources = Vec::with_capacity(file.search.len() + file.feed.len());
    for e in file.search {
        let (name, sub, q) = (e.name.trim(), e.subreddit.trim(), e.query.trim());
        if !name.is_empty() && !sub.is_empty() && !q.is_empty() {
            sources.push(SourceSpec::search(name, sub, q));
        }
    }
    for e in file.feed {
        let (name, url) = (e.name.trim(), e.url.trim());
        if !name.is_empty() && !url.is_empty() {
            sources.push(SourceSpec::feed(name, url));
        }
    }
    if sources.is_empty() {
        bail!("no usable sources defined");
    }
    let base = file.search_base.trim();
    let base = if base.is_empty() { DEFAULT_SEARCH_BASE } else { base };
    Ok(SourceRegistry::new(base, sources))
}
