// src/ingest/providers/rss_feed.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::error::ParseError;
use crate::ingest::normalize_title;
use crate::ingest::types::{Diagnostic, Fetch, Lead, LeadProvider};

// Element depths along rss/channel/item/<field>.
const CHANNEL_DEPTH: usize = 2;
const ITEM_DEPTH: usize = 3;
const FIELD_DEPTH: usize = 4;

#[derive(Debug, Default)]
struct RawItem {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
}

impl Field {
    /// Unprefixed names only: `atom:link` or `media:title` are not ours.
    fn from_element(e: &BytesStart<'_>) -> Option<Self> {
        match e.name().as_ref() {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            _ => None,
        }
    }

    fn slot<'a>(&self, item: &'a mut RawItem) -> &'a mut Option<String> {
        match self {
            Self::Title => &mut item.title,
            Self::Link => &mut item.link,
            Self::PubDate => &mut item.pub_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Before,
    Inside,
    Done,
}

/// Walks the first `channel` under the root and returns its first `limit`
/// items. Within an item the first `title`/`link`/`pubDate` wins and every
/// other element is ignored. The whole document must still be well formed.
fn read_channel_items(xml: &str, limit: usize) -> Result<Vec<RawItem>, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut channel = ChannelState::Before;
    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut field: Option<(Field, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(e.name().as_ref().to_vec());
                let want_more = items.len() < limit;
                open_element(&e, stack.len(), &mut channel, &mut current, &mut field, want_more);
                seen_root = true;
            }
            Event::Empty(e) => {
                let depth = stack.len() + 1;
                let want_more = items.len() < limit;
                open_element(&e, depth, &mut channel, &mut current, &mut field, want_more);
                close_element(depth, &mut channel, &mut current, &mut field, &mut items);
                seen_root = true;
            }
            Event::End(_) => {
                close_element(stack.len(), &mut channel, &mut current, &mut field, &mut items);
                stack.pop();
            }
            Event::Text(t) => {
                if let Some((_, buf)) = field.as_mut() {
                    // Unknown entities are kept verbatim rather than failing the feed.
                    match t.unescape() {
                        Ok(s) => buf.push_str(&s),
                        Err(_) => buf.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Event::CData(c) => {
                if let Some((_, buf)) = field.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        let name = String::from_utf8_lossy(&open).into_owned();
        return Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(name)).into());
    }
    if !seen_root {
        return Err(ParseError::MissingRoot);
    }
    Ok(items)
}

fn open_element(
    e: &BytesStart<'_>,
    depth: usize,
    channel: &mut ChannelState,
    current: &mut Option<RawItem>,
    field: &mut Option<(Field, String)>,
    want_more: bool,
) {
    match depth {
        CHANNEL_DEPTH if *channel == ChannelState::Before && e.name().as_ref() == b"channel" => {
            *channel = ChannelState::Inside;
        }
        ITEM_DEPTH if *channel == ChannelState::Inside && e.name().as_ref() == b"item" => {
            if want_more {
                *current = Some(RawItem::default());
            }
        }
        FIELD_DEPTH if field.is_none() => {
            if let (Some(item), Some(f)) = (current.as_mut(), Field::from_element(e)) {
                if f.slot(item).is_none() {
                    *field = Some((f, String::new()));
                }
            }
        }
        _ => {}
    }
}

fn close_element(
    depth: usize,
    channel: &mut ChannelState,
    current: &mut Option<RawItem>,
    field: &mut Option<(Field, String)>,
    items: &mut Vec<RawItem>,
) {
    match depth {
        FIELD_DEPTH => {
            if let (Some(item), Some((f, text))) = (current.as_mut(), field.take()) {
                *f.slot(item) = Some(text);
            }
        }
        ITEM_DEPTH => {
            if let Some(item) = current.take() {
                items.push(item);
            }
        }
        CHANNEL_DEPTH if *channel == ChannelState::Inside => *channel = ChannelState::Done,
        _ => {}
    }
}

/// Best-effort publication time. RFC 2822 is the RSS norm; RFC 3339 and a
/// bare `YYYY-MM-DD HH:MM:SS` (read as UTC) show up in the wild too.
/// Anything else, or no date at all, becomes "now".
pub fn parse_feed_date(raw: Option<&str>) -> DateTime<Utc> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_known_formats)
        .unwrap_or_else(Utc::now)
}

fn parse_known_formats(ts: &str) -> Option<DateTime<Utc>> {
    let from_time = |dt: OffsetDateTime| {
        DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
    };
    if let Some(dt) = OffsetDateTime::parse(ts, &Rfc2822).ok().and_then(from_time) {
        return Some(dt);
    }
    // chrono is laxer about obsolete zone names (EST, PDT, ...)
    if let Ok(dt) = DateTime::parse_from_rfc2822(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OffsetDateTime::parse(ts, &Rfc3339).ok().and_then(from_time) {
        return Some(dt);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// RSS 2.0 feed, taken in published order.
pub struct RssFeedProvider {
    name: String,
    url: String,
}

impl RssFeedProvider {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parse a feed document. A document without `<channel>` has no items.
    /// Only the first `limit` items are looked at; of those, items lacking
    /// a title or link are dropped. HTML named entities (`&nbsp;`, ...) are
    /// accepted alongside the XML ones.
    pub fn parse_feed(&self, payload: &[u8], limit: usize) -> Result<Vec<Lead>, ParseError> {
        let t0 = std::time::Instant::now();
        let text = String::from_utf8_lossy(payload);
        let items = read_channel_items(&text, limit)?;

        let mut out = Vec::with_capacity(items.len());
        for it in items {
            let (Some(title), Some(link)) = (it.title, it.link) else {
                continue;
            };
            let created = parse_feed_date(it.pub_date.as_deref());
            if let Some(lead) = Lead::new(self.name.as_str(), normalize_title(&title), link, created)
            {
                out.push(lead);
            }
        }

        histogram!("leads_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

#[async_trait]
impl LeadProvider for RssFeedProvider {
    async fn produce_leads(
        &self,
        fetcher: &dyn Fetch,
        limit: usize,
    ) -> Result<Vec<Lead>, Diagnostic> {
        let payload = fetcher.fetch(&self.url).await.map_err(|e| {
            counter!("leads_fetch_errors_total").increment(1);
            Diagnostic::new(&self.name, e)
        })?;

        self.parse_feed(&payload, limit).map_err(|e| {
            counter!("leads_parse_errors_total").increment(1);
            Diagnostic::new(&self.name, e)
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
