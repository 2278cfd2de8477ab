pub mod reddit_search;
pub mod rss_feed;

use crate::ingest::config::SourceRegistry;
use crate::ingest::types::{LeadProvider, SourceKind};

use reddit_search::RedditSearchProvider;
use rss_feed::RssFeedProvider;

/// One provider per registered source, in registry order.
pub fn providers_from_registry(registry: &SourceRegistry) -> Vec<Box<dyn LeadProvider>> {
    registry
        .sources()
        .iter()
        .map(|spec| -> Box<dyn LeadProvider> {
            match &spec.kind {
                SourceKind::Search { subreddit, query } => Box::new(
                    RedditSearchProvider::with_base_url(
                        &spec.name,
                        subreddit,
                        query,
                        registry.search_base(),
                    ),
                ),
                SourceKind::Feed { url } => Box::new(RssFeedProvider::new(&spec.name, url)),
            }
        })
        .collect()
}
