// src/ingest/mod.rs
pub mod config;
pub mod error;
pub mod fetch;
pub mod providers;
pub mod types;

use crate::ingest::error::AggregationError;
use crate::ingest::types::{Diagnostic, Fetch, Lead, LeadProvider};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::future::Future;

/// Per-source result bound used when the caller does not pick one.
pub const DEFAULT_LIMIT: usize = 5;

/// One-time metrics registration (so series carry descriptions).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("leads_sources_total", "Sources queried.");
        describe_counter!(
            "leads_source_errors_total",
            "Sources skipped after a fetch or parse failure."
        );
        describe_counter!("leads_fetch_errors_total", "Failed source fetches.");
        describe_counter!("leads_parse_errors_total", "Unreadable source payloads.");
        describe_counter!("leads_collected_total", "Leads kept after merging.");
        describe_histogram!("leads_parse_ms", "Payload parse time in milliseconds.");
        describe_histogram!("leads_source_ms", "Fetch + parse time per source.");
        describe_gauge!("leads_last_run_ts", "Unix ts when collection last ran.");
    });
}

/// Title cleanup: collapse whitespace runs (incl. NBSP), trim.
/// Entity decoding is the caller's business; feed text arrives decoded.
pub fn normalize_title(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Newest first. Stable, so equal timestamps keep registry order.
pub fn sort_newest_first(leads: &mut [Lead]) {
    leads.sort_by(|a, b| b.created().cmp(&a.created()));
}

/// Result of one aggregation pass.
#[derive(Debug, Default)]
pub struct Collected {
    pub leads: Vec<Lead>,
    /// One entry per skipped source, in registry order.
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the pass was cut short before every source was tried.
    pub interrupted: bool,
}

/// Run every provider once, sequentially, and merge the results.
pub async fn collect_leads(
    providers: &[Box<dyn LeadProvider>],
    fetcher: &dyn Fetch,
    limit: usize,
) -> Result<Collected, AggregationError> {
    collect_leads_until(providers, fetcher, limit, std::future::pending::<()>()).await
}

/// Like [`collect_leads`], but stops starting new fetches once `shutdown`
/// resolves. The in-flight source is abandoned; everything gathered before
/// it is still sorted and returned.
pub async fn collect_leads_until<F>(
    providers: &[Box<dyn LeadProvider>],
    fetcher: &dyn Fetch,
    limit: usize,
    shutdown: F,
) -> Result<Collected, AggregationError>
where
    F: Future<Output = ()>,
{
    if limit == 0 {
        return Err(AggregationError::InvalidLimit(limit));
    }
    if providers.is_empty() {
        return Err(AggregationError::NoSources);
    }
    ensure_metrics_described();
    tokio::pin!(shutdown);

    let mut out = Collected::default();
    for p in providers {
        let t0 = std::time::Instant::now();
        let res = tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!(provider = p.name(), "shutdown requested, not querying further sources");
                out.interrupted = true;
                break;
            }
            res = p.produce_leads(fetcher, limit) => res,
        };
        counter!("leads_sources_total").increment(1);
        histogram!("leads_source_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(mut v) => {
                tracing::debug!(provider = p.name(), leads = v.len(), "source ok");
                out.leads.append(&mut v);
            }
            Err(diag) => {
                tracing::warn!(provider = p.name(), cause = %diag.cause, "source skipped");
                counter!("leads_source_errors_total").increment(1);
                out.diagnostics.push(diag);
            }
        }
    }

    sort_newest_first(&mut out.leads);

    counter!("leads_collected_total").increment(out.leads.len() as u64);
    gauge!("leads_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    tracing::info!(
        target: "ingest",
        leads = out.leads.len(),
        skipped = out.diagnostics.len(),
        interrupted = out.interrupted,
        "collection pass finished"
    );

    Ok(out)
}
