// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ingest;
pub mod present;

// ---- Re-exports for stable public API ----
pub use crate::ingest::config::SourceRegistry;
pub use crate::ingest::fetch::HttpFetcher;
pub use crate::ingest::types::{Diagnostic, Lead, SourceKind, SourceSpec};
pub use crate::ingest::{collect_leads, collect_leads_until, Collected};
pub use crate::present::{render, OutputMode};
