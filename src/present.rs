// src/present.rs
use crate::ingest::types::Lead;

/// Printed instead of an empty plain-text listing.
pub const NO_LEADS_NOTICE: &str =
    "No leads found. Try increasing --limit or editing the source lists.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Plain,
    Json,
}

pub fn render(leads: &[Lead], mode: OutputMode) -> Result<String, serde_json::Error> {
    match mode {
        OutputMode::Plain => Ok(render_plain(leads)),
        OutputMode::Json => render_json(leads),
    }
}

/// ```text
/// [2024-05-07 08:30 UTC] r/VPN — Troubleshooting & help
///   Which VPN works with Hulu?
///   https://www.reddit.com/r/VPN/comments/abc/
/// ```
/// Blocks are separated by a blank line.
pub fn render_plain(leads: &[Lead]) -> String {
    if leads.is_empty() {
        return NO_LEADS_NOTICE.to_string();
    }
    leads
        .iter()
        .map(|lead| {
            format!(
                "[{}] {}\n  {}\n  {}",
                lead.created().format("%Y-%m-%d %H:%M UTC"),
                lead.source(),
                lead.title(),
                lead.url()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Pretty JSON array of `{source, title, url, created}`; `created` is RFC 3339.
pub fn render_json(leads: &[Lead]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(leads)
}
