// src/ingest/error.rs
use std::time::Duration;
use thiserror::Error;

/// A single GET that did not produce a body.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server answered HTTP {0}")]
    Status(u16),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// A payload that could not be read at all.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("could not decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid RSS: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid RSS: no root element")]
    MissingRoot,
}

/// Deserialized lead with a blank source, title or url.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("lead needs a non-empty source, title and url")]
pub struct InvalidLead;

/// Failures of the aggregation call itself; these are fatal to the caller.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AggregationError {
    #[error("limit must be a positive integer, got {0}")]
    InvalidLimit(usize),

    #[error("no sources configured")]
    NoSources,
}
