// src/ingest/fetch.rs
use reqwest::Client;
use std::error::Error as _;
use std::time::Duration;

use crate::ingest::error::FetchError;
use crate::ingest::types::Fetch;

/// Sent with every request so remote services can tell this tool apart
/// from anonymous crawling.
pub const USER_AGENT: &str = "LeadScraper/1.0 (+https://ghostdrop.eth)";

/// Upper bound for one request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// `reqwest`-backed fetcher. One attempt per call, no retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(USER_AGENT, REQUEST_TIMEOUT)
    }

    pub fn with_config(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(describe(&e)))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(describe(&e))
        }
    }
}

#[async_trait::async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed =
            url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url} ({e})")))?;

        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(|e| self.classify(e))?;
        Ok(body.to_vec())
    }
}

/// Flatten an error and its sources into one line, e.g.
/// `error sending request: connection refused`.
fn describe(e: &reqwest::Error) -> String {
    let mut out = e.to_string();
    let mut cur = e.source();
    while let Some(src) = cur {
        let s = src.to_string();
        if !out.contains(&s) {
            out.push_str(": ");
            out.push_str(&s);
        }
        cur = src.source();
    }
    out
}
