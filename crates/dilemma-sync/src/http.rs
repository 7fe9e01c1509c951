//! HTTP client for the issue results archive.

use thiserror::Error;
use tracing::info;

use crate::html::{IssueDocument, IssueRef, parse_issue_page, pick_random_issue};

pub const DEFAULT_SOURCE_URL: &str = "http://www.mwq.dds.nl/ns/results/";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("malformed results page: {0}")]
    Malformed(String),
    #[error("index page lists no issues")]
    NoIssues,
    #[error("issue must be a number or \"?\", got {0:?}")]
    InvalidIssue(String),
}

/// Fetches results pages from `<base_url>/<n>.html`.
pub struct IssueClient {
    client: reqwest::Client,
    base_url: String,
}

impl IssueClient {
    /// Create a client for the given archive URL. A trailing slash is optional.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and parse one issue. `Random` first reads the archive index.
    pub async fn fetch(&self, issue: IssueRef) -> Result<IssueDocument, FetchError> {
        let number = match issue {
            IssueRef::Number(n) => n,
            IssueRef::Random => self.random_issue().await?,
        };
        let url = self.issue_url(number);

        info!(url = %url, "fetching issue");
        let body = self.get(&url).await?;
        let document = parse_issue_page(number, &body)?;
        info!(number, options = document.rows.len(), "fetched issue");
        Ok(document)
    }

    async fn random_issue(&self) -> Result<u32, FetchError> {
        let url = format!("{}/", self.base_url);
        info!(url = %url, "fetching issue index");
        let body = self.get(&url).await?;
        let number = pick_random_issue(&body, &mut rand::thread_rng())?;
        info!(number, "picked random issue");
        Ok(number)
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "text/html")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text().await?)
    }

    fn issue_url(&self, number: u32) -> String {
        format!("{}/{number}.html", self.base_url)
    }
}

impl Default for IssueClient {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_URL)
    }
}
