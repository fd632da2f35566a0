//! Single-attempt item retrieval.
//!
//! A [`Fetcher`] performs exactly one network request per call and reports a
//! uniform failure for anything that did not produce a non-empty body with a
//! success status. Retrying is layered on top in [`crate::retry`].

use crate::config::HttpConfig;
use crate::error::{FetchError, Result};
use reqwest::header::{HeaderMap, HeaderValue, REFERER};

/// Abstraction over item fetching, enabling testability.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the payload at `url` once.
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError>;
}

/// Production [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher from HTTP settings.
    ///
    /// # Errors
    ///
    /// Fails if the referer is not a valid header value or the client cannot
    /// be constructed (e.g. TLS backend initialisation).
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(referer) = &config.referer {
            let value = HeaderValue::from_str(referer).map_err(|e| {
                crate::error::Error::config("http.referer", format!("invalid referer: {}", e))
            })?;
            headers.insert(REFERER, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(body.to_vec())
    }
}
