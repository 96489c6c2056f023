use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid host link: {0}")]
    InvalidLink(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("host returned status {0}")]
    Status(u16),

    #[error("hosted file exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// Retrieves the bytes a contributor claims to host.
#[async_trait]
pub trait HostFetcher: Send + Sync {
    async fn fetch(&self, link: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches contributor copies over HTTP(S) with a fixed timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_size: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_size: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, max_size })
    }
}

#[async_trait]
impl HostFetcher for HttpFetcher {
    async fn fetch(&self, link: &str) -> Result<Vec<u8>, FetchError> {
        let url =
            reqwest::Url::parse(link).map_err(|e| FetchError::InvalidLink(format!("{link}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidLink(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.max_size)
        {
            return Err(FetchError::TooLarge {
                limit: self.max_size,
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > self.max_size {
                return Err(FetchError::TooLarge {
                    limit: self.max_size,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}
