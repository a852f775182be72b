use std::{fmt, time::Duration};

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid image URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Downloads raw image bytes. Implementations do not retry.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl fmt::Debug for HttpImageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpImageFetcher")
            .field("http_client", &self.http)
            .finish()
    }
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("virtual-tourist/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn parse_image_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|err| FetchError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let url = parse_image_url(url)?;
        debug!("[fetch] downloading {}", url);

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("[fetch] {} returned HTTP {}", url, status);
            return Err(FetchError::Network(format!(
                "image request returned a status code other than 2xx ({status})"
            )));
        }

        let expected_len = response.content_length();
        let bytes = response.bytes().await?;

        if let Some(content_len) = expected_len
            && bytes.len() as u64 != content_len
        {
            return Err(FetchError::Network(format!(
                "image size mismatch: got {} bytes, expected {}",
                bytes.len(),
                content_len
            )));
        }

        if bytes.is_empty() {
            return Err(FetchError::Network(format!(
                "no image data was returned from {url}"
            )));
        }

        Ok(bytes.to_vec())
    }
}
