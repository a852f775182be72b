use thiserror::Error;
use url::Url;

use crate::models::TouristConfig;

/// The search API refuses larger pages.
pub const MAX_PER_PAGE: u32 = 500;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error(
        "flickr.api_key is empty; set FLICKR_API_KEY or add it to the \
         config file"
    )]
    MissingApiKey,

    #[error("flickr.endpoint is not a valid http(s) URL: {0}")]
    InvalidEndpoint(String),

    #[error("flickr.per_page must be between 1 and {MAX_PER_PAGE}, got {0}")]
    PerPageOutOfRange(u32),

    #[error("flickr.{field} must be a positive number of degrees, got {value}")]
    InvalidWindow { field: &'static str, value: f64 },

    #[error("flickr.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("acquisition.photos_per_pin must be greater than zero")]
    ZeroPhotosPerPin,

    #[error("acquisition.download_concurrency must be greater than zero")]
    ZeroConcurrency,

    #[error("store.root must not be empty")]
    EmptyStoreRoot,
}

impl TouristConfig {
    /// Full validation, for commands that search.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flickr.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        self.validate_offline()
    }

    /// Everything except the API key, for commands that only read the
    /// store.
    pub fn validate_offline(&self) -> Result<(), ConfigError> {
        let flickr = &self.flickr;
        match Url::parse(&flickr.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::InvalidEndpoint(format!(
                    "unsupported scheme {}",
                    url.scheme()
                )));
            }
            Err(err) => {
                return Err(ConfigError::InvalidEndpoint(err.to_string()));
            }
        }
        if flickr.per_page == 0 || flickr.per_page > MAX_PER_PAGE {
            return Err(ConfigError::PerPageOutOfRange(flickr.per_page));
        }
        for (field, value) in [
            ("half_width", flickr.half_width),
            ("half_height", flickr.half_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidWindow { field, value });
            }
        }
        if flickr.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        if self.acquisition.photos_per_pin == 0 {
            return Err(ConfigError::ZeroPhotosPerPin);
        }
        if self.acquisition.download_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        if self.store.root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStoreRoot);
        }
        Ok(())
    }
}
