use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use tourist_core::{
    acquisition::{
        AcquisitionSettings,
        service::{
            DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_HALF_HEIGHT,
            DEFAULT_HALF_WIDTH, DEFAULT_PHOTOS_PER_PIN,
        },
    },
    providers::flickr::{DEFAULT_PER_PAGE, FLICKR_REST_ENDPOINT, FlickrSettings},
};

pub const DEFAULT_STORE_ROOT: &str = "virtual-tourist-cache";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TouristConfig {
    pub flickr: FlickrConfig,
    pub acquisition: AcquisitionConfig,
    pub store: StoreConfig,
}

/// Remote search settings.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlickrConfig {
    /// Usually supplied through `FLICKR_API_KEY` rather than a file.
    pub api_key: String,
    pub endpoint: String,
    /// Results per search page. This page is the pool photos are sampled
    /// from, so it should be comfortably larger than `photos_per_pin`.
    pub per_page: u32,
    /// Longitude degrees searched on either side of a pin.
    pub half_width: f64,
    /// Latitude degrees searched on either side of a pin.
    pub half_height: f64,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for FlickrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrConfig")
            .field(
                "api_key",
                &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .field("endpoint", &self.endpoint)
            .field("per_page", &self.per_page)
            .field("half_width", &self.half_width)
            .field("half_height", &self.half_height)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for FlickrConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: FLICKR_REST_ENDPOINT.to_string(),
            per_page: DEFAULT_PER_PAGE,
            half_width: DEFAULT_HALF_WIDTH,
            half_height: DEFAULT_HALF_HEIGHT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl FlickrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn search_settings(&self) -> FlickrSettings {
        FlickrSettings {
            api_key: self.api_key.clone(),
            endpoint: self.endpoint.clone(),
            per_page: self.per_page,
            timeout: self.timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub photos_per_pin: usize,
    pub download_concurrency: usize,
    /// Remove a pin when a run leaves it without photos.
    pub delete_empty_pins: bool,
    /// Fixed seed for reproducible photo selection. Unset draws from OS
    /// entropy.
    pub seed: Option<u64>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            photos_per_pin: DEFAULT_PHOTOS_PER_PIN,
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            delete_empty_pins: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// cacache directory holding the manifest and photo blobs.
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_STORE_ROOT),
        }
    }
}

impl TouristConfig {
    pub fn acquisition_settings(&self) -> AcquisitionSettings {
        AcquisitionSettings {
            photos_per_pin: self.acquisition.photos_per_pin,
            download_concurrency: self.acquisition.download_concurrency,
            half_width: self.flickr.half_width,
            half_height: self.flickr.half_height,
            delete_empty_pins: self.acquisition.delete_empty_pins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let config: TouristConfig = toml::from_str(
            r#"
            [acquisition]
            photos_per_pin = 6

            [flickr]
            half_height = 0.5
            "#,
        )
        .expect("parse");

        assert_eq!(config.acquisition.photos_per_pin, 6);
        assert_eq!(config.acquisition.download_concurrency, 4);
        assert_eq!(config.flickr.half_height, 0.5);
        assert_eq!(config.flickr.half_width, 1.0);
        assert_eq!(config.flickr.per_page, 100);
        assert_eq!(config.store.root, PathBuf::from(DEFAULT_STORE_ROOT));

        let settings = config.acquisition_settings();
        assert_eq!(settings.photos_per_pin, 6);
        assert_eq!(settings.half_height, 0.5);
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let config = FlickrConfig {
            api_key: "secret-key".into(),
            ..FlickrConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
